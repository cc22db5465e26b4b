//! Core processing building blocks: dark object estimation, radiometric
//! conversion, the correction pipeline, nearest-neighbour zoom and spectral
//! indices. These are internal primitives consumed by the high-level `api` module.
pub mod params;
pub mod processing;
