//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, metadata and GDAL errors, and provides semantic variants
//! for the correction engine, the raster sink and the export flow.
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata error: {0}")]
    Metadata(#[from] crate::io::MetadataError),

    #[error("GDAL error: {0}")]
    Gdal(#[from] crate::io::GdalError),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("No dark object found in band {band}: no histogram step above {threshold:.3} pixels")]
    DarkObjectNotFound { band: usize, threshold: f64 },

    #[error("Operation {operation} needs at least {required} bands, raster has {available}")]
    UnsupportedBandCount {
        operation: &'static str,
        required: usize,
        available: usize,
    },

    #[error("Invalid correction method `{0}` (expected DOS, TOA or RAD)")]
    InvalidMethod(String),

    #[error("Solar irradiance missing for band index {band} ({available} values in metadata)")]
    MissingIrradiance { band: usize, available: usize },

    #[error("Failed to write raster to {destination}: {source}")]
    Write {
        destination: String,
        #[source]
        source: crate::io::GdalError,
    },

    #[error("No tiles found for pattern {pattern}")]
    NoTilesFound { pattern: PathBuf },

    #[error("No band data was retrieved for tile {tile}")]
    NoBandDataRetrieved { tile: String },

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("External error: {0}")]
    External(String),
}

impl Error {
    pub fn external<E: std::fmt::Display>(e: E) -> Self {
        Error::External(e.to_string())
    }
}
