//! I/O layer for Sentinel-2 L1C products and GDAL-backed rasters.
//! Provides the `sentinel2` metadata model, the `gdal` raster reader, zip
//! `archive` extraction and the `writers` for GeoTIFF/in-memory outputs.
pub mod sentinel2;
pub use sentinel2::{GridExtent, MetadataError, MetadataRecord, ProductMetadata, TileMetadata};

pub mod gdal;
pub use self::gdal::{GdalError, GdalMetadata, RasterReader};

pub mod archive;
pub mod writers;
pub(crate) mod xml;
