//! High-level, ergonomic library API: correct a band-stacked raster to a file or an
//! in-memory dataset, compute spectral indices, unzip and export products. Prefer
//! these entrypoints over the low-level processing modules when integrating s2dos.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use gdal::Dataset;
use tracing::info;

use crate::core::params::CorrectionParams;
use crate::core::processing::indices::{INDEX_DEFINITIONS, compute_indices};
use crate::core::processing::pipeline::{CorrectedRaster, correct};
use crate::error::Result;
use crate::io::gdal::RasterReader;
use crate::io::sentinel2::MetadataRecord;
use crate::io::writers::metadata::{extract_metadata_fields, provenance_fields};
use crate::io::writers::{Destination, write_raster, write_raster_with_nodata};
use crate::types::RasterImage;

pub mod export;

pub use crate::io::archive::unzip_product;
pub use export::{
    ExportReport, FailedTile, SkipReason, SkippedTile, bands_from_flags, export_product,
    find_tiles,
};

/// Run the correction on an image already in memory
pub fn correct_image(
    image: RasterImage<u16>,
    metadata: &MetadataRecord,
    params: &CorrectionParams,
) -> Result<CorrectedRaster> {
    correct(image, metadata, params.method, params.dark_object_policy)
}

/// Write a corrected raster with its provenance items to `destination`
pub fn write_corrected(
    corrected: &CorrectedRaster,
    metadata: &MetadataRecord,
    params: &CorrectionParams,
    destination: &Destination,
) -> Result<Dataset> {
    let items = extract_metadata_fields(metadata, Some(params.method));
    match corrected {
        CorrectedRaster::Reflectance(img) => write_raster(img, destination, &items),
        CorrectedRaster::Radiance(img) => write_raster(img, destination, &items),
    }
}

fn load_inputs(input: &Path, metadata_xml: &Path) -> Result<(RasterImage<u16>, MetadataRecord)> {
    let image = RasterReader::open(input)?.read_u16()?;
    let metadata = MetadataRecord::from_product_xml(metadata_xml)?;
    Ok((image, metadata))
}

/// Correct a band-stacked GeoTIFF and keep the result as a GDAL `MEM` dataset
pub fn correct_to_memory(
    input: &Path,
    metadata_xml: &Path,
    params: &CorrectionParams,
) -> Result<Dataset> {
    let (image, metadata) = load_inputs(input, metadata_xml)?;
    let corrected = correct_image(image, &metadata, params)?;
    write_corrected(&corrected, &metadata, params, &Destination::Memory)
}

/// Correct a band-stacked GeoTIFF into a compressed GeoTIFF at `output`
pub fn correct_file(
    input: &Path,
    metadata_xml: &Path,
    output: &Path,
    params: &CorrectionParams,
) -> Result<()> {
    let (image, metadata) = load_inputs(input, metadata_xml)?;
    let corrected = correct_image(image, &metadata, params)?;
    let ds = write_corrected(&corrected, &metadata, params, &Destination::file(output))?;
    drop(ds);
    info!("Successfully corrected: {:?} -> {:?}", input, output);
    Ok(())
}

/// Compute the eight indices of a reflectance stack into `<stem>_indices.tif`.
///
/// The Int16 bands carry no nodata value: 0 is a valid normalized difference.
pub fn compute_indices_file(input: &Path, output_dir: &Path) -> Result<PathBuf> {
    let image = RasterReader::open(input)?.read_f32()?;
    let indices = compute_indices(&image)?;

    std::fs::create_dir_all(output_dir)?;
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let output = output_dir.join(format!("{}_indices.tif", stem));

    let mut items: BTreeMap<String, String> = provenance_fields();
    for (i, def) in INDEX_DEFINITIONS.iter().enumerate() {
        items.insert(format!("INDEX_{}", i + 1), def.name.to_string());
    }
    items.insert("INDEX_SCALE".to_string(), "10000".to_string());

    let ds = write_raster_with_nodata(&indices, &Destination::file(&output), &items, None)?;
    drop(ds);
    info!("Indices written to {:?}", output);
    Ok(output)
}
