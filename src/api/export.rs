//! Band export: turn the JPEG2000 band files of an unzipped L1C product into one
//! band-stacked GeoTIFF per tile on a common grid.
use std::fs;
use std::path::{Path, PathBuf};

use ndarray::{Array3, Axis};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::params::ExportParams;
use crate::core::processing::resample::zoom_nearest_u16;
use crate::error::{Error, Result};
use crate::io::gdal::RasterReader;
use crate::io::sentinel2::{
    MetadataRecord, ProductMetadata, TileMetadata, find_product_metadata, find_tile_metadata,
    tile_code,
};
use crate::io::writers::metadata::extract_metadata_fields;
use crate::io::writers::{Destination, write_raster};
use crate::types::{Band, RasterImage};

/// Why a tile was not exported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    CloudCover,
    DataCover,
    CloudAndDataCover,
}

impl SkipReason {
    fn from_checks(too_cloudy: bool, too_empty: bool) -> Option<Self> {
        match (too_cloudy, too_empty) {
            (true, true) => Some(SkipReason::CloudAndDataCover),
            (true, false) => Some(SkipReason::CloudCover),
            (false, true) => Some(SkipReason::DataCover),
            (false, false) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedTile {
    pub tile: String,
    pub reason: SkipReason,
    pub cloud_cover: f64,
    pub data_cover: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedTile {
    pub tile: String,
    pub message: String,
}

/// Outcome of exporting one product
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportReport {
    pub exported: Vec<PathBuf>,
    pub skipped: Vec<SkippedTile>,
    pub errors: Vec<FailedTile>,
}

enum TileOutcome {
    Exported(PathBuf),
    Skipped(SkippedTile),
}

/// Bands selected by per-band flags in `Band::ALL` order, or all VIS/NIR bands
pub fn bands_from_flags(flags: [bool; 13], all_visnir: bool) -> Vec<Band> {
    if all_visnir {
        return Band::visnir();
    }
    Band::ALL
        .iter()
        .zip(flags)
        .filter_map(|(band, on)| on.then_some(*band))
        .collect()
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// MGRS code of a granule directory, or its full name when none can be parsed
fn tile_label(tile_dir: &Path) -> String {
    let name = dir_name(tile_dir);
    tile_code(&name).unwrap_or(name)
}

fn granule_matches(tile_dir_name: &str, granule: &str) -> bool {
    let wanted = granule.trim().trim_start_matches(['T', 't']).to_ascii_uppercase();
    tile_code(tile_dir_name).is_some_and(|code| code == wanted)
}

/// Tile directories under `GRANULE`, optionally restricted to MGRS codes.
///
/// Without a filter an empty `GRANULE` directory is an error; with a filter an
/// empty result is returned as-is.
pub fn find_tiles(product_dir: &Path, granules: &[String]) -> Result<Vec<PathBuf>> {
    let tile_root = product_dir.join("GRANULE");
    let mut tiles = Vec::new();
    if tile_root.is_dir() {
        for entry in fs::read_dir(&tile_root)? {
            let path = entry?.path();
            if path.is_dir() {
                tiles.push(path);
            }
        }
    }
    tiles.sort();

    if granules.is_empty() {
        if tiles.is_empty() {
            return Err(Error::NoTilesFound {
                pattern: tile_root.join("*"),
            });
        }
        return Ok(tiles);
    }

    Ok(tiles
        .into_iter()
        .filter(|tile| {
            let name = dir_name(tile);
            granules.iter().any(|g| granule_matches(&name, g))
        })
        .collect())
}

/// `IMG_DATA/*_<band>.jp2` of a tile, if present
pub fn find_band_file(tile_dir: &Path, band: Band) -> Result<Option<PathBuf>> {
    let img_dir = tile_dir.join("IMG_DATA");
    if !img_dir.is_dir() {
        return Ok(None);
    }
    let suffix = format!("_{}.jp2", band.name());
    let mut matches = Vec::new();
    for entry in fs::read_dir(&img_dir)? {
        let path = entry?.path();
        if path.is_file() && dir_name(&path).ends_with(&suffix) {
            matches.push(path);
        }
    }
    matches.sort();
    Ok(matches.into_iter().next())
}

/// Share of non-zero pixels (percent) in a band file
fn data_cover_percent(band_file: &Path) -> Result<f64> {
    let band = RasterReader::open(band_file)?.read_band_u16(1)?;
    if band.is_empty() {
        return Ok(0.0);
    }
    let valid = band.iter().filter(|&&v| v > 0).count();
    Ok(valid as f64 / band.len() as f64 * 100.0)
}

/// Read band 1 of a JP2 file as u16 with nodata forced to 0
fn read_band_file(path: &Path) -> Result<ndarray::Array2<u16>> {
    let reader = RasterReader::open(path)?;
    let mut band = reader.read_band_u16(1)?;
    if let Some(nodata) = reader.metadata.no_data {
        if nodata != 0.0 && nodata >= 0.0 && nodata <= u16::MAX as f64 {
            let nodata = nodata as u16;
            band.mapv_inplace(|v| if v == nodata { 0 } else { v });
        }
    }
    Ok(band)
}

/// Output name: band file stem without its `_<band>` suffix, plus `.tif`
fn output_name(band_file: &Path, band: Band) -> String {
    let stem = band_file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let suffix = format!("_{}", band.name());
    format!("{}.tif", stem.strip_suffix(&suffix).unwrap_or(&stem))
}

fn export_tile(
    tile_dir: &Path,
    product: &ProductMetadata,
    output_dir: &Path,
    params: &ExportParams,
) -> Result<TileOutcome> {
    let tile_label = tile_label(tile_dir);
    info!("Processing granule: {}", tile_label);

    let tile = TileMetadata::from_file(&find_tile_metadata(tile_dir)?)?;
    let grid = tile.grid(params.resolution)?;
    let geotransform = tile.geotransform(params.resolution)?;

    let cloud_cover = tile.cloudy_pixel_percentage.unwrap_or(0.0);
    info!("Cloud cover %: {:.0}", cloud_cover);

    let data_cover = match find_band_file(tile_dir, Band::B01)? {
        Some(b01) => data_cover_percent(&b01)?,
        None => {
            warn!("No B01 file in {:?}; data cover taken as 0", tile_dir);
            0.0
        }
    };
    info!("Data %: {:.0}", data_cover);

    let reason = SkipReason::from_checks(
        cloud_cover > params.max_cloud_cover,
        data_cover < params.min_data_cover,
    );
    if let Some(reason) = reason {
        info!("Skipping granule {}: {:?}", tile_label, reason);
        return Ok(TileOutcome::Skipped(SkippedTile {
            tile: tile_label,
            reason,
            cloud_cover,
            data_cover,
        }));
    }

    let mut data = Array3::<u16>::zeros((params.bands.len(), grid.rows, grid.cols));
    let mut last_file: Option<(PathBuf, Band)> = None;
    for (b, &band) in params.bands.iter().enumerate() {
        let Some(band_file) = find_band_file(tile_dir, band)? else {
            warn!(
                "No data found for band {} in {:?}. Continuing.",
                band,
                tile_dir.join("IMG_DATA")
            );
            continue;
        };
        info!("Exporting data for band {} from {:?}", band, band_file);
        let band_data = read_band_file(&band_file)?;
        let zoomed = zoom_nearest_u16(&band_data, grid.rows, grid.cols)?;
        data.index_axis_mut(Axis(0), b).assign(&zoomed);
        last_file = Some((band_file, band));
    }

    let Some((band_file, band)) = last_file else {
        return Err(Error::NoBandDataRetrieved { tile: tile_label });
    };

    let output_path = output_dir.join(output_name(&band_file, band));
    let image = RasterImage::new(data, geotransform, tile.crs());
    let mut items = extract_metadata_fields(&MetadataRecord::new(product.clone(), tile)?, None);
    items.insert(
        "BANDS".to_string(),
        params
            .bands
            .iter()
            .map(|b| b.name())
            .collect::<Vec<_>>()
            .join(","),
    );
    items.insert("RESOLUTION".to_string(), params.resolution.to_string());

    info!("Saving GeoTIFF {:?}", output_path);
    let ds = write_raster(&image, &Destination::File(output_path.clone()), &items)?;
    drop(ds);
    Ok(TileOutcome::Exported(output_path))
}

/// Export every selected tile of an unzipped product to `output_dir`.
///
/// With `continue_on_error`, a failing tile is recorded in the report and the
/// next tile is processed; otherwise the first failure is returned.
pub fn export_product(
    product_dir: &Path,
    output_dir: &Path,
    params: &ExportParams,
    continue_on_error: bool,
) -> Result<ExportReport> {
    if params.bands.is_empty() {
        return Err(Error::InvalidArgument {
            arg: "bands",
            value: "<empty>".to_string(),
        });
    }
    fs::create_dir_all(output_dir)?;

    let product = ProductMetadata::from_file(&find_product_metadata(product_dir)?)?;
    let tiles = find_tiles(product_dir, &params.granules)?;

    let mut report = ExportReport::default();
    if tiles.is_empty() {
        info!("No tiles were found for query {:?}. Exiting.", params.granules);
        return Ok(report);
    }
    debug!("Tiles to export: {:?}", tiles);

    for tile_dir in &tiles {
        match export_tile(tile_dir, &product, output_dir, params) {
            Ok(TileOutcome::Exported(path)) => report.exported.push(path),
            Ok(TileOutcome::Skipped(skipped)) => report.skipped.push(skipped),
            Err(e) => {
                if !continue_on_error {
                    return Err(e);
                }
                warn!("Error exporting {:?}: {}", tile_dir, e);
                report.errors.push(FailedTile {
                    tile: tile_label(tile_dir),
                    message: e.to_string(),
                });
            }
        }
    }

    info!(
        "Export finished with {} exported file(s), {} skipped, {} failed",
        report.exported.len(),
        report.skipped.len(),
        report.errors.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bands_from_flags() {
        let mut flags = [false; 13];
        flags[3] = true; // B04
        flags[8] = true; // B8A
        flags[12] = true; // B12
        assert_eq!(bands_from_flags(flags, false), vec![Band::B04, Band::B8A, Band::B12]);
        assert_eq!(bands_from_flags(flags, true), Band::visnir());
    }

    #[test]
    fn test_skip_reason_combinations() {
        assert_eq!(SkipReason::from_checks(false, false), None);
        assert_eq!(SkipReason::from_checks(true, false), Some(SkipReason::CloudCover));
        assert_eq!(SkipReason::from_checks(false, true), Some(SkipReason::DataCover));
        assert_eq!(
            SkipReason::from_checks(true, true),
            Some(SkipReason::CloudAndDataCover)
        );
    }

    #[test]
    fn test_output_name_strips_band_suffix() {
        let file = Path::new("/x/IMG_DATA/T32UNG_20171012T103021_B8A.jp2");
        assert_eq!(output_name(file, Band::B8A), "T32UNG_20171012T103021.tif");
    }

    #[test]
    fn test_find_tiles_filter() {
        let tmp = TempDir::new().unwrap();
        let granule = tmp.path().join("GRANULE");
        for name in [
            "L1C_T32UNG_A012029_20171012T103022",
            "S2A_OPER_MSI_L1C_TL_SGS__20171012T103022_A012029_T33UUB_N02.05",
        ] {
            fs::create_dir_all(granule.join(name)).unwrap();
        }

        assert_eq!(find_tiles(tmp.path(), &[]).unwrap().len(), 2);

        let only = find_tiles(tmp.path(), &["33UUB".to_string()]).unwrap();
        assert_eq!(only.len(), 1);
        assert!(dir_name(&only[0]).contains("_T33UUB_"));

        let prefixed = find_tiles(tmp.path(), &["t32ung".to_string()]).unwrap();
        assert_eq!(prefixed.len(), 1);

        assert!(find_tiles(tmp.path(), &["31TCJ".to_string()]).unwrap().is_empty());
    }

    #[test]
    fn test_find_tiles_without_granules_is_an_error() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("GRANULE")).unwrap();
        assert!(matches!(
            find_tiles(tmp.path(), &[]),
            Err(Error::NoTilesFound { .. })
        ));
    }

    #[test]
    fn test_tile_label() {
        assert_eq!(
            tile_label(Path::new("/p/GRANULE/L1C_T32UNG_A012029_20171012T103022")),
            "32UNG"
        );
        assert_eq!(
            tile_label(Path::new(
                "/p/GRANULE/S2A_OPER_MSI_L1C_TL_SGS__20171012T103022_A012029_T33UUB_N02.05"
            )),
            "33UUB"
        );
        assert_eq!(tile_label(Path::new("/p/GRANULE/odd")), "odd");
    }

    #[test]
    fn test_find_band_file() {
        let tmp = TempDir::new().unwrap();
        let img = tmp.path().join("IMG_DATA");
        fs::create_dir_all(&img).unwrap();
        fs::write(img.join("T32UNG_20171012T103021_B08.jp2"), b"").unwrap();
        fs::write(img.join("T32UNG_20171012T103021_TCI.jp2"), b"").unwrap();
        assert!(find_band_file(tmp.path(), Band::B08).unwrap().is_some());
        assert!(find_band_file(tmp.path(), Band::B8A).unwrap().is_none());
    }
}
