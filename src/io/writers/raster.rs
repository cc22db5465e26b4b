//! Raster sink: emit a `[band, row, col]` image with geotransform, projection and
//! nodata to an in-memory GDAL dataset or a DEFLATE-compressed tiled GeoTIFF.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use gdal::cpl::CslStringList;
use gdal::raster::{Buffer, ColorInterpretation, GdalType};
use gdal::{Dataset, DriverManager, Metadata};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::io::gdal::{GdalError, projection_to_wkt};
use crate::types::RasterImage;

/// Nodata sentinel of the DN, reflectance and radiance outputs
pub const NO_DATA_VALUE: f64 = 0.0;

/// Where a raster goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// GDAL `MEM` dataset, returned to the caller
    Memory,
    /// GeoTIFF on disk
    File(PathBuf),
}

impl Destination {
    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        Destination::File(path.as_ref().to_path_buf())
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Memory => write!(f, "<memory>"),
            Destination::File(path) => write!(f, "{}", path.display()),
        }
    }
}

fn geotiff_creation_options() -> std::result::Result<CslStringList, GdalError> {
    let mut options = CslStringList::new();
    options.set_name_value("COMPRESS", "DEFLATE")?;
    options.set_name_value("PREDICTOR", "2")?;
    options.set_name_value("TILED", "YES")?;
    options.set_name_value("BIGTIFF", "IF_SAFER")?;
    Ok(options)
}

fn create_dataset<T: GdalType + Copy>(
    image: &RasterImage<T>,
    destination: &Destination,
) -> std::result::Result<Dataset, GdalError> {
    let (bands, rows, cols) = image.data.dim();
    let ds = match destination {
        Destination::Memory => {
            let driver = DriverManager::get_driver_by_name("MEM")?;
            driver.create_with_band_type::<T, _>("", cols, rows, bands)?
        }
        Destination::File(path) => {
            let driver = DriverManager::get_driver_by_name("GTiff")?;
            let options = geotiff_creation_options()?;
            driver.create_with_band_type_with_options::<T, _>(path, cols, rows, bands, &options)?
        }
    };
    Ok(ds)
}

fn write_into<T: GdalType + Copy>(
    image: &RasterImage<T>,
    destination: &Destination,
    metadata_items: &BTreeMap<String, String>,
    no_data: Option<f64>,
) -> std::result::Result<Dataset, GdalError> {
    let (bands, rows, cols) = image.data.dim();
    let mut ds = create_dataset(image, destination)?;

    ds.set_geo_transform(&image.geotransform)?;
    if !image.projection.is_empty() {
        ds.set_projection(&projection_to_wkt(&image.projection)?)?;
    }
    for (key, value) in metadata_items {
        ds.set_metadata_item(key, value, "")?;
    }

    for b in 0..bands {
        let mut band = ds.rasterband(b + 1)?;
        band.set_color_interpretation(ColorInterpretation::GrayIndex)?;
        band.set_no_data_value(no_data)?;
        let values: Vec<T> = image.band(b).iter().copied().collect();
        let mut buf = Buffer::new((cols, rows), values);
        band.write((0, 0), (cols, rows), &mut buf)?;
        debug!("Wrote band {}/{}", b + 1, bands);
    }
    Ok(ds)
}

/// Write `image` to `destination` with nodata 0 on every band. For file destinations
/// the returned handle must be dropped to flush and close the GeoTIFF.
pub fn write_raster<T: GdalType + Copy>(
    image: &RasterImage<T>,
    destination: &Destination,
    metadata_items: &BTreeMap<String, String>,
) -> Result<Dataset> {
    write_raster_with_nodata(image, destination, metadata_items, Some(NO_DATA_VALUE))
}

/// Like [`write_raster`], with an explicit nodata value. `None` leaves the bands
/// without nodata, for outputs where 0 is a valid value.
pub fn write_raster_with_nodata<T: GdalType + Copy>(
    image: &RasterImage<T>,
    destination: &Destination,
    metadata_items: &BTreeMap<String, String>,
    no_data: Option<f64>,
) -> Result<Dataset> {
    let (bands, rows, cols) = image.data.dim();
    info!(
        "Writing {} band(s) of {}x{} to {} (nodata {:?})",
        bands, cols, rows, destination, no_data
    );
    write_into(image, destination, metadata_items, no_data).map_err(|source| Error::Write {
        destination: destination.to_string(),
        source,
    })
}
