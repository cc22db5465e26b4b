use gdal::Dataset;
use gdal::errors::GdalError as GdalCrateError;
use gdal::raster::{GdalType, ResampleAlg};
use gdal::spatial_ref::SpatialRef;
use ndarray::{Array2, Array3};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::types::{GeoTransform, RasterImage};

/// Errors encountered when using the GDAL reader
#[derive(Debug, Error)]
pub enum GdalError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalCrateError),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Element count mismatch: expected {expected} values, got {got}")]
    ElementCount { expected: usize, got: usize },
}

/// Size and georeferencing of a GDAL-supported dataset
#[derive(Debug, Clone)]
pub struct GdalMetadata {
    /// Width (pixels) of the raster
    pub size_x: usize,
    /// Height (lines) of the raster
    pub size_y: usize,
    /// Number of raster bands
    pub bands: usize,
    pub geotransform: GeoTransform,
    /// Projection as reported by GDAL (WKT)
    pub projection: String,
    /// Nodata value of band 1, if any
    pub no_data: Option<f64>,
}

/// Reader for band-stacked rasters and single-band JP2 granule files via GDAL
pub struct RasterReader {
    pub dataset: Dataset,
    pub metadata: GdalMetadata,
}

/// Extract "EPSG:xxxx" from a WKT authority tag
pub fn parse_epsg(wkt: &str) -> Option<String> {
    const KEY: &str = "AUTHORITY[\"EPSG\",\"";
    // WKT2 uses ID["EPSG",32632]
    const KEY_WKT2: &str = "ID[\"EPSG\",";
    if let Some(idx) = wkt.rfind(KEY) {
        let start = idx + KEY.len();
        if let Some(end) = wkt[start..].find('"') {
            return Some(format!("EPSG:{}", &wkt[start..start + end]));
        }
    }
    if let Some(idx) = wkt.rfind(KEY_WKT2) {
        let start = idx + KEY_WKT2.len();
        if let Some(end) = wkt[start..].find(']') {
            return Some(format!("EPSG:{}", wkt[start..start + end].trim()));
        }
    }
    None
}

/// Turn "EPSG:xxxx" into WKT; anything else is passed through as-is
pub fn projection_to_wkt(projection: &str) -> Result<String, GdalError> {
    match projection.trim().strip_prefix("EPSG:") {
        Some(code) => {
            let code: u32 = code
                .parse()
                .map_err(|_| GdalError::UnsupportedFormat(format!("Bad EPSG code: {}", projection)))?;
            Ok(SpatialRef::from_epsg(code)?.to_wkt()?)
        }
        None => Ok(projection.to_string()),
    }
}

impl RasterReader {
    /// Open a GDAL-supported dataset (GeoTIFF, JPEG2000, ...)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GdalError> {
        let dataset = Dataset::open(path.as_ref())?;
        let (size_x, size_y) = dataset.raster_size();
        let bands = dataset.raster_count() as usize;
        if bands == 0 {
            return Err(GdalError::UnsupportedFormat("No raster bands found".into()));
        }
        let geotransform = match dataset.geo_transform() {
            Ok(gt) => gt,
            Err(_) => [0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        };
        let projection = dataset.projection();
        let no_data = dataset.rasterband(1)?.no_data_value();
        info!(
            "Opened {:?}: {}x{} pixels, {} band(s), crs {}",
            path.as_ref(),
            size_x,
            size_y,
            bands,
            parse_epsg(&projection).unwrap_or_else(|| "unknown".to_string())
        );
        Ok(RasterReader {
            dataset,
            metadata: GdalMetadata {
                size_x: size_x as usize,
                size_y: size_y as usize,
                bands,
                geotransform,
                projection,
                no_data,
            },
        })
    }

    /// Read a single band (1-based index) as an ndarray of shape (height, width)
    pub fn read_band<T: GdalType + Copy>(&self, index: usize) -> Result<Array2<T>, GdalError> {
        if index == 0 || index > self.metadata.bands {
            return Err(GdalError::UnsupportedFormat(format!(
                "Band index {} out of range",
                index
            )));
        }
        let band = self.dataset.rasterband(index)?;
        let window = (self.metadata.size_x, self.metadata.size_y);
        let buf = band.read_as::<T>(
            (0, 0),
            window,
            window,
            Some(ResampleAlg::NearestNeighbour),
        )?;
        let data_vec = buf.data().to_vec();
        let got = data_vec.len();
        Array2::from_shape_vec((self.metadata.size_y, self.metadata.size_x), data_vec).map_err(
            |_| GdalError::ElementCount {
                expected: self.metadata.size_x * self.metadata.size_y,
                got,
            },
        )
    }

    pub fn read_band_u16(&self, index: usize) -> Result<Array2<u16>, GdalError> {
        self.read_band::<u16>(index)
    }

    /// Read all bands into one `[band, row, col]` image
    pub fn read_image<T: GdalType + Copy>(&self) -> Result<RasterImage<T>, GdalError> {
        let (rows, cols) = (self.metadata.size_y, self.metadata.size_x);
        let mut data = Vec::with_capacity(self.metadata.bands * rows * cols);
        for idx in 1..=self.metadata.bands {
            debug!("Reading band {}/{}", idx, self.metadata.bands);
            data.extend(self.read_band::<T>(idx)?.iter().copied());
        }
        let got = data.len();
        let data = Array3::from_shape_vec((self.metadata.bands, rows, cols), data)
            .map_err(|_| GdalError::ElementCount {
                expected: self.metadata.bands * rows * cols,
                got,
            })?;
        Ok(RasterImage::new(
            data,
            self.metadata.geotransform,
            self.metadata.projection.clone(),
        ))
    }

    pub fn read_u16(&self) -> Result<RasterImage<u16>, GdalError> {
        self.read_image::<u16>()
    }

    pub fn read_f32(&self) -> Result<RasterImage<f32>, GdalError> {
        self.read_image::<f32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_epsg_wkt1_and_wkt2() {
        let wkt1 = r#"PROJCS["WGS 84 / UTM zone 32N",GEOGCS["WGS 84"],AUTHORITY["EPSG","32632"]]"#;
        assert_eq!(parse_epsg(wkt1).as_deref(), Some("EPSG:32632"));
        let wkt2 = r#"PROJCRS["WGS 84 / UTM zone 33N",ID["EPSG",32633]]"#;
        assert_eq!(parse_epsg(wkt2).as_deref(), Some("EPSG:32633"));
        assert_eq!(parse_epsg("LOCAL_CS[\"x\"]"), None);
    }

    #[test]
    fn test_element_count_message() {
        let err = GdalError::ElementCount { expected: 120, got: 96 };
        assert_eq!(err.to_string(), "Element count mismatch: expected 120 values, got 96");
    }

    #[test]
    fn test_projection_passthrough() {
        let wkt = "LOCAL_CS[\"arbitrary\"]";
        assert_eq!(projection_to_wkt(wkt).unwrap(), wkt);
        assert!(projection_to_wkt("EPSG:abc").is_err());
    }
}
