use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::io::xml::{XmlDocument, parse_value};
use crate::types::{GeoTransform, Resolution};

/// Number of visible/NIR bands the radiometric conversion touches (B01..B8A)
pub const VISNIR_BAND_COUNT: usize = 9;

/// Errors encountered when reading Sentinel-2 L1C metadata
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Missing field `{0}` in Sentinel-2 metadata")]
    MissingField(String),
    #[error("Malformed value `{value}` for field `{field}`")]
    InvalidValue { field: String, value: String },
    #[error("Expected exactly one tile metadata file under {dir:?}, found {found}")]
    TileMetadataNotFound { dir: PathBuf, found: usize },
    #[error("Expected exactly one product metadata file in {dir:?}, found {found}")]
    ProductMetadataNotFound { dir: PathBuf, found: usize },
}

/// Rows, columns and upper-left corner of one tile grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridExtent {
    pub rows: usize,
    pub cols: usize,
    pub upper_left_x: f64,
    pub upper_left_y: f64,
}

/// Product-level radiometric parameters (`MTD_MSIL1C.xml`)
#[derive(Debug, Clone, PartialEq)]
pub struct ProductMetadata {
    pub product_uri: Option<String>,
    pub spacecraft: Option<String>,
    pub product_start_time: Option<String>,
    pub processing_baseline: Option<String>,
    pub quantification_value: f64,
    pub reflectance_conversion_u: f64,
    /// Solar irradiance per band (W/m²/µm), ordered by `bandId`
    pub irradiance_values: Vec<f64>,
    pub cloud_coverage: Option<f64>,
}

/// Tile-level geometry (`GRANULE/<tile>/MTD_TL.xml`)
#[derive(Debug, Clone, PartialEq)]
pub struct TileMetadata {
    pub tile_id: String,
    pub sensing_time: Option<String>,
    pub epsg_code: u32,
    pub sun_zenith_deg: f64,
    pub sun_azimuth_deg: f64,
    pub cloudy_pixel_percentage: Option<f64>,
    pub grids: BTreeMap<Resolution, GridExtent>,
}

/// Immutable radiometric/geometric parameters of one tile
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    pub product: ProductMetadata,
    pub tile: TileMetadata,
}

const PRODUCT_INFO: &str = "General_Info/Product_Info";
const IMAGE_CHARACTERISTICS: &str = "General_Info/Product_Image_Characteristics";

impl ProductMetadata {
    pub fn from_file(path: &Path) -> Result<Self, MetadataError> {
        info!("Parsing product metadata: {:?}", path);
        Self::from_xml(&fs::read_to_string(path)?)
    }

    pub fn from_xml(xml: &str) -> Result<Self, MetadataError> {
        let doc = XmlDocument::parse(xml)?;

        let quantification_value =
            doc.required(&format!("{}/QUANTIFICATION_VALUE", IMAGE_CHARACTERISTICS))?;
        let reflectance_conversion_u =
            doc.required(&format!("{}/Reflectance_Conversion/U", IMAGE_CHARACTERISTICS))?;

        let irradiance_path = format!(
            "{}/Reflectance_Conversion/Solar_Irradiance_List/SOLAR_IRRADIANCE",
            IMAGE_CHARACTERISTICS
        );
        let mut irradiance: Vec<(usize, f64)> = Vec::new();
        for leaf in doc.leaves(&irradiance_path) {
            let band_id = leaf
                .attribute("bandId")
                .ok_or_else(|| MetadataError::MissingField(format!("{}@bandId", irradiance_path)))?;
            irradiance.push((
                parse_value(&format!("{}@bandId", irradiance_path), band_id)?,
                parse_value(&irradiance_path, &leaf.text)?,
            ));
        }
        irradiance.sort_by_key(|(band_id, _)| *band_id);
        // Band ids must run 0..n without gaps, otherwise positions shift
        if let Some((pos, (band_id, _))) = irradiance
            .iter()
            .enumerate()
            .find(|(pos, (band_id, _))| pos != band_id)
        {
            return Err(MetadataError::InvalidValue {
                field: format!("{}@bandId", irradiance_path),
                value: format!("{} at position {}", band_id, pos),
            });
        }
        if irradiance.len() < VISNIR_BAND_COUNT {
            return Err(MetadataError::MissingField(format!(
                "{}[bandId={}]",
                irradiance_path,
                irradiance.len()
            )));
        }
        let irradiance_values: Vec<f64> = irradiance.into_iter().map(|(_, v)| v).collect();
        debug!("Solar irradiance values: {:?}", irradiance_values);

        Ok(Self {
            product_uri: doc
                .text(&format!("{}/PRODUCT_URI", PRODUCT_INFO))
                .map(str::to_string),
            spacecraft: doc
                .text(&format!("{}/Datatake/SPACECRAFT_NAME", PRODUCT_INFO))
                .map(str::to_string),
            product_start_time: doc
                .text(&format!("{}/PRODUCT_START_TIME", PRODUCT_INFO))
                .map(str::to_string),
            processing_baseline: doc
                .text(&format!("{}/PROCESSING_BASELINE", PRODUCT_INFO))
                .map(str::to_string),
            quantification_value,
            reflectance_conversion_u,
            irradiance_values,
            cloud_coverage: doc.optional("Quality_Indicators_Info/Cloud_Coverage_Assessment")?,
        })
    }
}

impl TileMetadata {
    pub fn from_file(path: &Path) -> Result<Self, MetadataError> {
        info!("Parsing tile metadata: {:?}", path);
        Self::from_xml(&fs::read_to_string(path)?)
    }

    pub fn from_xml(xml: &str) -> Result<Self, MetadataError> {
        let doc = XmlDocument::parse(xml)?;

        let cs_path = "Geometric_Info/Tile_Geocoding/HORIZONTAL_CS_CODE";
        let cs_code = doc.required_text(cs_path)?;
        let epsg_code = parse_value(
            cs_path,
            cs_code
                .trim()
                .strip_prefix("EPSG:")
                .ok_or_else(|| MetadataError::InvalidValue {
                    field: cs_path.to_string(),
                    value: cs_code.to_string(),
                })?,
        )?;

        let mut grids = BTreeMap::new();
        for resolution in Resolution::ALL {
            let res = resolution.meters().to_string();
            let field = |name: &str| -> Result<String, MetadataError> {
                doc.leaf_with_attribute(name, "resolution", &res)
                    .map(|leaf| leaf.text.clone())
                    .ok_or_else(|| {
                        MetadataError::MissingField(format!("{}[@resolution={}]", name, res))
                    })
            };
            let rows_path = "Tile_Geocoding/Size/NROWS";
            let cols_path = "Tile_Geocoding/Size/NCOLS";
            let ulx_path = "Tile_Geocoding/Geoposition/ULX";
            let uly_path = "Tile_Geocoding/Geoposition/ULY";
            grids.insert(
                resolution,
                GridExtent {
                    rows: parse_value(rows_path, &field(rows_path)?)?,
                    cols: parse_value(cols_path, &field(cols_path)?)?,
                    upper_left_x: parse_value(ulx_path, &field(ulx_path)?)?,
                    upper_left_y: parse_value(uly_path, &field(uly_path)?)?,
                },
            );
        }

        Ok(Self {
            tile_id: doc.required_text("General_Info/TILE_ID")?.to_string(),
            sensing_time: doc.text("General_Info/SENSING_TIME").map(str::to_string),
            epsg_code,
            sun_zenith_deg: doc.required("Tile_Angles/Mean_Sun_Angle/ZENITH_ANGLE")?,
            sun_azimuth_deg: doc.required("Tile_Angles/Mean_Sun_Angle/AZIMUTH_ANGLE")?,
            cloudy_pixel_percentage: doc
                .optional("Quality_Indicators_Info/Image_Content_QI/CLOUDY_PIXEL_PERCENTAGE")?,
            grids,
        })
    }

    pub fn grid(&self, resolution: Resolution) -> Result<GridExtent, MetadataError> {
        self.grids.get(&resolution).copied().ok_or_else(|| {
            MetadataError::MissingField(format!("Tile_Geocoding/Size[@resolution={}]", resolution.meters()))
        })
    }

    /// North-up geotransform of the tile grid at `resolution`
    pub fn geotransform(&self, resolution: Resolution) -> Result<GeoTransform, MetadataError> {
        let grid = self.grid(resolution)?;
        let res = resolution.meters() as f64;
        Ok([grid.upper_left_x, res, 0.0, grid.upper_left_y, 0.0, -res])
    }

    pub fn crs(&self) -> String {
        format!("EPSG:{}", self.epsg_code)
    }

    /// MGRS code of the tile, e.g. "32UNG"
    pub fn tile_code(&self) -> Option<String> {
        tile_code(&self.tile_id)
    }
}

impl MetadataRecord {
    pub fn new(product: ProductMetadata, tile: TileMetadata) -> Result<Self, MetadataError> {
        if product.irradiance_values.len() < VISNIR_BAND_COUNT {
            return Err(MetadataError::MissingField(format!(
                "SOLAR_IRRADIANCE[bandId={}]",
                product.irradiance_values.len()
            )));
        }
        Ok(Self { product, tile })
    }

    /// Parse the main metadata file and the single tile metadata file below it
    pub fn from_product_xml(path: &Path) -> Result<Self, MetadataError> {
        let product = ProductMetadata::from_file(path)?;
        let product_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let tile_path = resolve_tile_metadata(product_dir)?;
        let tile = TileMetadata::from_file(&tile_path)?;
        Self::new(product, tile)
    }

    pub fn irradiance_values(&self) -> &[f64] {
        &self.product.irradiance_values
    }

    pub fn sun_zenith_deg(&self) -> f64 {
        self.tile.sun_zenith_deg
    }

    pub fn quantification_value(&self) -> f64 {
        self.product.quantification_value
    }

    pub fn reflectance_conversion_u(&self) -> f64 {
        self.product.reflectance_conversion_u
    }

    pub fn geotransform(&self, resolution: Resolution) -> Result<GeoTransform, MetadataError> {
        self.tile.geotransform(resolution)
    }

    pub fn crs(&self) -> String {
        self.tile.crs()
    }
}

/// Extract an MGRS tile code ("32UNG") from a granule or tile identifier.
/// Matches both `L1C_T32UNG_A...` and `..._T32UNG_N02.01` naming.
pub fn tile_code(name: &str) -> Option<String> {
    name.split('_').find_map(|segment| {
        let code = segment.strip_prefix('T')?;
        let bytes = code.as_bytes();
        let well_formed = bytes.len() == 5
            && bytes[..2].iter().all(u8::is_ascii_digit)
            && bytes[2..].iter().all(u8::is_ascii_uppercase);
        well_formed.then(|| code.to_string())
    })
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, MetadataError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        entries.push(entry?.path());
    }
    entries.sort();
    Ok(entries)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn is_tile_metadata_name(name: &str) -> bool {
    name == "MTD_TL.xml" || (name.ends_with(".xml") && name.contains("MTD") && name.contains("_TL_"))
}

fn is_product_metadata_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    name == "MTD_MSIL1C.xml"
        || (name.starts_with("S2") && bytes.len() > 4 && bytes[3] == b'_' && name.ends_with(".xml"))
}

/// Tile metadata candidates inside one granule directory
pub fn tile_metadata_candidates(granule_dir: &Path) -> Result<Vec<PathBuf>, MetadataError> {
    Ok(sorted_entries(granule_dir)?
        .into_iter()
        .filter(|p| p.is_file() && is_tile_metadata_name(&file_name(p)))
        .collect())
}

/// The single tile metadata file of a granule directory
pub fn find_tile_metadata(granule_dir: &Path) -> Result<PathBuf, MetadataError> {
    let mut candidates = tile_metadata_candidates(granule_dir)?;
    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        found => Err(MetadataError::TileMetadataNotFound {
            dir: granule_dir.to_path_buf(),
            found,
        }),
    }
}

/// Locate `GRANULE/<tile>/MTD_TL.xml` relative to the product directory; exactly one
/// candidate across all granules must exist
pub fn resolve_tile_metadata(product_dir: &Path) -> Result<PathBuf, MetadataError> {
    let granule_root = product_dir.join("GRANULE");
    let mut candidates = Vec::new();
    if granule_root.is_dir() {
        for granule in sorted_entries(&granule_root)? {
            if granule.is_dir() {
                candidates.extend(tile_metadata_candidates(&granule)?);
            }
        }
    }
    debug!("Tile metadata candidates: {:?}", candidates);
    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        found => Err(MetadataError::TileMetadataNotFound {
            dir: granule_root,
            found,
        }),
    }
}

/// Locate the product metadata (`MTD_MSIL1C.xml` or legacy `S2?_*.xml`) in a SAFE directory
pub fn find_product_metadata(product_dir: &Path) -> Result<PathBuf, MetadataError> {
    let mut candidates: Vec<PathBuf> = sorted_entries(product_dir)?
        .into_iter()
        .filter(|p| p.is_file() && is_product_metadata_name(&file_name(p)))
        .collect();
    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        found => Err(MetadataError::ProductMetadataNotFound {
            dir: product_dir.to_path_buf(),
            found,
        }),
    }
}
