use std::collections::BTreeMap;

use crate::io::sentinel2::MetadataRecord;
use crate::types::CorrectionMethod;

/// Collect provenance and radiometric parameters as GeoTIFF metadata items
pub fn extract_metadata_fields(
    meta: &MetadataRecord,
    method: Option<CorrectionMethod>,
) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();

    if let Some(uri) = &meta.product.product_uri {
        metadata.insert("PRODUCT_URI".to_string(), uri.clone());
    }
    if let Some(spacecraft) = &meta.product.spacecraft {
        metadata.insert("SPACECRAFT".to_string(), spacecraft.clone());
    }
    if let Some(start) = &meta.product.product_start_time {
        metadata.insert("PRODUCT_START_TIME".to_string(), start.clone());
    }
    if let Some(baseline) = &meta.product.processing_baseline {
        metadata.insert("PROCESSING_BASELINE".to_string(), baseline.clone());
    }
    metadata.insert("TILE_ID".to_string(), meta.tile.tile_id.clone());
    if let Some(sensing) = &meta.tile.sensing_time {
        metadata.insert("SENSING_TIME".to_string(), sensing.clone());
    }
    metadata.insert(
        "SUN_ZENITH_ANGLE".to_string(),
        meta.tile.sun_zenith_deg.to_string(),
    );
    metadata.insert(
        "SUN_AZIMUTH_ANGLE".to_string(),
        meta.tile.sun_azimuth_deg.to_string(),
    );
    metadata.insert(
        "QUANTIFICATION_VALUE".to_string(),
        meta.product.quantification_value.to_string(),
    );
    metadata.insert(
        "REFLECTANCE_CONVERSION_U".to_string(),
        meta.product.reflectance_conversion_u.to_string(),
    );
    if let Some(cloudy) = meta.tile.cloudy_pixel_percentage {
        metadata.insert("CLOUDY_PIXEL_PERCENTAGE".to_string(), cloudy.to_string());
    }
    if let Some(method) = method {
        metadata.insert("CORRECTION_METHOD".to_string(), method.to_string());
    }

    metadata.extend(provenance_fields());
    metadata
}

/// Tool name, version and timestamp stamped on every output
pub fn provenance_fields() -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    metadata.insert("CONVERSION_TOOL".to_string(), "s2dos".to_string());
    metadata.insert(
        "CONVERSION_VERSION".to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    metadata.insert(
        "CONVERSION_TIMESTAMP".to_string(),
        chrono::Utc::now().to_rfc3339(),
    );
    metadata
}
