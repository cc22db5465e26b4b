use serde::{Deserialize, Serialize};

use crate::types::{Band, CorrectionMethod, DarkObjectPolicy, Resolution};

/// Atmospheric correction parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionParams {
    pub method: CorrectionMethod,
    pub dark_object_policy: DarkObjectPolicy,
}

impl Default for CorrectionParams {
    fn default() -> Self {
        Self {
            method: CorrectionMethod::Dos,
            dark_object_policy: DarkObjectPolicy::Fail,
        }
    }
}

/// Band export parameters suitable for JSON config files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportParams {
    pub bands: Vec<Band>,
    /// Output grid; every band is zoomed to it
    pub resolution: Resolution,
    /// MGRS tile codes, e.g. "32UNG"; empty means all tiles
    pub granules: Vec<String>,
    /// Skip tiles whose cloudy pixel percentage exceeds this
    pub max_cloud_cover: f64,
    /// Skip tiles whose B01 non-zero share (percent) is below this
    pub min_data_cover: f64,
}

impl Default for ExportParams {
    fn default() -> Self {
        Self {
            bands: Band::visnir(),
            resolution: Resolution::R10,
            granules: Vec::new(),
            max_cloud_cover: 100.0,
            min_data_cover: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_params_from_partial_json() {
        let params: ExportParams =
            serde_json::from_str(r#"{"bands": ["B04", "B8A"], "resolution": "R20", "max_cloud_cover": 30}"#)
                .unwrap();
        assert_eq!(params.bands, vec![Band::B04, Band::B8A]);
        assert_eq!(params.resolution, Resolution::R20);
        assert_eq!(params.max_cloud_cover, 30.0);
        assert!(params.granules.is_empty());
        assert_eq!(params.min_data_cover, 0.0);
    }

    #[test]
    fn test_correction_params_roundtrip_tags() {
        let params: CorrectionParams = serde_json::from_str(r#"{"method": "RAD"}"#).unwrap();
        assert_eq!(params.method, CorrectionMethod::Rad);
        assert_eq!(params.dark_object_policy, DarkObjectPolicy::Fail);
    }
}
