//! Shared types and enums used across s2dos.
//! Includes `CorrectionMethod`, `DarkObjectPolicy`, `Resolution`, the Sentinel-2
//! `Band` catalogue and the owned `RasterImage` working buffer.
use std::str::FromStr;

use ndarray::{Array3, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Affine coefficients ([origin_x, pixel_width, rot_x, origin_y, rot_y, pixel_height])
pub type GeoTransform = [f64; 6];

/// Output of the atmospheric correction step
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum CorrectionMethod {
    /// Dark Object Subtraction on top-of-atmosphere reflectance DN
    #[serde(rename = "DOS")]
    Dos,
    /// Top-of-atmosphere reflectance (no offset removed)
    #[serde(rename = "TOA")]
    Toa,
    /// Top-of-atmosphere radiance
    #[serde(rename = "RAD")]
    Rad,
}

impl std::fmt::Display for CorrectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorrectionMethod::Dos => write!(f, "DOS"),
            CorrectionMethod::Toa => write!(f, "TOA"),
            CorrectionMethod::Rad => write!(f, "RAD"),
        }
    }
}

impl FromStr for CorrectionMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DOS" => Ok(CorrectionMethod::Dos),
            "TOA" => Ok(CorrectionMethod::Toa),
            "RAD" => Ok(CorrectionMethod::Rad),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }
}

/// What to do when a band has no detectable dark object
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum DarkObjectPolicy {
    /// Abort the correction with `Error::DarkObjectNotFound`
    #[default]
    Fail,
    /// Use an offset of 0 for that band and log a warning
    ZeroFallback,
}

/// Sentinel-2 MSI ground sampling distances
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Resolution {
    R10,
    R20,
    R60,
}

impl Resolution {
    pub const ALL: [Resolution; 3] = [Resolution::R10, Resolution::R20, Resolution::R60];

    pub fn meters(self) -> u32 {
        match self {
            Resolution::R10 => 10,
            Resolution::R20 => 20,
            Resolution::R60 => 60,
        }
    }

    pub fn from_meters(meters: u32) -> Option<Self> {
        match meters {
            10 => Some(Resolution::R10),
            20 => Some(Resolution::R20),
            60 => Some(Resolution::R60),
            _ => None,
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}m", self.meters())
    }
}

impl FromStr for Resolution {
    type Err = Error;

    /// Accepts "10", "20", "60" with an optional trailing "m"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_suffix('m')
            .or_else(|| trimmed.strip_suffix('M'))
            .unwrap_or(trimmed);
        digits
            .parse::<u32>()
            .ok()
            .and_then(Resolution::from_meters)
            .ok_or_else(|| Error::InvalidArgument {
                arg: "resolution",
                value: s.to_string(),
            })
    }
}

/// Sentinel-2 MSI spectral bands in product order
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Band {
    B01,
    B02,
    B03,
    B04,
    B05,
    B06,
    B07,
    B08,
    B8A,
    B09,
    B10,
    B11,
    B12,
}

impl Band {
    pub const ALL: [Band; 13] = [
        Band::B01,
        Band::B02,
        Band::B03,
        Band::B04,
        Band::B05,
        Band::B06,
        Band::B07,
        Band::B08,
        Band::B8A,
        Band::B09,
        Band::B10,
        Band::B11,
        Band::B12,
    ];

    /// The 9 visible/NIR bands needed for atmospheric correction (B01..B8A)
    pub fn visnir() -> Vec<Band> {
        Band::ALL[..9].to_vec()
    }

    /// File-name suffix used by the product, e.g. "B8A"
    pub fn name(self) -> &'static str {
        match self {
            Band::B01 => "B01",
            Band::B02 => "B02",
            Band::B03 => "B03",
            Band::B04 => "B04",
            Band::B05 => "B05",
            Band::B06 => "B06",
            Band::B07 => "B07",
            Band::B08 => "B08",
            Band::B8A => "B8A",
            Band::B09 => "B09",
            Band::B10 => "B10",
            Band::B11 => "B11",
            Band::B12 => "B12",
        }
    }

    pub fn native_resolution(self) -> Resolution {
        match self {
            Band::B02 | Band::B03 | Band::B04 | Band::B08 => Resolution::R10,
            Band::B05 | Band::B06 | Band::B07 | Band::B8A | Band::B11 | Band::B12 => {
                Resolution::R20
            }
            Band::B01 | Band::B09 | Band::B10 => Resolution::R60,
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Band {
    type Err = Error;

    /// Accepts "B8A", "b08", "B1", "8a"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let code = upper.strip_prefix('B').unwrap_or(&upper);
        let normalized = match code {
            "8A" => "B8A".to_string(),
            digits => match digits.parse::<u8>() {
                Ok(n) => format!("B{:02}", n),
                Err(_) => String::new(),
            },
        };
        Band::ALL
            .iter()
            .copied()
            .find(|b| b.name() == normalized)
            .ok_or_else(|| Error::InvalidArgument {
                arg: "band",
                value: s.to_string(),
            })
    }
}

/// Owned multi-band raster: `[band, row, col]` plus georeferencing
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage<T> {
    pub data: Array3<T>,
    pub geotransform: GeoTransform,
    /// WKT or "EPSG:xxxx"; empty when unknown
    pub projection: String,
}

impl<T> RasterImage<T> {
    pub fn new(data: Array3<T>, geotransform: GeoTransform, projection: impl Into<String>) -> Self {
        Self {
            data,
            geotransform,
            projection: projection.into(),
        }
    }

    pub fn band_count(&self) -> usize {
        self.data.dim().0
    }

    pub fn rows(&self) -> usize {
        self.data.dim().1
    }

    pub fn cols(&self) -> usize {
        self.data.dim().2
    }

    pub fn band(&self, index: usize) -> ArrayView2<'_, T> {
        self.data.index_axis(ndarray::Axis(0), index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_tags() {
        assert_eq!("DOS".parse::<CorrectionMethod>().unwrap(), CorrectionMethod::Dos);
        assert_eq!("toa".parse::<CorrectionMethod>().unwrap(), CorrectionMethod::Toa);
        assert_eq!(" RAD ".parse::<CorrectionMethod>().unwrap(), CorrectionMethod::Rad);
        let err = "XYZ".parse::<CorrectionMethod>().unwrap_err();
        assert!(matches!(err, Error::InvalidMethod(ref tag) if tag == "XYZ"));
    }

    #[test]
    fn test_band_names() {
        assert_eq!("B8A".parse::<Band>().unwrap(), Band::B8A);
        assert_eq!("b1".parse::<Band>().unwrap(), Band::B01);
        assert_eq!("12".parse::<Band>().unwrap(), Band::B12);
        assert!("B13".parse::<Band>().is_err());
        assert_eq!(Band::visnir().len(), 9);
        assert_eq!(Band::visnir()[8], Band::B8A);
        assert_eq!(Band::B05.native_resolution(), Resolution::R20);
    }

    #[test]
    fn test_resolution_parse() {
        assert_eq!("10m".parse::<Resolution>().unwrap(), Resolution::R10);
        assert_eq!("60".parse::<Resolution>().unwrap(), Resolution::R60);
        assert!("30m".parse::<Resolution>().is_err());
    }
}
