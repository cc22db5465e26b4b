use tracing::info;

use crate::core::processing::dark_object::estimate_offsets;
use crate::core::processing::radiometric::{to_radiance, to_reflectance};
use crate::error::Result;
use crate::io::sentinel2::MetadataRecord;
use crate::types::{CorrectionMethod, DarkObjectPolicy, RasterImage};

/// Result of the atmospheric correction
#[derive(Debug, Clone, PartialEq)]
pub enum CorrectedRaster {
    /// DOS or TOA output, raw DN scale
    Reflectance(RasterImage<u16>),
    /// TOA radiance of the first nine bands
    Radiance(RasterImage<f32>),
}

impl CorrectedRaster {
    pub fn band_count(&self) -> usize {
        match self {
            CorrectedRaster::Reflectance(img) => img.band_count(),
            CorrectedRaster::Radiance(img) => img.band_count(),
        }
    }
}

/// Run one correction method over a band-stacked DN raster
pub fn correct(
    image: RasterImage<u16>,
    metadata: &MetadataRecord,
    method: CorrectionMethod,
    policy: DarkObjectPolicy,
) -> Result<CorrectedRaster> {
    info!(
        "Atmospheric correction: method={}, {} band(s) of {}x{}",
        method,
        image.band_count(),
        image.cols(),
        image.rows()
    );
    match method {
        CorrectionMethod::Dos | CorrectionMethod::Toa => {
            let do_dos = method == CorrectionMethod::Dos;
            let offsets = if do_dos {
                estimate_offsets(&image, policy)?
            } else {
                vec![0; image.band_count()]
            };
            Ok(CorrectedRaster::Reflectance(to_reflectance(image, &offsets)?))
        }
        CorrectionMethod::Rad => Ok(CorrectedRaster::Radiance(to_radiance(&image, metadata)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::io::sentinel2::fixtures::{IRRADIANCE, product_xml, tile_xml};
    use crate::io::sentinel2::{ProductMetadata, TileMetadata};
    use ndarray::Array3;

    fn record(zenith: f64) -> MetadataRecord {
        MetadataRecord::new(
            ProductMetadata::from_xml(&product_xml(&IRRADIANCE)).unwrap(),
            TileMetadata::from_xml(&tile_xml(zenith, 0.0)).unwrap(),
        )
        .unwrap()
    }

    fn image(bands: usize) -> RasterImage<u16> {
        let mut data = Array3::<u16>::zeros((bands, 6, 6));
        data.iter_mut()
            .enumerate()
            .for_each(|(i, v)| *v = 100 + (i % 50) as u16);
        RasterImage::new(data, [0.0, 10.0, 0.0, 60.0, 0.0, -10.0], "EPSG:32632")
    }

    #[test]
    fn test_toa_is_identity_on_dn() {
        let img = image(9);
        match correct(img.clone(), &record(30.0), CorrectionMethod::Toa, DarkObjectPolicy::Fail).unwrap() {
            CorrectedRaster::Reflectance(out) => assert_eq!(out, img),
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn test_dos_removes_dark_object() {
        let img = image(4);
        let out = correct(img, &record(30.0), CorrectionMethod::Dos, DarkObjectPolicy::Fail).unwrap();
        let CorrectedRaster::Reflectance(out) = out else {
            panic!("expected reflectance");
        };
        // Darkest DN is 100 (bin 99), so the offset is 98
        assert_eq!(out.data[[0, 0, 0]], 2);
        assert_eq!(out.band_count(), 4);
    }

    #[test]
    fn test_rad_dispatch() {
        let out = correct(image(13), &record(0.0), CorrectionMethod::Rad, DarkObjectPolicy::Fail).unwrap();
        assert!(matches!(out, CorrectedRaster::Radiance(_)));
        assert_eq!(out.band_count(), 9);

        let err = correct(image(3), &record(0.0), CorrectionMethod::Rad, DarkObjectPolicy::Fail).unwrap_err();
        assert!(matches!(err, Error::UnsupportedBandCount { .. }));
    }
}
