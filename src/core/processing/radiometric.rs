use std::f64::consts::PI;

use ndarray::{Array3, Axis, Zip};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::io::sentinel2::{MetadataRecord, VISNIR_BAND_COUNT};
use crate::types::RasterImage;

/// Subtract a per-band DN offset, clamping at zero.
///
/// The difference is taken in f64 and truncated back to u16. With all-zero
/// offsets this is the TOA reflectance output, so DOS and TOA share this path.
pub fn to_reflectance(mut image: RasterImage<u16>, offsets: &[u16]) -> Result<RasterImage<u16>> {
    if offsets.len() != image.band_count() {
        return Err(Error::InvalidArgument {
            arg: "offsets",
            value: format!(
                "{} offsets for {} bands",
                offsets.len(),
                image.band_count()
            ),
        });
    }
    for (mut band, &offset) in image.data.axis_iter_mut(Axis(0)).zip(offsets) {
        if offset == 0 {
            continue;
        }
        let offset = offset as f64;
        band.mapv_inplace(|dn| (dn as f64 - offset).max(0.0) as u16);
    }
    debug!("Applied offsets {:?}", offsets);
    Ok(image)
}

/// TOA radiance of the first nine bands from explicit irradiance and solar zenith:
/// `L = DN * E0 * cos(zenith) / PI`
pub fn radiance_from_irradiance(
    image: &RasterImage<u16>,
    irradiance: &[f64],
    sun_zenith_deg: f64,
) -> Result<RasterImage<f32>> {
    if image.band_count() < VISNIR_BAND_COUNT {
        return Err(Error::UnsupportedBandCount {
            operation: "RAD",
            required: VISNIR_BAND_COUNT,
            available: image.band_count(),
        });
    }
    if irradiance.len() < VISNIR_BAND_COUNT {
        return Err(Error::MissingIrradiance {
            band: irradiance.len(),
            available: irradiance.len(),
        });
    }

    let cos_zenith = (sun_zenith_deg * PI / 180.0).cos();
    let mut out = Array3::<f32>::zeros((VISNIR_BAND_COUNT, image.rows(), image.cols()));
    for (b, mut dst) in out.axis_iter_mut(Axis(0)).enumerate() {
        let factor = irradiance[b] * cos_zenith / PI;
        Zip::from(&mut dst)
            .and(&image.band(b))
            .for_each(|l, &dn| *l = (dn as f64 * factor) as f32);
    }
    info!(
        "Converted {} bands to radiance (sun zenith {:.3} deg)",
        VISNIR_BAND_COUNT, sun_zenith_deg
    );
    Ok(RasterImage::new(
        out,
        image.geotransform,
        image.projection.clone(),
    ))
}

pub fn to_radiance(image: &RasterImage<u16>, metadata: &MetadataRecord) -> Result<RasterImage<f32>> {
    radiance_from_irradiance(image, metadata.irradiance_values(), metadata.sun_zenith_deg())
}
