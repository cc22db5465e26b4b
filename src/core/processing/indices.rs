use ndarray::{Array3, ArrayView2, ArrayViewMut2, Axis, Zip};
use tracing::info;

use crate::error::{Error, Result};
use crate::types::RasterImage;

/// Input stack order: B02, B03, B04, B05, B06, B07, B08, B8A, B11, B12
pub const INDEX_INPUT_BANDS: usize = 10;

/// Normalized difference scaling so results fit Int16
pub const INDEX_SCALE: f32 = 10000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDefinition {
    pub name: &'static str,
    /// 1-based stack numbers of the `(a - b) / (a + b)` operands
    pub a: usize,
    pub b: usize,
}

pub const INDEX_DEFINITIONS: [IndexDefinition; 8] = [
    IndexDefinition { name: "NDVI B8/B4", a: 7, b: 3 },
    IndexDefinition { name: "NDVI B8A/B4", a: 8, b: 3 },
    IndexDefinition { name: "RE-NDI B8A/B5", a: 8, b: 4 },
    IndexDefinition { name: "RE-NDI B8A/B6", a: 8, b: 5 },
    IndexDefinition { name: "RE-NDI B6/B5", a: 5, b: 4 },
    IndexDefinition { name: "RE-NDI B7/B5", a: 6, b: 4 },
    IndexDefinition { name: "NDII B8A/B11", a: 8, b: 9 },
    IndexDefinition { name: "NDMI B8A/B12", a: 8, b: 10 },
];

/// `(a - b) / (a + b) * 10000` rounded to i16; zero where `a + b == 0`
pub fn normalized_difference<A, B>(
    a: ArrayView2<'_, A>,
    b: ArrayView2<'_, B>,
    out: &mut ArrayViewMut2<'_, i16>,
) where
    A: Copy + Into<f32>,
    B: Copy + Into<f32>,
{
    Zip::from(out).and(&a).and(&b).for_each(|res, &a_val, &b_val| {
        let (a_val, b_val): (f32, f32) = (a_val.into(), b_val.into());
        let sum = a_val + b_val;
        *res = if sum.abs() > f32::EPSILON {
            ((a_val - b_val) / sum * INDEX_SCALE).round() as i16
        } else {
            0
        };
    });
}

/// The eight spectral indices as an 8-band Int16 raster on the input grid
pub fn compute_indices<T>(image: &RasterImage<T>) -> Result<RasterImage<i16>>
where
    T: Copy + Into<f32>,
{
    if image.band_count() < INDEX_INPUT_BANDS {
        return Err(Error::UnsupportedBandCount {
            operation: "indices",
            required: INDEX_INPUT_BANDS,
            available: image.band_count(),
        });
    }
    let mut out = Array3::<i16>::zeros((INDEX_DEFINITIONS.len(), image.rows(), image.cols()));
    for (def, mut dst) in INDEX_DEFINITIONS.iter().zip(out.axis_iter_mut(Axis(0))) {
        normalized_difference(image.band(def.a - 1), image.band(def.b - 1), &mut dst);
    }
    info!(
        "Computed {} indices on {}x{} grid",
        INDEX_DEFINITIONS.len(),
        image.cols(),
        image.rows()
    );
    Ok(RasterImage::new(out, image.geotransform, image.projection.clone()))
}
