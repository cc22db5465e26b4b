use ndarray::ArrayView2;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::types::{DarkObjectPolicy, RasterImage};

/// Histogram covers DN 1..=2048; bin `k` counts DN `k + 1`
pub const HISTOGRAM_BINS: usize = 2048;

/// Share of the non-zero population a bin-to-bin increase must exceed
pub const TAIL_FRACTION: f64 = 1.0 - 0.999999;

/// Counts of DN 1..=2048 plus the total number of non-zero pixels
fn dark_histogram(band: ArrayView2<'_, u16>) -> (Vec<u64>, u64) {
    let mut hist = vec![0u64; HISTOGRAM_BINS];
    let mut nonzero: u64 = 0;
    for &dn in band.iter() {
        if dn == 0 {
            continue;
        }
        nonzero += 1;
        let bin = dn as usize - 1;
        if bin < HISTOGRAM_BINS {
            hist[bin] += 1;
        }
    }
    (hist, nonzero)
}

fn first_step(hist: &[u64], threshold: f64) -> Option<usize> {
    hist.windows(2)
        .position(|pair| pair[1] as f64 - pair[0] as f64 > threshold)
}

/// Dark object offset of one band: the histogram bin immediately preceding the
/// first bin-to-bin increase above `nonzero * TAIL_FRACTION`.
///
/// Zero pixels are treated as nodata. `band_index` only labels the error.
pub fn estimate_band_offset(band: ArrayView2<'_, u16>, band_index: usize) -> Result<u16> {
    let (hist, nonzero) = dark_histogram(band);
    let threshold = nonzero as f64 * TAIL_FRACTION;
    match first_step(&hist, threshold) {
        Some(bin) => {
            debug!(
                "Band {}: dark object at bin {} (threshold {:.4}, {} valid pixels)",
                band_index, bin, threshold, nonzero
            );
            Ok(bin as u16)
        }
        None => Err(Error::DarkObjectNotFound {
            band: band_index,
            threshold,
        }),
    }
}

pub fn estimate_dark_object(band: ArrayView2<'_, u16>) -> Result<u16> {
    estimate_band_offset(band, 0)
}

/// One offset per band, each band estimated independently
pub fn estimate_offsets(image: &RasterImage<u16>, policy: DarkObjectPolicy) -> Result<Vec<u16>> {
    let mut offsets = Vec::with_capacity(image.band_count());
    for b in 0..image.band_count() {
        let offset = match estimate_band_offset(image.band(b), b) {
            Ok(offset) => offset,
            Err(Error::DarkObjectNotFound { band, threshold })
                if policy == DarkObjectPolicy::ZeroFallback =>
            {
                warn!(
                    "No dark object in band {} (threshold {:.4}); using offset 0",
                    band, threshold
                );
                0
            }
            Err(e) => return Err(e),
        };
        offsets.push(offset);
    }
    info!("Dark object offsets: {:?}", offsets);
    Ok(offsets)
}
