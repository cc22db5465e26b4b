use fast_image_resize::{PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use ndarray::Array2;
use tracing::debug;

use crate::error::{Error, Result};

/// Nearest-neighbour zoom of a u16 band to exactly `target_rows` x `target_cols`
pub fn zoom_nearest_u16(band: &Array2<u16>, target_rows: usize, target_cols: usize) -> Result<Array2<u16>> {
    let (rows, cols) = band.dim();
    if (rows, cols) == (target_rows, target_cols) {
        return Ok(band.clone());
    }
    if rows == 0 || cols == 0 || target_rows == 0 || target_cols == 0 {
        return Err(Error::InvalidArgument {
            arg: "zoom",
            value: format!("{}x{} -> {}x{}", cols, rows, target_cols, target_rows),
        });
    }
    debug!("Zooming {}x{} -> {}x{} (nearest)", cols, rows, target_cols, target_rows);

    let resize_options = ResizeOptions::new().resize_alg(ResizeAlg::Nearest);
    let mut resizer = Resizer::new();

    // fast_image_resize takes u16 pixels as little-endian bytes
    let mut src_bytes = Vec::with_capacity(rows * cols * 2);
    for &v in band.iter() {
        src_bytes.extend_from_slice(&v.to_le_bytes());
    }

    let src_image = Image::from_vec_u8(cols as u32, rows as u32, src_bytes, PixelType::U16)
        .map_err(Error::external)?;
    let mut dst_image = Image::new(target_cols as u32, target_rows as u32, PixelType::U16);
    resizer
        .resize(&src_image, &mut dst_image, &resize_options)
        .map_err(Error::external)?;

    let out: Vec<u16> = dst_image
        .into_vec()
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .collect();
    Array2::from_shape_vec((target_rows, target_cols), out)
        .map_err(|e| Error::Processing(format!("Zoomed band has unexpected shape: {}", e)))
}
