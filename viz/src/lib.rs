//! Display helpers for point spread function images.
//!
//! A PSF spans many decades of intensity, so everything here works on a
//! logarithmically stretched copy of the data: the bright core and the faint
//! diffraction rings become visible in the same rendering. Output targets
//! are 8-bit grayscale PNG files and ASCII previews for terminals and logs.

use image::{GrayImage, Luma};
use ndarray::Array2;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VizError {
    #[error("image has no finite, positive pixels to display")]
    EmptyImage,

    #[error("failed to write image: {0}")]
    Write(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, VizError>;

/// Ramp of display characters from dark to bright.
const ASCII_RAMP: &[u8] = b" .:-=+*#%@";

/// Map intensities onto `[0, 1]` with a logarithmic stretch.
///
/// `decades` sets the dynamic range: the peak maps to 1 and anything
/// `10^decades` below it (or non-positive) maps to 0.
pub fn log_stretch(data: &Array2<f64>, decades: f64) -> Result<Array2<f64>> {
    let peak = data
        .iter()
        .cloned()
        .filter(|v| v.is_finite() && *v > 0.0)
        .fold(0.0_f64, f64::max);
    if peak == 0.0 || decades <= 0.0 {
        return Err(VizError::EmptyImage);
    }
    let floor = peak * 10f64.powf(-decades);
    Ok(data.mapv(|v| {
        if v <= floor {
            0.0
        } else {
            ((v / floor).log10() / decades).min(1.0)
        }
    }))
}

/// Render a stretched PSF as an 8-bit grayscale image.
pub fn to_gray_image(data: &Array2<f64>, decades: f64) -> Result<GrayImage> {
    let stretched = log_stretch(data, decades)?;
    let (ny, nx) = stretched.dim();
    let mut img = GrayImage::new(nx as u32, ny as u32);
    for ((i, j), &v) in stretched.indexed_iter() {
        // Row 0 of the array is the bottom of the scene; image rows count
        // down from the top.
        let pixel = (v * 255.0).round() as u8;
        img.put_pixel(j as u32, (ny - 1 - i) as u32, Luma([pixel]));
    }
    Ok(img)
}

/// Write a PSF to a grayscale PNG file.
pub fn save_png(data: &Array2<f64>, decades: f64, path: impl AsRef<Path>) -> Result<()> {
    to_gray_image(data, decades)?.save(path.as_ref())?;
    Ok(())
}

/// Downsample a PSF to a character grid for terminal display.
///
/// Each output character covers a block of pixels and shows the block
/// maximum, so narrow bright features survive the reduction.
pub fn ascii_preview(data: &Array2<f64>, decades: f64, width: usize) -> Result<String> {
    let stretched = log_stretch(data, decades)?;
    let (ny, nx) = stretched.dim();
    let width = width.clamp(1, nx);
    let block_x = nx.div_ceil(width);
    // Terminal cells are roughly twice as tall as wide.
    let block_y = (block_x * 2).min(ny);
    let rows = ny.div_ceil(block_y);
    let cols = nx.div_ceil(block_x);

    let mut out = String::with_capacity(rows * (cols + 1));
    for bi in (0..rows).rev() {
        for bj in 0..cols {
            let mut peak = 0.0_f64;
            for i in (bi * block_y)..((bi + 1) * block_y).min(ny) {
                for j in (bj * block_x)..((bj + 1) * block_x).min(nx) {
                    peak = peak.max(stretched[[i, j]]);
                }
            }
            let idx = (peak * (ASCII_RAMP.len() - 1) as f64).round() as usize;
            out.push(ASCII_RAMP[idx.min(ASCII_RAMP.len() - 1)] as char);
        }
        out.push('\n');
    }
    Ok(out)
}
