//! Resampling of intensity arrays between pixel grids.
//!
//! Detector output rarely shares a pixel scale with the grid a wavefront was
//! propagated on, so intensities are bilinearly interpolated between centered
//! grids, with a Jacobian factor keeping total flux invariant under a change
//! of pixel area. Points falling outside the source grid read as zero.

use ndarray::Array2;

use crate::coordinates::centered_axis;
use crate::error::{OpticsError, Result};

/// Relative pixel-scale difference below which two grids are treated as
/// identical and resampling degrades to an exact centered crop or pad.
const SCALE_MATCH_TOL: f64 = 1e-9;

/// Bilinear interpolator over a regularly spaced centered grid.
#[derive(Debug, Clone)]
pub struct BilinearSampler<'a> {
    data: &'a Array2<f64>,
    pixelscale: f64,
    /// Coordinate of sample `[0, 0]` along each axis.
    origin: f64,
}

impl<'a> BilinearSampler<'a> {
    /// Wrap a square centered array sampled at `pixelscale` units per pixel.
    pub fn new(data: &'a Array2<f64>, pixelscale: f64) -> Result<Self> {
        let (ny, nx) = data.dim();
        if ny != nx || nx == 0 {
            return Err(OpticsError::ResampleFailure(format!(
                "expected a non-empty square array, got {ny}x{nx}"
            )));
        }
        if !pixelscale.is_finite() || pixelscale <= 0.0 {
            return Err(OpticsError::ResampleFailure(format!(
                "pixelscale must be finite and positive, got {pixelscale}"
            )));
        }
        Ok(BilinearSampler {
            data,
            pixelscale,
            origin: -((nx - 1) as f64) / 2.0 * pixelscale,
        })
    }

    /// Interpolated value at `(x, y)`, or `fill` outside the sampled extent.
    pub fn sample_or(&self, x: f64, y: f64, fill: f64) -> f64 {
        let n = self.data.nrows();
        let fx = (x - self.origin) / self.pixelscale;
        let fy = (y - self.origin) / self.pixelscale;
        if fx < 0.0 || fy < 0.0 || fx > (n - 1) as f64 || fy > (n - 1) as f64 {
            return fill;
        }
        let ix = (fx.floor() as usize).min(n - 2);
        let iy = (fy.floor() as usize).min(n - 2);
        let wx = fx - ix as f64;
        let wy = fy - iy as f64;
        let q11 = self.data[[iy, ix]];
        let q21 = self.data[[iy, ix + 1]];
        let q12 = self.data[[iy + 1, ix]];
        let q22 = self.data[[iy + 1, ix + 1]];
        q11 * (1.0 - wx) * (1.0 - wy)
            + q21 * wx * (1.0 - wy)
            + q12 * (1.0 - wx) * wy
            + q22 * wx * wy
    }
}

/// Resample a centered intensity array onto a new centered grid.
///
/// Output values carry the pixel-area ratio `(out_scale / in_scale)^2`, so
/// the summed flux of a smooth distribution is preserved rather than its
/// peak value. When the scales match within [`SCALE_MATCH_TOL`] the array is
/// cropped or zero-padded about its center instead, which is exact.
pub fn resample_centered(
    data: &Array2<f64>,
    in_scale: f64,
    out_npix: usize,
    out_scale: f64,
) -> Result<Array2<f64>> {
    if out_npix == 0 || !out_scale.is_finite() || out_scale <= 0.0 {
        return Err(OpticsError::ResampleFailure(format!(
            "output grid {out_npix} px at {out_scale} per px is degenerate"
        )));
    }
    if ((out_scale - in_scale) / in_scale).abs() < SCALE_MATCH_TOL {
        return Ok(crate::fourier::resize_centered(data, out_npix));
    }

    let sampler = BilinearSampler::new(data, in_scale)?;
    let axis = centered_axis(out_npix, out_scale);
    let flux_ratio = (out_scale / in_scale).powi(2);
    let mut out = Array2::zeros((out_npix, out_npix));
    for ((i, j), v) in out.indexed_iter_mut() {
        *v = sampler.sample_or(axis[j], axis[i], 0.0) * flux_ratio;
    }
    Ok(out)
}

/// Sum `factor x factor` blocks of fine pixels into coarse detector pixels.
pub fn bin_by_factor(data: &Array2<f64>, factor: usize) -> Result<Array2<f64>> {
    let (ny, nx) = data.dim();
    if factor == 0 || ny % factor != 0 || nx % factor != 0 {
        return Err(OpticsError::ResampleFailure(format!(
            "cannot bin {ny}x{nx} array by factor {factor}"
        )));
    }
    let mut out = Array2::zeros((ny / factor, nx / factor));
    for ((i, j), v) in data.indexed_iter() {
        out[[i / factor, j / factor]] += *v;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use ndarray::arr2;

    #[test]
    fn sampler_hits_grid_points_exactly() {
        // data[i, j] = i + j on a 3x3 grid with unit pixels.
        let data = arr2(&[[0.0, 1.0, 2.0], [1.0, 2.0, 3.0], [2.0, 3.0, 4.0]]);
        let sampler = BilinearSampler::new(&data, 1.0).unwrap();
        assert_eq!(sampler.sample_or(-1.0, -1.0, f64::NAN), 0.0);
        assert_eq!(sampler.sample_or(1.0, -1.0, f64::NAN), 2.0);
        assert_eq!(sampler.sample_or(1.0, 1.0, f64::NAN), 4.0);
    }

    #[test]
    fn sampler_is_exact_for_bilinear_data() {
        // f(x, y) = x * y is reproduced exactly by bilinear weights.
        let mut data = Array2::zeros((4, 4));
        for ((i, j), v) in data.indexed_iter_mut() {
            let x = (j as f64) - 1.5;
            let y = (i as f64) - 1.5;
            *v = x * y;
        }
        let sampler = BilinearSampler::new(&data, 1.0).unwrap();
        assert!(approx_eq!(
            f64,
            sampler.sample_or(0.25, -0.75, f64::NAN),
            0.25 * -0.75,
            epsilon = 1e-12
        ));
    }

    #[test]
    fn sampler_fills_outside_the_grid() {
        let data = Array2::ones((3, 3));
        let sampler = BilinearSampler::new(&data, 0.5).unwrap();
        assert_eq!(sampler.sample_or(10.0, 0.0, 0.0), 0.0);
        assert_eq!(sampler.sample_or(0.0, -10.0, 0.0), 0.0);
    }

    #[test]
    fn sampler_rejects_non_square_input() {
        let data = Array2::ones((2, 3));
        assert!(BilinearSampler::new(&data, 1.0).is_err());
    }

    #[test]
    fn resample_preserves_flux_of_uniform_field() {
        // A uniform unit field halved in pixel scale: 4x the pixels, each
        // carrying a quarter of the flux.
        let data = Array2::ones((8, 8));
        let out = resample_centered(&data, 1.0, 16, 0.5).unwrap();
        // Interior pixels all interpolate to 1.0 before the area factor.
        assert!(approx_eq!(f64, out[[8, 8]], 0.25, epsilon = 1e-12));
    }

    #[test]
    fn matched_scales_crop_exactly() {
        let mut data = Array2::zeros((6, 6));
        for ((i, j), v) in data.indexed_iter_mut() {
            *v = (i * 10 + j) as f64;
        }
        let out = resample_centered(&data, 0.3, 4, 0.3).unwrap();
        assert_eq!(out.dim(), (4, 4));
        assert_eq!(out[[0, 0]], data[[1, 1]]);
        assert_eq!(out[[3, 3]], data[[4, 4]]);
    }

    #[test]
    fn binning_sums_blocks() {
        let mut data = Array2::zeros((4, 4));
        for ((i, j), v) in data.indexed_iter_mut() {
            *v = (i * 4 + j) as f64;
        }
        let out = bin_by_factor(&data, 2).unwrap();
        assert_eq!(out.dim(), (2, 2));
        assert_eq!(out[[0, 0]], 0.0 + 1.0 + 4.0 + 5.0);
        assert_eq!(out[[1, 1]], 10.0 + 11.0 + 14.0 + 15.0);
        assert_eq!(out.sum(), data.sum());
    }

    #[test]
    fn binning_rejects_non_divisible_sizes() {
        let data = Array2::ones((5, 5));
        assert!(bin_by_factor(&data, 2).is_err());
    }
}
