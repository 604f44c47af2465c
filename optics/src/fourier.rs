//! Centered, unitary 2D Fourier transforms and grid resizing helpers.
//!
//! Built on `rustfft` 1D plans: a row pass followed by a row pass over the
//! transposed array. Transforms are scaled by `1/sqrt(N)` in each direction
//! so a forward/inverse pair is the identity and Parseval's theorem holds
//! (total intensity is conserved through propagation).

use std::f64::consts::PI;

use ndarray::Array2;
use rustfft::{num_complex::Complex64, FftPlanner};

/// Unitary 2D DFT centered on the crate's coordinate convention: sample `i`
/// of either axis sits at `(i - (n - 1)/2)` in samples, in real space and in
/// frequency space alike.
///
/// For odd `n` this reduces to the usual `fftshift(fft2(ifftshift(field)))`.
/// For even `n` the origin falls between the two central samples, which no
/// cyclic shift can express; the half-sample offset is instead carried by
/// linear phase ramps applied before and after the raw transform, keeping
/// even-parity inputs exactly even-parity in the output.
pub fn fft2_centered(field: &Array2<Complex64>, inverse: bool) -> Array2<Complex64> {
    let (ny, nx) = field.dim();
    let sign = if inverse { -1.0 } else { 1.0 };
    let ramp_y = half_sample_ramp(ny, sign);
    let ramp_x = half_sample_ramp(nx, sign);

    let pre = Array2::from_shape_fn((ny, nx), |(i, j)| field[[i, j]] * ramp_y[i] * ramp_x[j]);
    let mut out = fft2_raw(pre, inverse);

    // Constant phase left over from expanding (j - c)(k - c) in the DFT
    // exponent; without it a forward/inverse pair is not the identity.
    let cy = (ny as f64 - 1.0) / 2.0;
    let cx = (nx as f64 - 1.0) / 2.0;
    let residual = Complex64::from_polar(
        1.0,
        -sign * 2.0 * PI * (cy * cy / ny as f64 + cx * cx / nx as f64),
    );
    for ((i, j), v) in out.indexed_iter_mut() {
        *v *= ramp_y[i] * ramp_x[j] * residual;
    }
    out
}

/// Phase ramp `exp(sign * 2 pi i c j / n)` with `c = (n - 1)/2`, the linear
/// phase that re-centers the raw DFT on the between-sample origin.
fn half_sample_ramp(n: usize, sign: f64) -> Vec<Complex64> {
    let c = (n as f64 - 1.0) / 2.0;
    (0..n)
        .map(|j| Complex64::from_polar(1.0, sign * 2.0 * PI * c * j as f64 / n as f64))
        .collect()
}

/// Unitary (but unshifted) 2D FFT.
fn fft2_raw(mut field: Array2<Complex64>, inverse: bool) -> Array2<Complex64> {
    let (ny, nx) = field.dim();
    let mut planner = FftPlanner::new();

    let row_fft = if inverse {
        planner.plan_fft_inverse(nx)
    } else {
        planner.plan_fft_forward(nx)
    };
    for mut row in field.rows_mut() {
        let slice = row
            .as_slice_mut()
            .expect("rows of a standard-layout array are contiguous");
        row_fft.process(slice);
    }

    // Column pass: transform the rows of the transposed copy.
    let mut t = field.reversed_axes().as_standard_layout().to_owned();
    let col_fft = if inverse {
        planner.plan_fft_inverse(ny)
    } else {
        planner.plan_fft_forward(ny)
    };
    for mut row in t.rows_mut() {
        let slice = row
            .as_slice_mut()
            .expect("rows of a standard-layout array are contiguous");
        col_fft.process(slice);
    }

    let scale = 1.0 / ((nx * ny) as f64).sqrt();
    let mut out = t.reversed_axes().as_standard_layout().to_owned();
    out.mapv_inplace(|v| v * scale);
    out
}

/// Resize a square array to `npix_new` about its center: zero-pads when
/// growing, crops when shrinking.
pub fn resize_centered<T: Copy + Default>(a: &Array2<T>, npix_new: usize) -> Array2<T> {
    let n = a.nrows();
    if n == npix_new {
        return a.clone();
    }
    let mut out = Array2::from_elem((npix_new, npix_new), T::default());
    if npix_new > n {
        let off = (npix_new - n) / 2;
        for i in 0..n {
            for j in 0..n {
                out[[i + off, j + off]] = a[[i, j]];
            }
        }
    } else {
        let off = (n - npix_new) / 2;
        for i in 0..npix_new {
            for j in 0..npix_new {
                out[[i, j]] = a[[i + off, j + off]];
            }
        }
    }
    out
}

/// Spatial-frequency samples matching the centered spectrum layout of
/// [`fft2_centered`]: bin `i` carries frequency `(i - (n - 1)/2) / (n *
/// pixelscale)`, the same centering as [`crate::coordinates::centered_axis`].
pub fn fft_frequencies(n: usize, pixelscale: f64) -> Vec<f64> {
    let df = 1.0 / (n as f64 * pixelscale);
    let half = (n as f64 - 1.0) / 2.0;
    (0..n).map(|i| (i as f64 - half) * df).collect()
}
