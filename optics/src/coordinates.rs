//! Centered coordinate grids shared by every optic and propagation kernel.
//!
//! The whole crate uses one centering convention: sample `i` of an `n`-sample
//! axis sits at physical position `(i - (n - 1)/2) * pixelscale`. For even
//! `n` the origin falls on the boundary between the two central pixels (no
//! single center pixel); for odd `n` a pixel sits exactly at the origin.
//! This convention is load-bearing for the parity and symmetry behavior of
//! the analytic optics, so it is factored out here once rather than
//! reimplemented per shape.

use ndarray::Array2;

use crate::wavefront::PlaneType;

/// A sampled coordinate grid an optic is asked to evaluate its phasor on.
///
/// Carries the physical x/y positions of every sample plus the metadata an
/// optic needs to interpret them: the pixel scale (meters/pixel in pupil
/// planes, arcsec/pixel in image planes), the plane type, and the wavelength
/// of the requesting wavefront (used by chromatic elements such as thin
/// lenses and OPD maps).
#[derive(Debug, Clone)]
pub struct CoordinateGrid {
    /// Physical x position of each sample.
    pub x: Array2<f64>,
    /// Physical y position of each sample.
    pub y: Array2<f64>,
    /// Physical units per pixel.
    pub pixelscale: f64,
    /// Wavelength of the requesting wavefront in meters.
    pub wavelength: f64,
    /// Plane the grid belongs to.
    pub plane: PlaneType,
}

impl CoordinateGrid {
    /// Build a centered square grid of `npix` x `npix` samples.
    pub fn centered(npix: usize, pixelscale: f64, wavelength: f64, plane: PlaneType) -> Self {
        let axis = centered_axis(npix, pixelscale);
        let x = Array2::from_shape_fn((npix, npix), |(_, j)| axis[j]);
        let y = Array2::from_shape_fn((npix, npix), |(i, _)| axis[i]);
        CoordinateGrid {
            x,
            y,
            pixelscale,
            wavelength,
            plane,
        }
    }

    /// Grid dimensions as (rows, cols).
    pub fn shape(&self) -> (usize, usize) {
        self.x.dim()
    }

    /// Radial distance of each sample from the grid origin.
    pub fn radius(&self) -> Array2<f64> {
        let mut r = &self.x * &self.x + &self.y * &self.y;
        r.mapv_inplace(f64::sqrt);
        r
    }

    /// Coordinates rotated so that evaluating an unrotated shape test on the
    /// result is equivalent to rotating the mask by `+angle_deg` about the
    /// array center.
    ///
    /// The sampling coordinates are rotated by `-angle_deg`; the arrays
    /// themselves are never rotated, so no interpolation is involved.
    pub fn rotated(&self, angle_deg: f64) -> (Array2<f64>, Array2<f64>) {
        if angle_deg == 0.0 {
            return (self.x.clone(), self.y.clone());
        }
        let a = angle_deg.to_radians();
        let (sin_a, cos_a) = a.sin_cos();
        let xr = &self.x * cos_a + &self.y * sin_a;
        let yr = &self.y * cos_a - &self.x * sin_a;
        (xr, yr)
    }
}

/// Physical positions of the samples along one centered axis.
///
/// ```
/// use optics::coordinates::centered_axis;
///
/// // Even count: origin between the two central samples.
/// assert_eq!(centered_axis(4, 1.0), vec![-1.5, -0.5, 0.5, 1.5]);
/// // Odd count: a sample exactly at the origin.
/// assert_eq!(centered_axis(5, 1.0), vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
/// ```
pub fn centered_axis(n: usize, pixelscale: f64) -> Vec<f64> {
    let half = (n as f64 - 1.0) / 2.0;
    (0..n).map(|i| (i as f64 - half) * pixelscale).collect()
}
