//! Field stops and opaque occulters for image planes.
//!
//! These elements measure their coordinates in arcseconds. Straight edges
//! use the separable covered-cell fraction, circular edges the shared
//! one-pixel ramp, matching the pupil-plane apertures.

use ndarray::Array2;
use rustfft::num_complex::Complex64;

use super::{cell_coverage, radial_ramp, transmission_to_phasor, OpticalElement};
use crate::coordinates::CoordinateGrid;
use crate::error::{require_non_negative, OpticsError, Result};
use crate::wavefront::PlaneType;

/// Square hole in an otherwise opaque image-plane mask.
#[derive(Debug, Clone)]
pub struct SquareFieldStop {
    size: f64,
    rotation: f64,
}

impl SquareFieldStop {
    /// Stop passing a square `size` arcseconds on a side.
    pub fn new(size: f64) -> Result<Self> {
        require_non_negative("size", size)?;
        Ok(SquareFieldStop {
            size,
            rotation: 0.0,
        })
    }

    /// Rotate the stop by `degrees` about the optical axis.
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }
}

impl OpticalElement for SquareFieldStop {
    fn name(&self) -> &str {
        "square field stop"
    }

    fn plane(&self) -> Option<PlaneType> {
        Some(PlaneType::Image)
    }

    fn phasor(&self, grid: &CoordinateGrid) -> Array2<Complex64> {
        let (x, y) = grid.rotated(self.rotation);
        let half = self.size / 2.0;
        let p = grid.pixelscale;
        let mut t = Array2::zeros(grid.shape());
        for ((i, j), v) in t.indexed_iter_mut() {
            *v = cell_coverage(x[[i, j]], half, p) * cell_coverage(y[[i, j]], half, p);
        }
        transmission_to_phasor(t)
    }
}

/// Rectangular hole in an otherwise opaque image-plane mask.
#[derive(Debug, Clone)]
pub struct RectangularFieldStop {
    width: f64,
    height: f64,
    rotation: f64,
}

impl RectangularFieldStop {
    /// Stop passing `width` x `height` arcseconds (width along x).
    pub fn new(width: f64, height: f64) -> Result<Self> {
        require_non_negative("width", width)?;
        require_non_negative("height", height)?;
        Ok(RectangularFieldStop {
            width,
            height,
            rotation: 0.0,
        })
    }

    /// Rotate the stop by `degrees` about the optical axis.
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }
}

impl OpticalElement for RectangularFieldStop {
    fn name(&self) -> &str {
        "rectangular field stop"
    }

    fn plane(&self) -> Option<PlaneType> {
        Some(PlaneType::Image)
    }

    fn phasor(&self, grid: &CoordinateGrid) -> Array2<Complex64> {
        let (x, y) = grid.rotated(self.rotation);
        let (hw, hh) = (self.width / 2.0, self.height / 2.0);
        let p = grid.pixelscale;
        let mut t = Array2::zeros(grid.shape());
        for ((i, j), v) in t.indexed_iter_mut() {
            *v = cell_coverage(x[[i, j]], hw, p) * cell_coverage(y[[i, j]], hh, p);
        }
        transmission_to_phasor(t)
    }
}

/// Annular hole: transmits between an inner and outer radius.
///
/// With a zero inner radius this degenerates to a circular field stop.
#[derive(Debug, Clone)]
pub struct AnnularFieldStop {
    radius_inner: f64,
    radius_outer: f64,
}

impl AnnularFieldStop {
    /// Stop passing `radius_inner <= r <= radius_outer`, in arcseconds.
    pub fn new(radius_inner: f64, radius_outer: f64) -> Result<Self> {
        require_non_negative("radius_inner", radius_inner)?;
        require_non_negative("radius_outer", radius_outer)?;
        if radius_outer < radius_inner {
            return Err(OpticsError::InvalidParameter {
                name: "radius_outer",
                value: radius_outer,
            });
        }
        Ok(AnnularFieldStop {
            radius_inner,
            radius_outer,
        })
    }

    pub fn radius_inner(&self) -> f64 {
        self.radius_inner
    }

    pub fn radius_outer(&self) -> f64 {
        self.radius_outer
    }
}

impl OpticalElement for AnnularFieldStop {
    fn name(&self) -> &str {
        "annular field stop"
    }

    fn plane(&self) -> Option<PlaneType> {
        Some(PlaneType::Image)
    }

    fn phasor(&self, grid: &CoordinateGrid) -> Array2<Complex64> {
        let p = grid.pixelscale;
        let t = grid.radius().mapv(|r| {
            radial_ramp(r, self.radius_outer, p) - radial_ramp(r, self.radius_inner, p)
        });
        transmission_to_phasor(t)
    }
}

/// Opaque circular spot blocking the center of the image plane.
#[derive(Debug, Clone)]
pub struct CircularOcculter {
    radius: f64,
}

impl CircularOcculter {
    /// Occulting spot of the given radius in arcseconds.
    pub fn new(radius: f64) -> Result<Self> {
        require_non_negative("radius", radius)?;
        Ok(CircularOcculter { radius })
    }
}

impl OpticalElement for CircularOcculter {
    fn name(&self) -> &str {
        "circular occulter"
    }

    fn plane(&self) -> Option<PlaneType> {
        Some(PlaneType::Image)
    }

    fn phasor(&self, grid: &CoordinateGrid) -> Array2<Complex64> {
        let p = grid.pixelscale;
        let t = grid
            .radius()
            .mapv(|r| 1.0 - radial_ramp(r, self.radius, p));
        transmission_to_phasor(t)
    }
}

/// Opaque bar crossing the full image plane.
#[derive(Debug, Clone)]
pub struct BarOcculter {
    width: f64,
    rotation: f64,
}

impl BarOcculter {
    /// Vertical bar of the given width in arcseconds.
    pub fn new(width: f64) -> Result<Self> {
        require_non_negative("width", width)?;
        Ok(BarOcculter {
            width,
            rotation: 0.0,
        })
    }

    /// Rotate the bar by `degrees` from vertical.
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }
}

impl OpticalElement for BarOcculter {
    fn name(&self) -> &str {
        "bar occulter"
    }

    fn plane(&self) -> Option<PlaneType> {
        Some(PlaneType::Image)
    }

    fn phasor(&self, grid: &CoordinateGrid) -> Array2<Complex64> {
        let (x, _) = grid.rotated(self.rotation);
        let half = self.width / 2.0;
        let p = grid.pixelscale;
        let t = x.mapv(|xv| 1.0 - cell_coverage(xv, half, p));
        transmission_to_phasor(t)
    }
}
