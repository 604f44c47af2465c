//! Combinators that build new optics out of existing ones.

use ndarray::Array2;
use rustfft::num_complex::Complex64;

use super::OpticalElement;
use crate::coordinates::CoordinateGrid;
use crate::error::{OpticsError, Result};
use crate::wavefront::PlaneType;

/// Several optics stacked in the same plane and applied as one.
///
/// The combined phasor is the elementwise product of the member phasors, so
/// a compound optic at a single plane is interchangeable with its members
/// applied one after another.
pub struct CompoundAnalyticOptic {
    name: String,
    optics: Vec<Box<dyn OpticalElement>>,
    plane: Option<PlaneType>,
}

impl CompoundAnalyticOptic {
    /// Combine `optics` into one element. Members must not declare
    /// conflicting planes; members with no plane preference combine with
    /// anything.
    pub fn new(name: impl Into<String>, optics: Vec<Box<dyn OpticalElement>>) -> Result<Self> {
        let name = name.into();
        let mut plane = None;
        for optic in &optics {
            match (plane, optic.plane()) {
                (None, p) => plane = p,
                (Some(_), None) => {}
                (Some(a), Some(b)) if a == b => {}
                (Some(_), Some(_)) => {
                    return Err(OpticsError::MixedPlaneType {
                        compound: name,
                    });
                }
            }
        }
        Ok(CompoundAnalyticOptic {
            name,
            optics,
            plane,
        })
    }
}

impl OpticalElement for CompoundAnalyticOptic {
    fn name(&self) -> &str {
        &self.name
    }

    fn plane(&self) -> Option<PlaneType> {
        self.plane
    }

    fn phasor(&self, grid: &CoordinateGrid) -> Array2<Complex64> {
        let mut product = Array2::from_elem(grid.shape(), Complex64::new(1.0, 0.0));
        for optic in &self.optics {
            product.zip_mut_with(&optic.phasor(grid), |acc, v| *acc *= v);
        }
        product
    }
}

/// Wrapper turning an optic's transmission into its complement.
///
/// Where the wrapped optic transmits amplitude `t`, this transmits `1 - t`:
/// an aperture becomes an occulting spot of the same shape and vice versa.
/// Only the transmission is inverted; any phase the wrapped optic carries is
/// dropped, so the complement of a pure-phase optic is fully opaque.
pub struct InverseTransmission {
    name: String,
    inner: Box<dyn OpticalElement>,
}

impl InverseTransmission {
    pub fn new(inner: Box<dyn OpticalElement>) -> Self {
        let name = format!("1 - {}", inner.name());
        InverseTransmission { name, inner }
    }
}

impl OpticalElement for InverseTransmission {
    fn name(&self) -> &str {
        &self.name
    }

    fn plane(&self) -> Option<PlaneType> {
        self.inner.plane()
    }

    fn phasor(&self, grid: &CoordinateGrid) -> Array2<Complex64> {
        self.inner
            .phasor(grid)
            .mapv(|v| Complex64::new(1.0 - v.norm(), 0.0))
    }
}
