//! Optical elements: the phasor capability and its implementations.
//!
//! Every optic exposes one capability: produce a complex phasor (amplitude x
//! phase) sampled on a requested coordinate grid. Implementations fall into
//! three families:
//!
//! - analytic generators ([`apertures`], [`stops`], [`masks`]) that evaluate
//!   a closed-form shape or profile on the grid,
//! - the array-backed element ([`array_backed`]) that resamples stored
//!   amplitude/OPD maps onto the grid,
//! - combinators ([`compound`]) that delegate to owned children.
//!
//! Phasor evaluation is a pure function of the grid and the optic's own
//! parameters: no per-call mutable state, so one optic instance can be
//! shared across concurrent per-wavelength calculations.

pub mod apertures;
pub mod array_backed;
pub mod compound;
pub mod masks;
pub mod stops;

use ndarray::Array2;
use rustfft::num_complex::Complex64;

use crate::coordinates::CoordinateGrid;
use crate::wavefront::PlaneType;

pub use apertures::{
    CircularAperture, GaussianAperture, HexagonAperture, MultiHexagonAperture, NgonAperture,
    ParityTestAperture, RectangleAperture, SecondaryObscuration, SquareAperture,
};
pub use array_backed::ArrayOpticalElement;
pub use compound::{CompoundAnalyticOptic, InverseTransmission};
pub use masks::{BandLimitedCoron, BandLimitedKind, ScalarTransmission, ThinLens};
pub use stops::{
    AnnularFieldStop, BarOcculter, CircularOcculter, RectangularFieldStop, SquareFieldStop,
};

/// Which real-valued component of a phasor to rasterize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    /// Magnitude of the phasor.
    Amplitude,
    /// Squared magnitude.
    Intensity,
    /// Argument in radians.
    Phase,
}

/// An element of an optical train that perturbs a wavefront's amplitude
/// and/or phase.
pub trait OpticalElement: Send + Sync {
    /// Human-readable name used in error reporting and logs.
    fn name(&self) -> &str;

    /// The plane this optic is valid in; `None` means any plane.
    fn plane(&self) -> Option<PlaneType>;

    /// Complex phasor sampled on the given coordinate grid.
    fn phasor(&self, grid: &CoordinateGrid) -> Array2<Complex64>;

    /// Rasterize one component of this optic on a standalone centered grid
    /// of `npix` x `npix` samples spanning `grid_size` physical units.
    ///
    /// This is the canonical wavefront-independent sampling of an optic; it
    /// agrees exactly with [`OpticalElement::phasor`] fed an equivalent
    /// wavefront grid because both paths build the same [`CoordinateGrid`].
    fn sample(
        &self,
        npix: usize,
        grid_size: f64,
        wavelength: f64,
        kind: SampleKind,
    ) -> Array2<f64> {
        let pixelscale = grid_size / npix as f64;
        let plane = self.plane().unwrap_or(PlaneType::Pupil);
        let grid = CoordinateGrid::centered(npix, pixelscale, wavelength, plane);
        let phasor = self.phasor(&grid);
        match kind {
            SampleKind::Amplitude => phasor.mapv(|v| v.norm()),
            SampleKind::Intensity => phasor.mapv(|v| v.norm_sqr()),
            SampleKind::Phase => phasor.mapv(|v| v.arg()),
        }
    }
}

/// Lift a real transmission map into a complex phasor.
pub(crate) fn transmission_to_phasor(t: Array2<f64>) -> Array2<Complex64> {
    t.mapv(|v| Complex64::new(v, 0.0))
}

/// One-pixel linear anti-aliasing ramp across a radial boundary: 1 well
/// inside `radius`, 0 well outside, fractional within half a pixel of the
/// edge. A non-positive radius is a degenerate (empty) shape.
pub(crate) fn radial_ramp(r: f64, radius: f64, pixelscale: f64) -> f64 {
    if radius <= 0.0 {
        return 0.0;
    }
    (0.5 + (radius - r) / pixelscale).clamp(0.0, 1.0)
}

/// Fraction of a pixel cell centered at `coord` covered by the slab
/// `|u| <= half_extent`, snapped to exactly 0 or 1 within 1e-9 so pixels
/// whose cells align with the slab edge contribute exact values.
pub(crate) fn cell_coverage(coord: f64, half_extent: f64, pixelscale: f64) -> f64 {
    if half_extent <= 0.0 {
        return 0.0;
    }
    // Per-edge ramps in the same form as `radial_ramp`. The edge distances
    // are computed directly rather than via interval endpoints, so a cell
    // centered exactly on an edge covers exactly 0.5.
    let below_upper = (0.5 + (half_extent - coord) / pixelscale).clamp(0.0, 1.0);
    let above_lower = (0.5 + (half_extent + coord) / pixelscale).clamp(0.0, 1.0);
    snap_unit((below_upper + above_lower - 1.0).clamp(0.0, 1.0))
}

/// Snap a coverage fraction to exactly 0 or 1 when within 1e-9.
pub(crate) fn snap_unit(t: f64) -> f64 {
    if t > 1.0 - 1e-9 {
        1.0
    } else if t < 1e-9 {
        0.0
    } else {
        t
    }
}
