//! Analytic pupil-plane apertures and obscurations.
//!
//! Transmission masks are 1 inside the shape boundary and 0 outside, with
//! deterministic gray-pixel edges: radial and polygon boundaries use the
//! shared one-pixel linear ramp, rectangle boundaries use the separable
//! covered-cell fraction. Shapes with a `rotation` evaluate the unrotated
//! boundary test in coordinates rotated by the opposite angle, which rotates
//! the mask without touching the sampled array.

use ndarray::Array2;
use rustfft::num_complex::Complex64;

use super::{cell_coverage, radial_ramp, snap_unit, transmission_to_phasor, OpticalElement};
use crate::coordinates::CoordinateGrid;
use crate::error::{require_non_negative, require_positive, OpticsError, Result};
use crate::wavefront::PlaneType;

/// Signed distance from a point to the boundary of a regular polygon with
/// a vertex on the +x axis; positive inside.
fn polygon_inner_distance(x: f64, y: f64, nsides: usize, circumradius: f64) -> f64 {
    let step = 2.0 * std::f64::consts::PI / nsides as f64;
    let apothem = circumradius * (step / 2.0).cos();
    let mut d = f64::INFINITY;
    for k in 0..nsides {
        // Face normals bisect the angles between adjacent vertices.
        let phi = step / 2.0 + k as f64 * step;
        let proj = x * phi.cos() + y * phi.sin();
        d = d.min(apothem - proj);
    }
    d
}

/// Uniformly transmitting circular aperture.
#[derive(Debug, Clone)]
pub struct CircularAperture {
    radius: f64,
}

impl CircularAperture {
    /// Aperture of the given radius in meters. A zero radius is a valid
    /// degenerate aperture transmitting nothing.
    pub fn new(radius: f64) -> Result<Self> {
        require_non_negative("radius", radius)?;
        Ok(CircularAperture { radius })
    }

    /// Aperture radius in meters.
    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl OpticalElement for CircularAperture {
    fn name(&self) -> &str {
        "circular aperture"
    }

    fn plane(&self) -> Option<PlaneType> {
        Some(PlaneType::Pupil)
    }

    fn phasor(&self, grid: &CoordinateGrid) -> Array2<Complex64> {
        let p = grid.pixelscale;
        let t = grid
            .radius()
            .mapv(|r| radial_ramp(r, self.radius, p));
        transmission_to_phasor(t)
    }
}

/// Square aperture, optionally rotated.
#[derive(Debug, Clone)]
pub struct SquareAperture {
    size: f64,
    rotation: f64,
}

impl SquareAperture {
    /// Square of the given side length in meters.
    pub fn new(size: f64) -> Result<Self> {
        require_non_negative("size", size)?;
        Ok(SquareAperture {
            size,
            rotation: 0.0,
        })
    }

    /// Rotate the aperture by `degrees` about the array center.
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }
}

impl OpticalElement for SquareAperture {
    fn name(&self) -> &str {
        "square aperture"
    }

    fn plane(&self) -> Option<PlaneType> {
        Some(PlaneType::Pupil)
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

/// Rectangular aperture, optionally rotated.
#[derive(Debug, Clone)]
pub struct RectangleAperture {
    width: f64,
    height: f64,
    rotation: f64,
}

impl RectangleAperture {
    /// Rectangle of `width` x `height` meters (width along x).
    pub fn new(width: f64, height: f64) -> Result<Self> {
        require_non_negative("width", width)?;
        require_non_negative("height", height)?;
        Ok(RectangleAperture {
            width,
            height,
            rotation: 0.0,
        })
    }

    /// Rotate the aperture by `degrees` about the array center.
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }
}

impl OpticalElement for RectangleAperture {
    fn name(&self) -> &str {
        "rectangle aperture"
    }

    fn plane(&self) -> Option<PlaneType> {
        Some(PlaneType::Pupil)
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

/// Regular hexagonal aperture with a vertex on the +x axis.
#[derive(Debug, Clone)]
pub struct HexagonAperture {
    side: f64,
    rotation: f64,
}

impl HexagonAperture {
    /// Hexagon of the given side length (equal to its circumradius) in meters.
    pub fn new(side: f64) -> Result<Self> {
        require_non_negative("side", side)?;
        Ok(HexagonAperture {
            side,
            rotation: 0.0,
        })
    }

    /// Rotate the aperture by `degrees` about the array center.
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }
}

impl OpticalElement for HexagonAperture {
    fn name(&self) -> &str {
        "hexagon aperture"
    }

    fn plane(&self) -> Option<PlaneType> {
        Some(PlaneType::Pupil)
    }

    fn phasor(&self, grid: &CoordinateGrid) -> Array2<Complex64> {
        let (x, y) = grid.rotated(self.rotation);
        let p = grid.pixelscale;
        let mut t = Array2::zeros(grid.shape());
        if self.side > 0.0 {
            for ((i, j), v) in t.indexed_iter_mut() {
                let d = polygon_inner_distance(x[[i, j]], y[[i, j]], 6, self.side);
                *v = (0.5 + d / p).clamp(0.0, 1.0);
            }
        }
        transmission_to_phasor(t)
    }
}

/// Regular polygon aperture with `nsides` sides and a vertex on the +x axis.
#[derive(Debug, Clone)]
pub struct NgonAperture {
    nsides: usize,
    radius: f64,
    rotation: f64,
}

impl NgonAperture {
    /// Polygon inscribed in a circle of `radius` meters. Fewer than 3 sides
    /// is malformed.
    pub fn new(nsides: usize, radius: f64) -> Result<Self> {
        if nsides < 3 {
            return Err(OpticsError::InvalidParameter {
                name: "nsides",
                value: nsides as f64,
            });
        }
        require_non_negative("radius", radius)?;
        Ok(NgonAperture {
            nsides,
            radius,
            rotation: 0.0,
        })
    }

    /// Rotate the aperture by `degrees` about the array center.
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }
}

impl OpticalElement for NgonAperture {
    fn name(&self) -> &str {
        "n-gon aperture"
    }

    fn plane(&self) -> Option<PlaneType> {
        Some(PlaneType::Pupil)
    }

    fn phasor(&self, grid: &CoordinateGrid) -> Array2<Complex64> {
        let (x, y) = grid.rotated(self.rotation);
        let p = grid.pixelscale;
        let mut t = Array2::zeros(grid.shape());
        if self.radius > 0.0 {
            for ((i, j), v) in t.indexed_iter_mut() {
                let d = polygon_inner_distance(x[[i, j]], y[[i, j]], self.nsides, self.radius);
                *v = (0.5 + d / p).clamp(0.0, 1.0);
            }
        }
        transmission_to_phasor(t)
    }
}

/// Segmented aperture: hexagons tiled in concentric rings around a central
/// segment, as in segmented-primary telescopes.
#[derive(Debug, Clone)]
pub struct MultiHexagonAperture {
    side: f64,
    rings: usize,
    rotation: f64,
}

impl MultiHexagonAperture {
    /// Segments of the given side length, tiled out to `rings` rings.
    pub fn new(side: f64, rings: usize) -> Result<Self> {
        require_positive("side", side)?;
        Ok(MultiHexagonAperture {
            side,
            rings,
            rotation: 0.0,
        })
    }

    /// Rotate the whole segment pattern by `degrees`.
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    /// Segment centers in axial honeycomb coordinates.
    fn centers(&self) -> Vec<(f64, f64)> {
        // Neighboring segments sit flat-to-flat, one flat-to-flat width apart
        // along the face-normal directions of the vertex-on-x hexagon.
        let pitch = 3.0_f64.sqrt() * self.side;
        let (a1x, a1y) = (
            pitch * (30.0_f64.to_radians()).cos(),
            pitch * (30.0_f64.to_radians()).sin(),
        );
        let (a2x, a2y) = (0.0, pitch);
        let n = self.rings as i64;
        let mut centers = Vec::new();
        for q in -n..=n {
            for r in -n..=n {
                let s = -q - r;
                if q.abs().max(r.abs()).max(s.abs()) <= n {
                    centers.push((q as f64 * a1x + r as f64 * a2x, q as f64 * a1y + r as f64 * a2y));
                }
            }
        }
        centers
    }
}

impl OpticalElement for MultiHexagonAperture {
    fn name(&self) -> &str {
        "multi-hexagon aperture"
    }

    fn plane(&self) -> Option<PlaneType> {
        Some(PlaneType::Pupil)
    }

    fn phasor(&self, grid: &CoordinateGrid) -> Array2<Complex64> {
        let (x, y) = grid.rotated(self.rotation);
        let p = grid.pixelscale;
        let centers = self.centers();
        let mut t = Array2::zeros(grid.shape());
        for ((i, j), v) in t.indexed_iter_mut() {
            let mut best = 0.0_f64;
            for &(cx, cy) in &centers {
                let d = polygon_inner_distance(x[[i, j]] - cx, y[[i, j]] - cy, 6, self.side);
                best = best.max((0.5 + d / p).clamp(0.0, 1.0));
            }
            *v = best;
        }
        transmission_to_phasor(t)
    }
}

/// Circular aperture with two asymmetric notches cut out, so the mask is
/// not symmetric under a flip about either axis. Used to verify that
/// orientation conventions survive sampling, serialization, and propagation.
#[derive(Debug, Clone)]
pub struct ParityTestAperture {
    radius: f64,
}

impl ParityTestAperture {
    pub fn new() -> Self {
        ParityTestAperture { radius: 1.0 }
    }
}

impl Default for ParityTestAperture {
    fn default() -> Self {
        Self::new()
    }
}

impl OpticalElement for ParityTestAperture {
    fn name(&self) -> &str {
        "parity test aperture"
    }

    fn plane(&self) -> Option<PlaneType> {
        Some(PlaneType::Pupil)
    }

    fn phasor(&self, grid: &CoordinateGrid) -> Array2<Complex64> {
        let p = grid.pixelscale;
        let mut t = Array2::zeros(grid.shape());
        for ((i, j), v) in t.indexed_iter_mut() {
            let (x, y) = (grid.x[[i, j]], grid.y[[i, j]]);
            let r = (x * x + y * y).sqrt();
            let mut val = radial_ramp(r, self.radius, p);
            // Notch on the +x side above the axis only.
            if x > 0.25 * self.radius && x < 0.5 * self.radius && y > 0.0 {
                val = 0.0;
            }
            // Narrower notch below the axis on the -x side only.
            if y < -0.2 * self.radius && y > -0.4 * self.radius && x < 0.0 {
                val = 0.0;
            }
            *v = val;
        }
        transmission_to_phasor(t)
    }
}

/// Aperture with a Gaussian amplitude profile.
///
/// Amplitude is `exp(-(x^2 + y^2) / w^2)` with `w = fwhm / (2 sqrt(ln 2))`,
/// so the amplitude is 1 at the origin, 0.5 one intensity half-width at
/// half-max out, and `exp(-1)` at one Gaussian radius `w`.
#[derive(Debug, Clone)]
pub struct GaussianAperture {
    fwhm: f64,
    w: f64,
}

impl GaussianAperture {
    /// Gaussian with the given intensity full-width at half-max in meters.
    pub fn new(fwhm: f64) -> Result<Self> {
        require_positive("fwhm", fwhm)?;
        Ok(GaussianAperture {
            fwhm,
            w: fwhm / (2.0 * (2.0_f64.ln()).sqrt()),
        })
    }

    /// The intensity full-width at half-max.
    pub fn fwhm(&self) -> f64 {
        self.fwhm
    }

    /// The Gaussian 1/e amplitude radius.
    pub fn w(&self) -> f64 {
        self.w
    }
}

impl OpticalElement for GaussianAperture {
    fn name(&self) -> &str {
        "gaussian aperture"
    }

    fn plane(&self) -> Option<PlaneType> {
        Some(PlaneType::Pupil)
    }

    fn phasor(&self, grid: &CoordinateGrid) -> Array2<Complex64> {
        let w2 = self.w * self.w;
        let mut t = Array2::zeros(grid.shape());
        for ((i, j), v) in t.indexed_iter_mut() {
            let (x, y) = (grid.x[[i, j]], grid.y[[i, j]]);
            *v = (-(x * x + y * y) / w2).exp();
        }
        transmission_to_phasor(t)
    }
}

/// Central secondary-mirror obscuration with optional spider supports.
///
/// An opaque disk at the center unioned with rectangular struts running from
/// the center outward at the given angles (degrees counterclockwise from
/// +y), combined with the surrounding transmission by elementwise product.
#[derive(Debug, Clone)]
pub struct SecondaryObscuration {
    secondary_radius: f64,
    support_angles: Vec<f64>,
    support_width: f64,
}

impl SecondaryObscuration {
    /// Obscuration with `n_supports` struts spaced uniformly in angle.
    pub fn new(secondary_radius: f64, n_supports: usize, support_width: f64) -> Result<Self> {
        let angles = (0..n_supports)
            .map(|k| k as f64 * 360.0 / n_supports.max(1) as f64)
            .collect();
        Self::asymmetric(secondary_radius, angles, support_width)
    }

    /// Obscuration with struts at arbitrary angles, e.g. an off-axis tripod.
    pub fn asymmetric(
        secondary_radius: f64,
        support_angles: Vec<f64>,
        support_width: f64,
    ) -> Result<Self> {
        require_non_negative("secondary_radius", secondary_radius)?;
        require_non_negative("support_width", support_width)?;
        Ok(SecondaryObscuration {
            secondary_radius,
            support_angles,
            support_width,
        })
    }
}

impl OpticalElement for SecondaryObscuration {
    fn name(&self) -> &str {
        "secondary obscuration"
    }

    fn plane(&self) -> Option<PlaneType> {
        Some(PlaneType::Pupil)
    }

    fn phasor(&self, grid: &CoordinateGrid) -> Array2<Complex64> {
        let p = grid.pixelscale;
        let half_w = self.support_width / 2.0;
        let rotations: Vec<(f64, f64)> = self
            .support_angles
            .iter()
            .map(|a| a.to_radians().sin_cos())
            .collect();
        let mut t = Array2::zeros(grid.shape());
        for ((i, j), v) in t.indexed_iter_mut() {
            let (x, y) = (grid.x[[i, j]], grid.y[[i, j]]);
            let r = (x * x + y * y).sqrt();
            let mut val = 1.0 - radial_ramp(r, self.secondary_radius, p);
            for &(sin_a, cos_a) in &rotations {
                // Strut frame: the strut runs along +y'.
                let xs = x * cos_a + y * sin_a;
                let ys = y * cos_a - x * sin_a;
                if ys >= 0.0 {
                    val *= 1.0 - cell_coverage(xs, half_w, p);
                }
            }
            *v = snap_unit(val.clamp(0.0, 1.0));
        }
        transmission_to_phasor(t)
    }
}
