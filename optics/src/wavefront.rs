//! Sampled complex wavefront at a single optical plane.
//!
//! A [`Wavefront`] is a 2D complex field plus the physical metadata needed to
//! interpret it: wavelength, pixel scale, and plane type. All operations
//! mutate the field in place; no operation allocates a new wavefront. A
//! wavefront is created once per wavelength by the optical system, pushed
//! through the train by alternating optic multiplications and propagations,
//! and discarded after its detector-plane intensity is extracted.

use std::fmt;

use ndarray::Array2;
use rustfft::num_complex::Complex64;

use crate::coordinates::CoordinateGrid;
use crate::elements::OpticalElement;
use crate::error::{require_positive, OpticsError, Result};
use crate::propagation;

/// Which conjugate plane a wavefront or optic lives in.
///
/// The plane type determines which propagation kernel applies when advancing
/// to the next stage: Pupil <-> Image transitions are far-field (Fraunhofer)
/// jumps; same-plane moves over a finite distance are near-field (Fresnel).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneType {
    /// Conjugate to the telescope aperture; spatial coordinates in meters.
    Pupil,
    /// Focal-plane conjugate; angular coordinates in arcseconds.
    Image,
    /// A free-space plane between conjugates; reached only by Fresnel steps.
    Intermediate,
}

impl fmt::Display for PlaneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaneType::Pupil => write!(f, "pupil"),
            PlaneType::Image => write!(f, "image"),
            PlaneType::Intermediate => write!(f, "intermediate"),
        }
    }
}

/// Complex optical field sampled at one plane.
#[derive(Debug, Clone)]
pub struct Wavefront {
    pub(crate) field: Array2<Complex64>,
    pub(crate) wavelength: f64,
    pub(crate) pixelscale: f64,
    pub(crate) plane: PlaneType,
}

impl Wavefront {
    /// Plane wavefront at an entrance pupil of physical diameter `diam`
    /// meters, sampled on `npix` x `npix` pixels (pixel scale `diam/npix`
    /// meters per pixel). The field starts as uniform unit amplitude.
    pub fn pupil(npix: usize, wavelength: f64, diam: f64) -> Result<Self> {
        if npix == 0 {
            return Err(OpticsError::InvalidParameter {
                name: "npix",
                value: 0.0,
            });
        }
        require_positive("wavelength", wavelength)?;
        require_positive("diam", diam)?;
        Ok(Wavefront {
            field: Array2::from_elem((npix, npix), Complex64::new(1.0, 0.0)),
            wavelength,
            pixelscale: diam / npix as f64,
            plane: PlaneType::Pupil,
        })
    }

    /// Plane wavefront at an image plane with the given angular pixel scale
    /// in arcsec/pixel.
    pub fn image(npix: usize, wavelength: f64, pixelscale: f64) -> Result<Self> {
        if npix == 0 {
            return Err(OpticsError::InvalidParameter {
                name: "npix",
                value: 0.0,
            });
        }
        require_positive("wavelength", wavelength)?;
        require_positive("pixelscale", pixelscale)?;
        Ok(Wavefront {
            field: Array2::from_elem((npix, npix), Complex64::new(1.0, 0.0)),
            wavelength,
            pixelscale,
            plane: PlaneType::Image,
        })
    }

    /// The complex field.
    pub fn field(&self) -> &Array2<Complex64> {
        &self.field
    }

    /// Grid dimensions as (rows, cols).
    pub fn shape(&self) -> (usize, usize) {
        self.field.dim()
    }

    /// Samples along one side of the (square) grid.
    pub fn npix(&self) -> usize {
        self.field.nrows()
    }

    /// Wavelength in meters.
    pub fn wavelength(&self) -> f64 {
        self.wavelength
    }

    /// Physical units per pixel: meters in pupil planes, arcsec in image
    /// planes. Changes after every propagation.
    pub fn pixelscale(&self) -> f64 {
        self.pixelscale
    }

    /// Current plane type.
    pub fn plane(&self) -> PlaneType {
        self.plane
    }

    /// Magnitude of the complex field.
    pub fn amplitude(&self) -> Array2<f64> {
        self.field.mapv(|v| v.norm())
    }

    /// Argument of the complex field in radians.
    pub fn phase(&self) -> Array2<f64> {
        self.field.mapv(|v| v.arg())
    }

    /// Squared amplitude.
    pub fn intensity(&self) -> Array2<f64> {
        self.field.mapv(|v| v.norm_sqr())
    }

    /// Total intensity summed over the grid.
    pub fn total_intensity(&self) -> f64 {
        self.field.iter().map(|v| v.norm_sqr()).sum()
    }

    /// Physical (x, y) coordinate grids for the current sampling, using the
    /// shared centering convention of [`crate::coordinates`].
    pub fn coordinates(&self) -> (Array2<f64>, Array2<f64>) {
        let grid = self.coordinate_grid();
        (grid.x, grid.y)
    }

    /// The full coordinate grid handed to optics during multiplication.
    pub fn coordinate_grid(&self) -> CoordinateGrid {
        CoordinateGrid::centered(self.npix(), self.pixelscale, self.wavelength, self.plane)
    }

    /// Multiply the field in place by an optic's phasor sampled on this
    /// wavefront's grid.
    ///
    /// Fails with [`OpticsError::PlaneMismatch`] if the optic declares a
    /// plane type other than the wavefront's current plane. Never changes
    /// the grid shape or plane type, only the field values.
    pub fn multiply_by(&mut self, optic: &dyn OpticalElement) -> Result<()> {
        if let Some(declared) = optic.plane() {
            if declared != self.plane {
                return Err(OpticsError::PlaneMismatch {
                    optic: optic.name().to_owned(),
                    declared,
                    actual: self.plane,
                });
            }
        }
        let phasor = optic.phasor(&self.coordinate_grid());
        self.field.zip_mut_with(&phasor, |f, p| *f *= *p);
        Ok(())
    }

    /// Rescale the field so the total intensity is 1.
    ///
    /// A wavefront with zero total intensity (e.g. after a zero-transmission
    /// optic) is left unchanged; all-dark is a valid state.
    pub fn normalize(&mut self) {
        let total = self.total_intensity();
        if total > 0.0 {
            let scale = 1.0 / total.sqrt();
            self.field.mapv_inplace(|v| v * scale);
        }
    }

    /// Advance the field from its current plane to `plane`.
    ///
    /// Pupil -> Image and Image -> Pupil use the far-field (Fraunhofer)
    /// kernel, which rescales the pixel scale by the Fourier reciprocity
    /// relation `wavelength / (npix * pixelscale)`. Same-plane transitions
    /// with a `distance` (meters) use the near-field (Fresnel) kernel;
    /// without a distance they are a no-op. Coordinates must be re-derived
    /// after propagation since the pixel scale changes.
    pub fn propagate_to(&mut self, plane: PlaneType, distance: Option<f64>) -> Result<()> {
        match (self.plane, plane) {
            // Intermediate planes live in pupil space, so leaving one for an
            // image plane is still a far-field jump.
            (PlaneType::Pupil | PlaneType::Intermediate, PlaneType::Image) => {
                propagation::fraunhofer_pupil_to_image(self);
            }
            (PlaneType::Image, PlaneType::Pupil) => {
                propagation::fraunhofer_image_to_pupil(self);
            }
            (PlaneType::Intermediate, PlaneType::Pupil) => {
                if let Some(d) = distance {
                    propagation::fresnel_same_plane(self, d);
                }
                self.plane = PlaneType::Pupil;
            }
            (from, to) if from == to || to == PlaneType::Intermediate => {
                if let Some(d) = distance {
                    propagation::fresnel_same_plane(self, d);
                }
                self.plane = to;
            }
            (from, to) => {
                return Err(OpticsError::PlaneMismatch {
                    optic: "free-space propagation".to_owned(),
                    declared: to,
                    actual: from,
                });
            }
        }
        Ok(())
    }

    /// Zero-pad or crop the field about its center (used by the optical
    /// system to reach the oversampled grid before the first far-field jump).
    pub(crate) fn resize_field(&mut self, npix: usize) {
        if npix != self.npix() {
            self.field = crate::fourier::resize_centered(&self.field, npix);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::masks::ScalarTransmission;
    use float_cmp::approx_eq;

    #[test]
    fn pupil_constructor_sets_pixelscale_from_diameter() {
        let w = Wavefront::pupil(100, 1e-6, 10.0).unwrap();
        assert_eq!(w.plane(), PlaneType::Pupil);
        assert!(approx_eq!(f64, w.pixelscale(), 0.1, epsilon = 1e-12));
        assert!(approx_eq!(f64, w.total_intensity(), 1e4, epsilon = 1e-6));
    }

    #[test]
    fn constructors_reject_bad_parameters() {
        assert!(Wavefront::pupil(0, 1e-6, 1.0).is_err());
        assert!(Wavefront::pupil(64, -1e-6, 1.0).is_err());
        assert!(Wavefront::image(64, 1e-6, 0.0).is_err());
    }

    #[test]
    fn multiply_preserves_shape_and_plane() {
        let mut w = Wavefront::image(64, 1e-6, 0.1).unwrap();
        let t = ScalarTransmission::new(0.5).unwrap();
        w.multiply_by(&t).unwrap();
        assert_eq!(w.shape(), (64, 64));
        assert_eq!(w.plane(), PlaneType::Image);
        assert!(approx_eq!(
            f64,
            w.intensity()[[10, 20]],
            0.25,
            epsilon = 1e-12
        ));
    }

    #[test]
    fn normalize_is_idempotent_on_dark_field() {
        let mut w = Wavefront::pupil(32, 1e-6, 1.0).unwrap();
        let dark = ScalarTransmission::new(0.0).unwrap();
        w.multiply_by(&dark).unwrap();
        w.normalize();
        assert_eq!(w.total_intensity(), 0.0);
    }

    #[test]
    fn fraunhofer_round_trip_restores_field() {
        let mut w = Wavefront::pupil(64, 1e-6, 1.0).unwrap();
        let before = w.field().clone();
        let scale_before = w.pixelscale();
        w.propagate_to(PlaneType::Image, None).unwrap();
        assert_eq!(w.plane(), PlaneType::Image);
        w.propagate_to(PlaneType::Pupil, None).unwrap();
        assert!(approx_eq!(f64, w.pixelscale(), scale_before, epsilon = 1e-15));
        for (a, b) in before.iter().zip(w.field().iter()) {
            assert!(approx_eq!(f64, a.re, b.re, epsilon = 1e-10));
            assert!(approx_eq!(f64, a.im, b.im, epsilon = 1e-10));
        }
    }

    #[test]
    fn same_plane_without_distance_is_noop() {
        let mut w = Wavefront::pupil(32, 1e-6, 1.0).unwrap();
        let before = w.field().clone();
        w.propagate_to(PlaneType::Pupil, None).unwrap();
        assert_eq!(w.field(), &before);
    }

    #[test]
    fn propagation_conserves_energy() {
        let mut w = Wavefront::pupil(64, 1e-6, 1.0).unwrap();
        w.normalize();
        w.propagate_to(PlaneType::Image, None).unwrap();
        assert!(approx_eq!(f64, w.total_intensity(), 1.0, epsilon = 1e-9));
    }
}
