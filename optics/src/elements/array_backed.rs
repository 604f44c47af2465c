//! Optics defined by sampled arrays instead of analytic profiles.

use ndarray::Array2;
use rustfft::num_complex::Complex64;

use super::{OpticalElement, SampleKind};
use crate::coordinates::CoordinateGrid;
use crate::error::{OpticsError, Result};
use crate::resample::BilinearSampler;
use crate::wavefront::PlaneType;

/// Optic backed by measured or precomputed amplitude and path-length arrays.
///
/// The amplitude transmission and the optical path difference (OPD, in
/// meters) are each a square array sampled at `pixelscale` units per pixel.
/// The OPD converts to phase at whatever wavelength the incoming wavefront
/// carries. When a wavefront's grid matches the stored sampling the arrays
/// pass through untouched; otherwise both are interpolated onto the
/// wavefront's grid, reading as opaque beyond their sampled extent.
pub struct ArrayOpticalElement {
    name: String,
    amplitude: Array2<f64>,
    opd: Array2<f64>,
    pixelscale: f64,
    plane: PlaneType,
}

impl ArrayOpticalElement {
    /// Build from an amplitude array and an optional OPD array of the same
    /// shape. Arrays must be square and non-empty.
    pub fn new(
        name: impl Into<String>,
        amplitude: Array2<f64>,
        opd: Option<Array2<f64>>,
        pixelscale: f64,
        plane: PlaneType,
    ) -> Result<Self> {
        let (ny, nx) = amplitude.dim();
        if ny != nx || nx == 0 {
            return Err(OpticsError::ResampleFailure(format!(
                "amplitude array must be square and non-empty, got {ny}x{nx}"
            )));
        }
        if !pixelscale.is_finite() || pixelscale <= 0.0 {
            return Err(OpticsError::ResampleFailure(format!(
                "pixelscale must be finite and positive, got {pixelscale}"
            )));
        }
        let opd = match opd {
            Some(o) => {
                if o.dim() != amplitude.dim() {
                    return Err(OpticsError::ResampleFailure(format!(
                        "OPD shape {:?} does not match amplitude shape {:?}",
                        o.dim(),
                        amplitude.dim()
                    )));
                }
                o
            }
            None => Array2::zeros(amplitude.dim()),
        };
        Ok(ArrayOpticalElement {
            name: name.into(),
            amplitude,
            opd,
            pixelscale,
            plane,
        })
    }

    /// Freeze an analytic optic into a sampled one on an `npix` grid
    /// spanning `grid_size` units.
    pub fn from_analytic(
        optic: &dyn OpticalElement,
        npix: usize,
        grid_size: f64,
        wavelength: f64,
    ) -> Result<Self> {
        if npix == 0 {
            return Err(OpticsError::InvalidParameter {
                name: "npix",
                value: 0.0,
            });
        }
        let amplitude = optic.sample(npix, grid_size, wavelength, SampleKind::Amplitude);
        let phase = optic.sample(npix, grid_size, wavelength, SampleKind::Phase);
        let opd = phase.mapv(|p| p * wavelength / (2.0 * std::f64::consts::PI));
        Ok(ArrayOpticalElement {
            name: format!("{} (sampled)", optic.name()),
            amplitude,
            opd,
            pixelscale: grid_size / npix as f64,
            plane: optic.plane().unwrap_or(PlaneType::Pupil),
        })
    }

    pub fn amplitude(&self) -> &Array2<f64> {
        &self.amplitude
    }

    pub fn opd(&self) -> &Array2<f64> {
        &self.opd
    }

    pub fn pixelscale(&self) -> f64 {
        self.pixelscale
    }

    fn matches_grid(&self, grid: &CoordinateGrid) -> bool {
        grid.shape() == self.amplitude.dim()
            && ((grid.pixelscale - self.pixelscale) / self.pixelscale).abs() < 1e-9
    }
}

impl OpticalElement for ArrayOpticalElement {
    fn name(&self) -> &str {
        &self.name
    }

    fn plane(&self) -> Option<PlaneType> {
        Some(self.plane)
    }

    fn phasor(&self, grid: &CoordinateGrid) -> Array2<Complex64> {
        let two_pi = 2.0 * std::f64::consts::PI;
        if self.matches_grid(grid) {
            let mut out = Array2::from_elem(grid.shape(), Complex64::new(0.0, 0.0));
            for ((i, j), v) in out.indexed_iter_mut() {
                *v = Complex64::from_polar(
                    self.amplitude[[i, j]],
                    two_pi * self.opd[[i, j]] / grid.wavelength,
                );
            }
            return out;
        }

        // Grid mismatch: interpolate onto the wavefront's sampling. The
        // constructor guarantees square non-empty arrays, so the samplers
        // cannot fail.
        let amp = BilinearSampler::new(&self.amplitude, self.pixelscale);
        let opd = BilinearSampler::new(&self.opd, self.pixelscale);
        let (amp, opd) = match (amp, opd) {
            (Ok(a), Ok(o)) => (a, o),
            _ => return Array2::from_elem(grid.shape(), Complex64::new(0.0, 0.0)),
        };
        let mut out = Array2::from_elem(grid.shape(), Complex64::new(0.0, 0.0));
        for ((i, j), v) in out.indexed_iter_mut() {
            let (x, y) = (grid.x[[i, j]], grid.y[[i, j]]);
            let a = amp.sample_or(x, y, 0.0);
            let p = two_pi * opd.sample_or(x, y, 0.0) / grid.wavelength;
            *v = Complex64::from_polar(a, p);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::ParityTestAperture;
    use crate::wavefront::Wavefront;

    #[test]
    fn analytic_round_trip_is_exact() {
        let optic = ParityTestAperture::new();
        let array = optic.sample(512, 4.0, 1e-6, SampleKind::Amplitude);

        let frozen = ArrayOpticalElement::from_analytic(&optic, 512, 4.0, 1e-6).unwrap();
        assert_eq!(frozen.amplitude(), &array);

        // On a matching grid the frozen optic reproduces the analytic one
        // bit for bit.
        let grid = CoordinateGrid::centered(512, 4.0 / 512.0, 1e-6, PlaneType::Pupil);
        let direct = optic.phasor(&grid).mapv(|v| v.norm());
        let sampled = frozen.phasor(&grid).mapv(|v| v.norm());
        assert_eq!(direct, sampled);
    }

    #[test]
    fn opd_becomes_wavelength_dependent_phase() {
        // A quarter-wave of OPD at 1 micron is an eighth-wave at 2 microns.
        let npix = 4;
        let amplitude = Array2::ones((npix, npix));
        let opd = Array2::from_elem((npix, npix), 0.25e-6);
        let optic = ArrayOpticalElement::new(
            "plate",
            amplitude,
            Some(opd),
            0.1,
            PlaneType::Pupil,
        )
        .unwrap();

        let grid1 = CoordinateGrid::centered(npix, 0.1, 1e-6, PlaneType::Pupil);
        let grid2 = CoordinateGrid::centered(npix, 0.1, 2e-6, PlaneType::Pupil);
        let p1 = optic.phasor(&grid1)[[0, 0]];
        let p2 = optic.phasor(&grid2)[[0, 0]];
        assert!((p1.arg() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!((p2.arg() - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
    }

    #[test]
    fn mismatched_grid_interpolates_and_darkens_outside() {
        let amplitude = Array2::ones((8, 8));
        let optic =
            ArrayOpticalElement::new("patch", amplitude, None, 0.1, PlaneType::Pupil).unwrap();

        // A wider, coarser grid: the patch covers only the middle.
        let grid = CoordinateGrid::centered(16, 0.2, 1e-6, PlaneType::Pupil);
        let phasor = optic.phasor(&grid);
        let center = phasor[[8, 8]].norm();
        let corner = phasor[[0, 0]].norm();
        assert!((center - 1.0).abs() < 1e-12);
        assert_eq!(corner, 0.0);
    }

    #[test]
    fn rejects_mismatched_opd_shape() {
        let amplitude = Array2::ones((4, 4));
        let opd = Array2::zeros((5, 5));
        assert!(ArrayOpticalElement::new(
            "bad",
            amplitude,
            Some(opd),
            0.1,
            PlaneType::Pupil
        )
        .is_err());
    }

    #[test]
    fn multiplies_into_a_matching_wavefront() {
        let optic = ArrayOpticalElement::from_analytic(
            &ParityTestAperture::new(),
            100,
            10.0,
            1e-6,
        )
        .unwrap();
        let mut wave = Wavefront::pupil(100, 1e-6, 10.0).unwrap();
        wave.multiply_by(&optic).unwrap();
        assert!(wave.total_intensity() > 0.0);
    }
}
