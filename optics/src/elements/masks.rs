//! Phase and transmission masks: uniform attenuators, defocus lenses, and
//! band-limited coronagraph occulters.

use ndarray::Array2;
use rustfft::num_complex::Complex64;
use scilib::math::bessel;

use super::{transmission_to_phasor, OpticalElement};
use crate::coordinates::CoordinateGrid;
use crate::error::{require_positive, OpticsError, Result};
use crate::wavefront::PlaneType;

/// Uniform scalar attenuation across the whole plane.
///
/// Usable in any plane; also serves as an explicit "no optic here"
/// placeholder with a transmission of 1.
#[derive(Debug, Clone)]
pub struct ScalarTransmission {
    transmission: f64,
}

impl ScalarTransmission {
    /// Amplitude transmission factor in `[0, 1]`.
    pub fn new(transmission: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&transmission) {
            return Err(OpticsError::InvalidParameter {
                name: "transmission",
                value: transmission,
            });
        }
        Ok(ScalarTransmission { transmission })
    }

    pub fn transmission(&self) -> f64 {
        self.transmission
    }
}

impl OpticalElement for ScalarTransmission {
    fn name(&self) -> &str {
        "scalar transmission"
    }

    fn plane(&self) -> Option<PlaneType> {
        None
    }

    fn phasor(&self, grid: &CoordinateGrid) -> Array2<Complex64> {
        Array2::from_elem(grid.shape(), Complex64::new(self.transmission, 0.0))
    }
}

/// Thin lens adding a rotationally symmetric defocus phase.
///
/// The phase profile is the balanced defocus term `(2t^2 - 1) / 2` in the
/// normalized radius `t = r / radius`, spanning exactly `nwaves` waves from
/// center to edge at the reference wavelength. The profile is held constant
/// beyond `radius`, and the lens applies phase only, leaving amplitude
/// untouched.
#[derive(Debug, Clone)]
pub struct ThinLens {
    nwaves: f64,
    reference_wavelength: f64,
    radius: f64,
}

impl ThinLens {
    /// Lens with `nwaves` waves of defocus at `reference_wavelength` over a
    /// clear aperture of `radius` meters. `nwaves` may be negative.
    pub fn new(nwaves: f64, reference_wavelength: f64, radius: f64) -> Result<Self> {
        require_positive("reference_wavelength", reference_wavelength)?;
        require_positive("radius", radius)?;
        Ok(ThinLens {
            nwaves,
            reference_wavelength,
            radius,
        })
    }
}

impl OpticalElement for ThinLens {
    fn name(&self) -> &str {
        "thin lens"
    }

    fn plane(&self) -> Option<PlaneType> {
        Some(PlaneType::Pupil)
    }

    fn phasor(&self, grid: &CoordinateGrid) -> Array2<Complex64> {
        // Scale the stroke with wavelength so the physical surface, not the
        // phase, is what stays fixed across a broadband calculation.
        let stroke = 2.0 * std::f64::consts::PI * self.nwaves * self.reference_wavelength
            / grid.wavelength;
        grid.radius().mapv(|r| {
            let t = (r / self.radius).min(1.0);
            let phase = stroke * (2.0 * t * t - 1.0) / 2.0;
            Complex64::from_polar(1.0, phase)
        })
    }
}

/// Profile family for [`BandLimitedCoron`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandLimitedKind {
    /// Rotationally symmetric occulter.
    Circular,
    /// Occulter varying along x only.
    Linear,
}

/// Band-limited coronagraph occulting mask.
///
/// The circular profile is `1 - (2 J1(s r) / (s r))^2` and the linear
/// profile `1 - sinc^2(s x)`, both exactly 0 on the optical axis.
#[derive(Debug, Clone)]
pub struct BandLimitedCoron {
    kind: BandLimitedKind,
    sigma: f64,
}

impl BandLimitedCoron {
    /// Mask with scale factor `sigma` in inverse arcseconds.
    pub fn new(kind: BandLimitedKind, sigma: f64) -> Result<Self> {
        require_positive("sigma", sigma)?;
        Ok(BandLimitedCoron { kind, sigma })
    }

    fn circular_profile(&self, r: f64) -> f64 {
        let u = self.sigma * r;
        if u < 1e-10 {
            // 2 J1(u)/u -> 1, so the transmission limit is exactly 0.
            return 0.0;
        }
        // The series evaluation of J1 stops converging around u ~ 100;
        // switch to the large-argument asymptotic form before that.
        let j1 = if u < 80.0 {
            bessel::j_n(1, u)
        } else {
            (2.0 / (std::f64::consts::PI * u)).sqrt()
                * (u - 3.0 * std::f64::consts::FRAC_PI_4).cos()
        };
        let term = 2.0 * j1 / u;
        1.0 - term * term
    }

    fn linear_profile(&self, x: f64) -> f64 {
        let u = self.sigma * x;
        if u.abs() < 1e-10 {
            return 0.0;
        }
        let term = u.sin() / u;
        1.0 - term * term
    }
}

impl OpticalElement for BandLimitedCoron {
    fn name(&self) -> &str {
        "band-limited coronagraph mask"
    }

    fn plane(&self) -> Option<PlaneType> {
        Some(PlaneType::Image)
    }

    fn phasor(&self, grid: &CoordinateGrid) -> Array2<Complex64> {
        let t = match self.kind {
            BandLimitedKind::Circular => {
                grid.radius().mapv(|r| self.circular_profile(r))
            }
            BandLimitedKind::Linear => grid.x.mapv(|x| self.linear_profile(x)),
        };
        transmission_to_phasor(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{CircularAperture, SampleKind};
    use crate::wavefront::Wavefront;

    #[test]
    fn scalar_transmission_broadcasts_uniformly() {
        let wave = Wavefront::pupil(100, 1e-6, 8.0).unwrap();
        for transmission in [1.0, 1.0e-3, 0.0] {
            let optic = ScalarTransmission::new(transmission).unwrap();
            let phasor = optic.phasor(&wave.coordinate_grid());
            assert!(phasor
                .iter()
                .all(|v| v.re == transmission && v.im == 0.0));
        }
        assert!(ScalarTransmission::new(1.5).is_err());
        assert!(ScalarTransmission::new(-0.1).is_err());
    }

    #[test]
    fn thin_lens_phase_spans_exactly_half_wave() {
        let pupil_radius = 1.0;
        let pupil = CircularAperture::new(pupil_radius).unwrap();
        // Half a wave of defocus avoids any phase wrapping.
        let lens = ThinLens::new(0.5, 1e-6, pupil_radius).unwrap();
        // 99 pixels over 3 m: integer pixels per meter and a pixel exactly
        // at the origin, so both phase extremes are sampled on the grid.
        let mut wave = Wavefront::pupil(99, 1e-6, 3.0).unwrap();
        wave.multiply_by(&pupil).unwrap();
        wave.multiply_by(&lens).unwrap();

        let phase = wave.phase();
        let max = phase.iter().cloned().fold(f64::MIN, f64::max);
        let min = phase.iter().cloned().fold(f64::MAX, f64::min);
        assert!((max - std::f64::consts::FRAC_PI_2).abs() < 1e-19);
        assert!((min + std::f64::consts::FRAC_PI_2).abs() < 1e-19);
    }

    #[test]
    fn thin_lens_preserves_amplitude() {
        let lens = ThinLens::new(2.0, 1e-6, 1.5).unwrap();
        let wave = Wavefront::pupil(64, 1e-6, 4.0).unwrap();
        let phasor = lens.phasor(&wave.coordinate_grid());
        for v in phasor.iter() {
            assert!((v.norm() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn band_limited_center_pixel_parity() {
        let halfsize = 5;
        let mask = BandLimitedCoron::new(BandLimitedKind::Circular, 1.0).unwrap();

        // Odd grid: the exact center pixel is 0 and its neighbors match.
        let sample = mask.sample(2 * halfsize + 1, 10.0, 1e-6, SampleKind::Amplitude);
        assert_eq!(sample[[halfsize, halfsize]], 0.0);
        assert_ne!(sample[[halfsize, halfsize]], sample[[halfsize - 1, halfsize]]);
        assert_eq!(
            sample[[halfsize + 1, halfsize]],
            sample[[halfsize - 1, halfsize]]
        );

        // Even grid: no pixel on the axis, the central four are equal.
        let sample2 = mask.sample(2 * halfsize, 10.0, 1e-6, SampleKind::Amplitude);
        assert_ne!(sample2[[halfsize, halfsize]], 0.0);
        assert_eq!(
            sample2[[halfsize - 1, halfsize - 1]],
            sample2[[halfsize, halfsize]]
        );
        assert_eq!(
            sample2[[halfsize - 1, halfsize]],
            sample2[[halfsize, halfsize]]
        );
        assert_eq!(
            sample2[[halfsize, halfsize - 1]],
            sample2[[halfsize, halfsize]]
        );
    }

    #[test]
    fn band_limited_mask_stays_finite_on_wide_grids() {
        // A 50 arcsec field at sigma = 5 pushes the Bessel argument well
        // past the direct-evaluation regime at the grid corners.
        let mask = BandLimitedCoron::new(BandLimitedKind::Circular, 5.0).unwrap();
        let sample = mask.sample(1024, 50.0, 1e-6, SampleKind::Amplitude);
        for &v in sample.iter() {
            assert!(v.is_finite());
            assert!((0.0..=1.0).contains(&v));
        }
        // Far off axis the occulter transmits essentially everything.
        assert!(sample[[0, 0]] > 0.999);
    }

    #[test]
    fn linear_mask_varies_along_x_only() {
        let mask = BandLimitedCoron::new(BandLimitedKind::Linear, 1.0).unwrap();
        let sample = mask.sample(11, 10.0, 1e-6, SampleKind::Amplitude);
        // Zero along the central column, constant along each column.
        for i in 0..11 {
            assert_eq!(sample[[i, 5]], 0.0);
            assert_eq!(sample[[i, 8]], sample[[0, 8]]);
        }
        assert!(sample[[0, 8]] > 0.0);
    }
}
