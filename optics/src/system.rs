//! Assembling optics into a system and computing its point spread function.
//!
//! An [`OpticalSystem`] is an ordered list of planes, each optionally
//! holding an optic, terminated by a [`Detector`]. A monochromatic
//! calculation seeds a flat wavefront at the entrance pupil, walks it
//! through every plane with the appropriate far- or near-field propagator,
//! and reads the intensity out on the detector grid. Broadband calculations
//! run the monochromatic ones in parallel and combine them with source
//! weights.

use log::{debug, info};
use ndarray::Array2;
use rayon::prelude::*;

use crate::elements::OpticalElement;
use crate::error::{require_positive, OpticsError, Result};
use crate::propagation::RAD_TO_ARCSEC;
use crate::resample::{bin_by_factor, resample_centered};
use crate::wavefront::{PlaneType, Wavefront};

/// One plane in the optical train.
struct Stage {
    plane: PlaneType,
    optic: Option<Box<dyn OpticalElement>>,
    /// Propagation distance in meters for intermediate planes.
    distance: Option<f64>,
}

/// Detector readout geometry.
#[derive(Debug, Clone)]
pub struct Detector {
    pixelscale: f64,
    fov_pixels: usize,
    oversample: usize,
}

impl Detector {
    /// Detector with `fov_pixels` square pixels of `pixelscale` arcsec each.
    pub fn new(pixelscale: f64, fov_pixels: usize) -> Result<Self> {
        require_positive("pixelscale", pixelscale)?;
        if fov_pixels == 0 {
            return Err(OpticsError::InvalidParameter {
                name: "fov_pixels",
                value: 0.0,
            });
        }
        Ok(Detector {
            pixelscale,
            fov_pixels,
            oversample: 1,
        })
    }

    /// Detector sized to cover at least `fov_arcsec` on a side.
    pub fn with_fov_arcsec(pixelscale: f64, fov_arcsec: f64) -> Result<Self> {
        require_positive("fov_arcsec", fov_arcsec)?;
        require_positive("pixelscale", pixelscale)?;
        let fov_pixels = (fov_arcsec / pixelscale).round().max(1.0) as usize;
        Detector::new(pixelscale, fov_pixels)
    }

    /// Compute on a grid `factor` times finer than the detector pixels,
    /// then bin back down. Also pads the pupil by the same factor for
    /// finer native image sampling. A factor of 0 is rejected.
    pub fn with_oversample(mut self, factor: usize) -> Result<Self> {
        if factor == 0 {
            return Err(OpticsError::InvalidParameter {
                name: "oversample",
                value: 0.0,
            });
        }
        self.oversample = factor;
        Ok(self)
    }

    pub fn pixelscale(&self) -> f64 {
        self.pixelscale
    }

    pub fn fov_pixels(&self) -> usize {
        self.fov_pixels
    }

    pub fn oversample(&self) -> usize {
        self.oversample
    }
}

/// A computed point spread function.
#[derive(Debug, Clone)]
pub struct Psf {
    data: Array2<f64>,
    pixelscale: f64,
    wavelengths: Vec<f64>,
}

impl Psf {
    /// Intensity image, rows along y.
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Output pixel scale in arcsec per pixel.
    pub fn pixelscale(&self) -> f64 {
        self.pixelscale
    }

    /// The wavelengths that contributed, in meters.
    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    /// Summed intensity over the field of view.
    pub fn total_intensity(&self) -> f64 {
        self.data.sum()
    }

    /// Largest pixel value.
    pub fn peak(&self) -> f64 {
        self.data.iter().cloned().fold(0.0, f64::max)
    }
}

/// An ordered train of optical planes.
pub struct OpticalSystem {
    name: String,
    npix: usize,
    pupil_diameter: f64,
    stages: Vec<Stage>,
    detector: Option<Detector>,
}

impl OpticalSystem {
    /// System sampled with `npix` pixels across a `pupil_diameter` meter
    /// entrance pupil.
    pub fn new(name: impl Into<String>, npix: usize, pupil_diameter: f64) -> Result<Self> {
        if npix == 0 {
            return Err(OpticsError::InvalidParameter {
                name: "npix",
                value: 0.0,
            });
        }
        require_positive("pupil_diameter", pupil_diameter)?;
        Ok(OpticalSystem {
            name: name.into(),
            npix,
            pupil_diameter,
            stages: Vec::new(),
            detector: None,
        })
    }

    /// Append a pupil-plane optic.
    pub fn add_pupil(&mut self, optic: Box<dyn OpticalElement>) -> Result<&mut Self> {
        self.add_stage(PlaneType::Pupil, Some(optic), None)
    }

    /// Append an empty pupil plane.
    pub fn add_empty_pupil(&mut self) -> &mut Self {
        self.stages.push(Stage {
            plane: PlaneType::Pupil,
            optic: None,
            distance: None,
        });
        self
    }

    /// Append an image-plane optic such as a field stop or occulter.
    pub fn add_image(&mut self, optic: Box<dyn OpticalElement>) -> Result<&mut Self> {
        self.add_stage(PlaneType::Image, Some(optic), None)
    }

    /// Append an empty image plane.
    pub fn add_empty_image(&mut self) -> &mut Self {
        self.stages.push(Stage {
            plane: PlaneType::Image,
            optic: None,
            distance: None,
        });
        self
    }

    /// Append an intermediate plane reached by near-field propagation over
    /// `distance` meters from the previous plane.
    pub fn add_intermediate(
        &mut self,
        distance: f64,
        optic: Option<Box<dyn OpticalElement>>,
    ) -> Result<&mut Self> {
        self.add_stage(PlaneType::Intermediate, optic, Some(distance))
    }

    fn add_stage(
        &mut self,
        plane: PlaneType,
        optic: Option<Box<dyn OpticalElement>>,
        distance: Option<f64>,
    ) -> Result<&mut Self> {
        if let Some(optic) = &optic {
            if let Some(declared) = optic.plane() {
                if declared != plane {
                    return Err(OpticsError::PlaneMismatch {
                        optic: optic.name().to_string(),
                        declared,
                        actual: plane,
                    });
                }
            }
        }
        self.stages.push(Stage {
            plane,
            optic,
            distance,
        });
        Ok(self)
    }

    /// Terminate the system with a detector readout.
    pub fn add_detector(&mut self, detector: Detector) -> &mut Self {
        self.detector = Some(detector);
        self
    }

    fn oversample(&self) -> usize {
        self.detector.as_ref().map_or(1, Detector::oversample)
    }

    /// Check the train is complete before spending any FFTs on it.
    fn validate(&self) -> Result<&Detector> {
        match self.stages.first() {
            None => {
                return Err(OpticsError::IncompleteSystem(
                    "optical system has no planes",
                ))
            }
            Some(stage) if stage.plane != PlaneType::Pupil => {
                return Err(OpticsError::IncompleteSystem(
                    "first plane must be the entrance pupil",
                ))
            }
            Some(_) => {}
        }
        self.detector
            .as_ref()
            .ok_or(OpticsError::IncompleteSystem("no detector at the end"))
    }

    /// Propagate a monochromatic wavefront through every plane, leaving it
    /// at the last declared plane.
    fn propagate(&self, wavelength: f64) -> Result<Wavefront> {
        let mut wave = Wavefront::pupil(self.npix, wavelength, self.pupil_diameter)?;
        for (index, stage) in self.stages.iter().enumerate() {
            wave.propagate_to(stage.plane, stage.distance)?;
            if let Some(optic) = &stage.optic {
                debug!(
                    "{}: applying '{}' at {} plane",
                    self.name,
                    optic.name(),
                    stage.plane
                );
                wave.multiply_by(optic.as_ref())?;
            }
            if index == 0 {
                // Unit total intensity entering the system.
                wave.normalize();
                // Pad the entrance pupil before the first transform so
                // every image plane comes out oversampled.
                let oversample = self.oversample();
                if oversample > 1 {
                    wave.resize_field(self.npix * oversample);
                }
            }
        }
        Ok(wave)
    }

    /// Read the wavefront's intensity out onto the detector grid.
    fn read_out(&self, mut wave: Wavefront, detector: &Detector) -> Result<Psf> {
        wave.propagate_to(PlaneType::Image, None)?;
        let fine_scale = detector.pixelscale / detector.oversample as f64;
        let fine_npix = detector.fov_pixels * detector.oversample;
        let fine = resample_centered(&wave.intensity(), wave.pixelscale(), fine_npix, fine_scale)?;
        let data = bin_by_factor(&fine, detector.oversample)?;
        Ok(Psf {
            data,
            pixelscale: detector.pixelscale,
            wavelengths: vec![wave.wavelength()],
        })
    }

    /// Native image-plane pixel scale in arcsec per pixel for a
    /// monochromatic calculation, before any detector resampling.
    pub fn native_image_pixelscale(&self, wavelength: f64) -> f64 {
        let npix = self.npix * self.oversample();
        let pupil_pixelscale = self.pupil_diameter / self.npix as f64;
        wavelength / (npix as f64 * pupil_pixelscale) * RAD_TO_ARCSEC
    }

    /// Compute the monochromatic point spread function.
    pub fn calc_psf(&self, wavelength: f64) -> Result<Psf> {
        require_positive("wavelength", wavelength)?;
        let detector = self.validate()?;
        info!(
            "{}: monochromatic calculation at {:.4} um across {} planes",
            self.name,
            wavelength * 1e6,
            self.stages.len()
        );
        let wave = self.propagate(wavelength)?;
        self.read_out(wave, detector)
    }

    /// Compute a broadband point spread function from weighted wavelengths.
    ///
    /// Weights are normalized to unit sum. The monochromatic calculations
    /// run in parallel but combine in input order, so the result is
    /// deterministic.
    pub fn calc_psf_broadband(&self, source: &[(f64, f64)]) -> Result<Psf> {
        if source.is_empty() {
            return Err(OpticsError::IncompleteSystem(
                "broadband source has no wavelengths",
            ));
        }
        for &(wavelength, weight) in source {
            require_positive("wavelength", wavelength)?;
            require_positive("weight", weight)?;
        }
        let weight_sum: f64 = source.iter().map(|&(_, w)| w).sum();
        info!(
            "{}: broadband calculation over {} wavelengths",
            self.name,
            source.len()
        );

        let monochromatic: Vec<Psf> = source
            .par_iter()
            .map(|&(wavelength, _)| self.calc_psf(wavelength))
            .collect::<Result<_>>()?;

        let mut data = Array2::zeros(monochromatic[0].data.dim());
        let mut wavelengths = Vec::with_capacity(source.len());
        for (psf, &(wavelength, weight)) in monochromatic.iter().zip(source) {
            if psf.data.dim() != data.dim() {
                return Err(OpticsError::ResampleFailure(format!(
                    "wavelength {:.4} um produced a {:?} image, expected {:?}",
                    wavelength * 1e6,
                    psf.data.dim(),
                    data.dim()
                )));
            }
            data.scaled_add(weight / weight_sum, &psf.data);
            wavelengths.push(wavelength);
        }
        Ok(Psf {
            data,
            pixelscale: monochromatic[0].pixelscale,
            wavelengths,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{
        CircularAperture, CompoundAnalyticOptic, SquareFieldStop, ThinLens,
    };

    fn airy_system() -> OpticalSystem {
        let mut osys = OpticalSystem::new("airy", 256, 2.0).unwrap();
        osys.add_pupil(Box::new(CircularAperture::new(1.0).unwrap()))
            .unwrap();
        osys.add_detector(Detector::new(0.05, 128).unwrap());
        osys
    }

    #[test]
    fn empty_system_is_rejected() {
        let osys = OpticalSystem::new("empty", 64, 1.0).unwrap();
        assert!(matches!(
            osys.calc_psf(1e-6),
            Err(OpticsError::IncompleteSystem(_))
        ));
    }

    #[test]
    fn airy_psf_peaks_at_center_and_conserves_flux() {
        let psf = airy_system().calc_psf(1e-6).unwrap();
        assert_eq!(psf.data().dim(), (128, 128));
        // Detector FOV captures nearly all the light.
        let total = psf.total_intensity();
        assert!(total > 0.9 && total < 1.02, "total {total}");
        // Peak sits in the central 2x2 (even grid).
        let (mut pi, mut pj, mut pv) = (0, 0, 0.0);
        for ((i, j), &v) in psf.data().indexed_iter() {
            if v > pv {
                (pi, pj, pv) = (i, j, v);
            }
        }
        assert!((63..=64).contains(&pi) && (63..=64).contains(&pj));
    }

    #[test]
    fn entrance_plane_must_be_a_pupil() {
        let mut osys = OpticalSystem::new("backwards", 64, 1.0).unwrap();
        osys.add_empty_image();
        osys.add_detector(Detector::new(0.05, 32).unwrap());
        assert!(matches!(
            osys.calc_psf(1e-6),
            Err(OpticsError::IncompleteSystem(_))
        ));
    }

    #[test]
    fn missing_detector_is_rejected() {
        let mut osys = OpticalSystem::new("headless", 64, 1.0).unwrap();
        osys.add_pupil(Box::new(CircularAperture::new(0.5).unwrap()))
            .unwrap();
        assert!(matches!(
            osys.calc_psf(1e-6),
            Err(OpticsError::IncompleteSystem(_))
        ));
    }

    #[test]
    fn image_stop_rejects_placement_at_pupil() {
        let mut osys = OpticalSystem::new("bad", 64, 1.0).unwrap();
        let result = osys.add_pupil(Box::new(SquareFieldStop::new(1.0).unwrap()));
        assert!(matches!(result, Err(OpticsError::PlaneMismatch { .. })));
    }

    #[test]
    fn null_planes_do_not_change_the_psf() {
        let pupil_radius = 1.0;
        let mut osys = OpticalSystem::new("padded", 128, 2.0).unwrap();
        osys.add_pupil(Box::new(CircularAperture::new(pupil_radius).unwrap()))
            .unwrap();
        for _ in 0..10 {
            osys.add_empty_image();
            osys.add_empty_pupil();
        }
        osys.add_pupil(Box::new(ThinLens::new(0.5, 1e-6, pupil_radius).unwrap()))
            .unwrap();
        osys.add_detector(Detector::with_fov_arcsec(0.05, 3.0).unwrap());
        let psf = osys.calc_psf(1e-6).unwrap();

        let mut direct = OpticalSystem::new("direct", 128, 2.0).unwrap();
        direct
            .add_pupil(Box::new(CircularAperture::new(pupil_radius).unwrap()))
            .unwrap();
        direct
            .add_pupil(Box::new(ThinLens::new(0.5, 1e-6, pupil_radius).unwrap()))
            .unwrap();
        direct.add_detector(Detector::with_fov_arcsec(0.05, 3.0).unwrap());
        let psf2 = direct.calc_psf(1e-6).unwrap();

        for (a, b) in psf.data().iter().zip(psf2.data().iter()) {
            assert!((a - b).abs() < 1e-8);
        }
    }

    #[test]
    fn compound_optic_matches_separate_planes() {
        let (wavelen, nwaves, r) = (2e-6, 2.0, 1.0);

        let mut compound = OpticalSystem::new("compound", 256, 3.0).unwrap();
        compound
            .add_pupil(Box::new(
                CompoundAnalyticOptic::new(
                    "aperture with lens",
                    vec![
                        Box::new(CircularAperture::new(r).unwrap()),
                        Box::new(ThinLens::new(nwaves, wavelen, r).unwrap()),
                    ],
                )
                .unwrap(),
            ))
            .unwrap();
        compound.add_detector(Detector::new(0.05, 256).unwrap());
        let psf_compound = compound.calc_psf(wavelen).unwrap();

        let mut separate = OpticalSystem::new("separate", 256, 3.0).unwrap();
        separate
            .add_pupil(Box::new(CircularAperture::new(r).unwrap()))
            .unwrap();
        separate
            .add_pupil(Box::new(ThinLens::new(nwaves, wavelen, r).unwrap()))
            .unwrap();
        separate.add_detector(Detector::new(0.05, 256).unwrap());
        let psf_separate = separate.calc_psf(wavelen).unwrap();

        for (a, b) in psf_compound
            .data()
            .iter()
            .zip(psf_separate.data().iter())
        {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn oversampled_detector_bins_back_to_requested_fov() {
        let mut osys = OpticalSystem::new("oversampled", 128, 2.0).unwrap();
        osys.add_pupil(Box::new(CircularAperture::new(1.0).unwrap()))
            .unwrap();
        osys.add_detector(Detector::new(0.05, 64).unwrap().with_oversample(4).unwrap());
        let psf = osys.calc_psf(1e-6).unwrap();
        assert_eq!(psf.data().dim(), (64, 64));
        assert_eq!(psf.pixelscale(), 0.05);
    }

    #[test]
    fn broadband_is_weighted_sum_in_input_order() {
        let osys = airy_system();
        let source = [(0.9e-6, 1.0), (1.0e-6, 2.0), (1.1e-6, 1.0)];
        let broadband = osys.calc_psf_broadband(&source).unwrap();
        assert_eq!(broadband.wavelengths(), &[0.9e-6, 1.0e-6, 1.1e-6]);

        let mut expected = Array2::zeros(broadband.data().dim());
        for &(wl, w) in &source {
            expected.scaled_add(w / 4.0, osys.calc_psf(wl).unwrap().data());
        }
        for (a, b) in broadband.data().iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn broadband_requires_wavelengths() {
        let osys = airy_system();
        assert!(matches!(
            osys.calc_psf_broadband(&[]),
            Err(OpticsError::IncompleteSystem(_))
        ));
    }
}
