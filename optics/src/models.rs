//! Ready-made telescope descriptions and their optical systems.

use once_cell::sync::Lazy;
use std::f64::consts::PI;

use crate::elements::{
    CircularAperture, CompoundAnalyticOptic, MultiHexagonAperture, OpticalElement,
    SecondaryObscuration,
};
use crate::error::Result;
use crate::propagation::RAD_TO_ARCSEC;
use crate::system::{Detector, OpticalSystem};

/// Geometry of a telescope entrance pupil.
#[derive(Debug, Clone)]
pub struct TelescopeModel {
    /// Telescope model name or identifier
    pub name: String,
    /// Primary mirror diameter in meters (clear aperture)
    pub diameter_m: f64,
    /// Secondary mirror diameter as a fraction of the primary (0 for none)
    pub secondary_fraction: f64,
    /// Number of secondary support struts
    pub n_supports: usize,
    /// Width of each support strut in meters
    pub support_width_m: f64,
    /// Hexagonal segmentation of the primary: (segment side in meters,
    /// number of rings around the central segment)
    pub hex_segments: Option<(f64, usize)>,
}

impl TelescopeModel {
    /// Monolithic circular telescope, optionally obscured.
    pub fn new(
        name: impl Into<String>,
        diameter_m: f64,
        secondary_fraction: f64,
        n_supports: usize,
        support_width_m: f64,
    ) -> Self {
        TelescopeModel {
            name: name.into(),
            diameter_m,
            secondary_fraction,
            n_supports,
            support_width_m,
            hex_segments: None,
        }
    }

    /// Angular radius of the first Airy minimum in arcseconds.
    pub fn airy_radius_arcsec(&self, wavelength_m: f64) -> f64 {
        1.22 * wavelength_m / self.diameter_m * RAD_TO_ARCSEC
    }

    /// Unobstructed collecting area in square meters.
    pub fn collecting_area_m2(&self) -> f64 {
        let primary = PI * (self.diameter_m / 2.0).powi(2);
        primary * (1.0 - self.secondary_fraction.powi(2))
    }

    /// Build the entrance-pupil optic this model describes.
    pub fn pupil(&self) -> Result<Box<dyn OpticalElement>> {
        if let Some((side, rings)) = self.hex_segments {
            return Ok(Box::new(MultiHexagonAperture::new(side, rings)?));
        }
        let aperture = CircularAperture::new(self.diameter_m / 2.0)?;
        if self.secondary_fraction == 0.0 {
            return Ok(Box::new(aperture));
        }
        let obscuration = SecondaryObscuration::new(
            self.secondary_fraction * self.diameter_m / 2.0,
            self.n_supports,
            self.support_width_m,
        )?;
        Ok(Box::new(CompoundAnalyticOptic::new(
            self.name.clone(),
            vec![Box::new(aperture), Box::new(obscuration)],
        )?))
    }

    /// Single-pupil imaging system for this telescope feeding `detector`.
    pub fn optical_system(&self, npix: usize, detector: Detector) -> Result<OpticalSystem> {
        let mut osys = OpticalSystem::new(self.name.clone(), npix, self.diameter_m)?;
        osys.add_pupil(self.pupil()?)?;
        osys.add_detector(detector);
        Ok(osys)
    }
}

/// Standard telescope models
pub mod models {
    use super::*;

    /// Unobscured 1 m test aperture
    pub static CLEAR_1M: Lazy<TelescopeModel> =
        Lazy::new(|| TelescopeModel::new("1m Clear", 1.0, 0.0, 0, 0.0));

    /// 2.4 m Cassegrain with a four-vane spider
    pub static CASSEGRAIN_2M4: Lazy<TelescopeModel> = Lazy::new(|| {
        TelescopeModel::new(
            "2.4m Cassegrain",
            2.4,
            0.33,  // secondary fraction
            4,     // support struts
            0.025, // strut width in meters
        )
    });

    /// Segmented 6.5 m primary: two rings of hexagons
    pub static SEGMENTED_6M5: Lazy<TelescopeModel> = Lazy::new(|| {
        let mut model = TelescopeModel::new("6.5m Segmented", 6.5, 0.0, 0, 0.0);
        model.hex_segments = Some((0.75, 2));
        model
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn airy_radius_scales_with_wavelength_over_diameter() {
        let model = TelescopeModel::new("test", 2.0, 0.0, 0, 0.0);
        let expected = 1.22 * 1e-6 / 2.0 * RAD_TO_ARCSEC;
        assert!(approx_eq!(
            f64,
            model.airy_radius_arcsec(1e-6),
            expected,
            epsilon = 1e-12
        ));
    }

    #[test]
    fn collecting_area_subtracts_the_secondary() {
        let clear = TelescopeModel::new("clear", 2.0, 0.0, 0, 0.0);
        assert!(approx_eq!(f64, clear.collecting_area_m2(), PI, epsilon = 1e-12));
        let obscured = TelescopeModel::new("obscured", 2.0, 0.5, 4, 0.02);
        assert!(approx_eq!(
            f64,
            obscured.collecting_area_m2(),
            PI * 0.75,
            epsilon = 1e-12
        ));
    }

    #[test]
    fn predefined_models_build_working_systems() {
        for model in [&*models::CLEAR_1M, &*models::CASSEGRAIN_2M4, &*models::SEGMENTED_6M5] {
            let osys = model
                .optical_system(128, Detector::new(0.05, 64).unwrap())
                .unwrap();
            let psf = osys.calc_psf(1e-6).unwrap();
            assert!(psf.total_intensity() > 0.0, "{} produced no light", model.name);
        }
    }

    #[test]
    fn cassegrain_preset_values() {
        assert_eq!(models::CASSEGRAIN_2M4.name, "2.4m Cassegrain");
        assert_eq!(models::CASSEGRAIN_2M4.diameter_m, 2.4);
        assert_eq!(models::CASSEGRAIN_2M4.n_supports, 4);
    }
}
