//! Coherent-light wavefront propagation and point spread function
//! simulation
//!
//! This crate models how light from a distant point source diffracts
//! through a train of apertures, masks, and stops. Wavefronts are complex
//! field arrays carried between pupil and image planes by unitary Fourier
//! transforms (far field) or an angular-spectrum propagator (near field),
//! and read out as intensity images on a detector grid.

pub mod coordinates;
pub mod elements;
pub mod error;
pub mod fourier;
pub mod models;
pub mod propagation;
pub mod resample;
pub mod system;
pub mod wavefront;

// Re-exports for easier access
pub use elements::{
    AnnularFieldStop, ArrayOpticalElement, BandLimitedCoron, BandLimitedKind, BarOcculter,
    CircularAperture, CircularOcculter, CompoundAnalyticOptic, GaussianAperture, HexagonAperture,
    InverseTransmission, MultiHexagonAperture, NgonAperture, OpticalElement, ParityTestAperture,
    RectangleAperture, RectangularFieldStop, SampleKind, ScalarTransmission, SecondaryObscuration,
    SquareAperture, SquareFieldStop, ThinLens,
};
pub use error::{OpticsError, Result};
pub use models::TelescopeModel;
pub use propagation::RAD_TO_ARCSEC;
pub use system::{Detector, OpticalSystem, Psf};
pub use wavefront::{PlaneType, Wavefront};
