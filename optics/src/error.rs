//! Error types for wavefront propagation and optical system assembly.
//!
//! All parameter and structural problems are detected eagerly, either at
//! construction time or at the start of a PSF calculation, and surfaced with
//! enough context (parameter name, optic name, stage) to diagnose. Numerical
//! edge cases such as a zero-radius aperture or zero transmission are valid
//! inputs and produce well-defined all-zero or all-one arrays, not errors.

use thiserror::Error;

use crate::wavefront::PlaneType;

/// Errors that can occur while building optics or propagating wavefronts.
#[derive(Error, Debug)]
pub enum OpticsError {
    /// A size, scale, wavelength or count parameter is non-positive,
    /// non-finite, or otherwise malformed (e.g. a polygon with < 3 sides).
    #[error("invalid parameter {name} = {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    /// An optic declares a plane type incompatible with the wavefront it was
    /// asked to modify, or with the stage it was registered at.
    #[error("optic '{optic}' is a {declared} plane element but the wavefront is at a {actual} plane")]
    PlaneMismatch {
        optic: String,
        declared: PlaneType,
        actual: PlaneType,
    },

    /// A compound optic was built from children declaring different planes.
    #[error("compound optic '{compound}' mixes children with different plane types")]
    MixedPlaneType { compound: String },

    /// The optical system is missing its entrance pupil or terminal detector.
    #[error("incomplete optical system: {0}")]
    IncompleteSystem(&'static str),

    /// An array-backed optic cannot be mapped onto the requested sampling.
    #[error("resampling failed: {0}")]
    ResampleFailure(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, OpticsError>;

/// Check that a parameter is finite and strictly positive.
pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(OpticsError::InvalidParameter { name, value });
    }
    Ok(())
}

/// Check that a parameter is finite and non-negative (zero is a valid
/// degenerate geometry).
pub(crate) fn require_non_negative(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(OpticsError::InvalidParameter { name, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_check_rejects_zero_and_nan() {
        assert!(require_positive("radius", 1.0).is_ok());
        assert!(require_positive("radius", 0.0).is_err());
        assert!(require_positive("radius", -2.0).is_err());
        assert!(require_positive("radius", f64::NAN).is_err());
    }

    #[test]
    fn non_negative_check_allows_zero() {
        assert!(require_non_negative("radius", 0.0).is_ok());
        assert!(require_non_negative("radius", -1.0).is_err());
    }

    #[test]
    fn error_messages_carry_context() {
        let err = OpticsError::InvalidParameter {
            name: "wavelength",
            value: -1e-6,
        };
        assert!(err.to_string().contains("wavelength"));
    }
}
