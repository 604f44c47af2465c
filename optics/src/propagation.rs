//! Diffraction propagation kernels.
//!
//! Pure functions over a wavefront's field and metadata. Far-field
//! (Fraunhofer) propagation between pupil and image planes is a unitary
//! centered Fourier transform with the reciprocal pixel-scale relation;
//! near-field (Fresnel) propagation between planes of the same type applies
//! the quadratic-phase chirp in the frequency domain between a forward and
//! inverse transform pair, preserving the sampling.

use std::f64::consts::PI;

use rustfft::num_complex::Complex64;

use crate::fourier;
use crate::wavefront::{PlaneType, Wavefront};

/// Arcseconds per radian.
pub const RAD_TO_ARCSEC: f64 = 3600.0 * 180.0 / PI;

/// Far-field jump from a pupil plane to the conjugate image plane.
///
/// The image-plane angular sampling follows the Fourier reciprocity
/// relation: `pixelscale_image = wavelength / (npix * pixelscale_pupil)`
/// radians per pixel.
pub(crate) fn fraunhofer_pupil_to_image(w: &mut Wavefront) {
    let n = w.npix() as f64;
    let scale_rad = w.wavelength / (n * w.pixelscale);
    w.field = fourier::fft2_centered(&w.field, false);
    w.pixelscale = scale_rad * RAD_TO_ARCSEC;
    w.plane = PlaneType::Image;
}

/// Far-field jump from an image plane back to the conjugate pupil plane.
pub(crate) fn fraunhofer_image_to_pupil(w: &mut Wavefront) {
    let n = w.npix() as f64;
    let scale_rad = w.pixelscale / RAD_TO_ARCSEC;
    w.field = fourier::fft2_centered(&w.field, true);
    w.pixelscale = w.wavelength / (n * scale_rad);
    w.plane = PlaneType::Pupil;
}

/// Near-field propagation over `distance` meters within the current plane.
///
/// Angular-spectrum form: the chirp `exp(-i pi lambda d (fx^2 + fy^2))` is
/// applied to the centered spectrum between a forward and inverse transform,
/// together with the plane-wave phase `exp(i 2 pi d / lambda)`. Sampling and
/// plane type are unchanged; a zero distance is the exact identity.
pub(crate) fn fresnel_same_plane(w: &mut Wavefront, distance: f64) {
    if distance == 0.0 {
        return;
    }
    let (ny, nx) = w.shape();
    let fy = fourier::fft_frequencies(ny, w.pixelscale);
    let fx = fourier::fft_frequencies(nx, w.pixelscale);
    let lambda = w.wavelength;

    let mut spectrum = fourier::fft2_centered(&w.field, false);
    let piston = Complex64::from_polar(1.0, 2.0 * PI * distance / lambda);
    for ((i, j), v) in spectrum.indexed_iter_mut() {
        let f2 = fx[j] * fx[j] + fy[i] * fy[i];
        let chirp = Complex64::from_polar(1.0, -PI * lambda * distance * f2);
        *v *= piston * chirp;
    }
    w.field = fourier::fft2_centered(&spectrum, true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn pixel_scales_are_reciprocal() {
        // 1 m pupil on 100 px at 1 um: lambda/D = 1e-6 rad across the array.
        let mut w = Wavefront::pupil(100, 1e-6, 1.0).unwrap();
        w.propagate_to(PlaneType::Image, None).unwrap();
        let expected = 1e-6 / (100.0 * 0.01) * RAD_TO_ARCSEC;
        assert!(approx_eq!(f64, w.pixelscale(), expected, epsilon = 1e-12));
    }

    #[test]
    fn fresnel_zero_distance_is_identity() {
        let mut w = Wavefront::pupil(32, 1e-6, 1.0).unwrap();
        let before = w.field().clone();
        w.propagate_to(PlaneType::Pupil, Some(0.0)).unwrap();
        assert_eq!(w.field(), &before);
    }

    #[test]
    fn fresnel_conserves_energy() {
        let mut w = Wavefront::pupil(64, 1e-6, 1.0).unwrap();
        w.normalize();
        w.propagate_to(PlaneType::Pupil, Some(10.0)).unwrap();
        assert!(approx_eq!(f64, w.total_intensity(), 1.0, epsilon = 1e-9));
        assert_eq!(w.plane(), PlaneType::Pupil);
    }

    #[test]
    fn fresnel_forward_backward_round_trip() {
        let mut w = Wavefront::pupil(32, 1e-6, 1.0).unwrap();
        let before = w.field().clone();
        w.propagate_to(PlaneType::Pupil, Some(250.0)).unwrap();
        w.propagate_to(PlaneType::Pupil, Some(-250.0)).unwrap();
        for (a, b) in before.iter().zip(w.field().iter()) {
            assert!(approx_eq!(f64, a.re, b.re, epsilon = 1e-9));
            assert!(approx_eq!(f64, a.im, b.im, epsilon = 1e-9));
        }
    }
}
