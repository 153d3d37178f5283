//! # Orientation providers
//!
//! The targeter never computes body orientation itself: it asks a
//! [`RotationProvider`] for the 3×3 matrix rotating vectors from one named frame to
//! another at a given ephemeris time. Anything able to answer that question can be
//! plugged in, such as a binding to a kernel-based toolkit, a table of precomputed
//! matrices, or a closure returning the identity in tests.
//!
//! [`iau::IauOrientation`] is the built-in provider, based on the IAU rotational
//! elements of a few bodies.
//!
//! ## Conventions
//!
//! * `rotation_matrix(source, destination, et)` returns `R` such that
//!   `v_destination = R · v_source`.
//! * `et` is TDB seconds elapsed since J2000 (see [`crate::time::epochs_to_et`]).
//! * Elementary rotations built by [`rotmt`] are **frame** rotations: they rotate the
//!   coordinate axes by `alpha`, i.e. the vector by `-alpha`.

pub mod iau;

use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::constants::{EphemerisSeconds, Radian};
use crate::targeter_errors::TargeterError;

/// Source of frame-to-frame rotation matrices.
pub trait RotationProvider {
    /// Matrix rotating vectors expressed in `source` into `destination` at time `et`.
    ///
    /// Errors (unknown frame, missing reference data, …) are returned to the caller
    /// unchanged by the frame transformer.
    fn rotation_matrix(
        &self,
        source: &str,
        destination: &str,
        et: EphemerisSeconds,
    ) -> Result<Matrix3<f64>, TargeterError>;
}

impl<F> RotationProvider for F
where
    F: Fn(&str, &str, EphemerisSeconds) -> Result<Matrix3<f64>, TargeterError>,
{
    fn rotation_matrix(
        &self,
        source: &str,
        destination: &str,
        et: EphemerisSeconds,
    ) -> Result<Matrix3<f64>, TargeterError> {
        self(source, destination, et)
    }
}

/// Elementary frame rotation of angle `alpha` around one of the principal axes.
///
/// # Arguments
///
/// * `alpha` - Rotation angle of the axes in **radians**.
/// * `k` - Index of the axis of rotation:
///   * `0` → X-axis
///   * `1` → Y-axis
///   * `2` → Z-axis
///
/// # Returns
///
/// The orthonormal matrix `R` giving the coordinates `x' = R · x` of a fixed vector in the
/// rotated axes. For `k = 2`:
///
/// ```text
/// ⎡  cos α   sin α   0 ⎤
/// ⎢ −sin α   cos α   0 ⎥
/// ⎣    0       0     1 ⎦
/// ```
///
/// # Panics
///
/// Panics if `k > 2`, as only axes 0–2 are valid.
pub fn rotmt(alpha: Radian, k: usize) -> Matrix3<f64> {
    let axis = match k {
        0 => Vector3::x_axis(),
        1 => Vector3::y_axis(),
        2 => Vector3::z_axis(),
        _ => panic!("rotmt: invalid axis index {k} (must be 0, 1 or 2)"),
    };

    Rotation3::from_axis_angle(&axis, -alpha).into()
}

/// Rotation from the equatorial J2000 frame to a body-fixed frame.
///
/// The body's north pole has right ascension `alpha0` and declination `delta0`; `w` locates
/// the prime meridian along the body equator, measured from the ascending node of that
/// equator on the J2000 equator. All angles in **degrees**.
///
/// ```text
/// R = R3(W) · R1(90° − δ0) · R3(90° + α0)
/// ```
pub fn body_fixed_rotation(alpha0: f64, delta0: f64, w: f64) -> Matrix3<f64> {
    rotmt(w.to_radians(), 2)
        * rotmt((90.0 - delta0).to_radians(), 0)
        * rotmt((90.0 + alpha0).to_radians(), 2)
}
