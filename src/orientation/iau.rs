//! # IAU rotational-element orientation
//!
//! [`IauOrientation`] is a self-contained [`RotationProvider`] covering the frames
//! most targeting work needs:
//!
//! | Name(s)                       | Frame                                            |
//! |-------------------------------|--------------------------------------------------|
//! | `J2000`, `ICRF`, `EME2000`    | Earth mean equator and equinox of J2000 (inertial) |
//! | `ECLIPJ2000`                  | Mean ecliptic and equinox of J2000 (inertial)    |
//! | `IAU_EARTH`                   | Earth body-fixed, IAU rotational elements        |
//! | `IAU_MOON`                    | Moon body-fixed, IAU rotational elements (with the E1–E13 lunar terms) |
//! | `IAU_MARS`                    | Mars body-fixed, IAU rotational elements         |
//!
//! Frame names are matched case-insensitively. Body-fixed frames follow the
//! WGCCRE convention: pole right ascension `α0`, declination `δ0` and prime meridian
//! angle `W` as polynomials (plus periodic terms for the Moon) in
//! `d` = days and `T` = Julian centuries of TDB since J2000.
//!
//! The IAU Earth model ignores precession/nutation beyond its linear pole drift; it
//! is adequate for body-fixed longitudes at the 0.01° level, not for geodesy.

use std::str::FromStr;

use nalgebra::Matrix3;

use super::{body_fixed_rotation, rotmt, RotationProvider};
use crate::constants::{
    EphemerisSeconds, Radian, DAYS_PER_CENTURY, RADSEC, SECONDS_PER_DAY, T2000,
};
use crate::targeter_errors::TargeterError;

/// Reference frames known to [`IauOrientation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    J2000,
    EclipJ2000,
    IauEarth,
    IauMoon,
    IauMars,
}

impl FromStr for Frame {
    type Err = TargeterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "J2000" | "ICRF" | "EME2000" => Ok(Frame::J2000),
            "ECLIPJ2000" => Ok(Frame::EclipJ2000),
            "IAU_EARTH" => Ok(Frame::IauEarth),
            "IAU_MOON" => Ok(Frame::IauMoon),
            "IAU_MARS" => Ok(Frame::IauMars),
            _ => Err(TargeterError::UnknownFrame(s.to_string())),
        }
    }
}

/// Orientation oracle built on IAU rotational elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct IauOrientation;

impl IauOrientation {
    pub fn new() -> Self {
        IauOrientation
    }

    /// Rotation from J2000 to `frame` at ephemeris time `et`.
    pub fn from_j2000(&self, frame: Frame, et: EphemerisSeconds) -> Matrix3<f64> {
        let d = et / SECONDS_PER_DAY;
        match frame {
            Frame::J2000 => Matrix3::identity(),
            Frame::EclipJ2000 => rotmt(obleq(T2000), 0),
            Frame::IauEarth => {
                let (alpha0, delta0, w) = earth_elements(d);
                body_fixed_rotation(alpha0, delta0, w)
            }
            Frame::IauMoon => {
                let (alpha0, delta0, w) = moon_elements(d);
                body_fixed_rotation(alpha0, delta0, w)
            }
            Frame::IauMars => {
                let (alpha0, delta0, w) = mars_elements(d);
                body_fixed_rotation(alpha0, delta0, w)
            }
        }
    }
}

impl RotationProvider for IauOrientation {
    fn rotation_matrix(
        &self,
        source: &str,
        destination: &str,
        et: EphemerisSeconds,
    ) -> Result<Matrix3<f64>, TargeterError> {
        let source = Frame::from_str(source)?;
        let destination = Frame::from_str(destination)?;
        if source == destination {
            return Ok(Matrix3::identity());
        }
        Ok(self.from_j2000(destination, et) * self.from_j2000(source, et).transpose())
    }
}

/// Mean obliquity of the ecliptic (IAU 1976), in radians, for an MJD in TT.
///
/// ```text
/// ε(t) = ((ob3·t + ob2)·t + ob1)·t + ob0,   t = (tjm − T2000) / 36525
/// ```
pub fn obleq(tjm: f64) -> Radian {
    let ob0 = ((23.0 * 3600.0 + 26.0 * 60.0) + 21.448) * RADSEC;
    let ob1 = -46.815 * RADSEC;
    let ob2 = -0.0006 * RADSEC;
    let ob3 = 0.00181 * RADSEC;

    let t = (tjm - T2000) / DAYS_PER_CENTURY;

    ((ob3 * t + ob2) * t + ob1) * t + ob0
}

/// Earth pole and prime meridian, degrees.
fn earth_elements(d: f64) -> (f64, f64, f64) {
    let t = d / DAYS_PER_CENTURY;
    let alpha0 = -0.641 * t;
    let delta0 = 90.0 - 0.557 * t;
    let w = 190.147 + 360.985_623_5 * d;
    (alpha0, delta0, w)
}

/// Mars pole and prime meridian, degrees.
fn mars_elements(d: f64) -> (f64, f64, f64) {
    let t = d / DAYS_PER_CENTURY;
    let alpha0 = 317.681_43 - 0.1061 * t;
    let delta0 = 52.886_50 - 0.0609 * t;
    let w = 176.630 + 350.891_982_26 * d;
    (alpha0, delta0, w)
}

/// Moon pole and prime meridian, degrees, including the periodic terms E1–E13.
fn moon_elements(d: f64) -> (f64, f64, f64) {
    let t = d / DAYS_PER_CENTURY;

    let e = [
        125.045 - 0.052_992_1 * d,
        250.089 - 0.105_984_2 * d,
        260.008 + 13.012_000_9 * d,
        176.625 + 13.340_715_4 * d,
        357.529 + 0.985_600_3 * d,
        311.589 + 26.405_708_4 * d,
        134.963 + 13.064_993_0 * d,
        276.617 + 0.328_714_6 * d,
        34.226 + 1.748_487_7 * d,
        15.134 - 0.158_976_3 * d,
        119.743 + 0.003_609_6 * d,
        239.961 + 0.164_357_3 * d,
        25.053 + 12.959_008_8 * d,
    ]
    .map(f64::to_radians);
    let sin = |k: usize| e[k - 1].sin();
    let cos = |k: usize| e[k - 1].cos();

    let alpha0 = 269.9949 + 0.0031 * t - 3.8787 * sin(1) - 0.1204 * sin(2) + 0.0700 * sin(3)
        - 0.0172 * sin(4)
        + 0.0072 * sin(6)
        - 0.0052 * sin(10)
        + 0.0043 * sin(13);

    let delta0 = 66.5392 + 0.0130 * t + 1.5419 * cos(1) + 0.0239 * cos(2) - 0.0278 * cos(3)
        + 0.0068 * cos(4)
        - 0.0029 * cos(6)
        + 0.0009 * cos(7)
        + 0.0008 * cos(10)
        - 0.0009 * cos(13);

    let w = 38.3213 + 13.176_358_15 * d - 1.4e-12 * d * d + 3.5610 * sin(1) + 0.1208 * sin(2)
        - 0.0642 * sin(3)
        + 0.0158 * sin(4)
        + 0.0252 * sin(5)
        - 0.0066 * sin(6)
        - 0.0047 * sin(7)
        - 0.0046 * sin(8)
        + 0.0028 * sin(9)
        + 0.0052 * sin(10)
        + 0.0040 * sin(11)
        + 0.0019 * sin(12)
        - 0.0044 * sin(13);

    (alpha0, delta0, w)
}
