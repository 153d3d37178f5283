use approx::assert_abs_diff_eq;
use hifitime::{Epoch, Unit};
use nalgebra::Vector3;
use targeter::coordinates::{cart2sph, sph2cart};
use targeter::ephemeris::EphemerisTable;
use targeter::orientation::iau::IauOrientation;
use targeter::orientation::RotationProvider;
use targeter::time::epochs_to_et;

/// Mean Earth–Moon distance in meters
pub const EARTH_MOON: f64 = 384_400_000.0;

/// Planetocentric longitude and latitude of the point of the Moon facing an observer at
/// the origin, `center` being the J2000 position of the Moon's center.
pub fn sub_observer_point(center: &Vector3<f64>, epoch: Epoch) -> (f64, f64) {
    let et = epochs_to_et(&[epoch])[0];
    let rotation = IauOrientation
        .rotation_matrix("J2000", "IAU_MOON", et)
        .unwrap();
    let (lat, lon, _) = cart2sph(&(rotation * -center));
    (lon, lat)
}

pub fn minute_epochs(n: usize) -> Vec<Epoch> {
    let start = Epoch::from_gregorian_utc(2021, 4, 17, 1, 30, 0, 0);
    (0..n).map(|ix| start + Unit::Minute * ix as i64).collect()
}

/// Apparent position of the lunar center, as an OBSERVER ephemeris would give it, plus the
/// expected sub-observer coordinates of each row.
pub fn lunar_center_table(epochs: &[Epoch], ra: &[f64], dec: &[f64]) -> EphemerisTable {
    let (sub_lon, sub_lat): (Vec<f64>, Vec<f64>) = epochs
        .iter()
        .zip(ra.iter().zip(dec))
        .map(|(&epoch, (&ra, &dec))| sub_observer_point(&sph2cart(dec, ra, EARTH_MOON), epoch))
        .unzip();

    EphemerisTable::default()
        .with_time(epochs.to_vec())
        .unwrap()
        .with_column("ra_app_icrf", ra.to_vec())
        .unwrap()
        .with_column("dec_app_icrf", dec.to_vec())
        .unwrap()
        .with_column("dist", vec![EARTH_MOON; epochs.len()])
        .unwrap()
        .with_column("sub_lon", sub_lon)
        .unwrap()
        .with_column("sub_lat", sub_lat)
        .unwrap()
}

/// Compare longitudes modulo 360°.
pub fn assert_lon_close(actual: f64, expected: f64, epsilon: f64) {
    let diff = (actual - expected + 180.0).rem_euclid(360.0) - 180.0;
    assert_abs_diff_eq!(diff, 0.0, epsilon = epsilon);
}
