//! # Coordinate conversions
//!
//! Spherical ↔ cartesian conversions and unit-vector normalization shared by the
//! ephemeris coercion layer and the frame transformer.
//!
//! Conventions
//! -----------
//! * Latitude runs from −90° to +90°, longitude is returned in [0°, 360°).
//! * Angles are expressed in **degrees** at the public boundary.
//! * Batches of vectors are stored column-wise in a [`Matrix3xX`], one column per row
//!   of the originating table.

use nalgebra::{Matrix3xX, Vector3};

use crate::constants::Degree;

/// Position schemes recognised in an ephemeris table, in coercion priority order.
///
/// Each spherical scheme names its `(latitude, longitude, radius)` columns; the
/// radius column defaults to 1.0 when absent, which turns a pure direction into a
/// unit cartesian vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateScheme {
    Cartesian,
    Spherical {
        lat: &'static str,
        lon: &'static str,
        radius: &'static str,
    },
}

/// Spherical schemes tried, in order, when a table has no `x, y, z` columns.
pub const SPHERICAL_SCHEMES: [CoordinateScheme; 3] = [
    CoordinateScheme::Spherical {
        lat: "dec_app_icrf",
        lon: "ra_app_icrf",
        radius: "dist",
    },
    CoordinateScheme::Spherical {
        lat: "dec",
        lon: "ra",
        radius: "dist",
    },
    CoordinateScheme::Spherical {
        lat: "alt",
        lon: "az",
        radius: "dist",
    },
];

impl CoordinateScheme {
    /// Find the first scheme whose columns are all present.
    ///
    /// Arguments
    /// -----------------
    /// * `has_column`: predicate telling whether a column name exists.
    ///
    /// Return
    /// ----------
    /// * The detected scheme, or `None` if no recognised set of columns is present.
    pub fn detect<F>(has_column: F) -> Option<CoordinateScheme>
    where
        F: Fn(&str) -> bool,
    {
        if ["x", "y", "z"].iter().all(|c| has_column(c)) {
            return Some(CoordinateScheme::Cartesian);
        }
        SPHERICAL_SCHEMES.into_iter().find(|scheme| match scheme {
            CoordinateScheme::Spherical { lat, lon, .. } => has_column(lat) && has_column(lon),
            CoordinateScheme::Cartesian => false,
        })
    }
}

/// Convert spherical coordinates (degrees) to cartesian.
pub fn sph2cart(lat: Degree, lon: Degree, radius: f64) -> Vector3<f64> {
    let (lat, lon) = (lat.to_radians(), lon.to_radians());
    Vector3::new(
        radius * lat.cos() * lon.cos(),
        radius * lat.cos() * lon.sin(),
        radius * lat.sin(),
    )
}

/// Convert a cartesian vector to spherical coordinates.
///
/// Return
/// ----------
/// * `(lat, lon, radius)` with `lat ∈ [-90, 90]` and `lon ∈ [0, 360)` in degrees.
///   The longitude is wrapped with a true modulo so that negative angles land in range.
///   A zero vector yields a NaN latitude.
pub fn cart2sph(position: &Vector3<f64>) -> (Degree, Degree, f64) {
    let radius = position.norm();
    let lon = position.y.atan2(position.x).to_degrees().rem_euclid(360.0);
    let lat = (position.z / radius).asin().to_degrees();
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    let lon = if lon >= 360.0 { 0.0 } else { lon };
    (lat, lon, radius)
}

/// Normalize every column of a batch of vectors to unit length.
///
/// Zero-length columns become NaN, which downstream solvers treat as a miss.
pub fn hats(vectors: &Matrix3xX<f64>) -> Matrix3xX<f64> {
    let mut unit = vectors.clone();
    for mut column in unit.column_iter_mut() {
        let norm = column.norm();
        column /= norm;
    }
    unit
}
