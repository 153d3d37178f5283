//! # Frame transformation of intersection points
//!
//! [`FrameTransformer`] rotates a batch of position vectors from one named frame into
//! another with the help of a [`RotationProvider`], and reports each rotated vector
//! together with its body-fixed longitude and latitude.
//!
//! ## Modes
//!
//! * **Per-row**: one rotation matrix is requested for every vector, at the vector's
//!   own ephemeris time. `times_et` must then hold exactly one epoch per vector.
//! * **Broadcast**: one matrix, computed at the first epoch, is applied to every
//!   vector. This is the wide-mode path (many pointings, one body epoch). The
//!   approximation is only accepted if the supplied epochs span no more than the
//!   configured tolerance.
//!
//! ## Output layout
//!
//! A `5 × N` matrix with rows `x, y, z, lon, lat`; longitudes are in [0°, 360°),
//! latitudes in [−90°, 90°]. A vector with any non-finite component comes out as a
//! column of NaN and costs no call to the oracle.

use hifitime::{Duration, Unit};
use itertools::{Itertools, MinMaxResult};
use nalgebra::{Matrix3, Matrix3xX, Matrix5xX, Vector3, Vector5};
use tracing::debug;

use crate::constants::{EphemerisSeconds, DEFAULT_BROADCAST_TOLERANCE_S};
use crate::coordinates::cart2sph;
use crate::orientation::RotationProvider;
use crate::targeter_errors::TargeterError;

pub struct FrameTransformer<'a> {
    provider: &'a dyn RotationProvider,
    broadcast_tolerance: Duration,
}

impl<'a> FrameTransformer<'a> {
    pub fn new(provider: &'a dyn RotationProvider) -> Self {
        FrameTransformer {
            provider,
            broadcast_tolerance: Unit::Second * DEFAULT_BROADCAST_TOLERANCE_S,
        }
    }

    pub fn with_broadcast_tolerance(mut self, tolerance: Duration) -> Self {
        self.broadcast_tolerance = tolerance;
        self
    }

    /// Rotate `vectors` from `source` into `destination`.
    ///
    /// Arguments
    /// -----------------
    /// * `vectors`: one position per column, expressed in `source`.
    /// * `times_et`: ephemeris seconds past J2000; one per column, or at least one when
    ///   `broadcast` is set.
    /// * `source`, `destination`: frame names understood by the rotation provider.
    /// * `broadcast`: reuse the rotation at `times_et[0]` for every column.
    ///
    /// Return
    /// ----------
    /// * The `5 × N` matrix of rotated positions, longitudes and latitudes.
    ///
    /// Errors
    /// ----------
    /// * [`TargeterError::LengthMismatch`] if the number of epochs is wrong for the mode.
    /// * [`TargeterError::NonFiniteTime`] if a broadcast is given a NaN or infinite epoch.
    /// * [`TargeterError::BroadcastSpanExceeded`] if a broadcast covers too long a span.
    /// * Any error of the rotation provider, unchanged.
    pub fn transform(
        &self,
        vectors: &Matrix3xX<f64>,
        times_et: &[EphemerisSeconds],
        source: &str,
        destination: &str,
        broadcast: bool,
    ) -> Result<Matrix5xX<f64>, TargeterError> {
        let n = vectors.ncols();
        let mut output = Matrix5xX::from_element(n, f64::NAN);
        if n == 0 {
            return Ok(output);
        }

        if broadcast {
            self.check_broadcast_span(n, times_et)?;
        } else if times_et.len() != n {
            return Err(TargeterError::LengthMismatch {
                vectors: n,
                expected: n,
                found: times_et.len(),
            });
        }

        let mut shared: Option<Matrix3<f64>> = None;
        let mut oracle_calls = 0usize;

        for (ix, vector) in vectors.column_iter().enumerate() {
            if !vector.iter().all(|c| c.is_finite()) {
                continue;
            }

            let rotation = if broadcast {
                match shared {
                    Some(rotation) => rotation,
                    None => {
                        oracle_calls += 1;
                        let rotation =
                            self.provider
                                .rotation_matrix(source, destination, times_et[0])?;
                        shared = Some(rotation);
                        rotation
                    }
                }
            } else {
                oracle_calls += 1;
                self.provider
                    .rotation_matrix(source, destination, times_et[ix])?
            };

            let rotated: Vector3<f64> = rotation * vector;
            let (lat, lon, _) = cart2sph(&rotated);
            output.set_column(
                ix,
                &Vector5::new(rotated.x, rotated.y, rotated.z, lon, lat),
            );
        }

        debug!(
            source,
            destination,
            rows = n,
            broadcast,
            oracle_calls,
            "frame transform done"
        );
        Ok(output)
    }

    fn check_broadcast_span(
        &self,
        vectors: usize,
        times_et: &[EphemerisSeconds],
    ) -> Result<(), TargeterError> {
        if let Some(row) = times_et.iter().position(|t| !t.is_finite()) {
            return Err(TargeterError::NonFiniteTime(row));
        }

        let span_s = match times_et.iter().minmax_by(|a, b| a.total_cmp(b)) {
            MinMaxResult::NoElements => {
                return Err(TargeterError::LengthMismatch {
                    vectors,
                    expected: 1,
                    found: 0,
                })
            }
            MinMaxResult::OneElement(_) => 0.0,
            MinMaxResult::MinMax(min, max) => max - min,
        };

        let tolerance_s = self.broadcast_tolerance.to_seconds();
        if span_s > tolerance_s {
            return Err(TargeterError::BroadcastSpanExceeded {
                span_s,
                tolerance_s,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod frame_transform_test {
    use super::*;
    use crate::orientation::rotmt;
    use approx::assert_abs_diff_eq;
    use std::cell::Cell;

    /// Rotation of the axes by `et` degrees about z, counting oracle calls.
    struct SpinningOracle {
        calls: Cell<usize>,
    }

    impl SpinningOracle {
        fn new() -> Self {
            SpinningOracle {
                calls: Cell::new(0),
            }
        }
    }

    impl RotationProvider for SpinningOracle {
        fn rotation_matrix(
            &self,
            _source: &str,
            destination: &str,
            et: EphemerisSeconds,
        ) -> Result<Matrix3<f64>, TargeterError> {
            self.calls.set(self.calls.get() + 1);
            if destination != "BODY" {
                return Err(TargeterError::UnknownFrame(destination.to_string()));
            }
            Ok(rotmt(et.to_radians(), 2))
        }
    }

    fn x_axis_batch(n: usize) -> Matrix3xX<f64> {
        Matrix3xX::from_fn(n, |r, _| if r == 0 { 1.0 } else { 0.0 })
    }

    #[test]
    fn test_per_row_rotation() {
        let oracle = SpinningOracle::new();
        let transformer = FrameTransformer::new(&oracle);
        let out = transformer
            .transform(&x_axis_batch(3), &[0.0, 90.0, -30.0], "J2000", "BODY", false)
            .unwrap();

        assert_eq!(oracle.calls.get(), 3);
        assert_abs_diff_eq!(out[(3, 0)], 0.0, epsilon = 1e-12);
        // axes turned by +90°: the fixed x direction now lies at −90°, i.e. 270°
        assert_abs_diff_eq!(out[(3, 1)], 270.0, epsilon = 1e-9);
        assert_abs_diff_eq!(out[(3, 2)], 30.0, epsilon = 1e-9);
        assert_abs_diff_eq!(out[(1, 1)], -1.0, epsilon = 1e-12);
        for ix in 0..3 {
            assert_abs_diff_eq!(out[(4, ix)], 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_broadcast_calls_oracle_once() {
        let oracle = SpinningOracle::new();
        let transformer = FrameTransformer::new(&oracle);
        let out = transformer
            .transform(&x_axis_batch(25), &[45.0], "J2000", "BODY", true)
            .unwrap();

        assert_eq!(oracle.calls.get(), 1);
        assert_eq!(out.ncols(), 25);
        for ix in 0..25 {
            assert_abs_diff_eq!(out[(3, ix)], 315.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_nan_rows_skip_oracle() {
        let oracle = SpinningOracle::new();
        let transformer = FrameTransformer::new(&oracle);
        let mut vectors = x_axis_batch(3);
        vectors[(1, 1)] = f64::NAN;

        let out = transformer
            .transform(&vectors, &[0.0, 1.0, 2.0], "J2000", "BODY", false)
            .unwrap();
        assert_eq!(oracle.calls.get(), 2);
        assert!(out.column(1).iter().all(|v| v.is_nan()));
        assert!(out.column(2).iter().all(|v| v.is_finite()));

        // an all-miss batch never reaches the oracle, even in broadcast mode
        let misses = Matrix3xX::from_element(4, f64::NAN);
        let out = transformer
            .transform(&misses, &[0.0], "J2000", "BODY", true)
            .unwrap();
        assert_eq!(oracle.calls.get(), 2);
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_length_checks() {
        let oracle = SpinningOracle::new();
        let transformer = FrameTransformer::new(&oracle);
        assert_eq!(
            transformer.transform(&x_axis_batch(3), &[0.0, 1.0], "J2000", "BODY", false),
            Err(TargeterError::LengthMismatch {
                vectors: 3,
                expected: 3,
                found: 2
            })
        );
        assert_eq!(
            transformer.transform(&x_axis_batch(3), &[], "J2000", "BODY", true),
            Err(TargeterError::LengthMismatch {
                vectors: 3,
                expected: 1,
                found: 0
            })
        );
        assert_eq!(
            transformer
                .transform(&x_axis_batch(0), &[], "J2000", "BODY", false)
                .unwrap()
                .ncols(),
            0
        );
    }

    #[test]
    fn test_broadcast_tolerance() {
        let oracle = SpinningOracle::new();
        let strict = FrameTransformer::new(&oracle).with_broadcast_tolerance(Unit::Second * 10);
        assert_eq!(
            strict.transform(&x_axis_batch(2), &[0.0, 30.0], "J2000", "BODY", true),
            Err(TargeterError::BroadcastSpanExceeded {
                span_s: 30.0,
                tolerance_s: 10.0
            })
        );
        assert!(FrameTransformer::new(&oracle)
            .transform(&x_axis_batch(2), &[0.0, 30.0], "J2000", "BODY", true)
            .is_ok());
    }

    #[test]
    fn test_broadcast_rejects_non_finite_epochs() {
        let oracle = SpinningOracle::new();
        let transformer = FrameTransformer::new(&oracle);
        assert_eq!(
            transformer.transform(&x_axis_batch(2), &[0.0, f64::NAN], "J2000", "BODY", true),
            Err(TargeterError::NonFiniteTime(1))
        );
        assert_eq!(
            transformer.transform(&x_axis_batch(2), &[f64::INFINITY], "J2000", "BODY", true),
            Err(TargeterError::NonFiniteTime(0))
        );
        assert_eq!(oracle.calls.get(), 0);
    }

    #[test]
    fn test_oracle_error_propagates() {
        let oracle = SpinningOracle::new();
        let transformer = FrameTransformer::new(&oracle);
        assert_eq!(
            transformer.transform(&x_axis_batch(1), &[0.0], "J2000", "IAU_NOWHERE", false),
            Err(TargeterError::UnknownFrame("IAU_NOWHERE".into()))
        );
    }
}
