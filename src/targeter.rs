//! # Targeter
//!
//! The [`Targeter`] ties the pieces of the crate together. It owns the ephemeris of a
//! body's center and a set of intersection solutions, finds where pointing rays hit
//! the body, and re-expresses those hits in a body-fixed rotating frame.
//!
//! ## Workflow
//!
//! 1. Build it from the body ephemeris and either explicit solutions or a radius
//!    ([`Targeter::new`]).
//! 2. Find the intersections:
//!    * [`Targeter::find_targets`] pairs each pointing with the body row at the same
//!      epoch ("long" mode);
//!    * [`Targeter::find_target_grid`] casts a whole grid of pointings at a single
//!      body epoch ("wide" mode).
//! 3. Rotate the body-to-intersection vectors into the body frame with
//!    [`Targeter::transform_to_body_frame`], which also yields longitudes and
//!    latitudes.
//!
//! ```text
//! Constructed ──find_*──▶ Targeted ──transform──▶ FrameTransformed
//!                  ▲                                      │
//!                  └─────────────── find_* ───────────────┘
//! ```
//!
//! Every `find_*` call replaces the previous results and drops any bodycentric table.
//! Transforming again from `FrameTransformed` (e.g. into another frame) is allowed.
//!
//! Rays that miss the body are not errors: their topocentric and bodycentric
//! coordinates are NaN. [`TopocentricTable::intersections`] lifts them into
//! [`Intersection::Miss`].
//!
//! ## Example
//!
//! ```rust
//! use hifitime::Epoch;
//! use nalgebra::Matrix3;
//! use targeter::ephemeris::EphemerisTable;
//! use targeter::targeter::Targeter;
//! use targeter::targeter_errors::TargeterError;
//!
//! let epoch = Epoch::from_gregorian_utc_at_midnight(2021, 1, 1);
//! let body = EphemerisTable::default()
//!     .with_column("x", vec![10.0])?
//!     .with_column("y", vec![0.0])?
//!     .with_column("z", vec![0.0])?
//!     .with_time(vec![epoch])?;
//! let pointing = EphemerisTable::default()
//!     .with_column("ra", vec![0.0])?
//!     .with_column("dec", vec![0.0])?;
//!
//! let mut targeter = Targeter::new(body, None, Some(1.0))?;
//! targeter.find_targets(pointing)?;
//! let identity = |_: &str, _: &str, _: f64| Ok::<_, TargeterError>(Matrix3::<f64>::identity());
//! targeter.transform_to_body_frame(&identity, "J2000", "J2000")?;
//!
//! let bodycentric = targeter.bodycentric().unwrap();
//! assert!((bodycentric.positions()[(0, 0)] + 1.0).abs() < 1e-12);
//! assert!((bodycentric.lon()[0] - 180.0).abs() < 1e-9);
//! # Ok::<(), TargeterError>(())
//! ```

use std::io::Write;

use camino::Utf8Path;
use nalgebra::{DVector, Matrix3xX, Matrix5xX};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::TargeterConfig;
use crate::constants::Meter;
use crate::coordinates::hats;
use crate::ephemeris::{EphemerisInput, EphemerisTable};
use crate::frame_transform::FrameTransformer;
use crate::orientation::RotationProvider;
use crate::solutions::{Intersection, SolutionSet};
use crate::targeter_errors::TargeterError;
use crate::time::epochs_to_et;

/// Intersections expressed from the ray origin, one value per pointing row and solution.
#[derive(Debug, Clone, PartialEq)]
pub struct TopocentricTable {
    index: Vec<usize>,
    columns: Vec<(String, DVector<f64>)>,
}

impl TopocentricTable {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Row labels, copied from the pointing table.
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&DVector<f64>> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values)
    }

    /// The `x, y, z` solutions as one column vector per row.
    pub fn positions(&self) -> Result<Matrix3xX<f64>, TargeterError> {
        let [x, y, z] = ["x", "y", "z"].map(|name| {
            self.column(name)
                .ok_or_else(|| TargeterError::MissingColumn(name.to_string()))
        });
        let (x, y, z) = (x?, y?, z?);
        Ok(Matrix3xX::from_fn(self.len(), |r, c| match r {
            0 => x[c],
            1 => y[c],
            _ => z[c],
        }))
    }

    /// Per-row hits and misses.
    pub fn intersections(&self) -> Result<Vec<Intersection>, TargeterError> {
        Ok(self
            .positions()?
            .column_iter()
            .map(|p| Intersection::from_vector(p.into_owned()))
            .collect())
    }
}

/// Body-to-intersection vectors in the body frame, with planetocentric coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct BodycentricTable {
    index: Vec<usize>,
    positions: Matrix3xX<f64>,
    lon: DVector<f64>,
    lat: DVector<f64>,
}

/// One row of a [`BodycentricTable`], as written to CSV.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodycentricRecord {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub lon: f64,
    pub lat: f64,
}

impl BodycentricTable {
    fn from_transformed(index: Vec<usize>, transformed: &Matrix5xX<f64>) -> Self {
        BodycentricTable {
            index,
            positions: transformed.fixed_rows::<3>(0).into_owned(),
            lon: transformed.row(3).transpose(),
            lat: transformed.row(4).transpose(),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[usize] {
        &self.index
    }

    pub fn positions(&self) -> &Matrix3xX<f64> {
        &self.positions
    }

    /// Longitudes in degrees, in [0, 360).
    pub fn lon(&self) -> &DVector<f64> {
        &self.lon
    }

    /// Latitudes in degrees, in [−90, 90].
    pub fn lat(&self) -> &DVector<f64> {
        &self.lat
    }

    pub fn records(&self) -> impl Iterator<Item = BodycentricRecord> + '_ {
        self.index.iter().enumerate().map(|(ix, &index)| BodycentricRecord {
            index,
            x: self.positions[(0, ix)],
            y: self.positions[(1, ix)],
            z: self.positions[(2, ix)],
            lon: self.lon[ix],
            lat: self.lat[ix],
        })
    }

    /// Write the table as CSV with an `index, x, y, z, lon, lat` header.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), TargeterError> {
        let mut writer = csv::Writer::from_writer(writer);
        for record in self.records() {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn to_csv_path(&self, path: &Utf8Path) -> Result<(), TargeterError> {
        self.write_csv(std::fs::File::create(path)?)
    }
}

/// How the body center is paired with the pointing rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetingMode {
    /// One body row per pointing row.
    Long,
    /// A single body epoch against every pointing row.
    Wide,
}

/// Progress of a [`Targeter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Constructed,
    Targeted,
    FrameTransformed,
}

#[derive(Debug)]
struct Targets {
    pointing: EphemerisTable,
    topocentric: TopocentricTable,
    mode: TargetingMode,
}

#[derive(Debug)]
enum TargeterState {
    Constructed,
    Targeted(Targets),
    FrameTransformed(Targets, BodycentricTable),
}

/// Finds ray–body intersections and expresses them in the body frame.
#[derive(Debug)]
pub struct Targeter {
    body: EphemerisTable,
    solutions: SolutionSet,
    config: TargeterConfig,
    state: TargeterState,
}

impl Targeter {
    /// Create a targeter with the default configuration.
    ///
    /// Arguments
    /// -----------------
    /// * `target`: ephemeris of the body center, seen from the ray origin. A table in any
    ///   recognised coordinate scheme, or an ephemeris provider. It must carry a time column.
    /// * `solutions`: explicit intersection solutions; takes precedence over the radius.
    /// * `target_radius`: radius of a spherical body, used to build ray–sphere solutions
    ///   when `solutions` is `None`.
    ///
    /// Errors
    /// ----------
    /// * [`TargeterError::MissingSolutionsAndRadius`] if neither solutions nor a radius is given.
    /// * [`TargeterError::InvalidRadius`], [`TargeterError::UnrecognizedCoordinates`],
    ///   [`TargeterError::UnsupportedQueryType`] or [`TargeterError::MissingTime`] for
    ///   unusable inputs.
    pub fn new<'a>(
        target: impl Into<EphemerisInput<'a>>,
        solutions: Option<SolutionSet>,
        target_radius: Option<Meter>,
    ) -> Result<Self, TargeterError> {
        Self::with_config(target, solutions, target_radius, TargeterConfig::default())
    }

    /// Same as [`Targeter::new`] with explicit options.
    pub fn with_config<'a>(
        target: impl Into<EphemerisInput<'a>>,
        solutions: Option<SolutionSet>,
        target_radius: Option<Meter>,
        config: TargeterConfig,
    ) -> Result<Self, TargeterError> {
        let solutions = SolutionSet::resolve(solutions, target_radius, config.branch)?;
        let body = target.into().into_cartesian()?;
        if body.time().is_none() {
            return Err(TargeterError::MissingTime);
        }

        debug!(
            rows = body.len(),
            solutions = solutions.len(),
            branch = ?config.branch,
            "targeter constructed"
        );
        Ok(Targeter {
            body,
            solutions,
            config,
            state: TargeterState::Constructed,
        })
    }

    /// Intersect a time series of pointings with the body, row by row.
    ///
    /// The pointing table must have as many rows as the body ephemeris. Without a time
    /// column it inherits the body's epochs; with one, every epoch must equal the body's.
    /// Pointing vectors are normalized before the solutions are evaluated.
    ///
    /// Errors
    /// ----------
    /// * [`TargeterError::RowCountMismatch`] if the row counts differ.
    /// * [`TargeterError::TimeMismatch`] with the first disagreeing row.
    /// * Coercion errors of the pointing input.
    pub fn find_targets<'a>(
        &mut self,
        pointings: impl Into<EphemerisInput<'a>>,
    ) -> Result<(), TargeterError> {
        let mut pointing = pointings.into().into_cartesian()?;
        if pointing.len() != self.body.len() {
            return Err(TargeterError::RowCountMismatch {
                pointing: pointing.len(),
                body: self.body.len(),
            });
        }

        let body_time = self.body.time().ok_or(TargeterError::MissingTime)?;
        match pointing.time() {
            None => pointing.set_time(body_time.to_vec())?,
            Some(time) => {
                if let Some(row) = time.iter().zip(body_time).position(|(p, b)| p != b) {
                    return Err(TargeterError::TimeMismatch(row));
                }
            }
        }

        let rays = hats(&pointing.positions()?);
        pointing.set_positions(&rays)?;
        let centers = self.body.positions()?;

        self.store_targets(pointing, &rays, &centers, TargetingMode::Long);
        Ok(())
    }

    /// Intersect a grid of pointings with the body at a single epoch.
    ///
    /// Only the first body row is used; a longer body ephemeris is reported with a
    /// warning. The grid must be a table, typically built by
    /// [`make_raveled_meshgrid`](crate::ephemeris::grid::make_raveled_meshgrid).
    ///
    /// Errors
    /// ----------
    /// * [`TargeterError::GridRequiresTable`] if an ephemeris provider is passed.
    /// * [`TargeterError::RowCountMismatch`] if the body ephemeris is empty.
    /// * Coercion errors of the grid.
    pub fn find_target_grid<'a>(
        &mut self,
        raveled_grid: impl Into<EphemerisInput<'a>>,
    ) -> Result<(), TargeterError> {
        let mut grid = match raveled_grid.into() {
            EphemerisInput::Table(table) => table.to_cartesian()?,
            EphemerisInput::Provider(_) => return Err(TargeterError::GridRequiresTable),
        };

        if self.body.is_empty() {
            return Err(TargeterError::RowCountMismatch {
                pointing: grid.len(),
                body: 0,
            });
        }
        if self.body.len() > 1 {
            warn!(
                rows = self.body.len(),
                "body ephemeris has more than one row, targeting the grid at the first epoch only"
            );
        }

        let rays = hats(&grid.positions()?);
        grid.set_positions(&rays)?;
        let center = self.body.positions()?.column(0).into_owned();
        let centers = Matrix3xX::from_fn(rays.ncols(), |r, _| center[r]);

        self.store_targets(grid, &rays, &centers, TargetingMode::Wide);
        Ok(())
    }

    fn store_targets(
        &mut self,
        pointing: EphemerisTable,
        rays: &Matrix3xX<f64>,
        centers: &Matrix3xX<f64>,
        mode: TargetingMode,
    ) {
        let topocentric = TopocentricTable {
            index: pointing.index().to_vec(),
            columns: self.solutions.evaluate(rays, centers),
        };
        debug!(rows = topocentric.len(), mode = ?mode, "targets found");
        self.state = TargeterState::Targeted(Targets {
            pointing,
            topocentric,
            mode,
        });
    }

    /// Rotate the body-to-intersection vectors from `source` into `destination`.
    ///
    /// The body ephemeris epochs are converted to ephemeris seconds and handed to
    /// `oracle`. In wide mode (a grid, or a single body epoch against several rows) the
    /// single body center is subtracted from every intersection and one rotation is
    /// broadcast; otherwise centers are subtracted row by row and one rotation is
    /// requested per row.
    ///
    /// Errors
    /// ----------
    /// * [`TargeterError::NotTargeted`] if no targets have been found yet.
    /// * [`TargeterError::MissingColumn`] if the solutions produce no `x, y, z`.
    /// * [`TargeterError::BroadcastSpanExceeded`] and oracle errors, unchanged.
    pub fn transform_to_body_frame(
        &mut self,
        oracle: &dyn RotationProvider,
        source: &str,
        destination: &str,
    ) -> Result<(), TargeterError> {
        let targets = match &self.state {
            TargeterState::Targeted(targets) | TargeterState::FrameTransformed(targets, _) => {
                targets
            }
            TargeterState::Constructed => return Err(TargeterError::NotTargeted),
        };

        let body_time = self.body.time().ok_or(TargeterError::MissingTime)?;
        let epochs_et = epochs_to_et(body_time);
        let intersections = targets.topocentric.positions()?;
        let centers = self.body.positions()?;
        let n = intersections.ncols();

        let wide = targets.mode == TargetingMode::Wide || (centers.ncols() == 1 && n != 1);
        let (relative, times) = if wide {
            let center = centers.column(0);
            (
                Matrix3xX::from_fn(n, |r, c| intersections[(r, c)] - center[r]),
                &epochs_et[..1],
            )
        } else {
            (intersections - centers, &epochs_et[..])
        };

        let transformed =
            FrameTransformer::new(oracle).transform(&relative, times, source, destination, wide)?;
        let bodycentric =
            BodycentricTable::from_transformed(targets.topocentric.index().to_vec(), &transformed);

        self.state = match std::mem::replace(&mut self.state, TargeterState::Constructed) {
            TargeterState::Targeted(targets) | TargeterState::FrameTransformed(targets, _) => {
                TargeterState::FrameTransformed(targets, bodycentric)
            }
            TargeterState::Constructed => TargeterState::Constructed,
        };
        Ok(())
    }

    pub fn stage(&self) -> Stage {
        match self.state {
            TargeterState::Constructed => Stage::Constructed,
            TargeterState::Targeted(_) => Stage::Targeted,
            TargeterState::FrameTransformed(..) => Stage::FrameTransformed,
        }
    }

    /// The cartesian body ephemeris.
    pub fn body(&self) -> &EphemerisTable {
        &self.body
    }

    pub fn solutions(&self) -> &SolutionSet {
        &self.solutions
    }

    pub fn config(&self) -> &TargeterConfig {
        &self.config
    }

    fn targets(&self) -> Option<&Targets> {
        match &self.state {
            TargeterState::Constructed => None,
            TargeterState::Targeted(targets) | TargeterState::FrameTransformed(targets, _) => {
                Some(targets)
            }
        }
    }

    /// The last pointing table or grid, cartesian, normalized and time-augmented.
    pub fn pointing(&self) -> Option<&EphemerisTable> {
        self.targets().map(|t| &t.pointing)
    }

    pub fn topocentric(&self) -> Option<&TopocentricTable> {
        self.targets().map(|t| &t.topocentric)
    }

    pub fn mode(&self) -> Option<TargetingMode> {
        self.targets().map(|t| t.mode)
    }

    pub fn bodycentric(&self) -> Option<&BodycentricTable> {
        match &self.state {
            TargeterState::FrameTransformed(_, bodycentric) => Some(bodycentric),
            _ => None,
        }
    }
}

#[cfg(test)]
mod targeter_test {
    use super::*;
    use crate::ephemeris::EphemerisProvider;
    use crate::solutions::Branch;
    use approx::assert_abs_diff_eq;
    use hifitime::{Epoch, Unit};
    use nalgebra::{Matrix3, Vector3};
    use std::cell::RefCell;
    use std::sync::{Arc, Mutex};

    fn epochs(n: usize) -> Vec<Epoch> {
        let start = Epoch::from_gregorian_utc_at_midnight(2021, 1, 1);
        (0..n).map(|ix| start + Unit::Minute * ix as i64).collect()
    }

    fn body_on_x(n: usize, distance: f64) -> EphemerisTable {
        EphemerisTable::default()
            .with_column("x", vec![distance; n])
            .unwrap()
            .with_column("y", vec![0.0; n])
            .unwrap()
            .with_column("z", vec![0.0; n])
            .unwrap()
            .with_time(epochs(n))
            .unwrap()
    }

    fn pointing_along(n: usize, direction: Vector3<f64>) -> EphemerisTable {
        EphemerisTable::default()
            .with_column("x", vec![direction.x; n])
            .unwrap()
            .with_column("y", vec![direction.y; n])
            .unwrap()
            .with_column("z", vec![direction.z; n])
            .unwrap()
    }

    fn identity(_: &str, _: &str, _: f64) -> Result<Matrix3<f64>, TargeterError> {
        Ok(Matrix3::identity())
    }

    struct VectorsProvider(EphemerisTable);

    impl EphemerisProvider for VectorsProvider {
        fn table(&self) -> Result<EphemerisTable, TargeterError> {
            Ok(self.0.clone())
        }

        fn query_type(&self) -> &str {
            "VECTORS"
        }
    }

    #[test]
    fn test_construction_errors() {
        assert_eq!(
            Targeter::new(body_on_x(1, 10.0), None, None).unwrap_err(),
            TargeterError::MissingSolutionsAndRadius
        );

        let untimed = EphemerisTable::default()
            .with_column("ra", vec![0.0])
            .unwrap()
            .with_column("dec", vec![0.0])
            .unwrap();
        assert_eq!(
            Targeter::new(untimed, None, Some(1.0)).unwrap_err(),
            TargeterError::MissingTime
        );
    }

    #[test]
    fn test_long_mode_scales_pointings() {
        let mut targeter = Targeter::new(body_on_x(3, 10.0), None, Some(1.0)).unwrap();
        assert_eq!(targeter.stage(), Stage::Constructed);

        // unnormalized pointings: the solutions see unit vectors
        targeter
            .find_targets(pointing_along(3, Vector3::new(4.0, 0.0, 0.0)))
            .unwrap();
        assert_eq!(targeter.stage(), Stage::Targeted);
        assert_eq!(targeter.mode(), Some(TargetingMode::Long));

        let topocentric = targeter.topocentric().unwrap();
        assert_eq!(topocentric.names().collect::<Vec<_>>(), ["x", "y", "z", "d"]);
        for ix in 0..3 {
            assert_abs_diff_eq!(topocentric.column("x").unwrap()[ix], 9.0, epsilon = 1e-12);
            assert_abs_diff_eq!(topocentric.column("d").unwrap()[ix], 9.0, epsilon = 1e-12);
        }

        let pointing = targeter.pointing().unwrap();
        assert_eq!(pointing.column("x").unwrap(), &[1.0, 1.0, 1.0]);
        assert_eq!(pointing.time(), targeter.body().time());
    }

    #[test]
    fn test_farside_config() {
        let config = TargeterConfig::default().with_branch(Branch::Farside);
        let mut targeter =
            Targeter::with_config(body_on_x(1, 10.0), None, Some(1.0), config).unwrap();
        targeter.find_targets(pointing_along(1, Vector3::x())).unwrap();
        assert_abs_diff_eq!(
            targeter.topocentric().unwrap().column("x").unwrap()[0],
            11.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_misses_are_reported() {
        let mut targeter = Targeter::new(body_on_x(2, 10.0), None, Some(1.0)).unwrap();
        let pointing = EphemerisTable::default()
            .with_column("x", vec![1.0, 0.0])
            .unwrap()
            .with_column("y", vec![0.0, 1.0])
            .unwrap()
            .with_column("z", vec![0.0, 0.0])
            .unwrap();
        targeter.find_targets(pointing).unwrap();

        let intersections = targeter.topocentric().unwrap().intersections().unwrap();
        assert!(intersections[0].is_hit());
        assert_eq!(intersections[1], Intersection::Miss);

        targeter
            .transform_to_body_frame(&identity, "J2000", "J2000")
            .unwrap();
        let bodycentric = targeter.bodycentric().unwrap();
        assert_abs_diff_eq!(bodycentric.lon()[0], 180.0, epsilon = 1e-9);
        assert!(bodycentric.lon()[1].is_nan());
        assert!(bodycentric.positions().column(1).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_time_reconciliation() {
        let mut targeter = Targeter::new(body_on_x(3, 10.0), None, Some(1.0)).unwrap();

        let matching = pointing_along(3, Vector3::x()).with_time(epochs(3)).unwrap();
        targeter.find_targets(matching).unwrap();

        let mut shifted = epochs(3);
        shifted[2] += Unit::Second * 1;
        let mismatched = pointing_along(3, Vector3::x()).with_time(shifted).unwrap();
        assert_eq!(
            targeter.find_targets(mismatched).unwrap_err(),
            TargeterError::TimeMismatch(2)
        );
    }

    #[test]
    fn test_row_count_mismatch() {
        let mut targeter = Targeter::new(body_on_x(3, 10.0), None, Some(1.0)).unwrap();
        assert_eq!(
            targeter
                .find_targets(pointing_along(2, Vector3::x()))
                .unwrap_err(),
            TargeterError::RowCountMismatch {
                pointing: 2,
                body: 3
            }
        );
        assert_eq!(targeter.stage(), Stage::Constructed);
    }

    #[test]
    fn test_not_targeted() {
        let mut targeter = Targeter::new(body_on_x(1, 10.0), None, Some(1.0)).unwrap();
        assert_eq!(
            targeter.transform_to_body_frame(&identity, "J2000", "IAU_MOON"),
            Err(TargeterError::NotTargeted)
        );
    }

    #[test]
    fn test_grid_rejects_provider() {
        let provider = VectorsProvider(pointing_along(1, Vector3::x()));
        let mut targeter = Targeter::new(body_on_x(1, 10.0), None, Some(1.0)).unwrap();
        assert_eq!(
            targeter.find_target_grid(&provider),
            Err(TargeterError::GridRequiresTable)
        );

        // providers remain fine for the body and for time-series pointings
        let mut targeter = Targeter::new(&VectorsProvider(body_on_x(1, 10.0)), None, Some(1.0)).unwrap();
        targeter.find_targets(&provider).unwrap();
    }

    #[test]
    fn test_grid_with_long_body_uses_first_row() {
        let body = body_on_x(2, 10.0);
        let mut targeter = Targeter::new(body, None, Some(1.0)).unwrap();
        targeter
            .find_target_grid(pointing_along(4, Vector3::x()))
            .unwrap();
        assert_eq!(targeter.mode(), Some(TargetingMode::Wide));
        assert_eq!(targeter.topocentric().unwrap().len(), 4);

        targeter
            .transform_to_body_frame(&identity, "J2000", "J2000")
            .unwrap();
        let bodycentric = targeter.bodycentric().unwrap();
        assert_eq!(bodycentric.len(), 4);
        assert_abs_diff_eq!(bodycentric.positions()[(0, 3)], -1.0, epsilon = 1e-12);
    }

    /// In-memory sink for the log lines of a test subscriber.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_grid_warns_on_long_body() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut single = Targeter::new(body_on_x(1, 10.0), None, Some(1.0)).unwrap();
            single.find_target_grid(pointing_along(4, Vector3::x())).unwrap();
        });
        assert!(logs.text().is_empty());

        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            let mut long = Targeter::new(body_on_x(3, 10.0), None, Some(1.0)).unwrap();
            long.find_target_grid(pointing_along(4, Vector3::x())).unwrap();
        });
        let text = logs.text();
        assert!(text.contains("WARN"));
        assert!(text.contains("more than one row"));
        assert!(text.contains("rows=3"));
    }

    #[test]
    fn test_grid_rotates_at_first_body_epoch_only() {
        let start = Epoch::from_gregorian_utc_at_midnight(2021, 1, 1);
        let hourly: Vec<Epoch> = (0..24_i64).map(|ix| start + Unit::Hour * ix).collect();
        let body = EphemerisTable::default()
            .with_column("x", vec![10.0; 24])
            .unwrap()
            .with_column("y", vec![0.0; 24])
            .unwrap()
            .with_column("z", vec![0.0; 24])
            .unwrap()
            .with_time(hourly)
            .unwrap();

        let mut targeter = Targeter::new(body, None, Some(1.0)).unwrap();
        targeter
            .find_target_grid(pointing_along(9, Vector3::x()))
            .unwrap();

        let requested = RefCell::new(Vec::new());
        let recording = |_: &str, _: &str, et: f64| {
            requested.borrow_mut().push(et);
            Ok::<_, TargeterError>(Matrix3::<f64>::identity())
        };
        targeter
            .transform_to_body_frame(&recording, "J2000", "J2000")
            .unwrap();

        // the 23 h covered by the body never reach the rotation: only its first epoch does
        assert_eq!(*requested.borrow(), vec![start.to_et_seconds()]);
        assert_eq!(targeter.bodycentric().unwrap().len(), 9);
    }

    #[test]
    fn test_find_discards_bodycentric() {
        let mut targeter = Targeter::new(body_on_x(1, 10.0), None, Some(1.0)).unwrap();
        targeter.find_targets(pointing_along(1, Vector3::x())).unwrap();
        targeter
            .transform_to_body_frame(&identity, "J2000", "J2000")
            .unwrap();
        assert_eq!(targeter.stage(), Stage::FrameTransformed);

        // transforming again is allowed
        targeter
            .transform_to_body_frame(&identity, "J2000", "J2000")
            .unwrap();
        assert!(targeter.bodycentric().is_some());

        targeter.find_targets(pointing_along(1, Vector3::x())).unwrap();
        assert_eq!(targeter.stage(), Stage::Targeted);
        assert!(targeter.bodycentric().is_none());
    }

    #[test]
    fn test_oracle_error_keeps_targets() {
        let mut targeter = Targeter::new(body_on_x(1, 10.0), None, Some(1.0)).unwrap();
        targeter.find_targets(pointing_along(1, Vector3::x())).unwrap();
        let failing = |_: &str, destination: &str, _: f64| {
            Err::<Matrix3<f64>, _>(TargeterError::UnknownFrame(destination.to_string()))
        };
        assert_eq!(
            targeter.transform_to_body_frame(&failing, "J2000", "IAU_NOWHERE"),
            Err(TargeterError::UnknownFrame("IAU_NOWHERE".into()))
        );
        assert_eq!(targeter.stage(), Stage::Targeted);
    }

    #[test]
    fn test_bodycentric_csv() {
        let mut targeter = Targeter::new(body_on_x(2, 10.0), None, Some(1.0)).unwrap();
        targeter.find_targets(pointing_along(2, Vector3::x())).unwrap();
        targeter
            .transform_to_body_frame(&identity, "J2000", "J2000")
            .unwrap();

        let mut buffer = Vec::new();
        targeter.bodycentric().unwrap().write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("index,x,y,z,lon,lat"));
        assert!(lines.next().unwrap().starts_with("0,-1.0,"));
        assert_eq!(lines.count(), 1);
    }
}
