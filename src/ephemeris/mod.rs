//! # Ephemeris tables
//!
//! An [`EphemerisTable`] is the tabular form in which body positions and pointing
//! directions reach the targeter: row labels, an optional column of epochs, and any
//! number of named `f64` columns. Positions are expressed in one of the schemes listed
//! in [`CoordinateScheme`]; [`EphemerisTable::to_cartesian`] normalizes any of them to
//! `x, y, z` columns.
//!
//! Tables arrive either directly (built in memory, read from CSV with
//! [`csv_table`], or produced by [`grid::make_raveled_meshgrid`]) or through an
//! [`EphemerisProvider`], the interface exposed by an ephemeris retrieval client.
//!
//! ```rust
//! use targeter::ephemeris::EphemerisTable;
//!
//! let table = EphemerisTable::default()
//!     .with_column("ra", vec![10.0, 20.0])?
//!     .with_column("dec", vec![-5.0, 5.0])?;
//! let cartesian = table.to_cartesian()?;
//! assert!(cartesian.has_column("x"));
//! # Ok::<(), targeter::targeter_errors::TargeterError>(())
//! ```

pub mod csv_table;
pub mod grid;

use std::collections::BTreeMap;
use std::str::FromStr;

use hifitime::Epoch;
use nalgebra::{Matrix3xX, Vector3};
use tracing::debug;

use crate::coordinates::{sph2cart, CoordinateScheme};
use crate::targeter_errors::TargeterError;

/// Tabular ephemeris: labelled rows, optional epochs, named numeric columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EphemerisTable {
    index: Vec<usize>,
    time: Option<Vec<Epoch>>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl EphemerisTable {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Row labels. Defaults to `0..len` and survives slicing with [`EphemerisTable::head`].
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    pub fn time(&self) -> Option<&[Epoch]> {
        self.time.as_deref()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Look up a column, failing with [`TargeterError::MissingColumn`].
    pub fn require_column(&self, name: &str) -> Result<&[f64], TargeterError> {
        self.column(name)
            .ok_or_else(|| TargeterError::MissingColumn(name.to_string()))
    }

    /// Insert or replace a column.
    ///
    /// The first column (or time series) inserted into an empty table fixes the row count
    /// and the default `0..n` row labels; later columns must match it.
    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), TargeterError> {
        let name = name.into();
        self.check_length(&name, values.len())?;
        self.columns.insert(name, values);
        Ok(())
    }

    /// Builder form of [`EphemerisTable::insert_column`].
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<Self, TargeterError> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    /// Insert or replace the time column.
    pub fn set_time(&mut self, epochs: Vec<Epoch>) -> Result<(), TargeterError> {
        self.check_length("time", epochs.len())?;
        self.time = Some(epochs);
        Ok(())
    }

    /// Builder form of [`EphemerisTable::set_time`].
    pub fn with_time(mut self, epochs: Vec<Epoch>) -> Result<Self, TargeterError> {
        self.set_time(epochs)?;
        Ok(self)
    }

    /// Replace the row labels.
    pub fn with_index(mut self, index: Vec<usize>) -> Result<Self, TargeterError> {
        if self.is_unsized() {
            self.index = index;
            return Ok(self);
        }
        if index.len() != self.len() {
            return Err(TargeterError::ColumnLength {
                name: "index".into(),
                expected: self.len(),
                found: index.len(),
            });
        }
        self.index = index;
        Ok(self)
    }

    /// Keep only the first `n` rows, preserving their labels.
    pub fn head(&self, n: usize) -> Self {
        let n = n.min(self.len());
        EphemerisTable {
            index: self.index[..n].to_vec(),
            time: self.time.as_ref().map(|t| t[..n].to_vec()),
            columns: self
                .columns
                .iter()
                .map(|(name, values)| (name.clone(), values[..n].to_vec()))
                .collect(),
        }
    }

    fn is_unsized(&self) -> bool {
        self.columns.is_empty() && self.time.is_none()
    }

    fn check_length(&mut self, name: &str, found: usize) -> Result<(), TargeterError> {
        if self.is_unsized() {
            if self.index.is_empty() {
                self.index = (0..found).collect();
            }
            if self.index.len() == found {
                return Ok(());
            }
        }
        if found != self.len() {
            return Err(TargeterError::ColumnLength {
                name: name.to_string(),
                expected: self.len(),
                found,
            });
        }
        Ok(())
    }

    /// Extract the `x, y, z` columns as one column vector per row.
    pub fn positions(&self) -> Result<Matrix3xX<f64>, TargeterError> {
        let x = self.require_column("x")?;
        let y = self.require_column("y")?;
        let z = self.require_column("z")?;
        Ok(Matrix3xX::from_fn(self.len(), |r, c| match r {
            0 => x[c],
            1 => y[c],
            _ => z[c],
        }))
    }

    /// Write a batch of vectors into the `x, y, z` columns.
    pub fn set_positions(&mut self, positions: &Matrix3xX<f64>) -> Result<(), TargeterError> {
        for (row, name) in ["x", "y", "z"].iter().enumerate() {
            self.insert_column(*name, positions.row(row).iter().copied().collect())?;
        }
        Ok(())
    }

    /// Produce a copy of this table carrying cartesian `x, y, z` columns.
    ///
    /// Tables that already have `x, y, z` are returned unchanged. Otherwise the first
    /// spherical scheme found (`dec_app_icrf/ra_app_icrf`, then `dec/ra`, then `alt/az`)
    /// is converted, with `dist` defaulting to 1.0 when absent. The original columns are
    /// kept alongside the new ones.
    ///
    /// Return
    /// ----------
    /// * The cartesian table, or [`TargeterError::UnrecognizedCoordinates`] if no
    ///   scheme matches.
    pub fn to_cartesian(&self) -> Result<EphemerisTable, TargeterError> {
        let scheme = CoordinateScheme::detect(|name| self.has_column(name)).ok_or_else(|| {
            TargeterError::UnrecognizedCoordinates(
                self.column_names().map(str::to_string).collect(),
            )
        })?;

        match scheme {
            CoordinateScheme::Cartesian => Ok(self.clone()),
            CoordinateScheme::Spherical { lat, lon, radius } => {
                debug!(lat, lon, radius, rows = self.len(), "coercing spherical table to cartesian");
                self.spherical_to_cartesian(lat, lon, radius)
            }
        }
    }

    /// Convert the named spherical columns to `x, y, z`, defaulting the radius to 1.0.
    pub(crate) fn spherical_to_cartesian(
        &self,
        lat: &str,
        lon: &str,
        radius: &str,
    ) -> Result<EphemerisTable, TargeterError> {
        let lat = self.require_column(lat)?;
        let lon = self.require_column(lon)?;
        let unit = vec![1.0; self.len()];
        let dist = self.column(radius).unwrap_or(&unit);

        let vectors: Vec<Vector3<f64>> = lat
            .iter()
            .zip(lon)
            .zip(dist)
            .map(|((&lat, &lon), &r)| sph2cart(lat, lon, r))
            .collect();

        let mut cartesian = self.clone();
        cartesian.set_positions(&Matrix3xX::from_fn(vectors.len(), |r, c| vectors[c][r]))?;
        Ok(cartesian)
    }
}

/// Kind of query behind an [`EphemerisProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    /// State vectors: the table already carries `x, y, z`.
    Vectors,
    /// Observer tables: apparent ICRF right ascension / declination and distance.
    Observer,
}

impl FromStr for QueryType {
    type Err = TargeterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VECTORS" => Ok(QueryType::Vectors),
            "OBSERVER" => Ok(QueryType::Observer),
            other => Err(TargeterError::UnsupportedQueryType(other.to_string())),
        }
    }
}

/// An ephemeris retrieval client, seen from the targeter.
///
/// Implementors perform whatever request/parsing they need and hand back a table.
/// The `query_type` tag tells how the table encodes positions.
pub trait EphemerisProvider {
    fn table(&self) -> Result<EphemerisTable, TargeterError>;

    /// `"VECTORS"` or `"OBSERVER"`; any other tag is rejected.
    fn query_type(&self) -> &str;
}

/// Ephemeris as accepted by the targeter: an in-memory table or a provider.
pub enum EphemerisInput<'a> {
    Table(EphemerisTable),
    Provider(&'a dyn EphemerisProvider),
}

impl From<EphemerisTable> for EphemerisInput<'_> {
    fn from(table: EphemerisTable) -> Self {
        EphemerisInput::Table(table)
    }
}

impl<'a, P: EphemerisProvider> From<&'a P> for EphemerisInput<'a> {
    fn from(provider: &'a P) -> Self {
        EphemerisInput::Provider(provider)
    }
}

impl EphemerisInput<'_> {
    /// Coerce the input to a table carrying `x, y, z` columns.
    ///
    /// Providers are dispatched on their query type: `VECTORS` tables are used as-is,
    /// `OBSERVER` tables are converted from `dec_app_icrf, ra_app_icrf, dist`.
    pub fn into_cartesian(self) -> Result<EphemerisTable, TargeterError> {
        match self {
            EphemerisInput::Table(table) => table.to_cartesian(),
            EphemerisInput::Provider(provider) => {
                let query_type = QueryType::from_str(provider.query_type())?;
                let table = provider.table()?;
                match query_type {
                    QueryType::Vectors => Ok(table),
                    QueryType::Observer => {
                        table.spherical_to_cartesian("dec_app_icrf", "ra_app_icrf", "dist")
                    }
                }
            }
        }
    }
}
