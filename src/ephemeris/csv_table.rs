//! Reading pre-fetched ephemeris tables from CSV.
//!
//! The layout is the one written by common dataframe tools: a header row, then one
//! row per epoch. Column handling:
//!
//! * `time` is parsed with [`parse_epoch`] (ISO 8601, Horizons calendar strings or Julian Dates),
//! * an unnamed first column is taken as the row labels,
//! * every other column is kept if all of its non-empty fields parse as `f64`
//!   (empty fields become NaN); text columns are skipped.

use std::fs::File;
use std::io::Read;

use camino::Utf8Path;
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use super::EphemerisTable;
use crate::targeter_errors::TargeterError;
use crate::time::parse_epoch;

impl EphemerisTable {
    /// Read a table from any CSV source.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, TargeterError> {
        let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let records: Vec<StringRecord> = csv_reader.records().collect::<Result<_, _>>()?;

        let mut table = EphemerisTable::default();

        if let Some(first) = headers.get(0).filter(|h| h.is_empty()) {
            let index = records
                .iter()
                .map(|record| {
                    let raw = record.get(0).unwrap_or_default();
                    raw.parse::<usize>()
                        .map_err(|_| TargeterError::InvalidNumber {
                            column: first.to_string(),
                            value: raw.to_string(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            table = table.with_index(index)?;
        }

        for (position, name) in headers.iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            let fields = records.iter().map(|record| record.get(position).unwrap_or_default());

            if name == "time" {
                let epochs = fields.map(parse_epoch).collect::<Result<Vec<_>, _>>()?;
                table.set_time(epochs)?;
                continue;
            }

            match parse_numeric_column(fields) {
                Some(values) => table.insert_column(name, values)?,
                None => debug!(column = name, "skipping non-numeric CSV column"),
            }
        }

        if table.is_empty() && !records.is_empty() {
            table = table.with_index((0..records.len()).collect())?;
        }
        Ok(table)
    }

    /// Read a table from a CSV file on disk.
    pub fn from_csv_path(path: &Utf8Path) -> Result<Self, TargeterError> {
        let file = File::open(path)?;
        EphemerisTable::from_csv_reader(file)
    }
}

fn parse_numeric_column<'a>(fields: impl Iterator<Item = &'a str>) -> Option<Vec<f64>> {
    fields
        .map(|field| {
            if field.is_empty() {
                Some(f64::NAN)
            } else {
                field.parse::<f64>().ok()
            }
        })
        .collect()
}
