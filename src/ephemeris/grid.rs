//! Pointing grids: flattened cartesian products of coordinate axes.
//!
//! A grid is an ordinary [`EphemerisTable`] with one column per axis plus an
//! `<axis>_ix` column holding each row's integer position along that axis. It carries
//! no time column; the targeter pairs it with a single body epoch.
//!
//! Row order is the Cartesian ("xy") meshgrid raveled row-major: with two axes the
//! first axis varies fastest. For a square `n × n` grid with odd `n` the center point
//! sits at row `(n * n) / 2`.

use itertools::Itertools;

use super::EphemerisTable;
use crate::targeter_errors::TargeterError;

/// Build a flattened, indexed meshgrid from coordinate axes.
///
/// Arguments
/// -----------------
/// * `axes`: the coordinate values along each axis (e.g. right ascension then declination, in degrees).
/// * `axis_names`: column names for the axes; defaults to `"0"`, `"1"`, …
///
/// Return
/// ----------
/// * A table with `Π len(axis)` rows, or [`TargeterError::GridAxisNames`] if the number
///   of names differs from the number of axes.
///
/// ```rust
/// use targeter::ephemeris::grid::make_raveled_meshgrid;
///
/// let grid = make_raveled_meshgrid(&[vec![10.0, 11.0], vec![-1.0, 0.0, 1.0]], Some(&["ra", "dec"]))?;
/// assert_eq!(grid.len(), 6);
/// assert_eq!(grid.column("ra").unwrap(), &[10.0, 11.0, 10.0, 11.0, 10.0, 11.0]);
/// assert_eq!(grid.column("dec_ix").unwrap(), &[0.0, 0.0, 1.0, 1.0, 2.0, 2.0]);
/// # Ok::<(), targeter::targeter_errors::TargeterError>(())
/// ```
pub fn make_raveled_meshgrid(
    axes: &[Vec<f64>],
    axis_names: Option<&[&str]>,
) -> Result<EphemerisTable, TargeterError> {
    let names: Vec<String> = match axis_names {
        Some(names) if names.len() != axes.len() => {
            return Err(TargeterError::GridAxisNames {
                axes: axes.len(),
                names: names.len(),
            })
        }
        Some(names) => names.iter().map(|n| n.to_string()).collect(),
        None => (0..axes.len()).map(|ix| ix.to_string()).collect(),
    };

    if axes.is_empty() {
        return Ok(EphemerisTable::default());
    }

    // "xy" indexing swaps the first two axes; iteration then runs in row-major order
    let mut order: Vec<usize> = (0..axes.len()).collect();
    if order.len() > 1 {
        order.swap(0, 1);
    }

    let points: Vec<Vec<usize>> = order
        .iter()
        .map(|&axis| 0..axes[axis].len())
        .multi_cartesian_product()
        .collect();

    let mut table = EphemerisTable::default();
    for (axis, name) in names.iter().enumerate() {
        let slot = order.iter().position(|&o| o == axis).unwrap_or(axis);
        let indices: Vec<usize> = points.iter().map(|point| point[slot]).collect();

        table.insert_column(
            name.as_str(),
            indices.iter().map(|&ix| axes[axis][ix]).collect(),
        )?;
        table.insert_column(
            format!("{name}_ix"),
            indices.iter().map(|&ix| ix as f64).collect(),
        )?;
    }
    Ok(table)
}
