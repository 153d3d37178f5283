use hifitime::Epoch;
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::constants::EphemerisSeconds;
use crate::targeter_errors::TargeterError;

/// JPL Horizons calendar date, e.g. `2021-Jan-01 00:00:00.000` or `A.D. 2021-Jan-01 12:30`
static HORIZONS_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:A\.D\.\s*)?(\d{4})-([A-Za-z]{3})-(\d{1,2})(?:[ T]+(\d{1,2}):(\d{2})(?::(\d{2}(?:\.\d+)?))?)?$",
    )
    .expect("Horizons date regex must compile")
});

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Parse a timestamp as found in an ephemeris table.
///
/// Accepted forms
/// --------------
/// * ISO 8601 strings understood by [`hifitime`] (`2021-01-01T00:00:00`, optionally with a time scale suffix),
/// * JPL Horizons calendar strings (`2021-Jan-01 00:00:00.000`, `A.D. 2021-Jan-01 00:00`),
/// * bare floats, interpreted as Julian Dates in UTC.
///
/// Strings without an explicit scale are interpreted as UTC.
///
/// Return
/// ----------
/// * The parsed [`Epoch`], or [`TargeterError::InvalidEpoch`] if no form matches.
pub fn parse_epoch(raw: &str) -> Result<Epoch, TargeterError> {
    let raw = raw.trim();

    if let Ok(jd) = f64::from_str(raw) {
        return Ok(Epoch::from_jde_utc(jd));
    }

    if let Some(caps) = HORIZONS_DATE.captures(raw) {
        let month_name = caps[2].to_ascii_lowercase();
        let month = MONTHS
            .iter()
            .position(|m| *m == month_name)
            .ok_or_else(|| TargeterError::InvalidEpoch(raw.to_string()))?
            + 1;
        let day: u8 = caps[3]
            .parse()
            .map_err(|_| TargeterError::InvalidEpoch(raw.to_string()))?;
        let hour = caps.get(4).map_or("00", |m| m.as_str());
        let minute = caps.get(5).map_or("00", |m| m.as_str());
        let second = caps.get(6).map_or("00", |m| m.as_str());

        let iso = format!(
            "{}-{month:02}-{day:02}T{:0>2}:{minute}:{second:0>2}",
            &caps[1], hour
        );
        return Epoch::from_str(&iso).map_err(|_| TargeterError::InvalidEpoch(raw.to_string()));
    }

    Epoch::from_str(raw).map_err(|_| TargeterError::InvalidEpoch(raw.to_string()))
}

/// Convert epochs to ephemeris time, the TDB seconds elapsed since J2000 expected by
/// orientation providers.
pub fn epochs_to_et(epochs: &[Epoch]) -> Vec<EphemerisSeconds> {
    epochs.iter().map(|epoch| epoch.to_et_seconds()).collect()
}
