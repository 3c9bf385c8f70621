//! # CSV Reader for Drifter Observations
//!
//! Typed ingestion of drifter fixes from delimited text. The expected schema is fixed:
//!
//! | column  | type   | meaning                          |
//! |---------|--------|----------------------------------|
//! | `id`    | text   | drifter identifier               |
//! | `year`  | int    | calendar year                    |
//! | `month` | int    | month, 1–12                      |
//! | `day`   | int    | day of month                     |
//! | `hour`  | int    | hour of day, 0–23                |
//! | `lat`   | float  | latitude in degrees, [-90, 90]   |
//! | `lon`   | float  | longitude in degrees             |
//!
//! Column names are matched case-insensitively after trimming; extra columns are ignored.
//!
//! ## Error Handling
//! -----------------
//! * Missing columns are detected from the header, before any row is read, and reported
//!   as [`SkillError::MissingColumns`].
//! * Every row is deserialized into a [`DrifterRow`] and validated. Failing rows are
//!   **collected** (line number + reason) and reported together as
//!   [`SkillError::MalformedInput`]; a source with any bad row yields no data at all.
//! * A failure of the underlying reader stops the read as [`SkillError::IoError`].
use std::io::Read;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    constants::DrifterId,
    skill_errors::{RowError, SkillError},
    time::hour_epoch,
};

use super::trajectory::DrifterObservation;

/// Columns a drifter source must provide.
pub const REQUIRED_COLUMNS: [&str; 7] = ["id", "year", "month", "day", "hour", "lat", "lon"];

/// One raw row of a drifter table, typed but not yet validated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DrifterRow {
    pub id: String,
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub lat: f64,
    pub lon: f64,
}

impl DrifterRow {
    /// Validate the row and build the corresponding [`DrifterObservation`].
    ///
    /// Return
    /// ------
    /// * the observation, or the reason why the row is rejected
    pub fn to_observation(&self) -> Result<DrifterObservation, String> {
        let id = self
            .id
            .parse::<DrifterId>()
            .map_err(|_| format!("invalid drifter id '{}'", self.id))?;

        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(format!("latitude {} out of range [-90, 90]", self.lat));
        }
        if !self.lon.is_finite() {
            return Err(format!("longitude {} is not finite", self.lon));
        }

        let time = hour_epoch(self.year, self.month, self.day, self.hour)?;

        Ok(DrifterObservation {
            id,
            time,
            lat: self.lat,
            lon: self.lon,
        })
    }
}

fn deserialize_reason(err: &csv::Error) -> String {
    match err.kind() {
        csv::ErrorKind::Deserialize { err, .. } => err.to_string(),
        _ => err.to_string(),
    }
}

/// Validate in-memory rows, collecting every failure.
///
/// Line numbers in reported errors are the 1-based positions of the rows.
pub(crate) fn rows_to_observations<I>(rows: I) -> Result<Vec<DrifterObservation>, SkillError>
where
    I: IntoIterator<Item = DrifterRow>,
{
    let mut observations = Vec::new();
    let mut errors = Vec::new();

    for (idx, row) in rows.into_iter().enumerate() {
        match row.to_observation() {
            Ok(obs) => observations.push(obs),
            Err(reason) => errors.push(RowError::new(idx as u64 + 1, reason)),
        }
    }

    if errors.is_empty() {
        Ok(observations)
    } else {
        Err(SkillError::MalformedInput { errors })
    }
}

/// Read and validate a full drifter table from any reader.
///
/// Arguments
/// -----------------
/// * `reader` – CSV content with a header line.
///
/// Return
/// ----------
/// * every validated observation, in source order
/// * [`SkillError::MissingColumns`] if the header lacks a required column
/// * [`SkillError::MalformedInput`] with all rejected rows otherwise
/// * [`SkillError::IoError`] if `reader` fails mid-stream
pub(crate) fn read_drifter_csv<R: Read>(reader: R) -> Result<Vec<DrifterObservation>, SkillError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: csv::StringRecord = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SkillError::MissingColumns(missing));
    }

    let mut observations = Vec::new();
    let mut errors = Vec::new();

    for (idx, result) in rdr.records().enumerate() {
        // header is line 1
        let fallback_line = idx as u64 + 2;
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                let line = err.position().map_or(fallback_line, |p| p.line());
                let reason = deserialize_reason(&err);
                if let csv::ErrorKind::Io(io) = err.into_kind() {
                    return Err(SkillError::IoError(io));
                }
                errors.push(RowError::new(line, reason));
                continue;
            }
        };
        let line = record.position().map_or(fallback_line, |p| p.line());

        let parsed = record
            .deserialize::<DrifterRow>(Some(&headers))
            .map_err(|err| deserialize_reason(&err))
            .and_then(|row| row.to_observation());

        match parsed {
            Ok(obs) => observations.push(obs),
            Err(reason) => errors.push(RowError::new(line, reason)),
        }
    }

    if !errors.is_empty() {
        warn!(
            rejected = errors.len(),
            accepted = observations.len(),
            "drifter source contains malformed rows"
        );
        return Err(SkillError::MalformedInput { errors });
    }

    debug!(rows = observations.len(), "drifter source loaded");
    Ok(observations)
}
