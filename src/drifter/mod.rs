//! # Drifter data: ingestion and per-drifter trajectories
//!
//! Loading and filtering of **observed** drifter tracks. A drifter table holds fixes of
//! many drifters, one row per fix, in no particular order. [`DrifterData`] keeps every
//! validated row; [`DrifterData::trajectory_for`] extracts the time-ordered
//! [`Trajectory`] of one drifter.
//!
//! Modules
//! -----------------
//! * [`csv_reader`](crate::drifter::csv_reader) – Typed CSV schema ([`DrifterRow`]) and
//!   row validation with collected errors.
//! * [`trajectory`](crate::drifter::trajectory) – [`DrifterObservation`], [`TrackPoint`] and
//!   [`Trajectory`].
//!
//! Time Convention
//! -----------------
//! Drifter fixes carry year/month/day/hour fields only. Timestamps are therefore floored
//! to the hour and built with [`hour_epoch`](crate::time::hour_epoch).
//!
//! Example
//! -----------------
//! ```rust
//! use driftskill::drifter::DrifterData;
//! use driftskill::constants::DrifterId;
//!
//! let csv = "id,year,month,day,hour,lat,lon\n\
//!            44,2016,3,14,1,28.2,-88.5\n\
//!            44,2016,3,14,0,28.1,-88.4\n\
//!            51,2016,3,14,0,27.0,-87.0\n";
//! let data = DrifterData::from_reader(csv.as_bytes()).unwrap();
//! let track = data.trajectory_for(&DrifterId::Int(44));
//! assert_eq!(track.len(), 2);
//! assert_eq!(track.first().unwrap().position.lat, 28.1);
//! assert!(data.trajectory_for(&DrifterId::Int(7)).is_empty());
//! ```
use std::fs::File;
use std::io::Read;

use camino::Utf8Path;
use itertools::Itertools;
use tracing::debug;

use crate::{constants::DrifterId, skill_errors::SkillError};

pub mod csv_reader;
pub mod trajectory;

pub use csv_reader::{DrifterRow, REQUIRED_COLUMNS};
pub use trajectory::{DrifterObservation, TrackPoint, Trajectory};

/// Every validated fix of a drifter table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrifterData {
    observations: Vec<DrifterObservation>,
}

impl DrifterData {
    /// Read a CSV drifter table from any reader.
    ///
    /// See [`csv_reader`](crate::drifter::csv_reader) for the schema and the error policy.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SkillError> {
        Ok(DrifterData {
            observations: csv_reader::read_drifter_csv(reader)?,
        })
    }

    /// Read a CSV drifter table from a file.
    pub fn from_path(path: &Utf8Path) -> Result<Self, SkillError> {
        let file = File::open(path)?;
        debug!(path = %path, "reading drifter file");
        Self::from_reader(file)
    }

    /// Build from rows already split into typed fields (e.g. by another table reader).
    pub fn from_rows<I>(rows: I) -> Result<Self, SkillError>
    where
        I: IntoIterator<Item = DrifterRow>,
    {
        Ok(DrifterData {
            observations: csv_reader::rows_to_observations(rows)?,
        })
    }

    pub fn observations(&self) -> &[DrifterObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Distinct drifter identifiers, sorted.
    pub fn ids(&self) -> Vec<DrifterId> {
        self.observations
            .iter()
            .map(|o| o.id.clone())
            .sorted()
            .dedup()
            .collect()
    }

    /// Time-ordered trajectory of one drifter.
    ///
    /// Arguments
    /// ---------
    /// * `id`: the drifter identifier, in the same representation as the source
    ///
    /// Return
    /// ------
    /// * the drifter trajectory; empty if no fix matches `id`
    pub fn trajectory_for(&self, id: &DrifterId) -> Trajectory {
        let track: Trajectory = self
            .observations
            .iter()
            .filter(|o| &o.id == id)
            .map(DrifterObservation::track_point)
            .collect();
        debug!(drifter = %id, fixes = track.len(), "extracted drifter trajectory");
        track
    }
}

/// Load a drifter file and extract the trajectory of `drifter_id`.
pub fn get_drifter_data(path: &Utf8Path, drifter_id: &DrifterId) -> Result<Trajectory, SkillError> {
    Ok(DrifterData::from_path(path)?.trajectory_for(drifter_id))
}
