//! # Simulated particle runs
//!
//! A model run releases a set of particles and records their positions on a common time
//! axis. This module provides the in-memory representation of one run
//! ([`SimulationRun`]) and the [`RunSource`] abstraction through which the skill
//! evaluator obtains runs.
//!
//! ## Layout & Units
//! -----------------
//! * **Positions:** two `nalgebra::DMatrix<f64>` of shape `[particle, time-step]`, holding
//!   latitudes and longitudes in **degrees**. Missing positions (e.g. beached particles)
//!   may be stored as `NaN`; they propagate into `NaN` metrics.
//! * **Time axis:** raw offsets plus their CF-style descriptor
//!   (`"hours since 2016-01-01 00:00:00"`), decoded by [`SimulationRun::epochs`].
//!
//! ## Invariants
//! -----------------
//! * `lat.shape() == lon.shape()`
//! * `lat.ncols() == time.len()`
//!
//! Both are checked by the constructors ([`SkillError::MalformedRun`]).
//!
//! ## Sources
//! -----------------
//! Readers of actual model files (netCDF, Zarr, …) live outside this crate; they
//! implement [`RunSource`] and hand over a fully materialized [`SimulationRun`], so
//! no I/O happens while scoring. `SimulationRun` itself is a `RunSource` that lends
//! itself without copying.
use std::{borrow::Cow, fmt};

use hifitime::Epoch;
use nalgebra::DMatrix;

use crate::{constants::Degree, geodesy::GeoPoint, skill_errors::SkillError, time::TimeUnits};

/// Identifier of a run inside one evaluation: its position in the input list and its label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId {
    pub index: usize,
    pub label: String,
}

impl RunId {
    pub fn new(index: usize, label: impl Into<String>) -> Self {
        RunId {
            index,
            label: label.into(),
        }
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({})", self.index, self.label)
    }
}

/// Fully materialized output of one model run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRun {
    label: String,
    time: Vec<f64>,
    time_units: String,
    lat: DMatrix<Degree>,
    lon: DMatrix<Degree>,
}

impl SimulationRun {
    /// Create a run from its time axis and position matrices.
    ///
    /// Arguments
    /// -----------------
    /// * `label` – Human readable name of the run (usually the file stem).
    /// * `time` – Relative time offsets, one per time step.
    /// * `time_units` – CF-style descriptor of `time` (`"<unit> since <date>"`).
    /// * `lat`, `lon` – Positions in degrees, shape `[particle, time-step]`.
    ///
    /// Return
    /// ----------
    /// * [`SkillError::MalformedRun`] if the matrix shapes disagree with each other or
    ///   with the time axis. The units are **not** parsed here, see [`SimulationRun::epochs`].
    pub fn new(
        label: impl Into<String>,
        time: Vec<f64>,
        time_units: impl Into<String>,
        lat: DMatrix<Degree>,
        lon: DMatrix<Degree>,
    ) -> Result<Self, SkillError> {
        let label = label.into();
        if lat.shape() != lon.shape() {
            return Err(SkillError::MalformedRun(format!(
                "{label}: latitude shape {:?} differs from longitude shape {:?}",
                lat.shape(),
                lon.shape()
            )));
        }
        if lat.ncols() != time.len() {
            return Err(SkillError::MalformedRun(format!(
                "{label}: {} time steps in positions but {} values on the time axis",
                lat.ncols(),
                time.len()
            )));
        }
        Ok(SimulationRun {
            label,
            time,
            time_units: time_units.into(),
            lat,
            lon,
        })
    }

    /// Create a run from per-particle rows of positions.
    ///
    /// Every row must have one value per time step.
    pub fn from_rows(
        label: impl Into<String>,
        time: Vec<f64>,
        time_units: impl Into<String>,
        lat_rows: &[Vec<Degree>],
        lon_rows: &[Vec<Degree>],
    ) -> Result<Self, SkillError> {
        let label = label.into();
        let steps = time.len();
        let to_matrix = |rows: &[Vec<Degree>], what: &str| {
            if let Some((j, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != steps) {
                return Err(SkillError::MalformedRun(format!(
                    "{label}: {what} row of particle {j} has {} values, expected {steps}",
                    row.len()
                )));
            }
            Ok(DMatrix::from_fn(rows.len(), steps, |i, k| rows[i][k]))
        };
        let lat = to_matrix(lat_rows, "latitude")?;
        let lon = to_matrix(lon_rows, "longitude")?;
        Self::new(label, time, time_units, lat, lon)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn num_particles(&self) -> usize {
        self.lat.nrows()
    }

    pub fn num_steps(&self) -> usize {
        self.time.len()
    }

    pub fn time_values(&self) -> &[f64] {
        &self.time
    }

    pub fn time_units(&self) -> &str {
        &self.time_units
    }

    pub fn lat(&self) -> &DMatrix<Degree> {
        &self.lat
    }

    pub fn lon(&self) -> &DMatrix<Degree> {
        &self.lon
    }

    /// Decode the time axis into absolute timestamps.
    ///
    /// Return
    /// ----------
    /// * [`SkillError::TimeUnits`] if the descriptor cannot be parsed
    /// * [`SkillError::MalformedRun`] if an offset is not finite
    pub fn epochs(&self) -> Result<Vec<Epoch>, SkillError> {
        let units: TimeUnits = self.time_units.parse()?;
        units.to_epochs(&self.time).map_err(|idx| {
            SkillError::MalformedRun(format!(
                "{}: time value {} at step {idx} cannot be converted",
                self.label, self.time[idx]
            ))
        })
    }

    /// Position of `particle` at time step `step`.
    pub fn position(&self, particle: usize, step: usize) -> GeoPoint {
        GeoPoint::new(self.lat[(particle, step)], self.lon[(particle, step)])
    }

    /// Positions of `particle` at the given time steps, in the given order.
    pub fn particle_track<'a>(
        &'a self,
        particle: usize,
        steps: &'a [usize],
    ) -> impl Iterator<Item = GeoPoint> + 'a {
        steps.iter().map(move |&k| self.position(particle, k))
    }
}

/// Anything that can hand over a materialized [`SimulationRun`].
///
/// Implementors report read failures as errors; the evaluator attaches the run
/// identifier and records them against the run (see
/// [`SkillError::RunRead`]).
pub trait RunSource: Sync {
    /// Human readable name of the run, used in reports and errors.
    fn label(&self) -> String;

    /// Load the run in memory.
    fn read_run(&self) -> Result<Cow<'_, SimulationRun>, SkillError>;
}

impl RunSource for SimulationRun {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn read_run(&self) -> Result<Cow<'_, SimulationRun>, SkillError> {
        Ok(Cow::Borrowed(self))
    }
}
