//! # Skill records and result tables
//!
//! Output types of the skill evaluation, from the finest to the coarsest:
//!
//! * [`SkillRecord`] – the four metrics of one particle.
//! * [`RunSkill`] – every record of one successfully evaluated run, indexed by particle.
//! * [`SkillTable`] – the outcome of **every** run, failures included.
//! * [`SkillArray`] – dense numeric view `(run, particle, field)` for downstream reporting,
//!   with failed runs filled with `NaN`.
//!
//! The field order of the numeric view is fixed by [`SkillField`]:
//! `start_time, trajectory_length, separation_distance, skill_score`.
use std::{fmt, ops::Index};

use hifitime::Epoch;
use itertools::Itertools;

use crate::{
    constants::Meter,
    simulation::RunId,
    skill_errors::SkillError,
    time::epoch_to_mjd,
};

/// Metrics of one particle against the observed drifter.
///
/// Fields
/// -----------------
/// * `start_time` – First aligned observed timestamp.
/// * `trajectory_length` – Geodesic path length of the aligned simulated points (m).
/// * `separation_distance` – Geodesic distance between the last aligned observed and
///   simulated points (m).
/// * `skill_score` – `max(0, 1 - separation / length)`, or `NaN` when undefined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillRecord {
    pub start_time: Epoch,
    pub trajectory_length: Meter,
    pub separation_distance: Meter,
    pub skill_score: f64,
}

impl SkillRecord {
    /// Numeric row in [`SkillField`] order, `start_time` as a Modified Julian Date.
    pub fn to_row(&self) -> [f64; 4] {
        [
            epoch_to_mjd(&self.start_time),
            self.trajectory_length,
            self.separation_distance,
            self.skill_score,
        ]
    }
}

/// Column of the numeric skill array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkillField {
    StartTime,
    TrajectoryLength,
    SeparationDistance,
    SkillScore,
}

impl SkillField {
    pub const ALL: [SkillField; 4] = [
        SkillField::StartTime,
        SkillField::TrajectoryLength,
        SkillField::SeparationDistance,
        SkillField::SkillScore,
    ];

    pub fn index(self) -> usize {
        match self {
            SkillField::StartTime => 0,
            SkillField::TrajectoryLength => 1,
            SkillField::SeparationDistance => 2,
            SkillField::SkillScore => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SkillField::StartTime => "start_time",
            SkillField::TrajectoryLength => "trajectory_length",
            SkillField::SeparationDistance => "separation_distance",
            SkillField::SkillScore => "skill_score",
        }
    }
}

impl fmt::Display for SkillField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Records of one successfully evaluated run.
///
/// `records[j]` belongs to particle `j`; `aligned` is the number of instants shared by
/// the run and the observed trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSkill {
    pub run: RunId,
    pub aligned: usize,
    pub records: Vec<SkillRecord>,
}

impl RunSkill {
    pub fn num_particles(&self) -> usize {
        self.records.len()
    }

    /// Particle with the highest defined skill score, if any.
    pub fn best_particle(&self) -> Option<(usize, &SkillRecord)> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.skill_score.is_nan())
            .max_by(|(_, a), (_, b)| a.skill_score.total_cmp(&b.skill_score))
    }

    /// Distribution of the skill scores of the run.
    ///
    /// `NaN` scores are counted but excluded from the statistics; when no score is
    /// defined, the statistics themselves are `NaN`.
    pub fn summary(&self) -> SkillSummary {
        let scores: Vec<f64> = self
            .records
            .iter()
            .map(|r| r.skill_score)
            .filter(|s| !s.is_nan())
            .sorted_by(f64::total_cmp)
            .collect();

        let n = scores.len();
        let (min, median, max, mean) = if n == 0 {
            (f64::NAN, f64::NAN, f64::NAN, f64::NAN)
        } else {
            // nearest-rank median
            let mid = ((n as f64 - 1.0) * 0.5).round() as usize;
            (
                scores[0],
                scores[mid],
                scores[n - 1],
                scores.iter().sum::<f64>() / n as f64,
            )
        };

        SkillSummary {
            particles: self.records.len(),
            defined: n,
            min,
            median,
            max,
            mean,
        }
    }
}

/// Skill score distribution of one run.
///
/// Display
/// -----------------
/// * `format!("{}", summary)` – compact single line:
///   ```text
///   particles=4, defined=3, min=0.000, median=0.667, max=1.000, mean=0.556
///   ```
/// * `format!("{:#}", summary)` – multi-line table:
///   ```text
///   Skill score summary
///   -------------------
///   particles : 4
///   defined   : 3
///   min       : 0.000
///   median    : 0.667
///   max       : 1.000
///   mean      : 0.556
///   ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillSummary {
    pub particles: usize,
    pub defined: usize,
    pub min: f64,
    pub median: f64,
    pub max: f64,
    pub mean: f64,
}

impl fmt::Display for SkillSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Skill score summary")?;
            writeln!(f, "-------------------")?;
            writeln!(f, "particles : {}", self.particles)?;
            writeln!(f, "defined   : {}", self.defined)?;
            writeln!(f, "min       : {:.3}", self.min)?;
            writeln!(f, "median    : {:.3}", self.median)?;
            writeln!(f, "max       : {:.3}", self.max)?;
            write!(f, "mean      : {:.3}", self.mean)
        } else {
            write!(
                f,
                "particles={}, defined={}, min={:.3}, median={:.3}, max={:.3}, mean={:.3}",
                self.particles, self.defined, self.min, self.median, self.max, self.mean
            )
        }
    }
}

/// Outcome of every evaluated run, in input order.
///
/// Failed runs stay in the table as their run-scoped [`SkillError`] (which carries the
/// [`RunId`]); `num_particles` is the particle count shared by every successful run.
#[derive(Debug)]
pub struct SkillTable {
    pub num_particles: usize,
    pub runs: Vec<Result<RunSkill, SkillError>>,
}

impl SkillTable {
    pub fn num_runs(&self) -> usize {
        self.runs.len()
    }

    pub fn successful_runs(&self) -> impl Iterator<Item = &RunSkill> {
        self.runs.iter().filter_map(|r| r.as_ref().ok())
    }

    /// Identifier and cause of every failed run.
    pub fn failed_runs(&self) -> Vec<(&RunId, &SkillError)> {
        self.runs
            .iter()
            .filter_map(|r| r.as_ref().err())
            .filter_map(|e| e.run_id().map(|id| (id, e)))
            .collect()
    }

    /// Dense `(run, particle, field)` view of the table.
    pub fn to_array(&self) -> SkillArray {
        let shape = (self.runs.len(), self.num_particles, SkillField::ALL.len());
        let mut data = vec![f64::NAN; shape.0 * shape.1 * shape.2];

        for (r, outcome) in self.runs.iter().enumerate() {
            let Ok(run) = outcome else { continue };
            for (p, record) in run.records.iter().enumerate().take(shape.1) {
                let offset = (r * shape.1 + p) * shape.2;
                data[offset..offset + shape.2].copy_from_slice(&record.to_row());
            }
        }

        SkillArray {
            shape,
            data,
            failed_runs: self.failed_runs().into_iter().map(|(id, _)| id.clone()).collect(),
        }
    }
}

/// Row-major `(run, particle, field)` array of skill metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillArray {
    shape: (usize, usize, usize),
    data: Vec<f64>,
    failed_runs: Vec<RunId>,
}

impl SkillArray {
    /// `(num_runs, num_particles, 4)`
    pub fn shape(&self) -> (usize, usize, usize) {
        self.shape
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Runs whose rows are filled with `NaN`.
    pub fn failed_runs(&self) -> &[RunId] {
        &self.failed_runs
    }

    pub fn get(&self, run: usize, particle: usize, field: SkillField) -> Option<f64> {
        (run < self.shape.0 && particle < self.shape.1)
            .then(|| self.data[(run * self.shape.1 + particle) * self.shape.2 + field.index()])
    }

    /// The four fields of one `(run, particle)` cell.
    pub fn row(&self, run: usize, particle: usize) -> Option<&[f64]> {
        (run < self.shape.0 && particle < self.shape.1).then(|| {
            let offset = (run * self.shape.1 + particle) * self.shape.2;
            &self.data[offset..offset + self.shape.2]
        })
    }
}

impl Index<(usize, usize, SkillField)> for SkillArray {
    type Output = f64;

    fn index(&self, (run, particle, field): (usize, usize, SkillField)) -> &f64 {
        assert!(
            run < self.shape.0 && particle < self.shape.1,
            "skill array index ({run}, {particle}) out of bounds for shape {:?}",
            self.shape
        );
        &self.data[(run * self.shape.1 + particle) * self.shape.2 + field.index()]
    }
}
