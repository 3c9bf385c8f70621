//! # Skill evaluation of simulated runs against an observed drifter
//!
//! Scores every particle of every run with the Liu & Weisberg (2011) skill:
//!
//! ```text
//! s = max(0, 1 - separation / length)
//! ```
//!
//! where `length` is the geodesic path length of the particle over the aligned instants
//! and `separation` the geodesic distance between its last aligned position and the last
//! aligned observed fix.
//!
//! ## Pipeline
//! -----------------
//! 1. Restrict the observed trajectory to the caller's alignment dates.
//! 2. Read every run through its [`RunSource`]; the first run read successfully fixes
//!    the particle count every other run must match.
//! 3. Per run: decode the time axis, [`align`] it with the observed timestamps, then
//!    score each particle on the aligned instants.
//!
//! Runs and particles are independent; both loops run on `rayon` when
//! [`SkillParams::parallel`] is set. Results come back in input order regardless.
//!
//! ## Failure policy
//! -----------------
//! * Run-scoped failures (unreadable source, inconsistent shape, failed alignment) are
//!   stored in the [`SkillTable`] against their run; other runs are unaffected.
//! * Failures that invalidate the whole evaluation, such as an unparsable time-units
//!   descriptor, abort it and are returned as `Err`.
//! * Degenerate metrics are `NaN`, never an error: fewer than two aligned instants,
//!   non-finite coordinates, or a geodesic that does not converge (logged at `warn`).
use camino::Utf8Path;
use hifitime::Epoch;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    constants::{DrifterId, Meter},
    drifter::{get_drifter_data, TrackPoint, Trajectory},
    geodesy::{Ellipsoid, GeoPoint},
    simulation::{RunId, RunSource, SimulationRun},
    skill_errors::SkillError,
};

use super::{
    alignment::{align, Alignment},
    skill_record::{RunSkill, SkillRecord, SkillTable},
    SkillParams,
};

/// Liu & Weisberg skill score from a path length and a final separation.
///
/// Return
/// ----------
/// * `max(0, 1 - separation / length)`, in `[0, 1]`
/// * `NaN` if `length` is zero or either input is not finite
///
/// # Example
///
/// ```rust
/// use driftskill::skill::evaluator::skill_score;
///
/// assert_eq!(skill_score(100.0, 25.0), 0.75);
/// assert_eq!(skill_score(100.0, 250.0), 0.0);
/// assert!(skill_score(0.0, 0.0).is_nan());
/// ```
pub fn skill_score(length: Meter, separation: Meter) -> f64 {
    if !length.is_finite() || !separation.is_finite() || length <= 0.0 {
        return f64::NAN;
    }
    (1.0 - separation / length).max(0.0)
}

/// Skill analysis of a set of runs against a trajectory.
pub trait SkillAnalysis {
    /// Score every run against `self`.
    ///
    /// Arguments
    /// -----------------
    /// * `runs` – Ordered run sources; the position of a run is its [`RunId::index`].
    /// * `dates` – Instants to evaluate against (see [`DateRange`](crate::time::DateRange)).
    /// * `params` – Geodesic and execution parameters.
    ///
    /// Return
    /// ----------
    /// * a [`SkillTable`] with one outcome per run
    /// * a fatal [`SkillError`] if the evaluation as a whole cannot proceed
    ///
    /// See also
    /// ------------
    /// * [`evaluate_skill`] – Free function form.
    /// * [`run_skill_analysis`] – Loads the observed trajectory from a drifter file first.
    fn evaluate_runs<S: RunSource>(
        &self,
        runs: &[S],
        dates: &[Epoch],
        params: &SkillParams,
    ) -> Result<SkillTable, SkillError>;
}

impl SkillAnalysis for Trajectory {
    fn evaluate_runs<S: RunSource>(
        &self,
        runs: &[S],
        dates: &[Epoch],
        params: &SkillParams,
    ) -> Result<SkillTable, SkillError> {
        evaluate_skill(self, runs, dates, params)
    }
}

/// Load the trajectory of `drifter_id` from a drifter file and score `runs` against it.
pub fn run_skill_analysis<S: RunSource>(
    drifter_path: &Utf8Path,
    drifter_id: &DrifterId,
    runs: &[S],
    dates: &[Epoch],
    params: &SkillParams,
) -> Result<SkillTable, SkillError> {
    let observed = get_drifter_data(drifter_path, drifter_id)?;
    if observed.is_empty() {
        warn!(drifter = %drifter_id, path = %drifter_path, "no fix found for drifter");
    }
    evaluate_skill(&observed, runs, dates, params)
}

fn map_runs<'a, T, R, F>(items: &'a [T], parallel: bool, f: F) -> Vec<R>
where
    T: Sync + 'a,
    R: Send,
    F: Fn(usize, &'a T) -> R + Sync + Send,
{
    if parallel {
        items.par_iter().enumerate().map(|(i, t)| f(i, t)).collect()
    } else {
        items.iter().enumerate().map(|(i, t)| f(i, t)).collect()
    }
}

/// Score every run of `runs` against an observed trajectory.
///
/// See [`SkillAnalysis::evaluate_runs`].
pub fn evaluate_skill<S: RunSource>(
    observed: &Trajectory,
    runs: &[S],
    dates: &[Epoch],
    params: &SkillParams,
) -> Result<SkillTable, SkillError> {
    let observed = observed.restricted_to(dates);
    let ellipsoid = params.ellipsoid();
    info!(
        runs = runs.len(),
        observed_fixes = observed.len(),
        "starting skill evaluation"
    );

    let loaded = map_runs(runs, params.parallel, |index, source| {
        let id = RunId::new(index, source.label());
        let run = source.read_run().map_err(|err| err.to_string());
        (id, run)
    });

    let num_particles = loaded
        .iter()
        .find_map(|(_, run)| run.as_ref().ok())
        .map_or(0, |run| run.num_particles());

    let outcomes = map_runs(&loaded, params.parallel, |_, (id, run)| {
        let run = run.as_ref().map_err(|reason| SkillError::RunRead {
            run: id.clone(),
            reason: reason.clone(),
        })?;
        if run.num_particles() != num_particles {
            return Err(SkillError::RunRead {
                run: id.clone(),
                reason: format!(
                    "{} particles, expected {num_particles} as in the first run",
                    run.num_particles()
                ),
            });
        }
        evaluate_run(&observed, id, run, &ellipsoid, params.parallel)
    });

    let mut table = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            Err(err) if err.is_fatal() => {
                warn!(error = %err, "skill evaluation aborted");
                return Err(err);
            }
            Err(err) => {
                warn!(error = %err, "run excluded from skill evaluation");
                table.push(Err(err));
            }
            Ok(skill) => table.push(Ok(skill)),
        }
    }
    info!(
        succeeded = table.iter().filter(|o| o.is_ok()).count(),
        failed = table.iter().filter(|o| o.is_err()).count(),
        "skill evaluation done"
    );

    Ok(SkillTable {
        num_particles,
        runs: table,
    })
}

/// Score all particles of one run.
fn evaluate_run(
    observed: &Trajectory,
    id: &RunId,
    run: &SimulationRun,
    ellipsoid: &Ellipsoid,
    parallel: bool,
) -> Result<RunSkill, SkillError> {
    let epochs = run.epochs().map_err(|err| match err {
        SkillError::MalformedRun(reason) => SkillError::RunRead {
            run: id.clone(),
            reason,
        },
        other => other,
    })?;

    let alignment = align(&observed.times(), &epochs).map_err(|source| SkillError::Alignment {
        run: id.clone(),
        source,
    })?;

    let aligned_obs: Vec<&TrackPoint> = alignment
        .observed_indices()
        .iter()
        .map(|&i| &observed.points()[i])
        .collect();
    let (Some(first_obs), Some(last_obs)) = (aligned_obs.first(), aligned_obs.last()) else {
        return Err(SkillError::RunRead {
            run: id.clone(),
            reason: "empty alignment".into(),
        });
    };
    let start_time = first_obs.time;
    let target = last_obs.position;

    debug!(run = %id, aligned = alignment.len(), "run aligned with observations");

    let score = |particle: usize| {
        score_particle(run, particle, &alignment, target, start_time, ellipsoid, id)
    };
    let records: Vec<SkillRecord> = if parallel {
        (0..run.num_particles()).into_par_iter().map(score).collect()
    } else {
        (0..run.num_particles()).map(score).collect()
    };

    Ok(RunSkill {
        run: id.clone(),
        aligned: alignment.len(),
        records,
    })
}

fn score_particle(
    run: &SimulationRun,
    particle: usize,
    alignment: &Alignment,
    target: GeoPoint,
    start_time: Epoch,
    ellipsoid: &Ellipsoid,
    id: &RunId,
) -> SkillRecord {
    let steps = alignment.simulated_indices();

    let trajectory_length = ellipsoid
        .line_length(run.particle_track(particle, steps))
        .unwrap_or_else(|err| {
            warn!(run = %id, particle, error = %err, "trajectory length undefined");
            f64::NAN
        });

    let separation_distance = match steps.last() {
        Some(&last) => ellipsoid
            .inverse(target, run.position(particle, last))
            .unwrap_or_else(|err| {
                warn!(run = %id, particle, error = %err, "separation distance undefined");
                f64::NAN
            }),
        None => f64::NAN,
    };

    SkillRecord {
        start_time,
        trajectory_length,
        separation_distance,
        skill_score: skill_score(trajectory_length, separation_distance),
    }
}
