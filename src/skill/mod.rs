//! # Skill evaluation
//!
//! Measures how well simulated particles reproduce an observed drifter track.
//!
//! ## Overview
//! -----------------
//! For every run and every particle, the evaluator pairs the simulated positions with the
//! observed fixes taken at the same instants, then computes on the reference ellipsoid:
//!
//! * the **trajectory length** of the particle over the aligned instants,
//! * the **separation distance** between the last aligned observed and simulated points,
//! * the **skill score** `max(0, 1 - separation / length)` (Liu & Weisberg, 2011).
//!
//! Modules
//! -----------------
//! * [`alignment`](crate::skill::alignment) – Timestamp matching of two series.
//! * [`evaluator`](crate::skill::evaluator) – The evaluation pipeline and the skill formula.
//! * [`skill_record`](crate::skill::skill_record) – Records, per-run tables and the numeric
//!   `(run, particle, field)` array.
//!
//! Configuration goes through [`SkillParams`], either with its defaults (WGS84, parallel
//! execution) or with [`SkillParams::builder`].
//!
//! Example
//! -----------------
//! ```rust
//! use driftskill::drifter::{TrackPoint, Trajectory};
//! use driftskill::simulation::SimulationRun;
//! use driftskill::skill::{SkillAnalysis, SkillField, SkillParams};
//! use driftskill::time::{hour_epoch, DateRange};
//!
//! let observed: Trajectory = (0..4)
//!     .map(|h| TrackPoint::new(hour_epoch(2016, 1, 1, h).unwrap(), 0.0, 0.0))
//!     .collect();
//! let run = SimulationRun::from_rows(
//!     "run_00",
//!     vec![0.0, 1.0, 2.0, 3.0],
//!     "hours since 2016-01-01 00:00:00",
//!     &[vec![0.0; 4]],
//!     &[vec![0.0, 0.01, 0.02, 0.01]],
//! )
//! .unwrap();
//! let dates = DateRange::hourly(observed.first().unwrap().time, observed.last().unwrap().time)
//!     .unwrap()
//!     .epochs();
//!
//! let table = observed
//!     .evaluate_runs(&[run], &dates, &SkillParams::default())
//!     .unwrap();
//! let skill = table.to_array()[(0, 0, SkillField::SkillScore)];
//! assert!((skill - 2.0 / 3.0).abs() < 1e-6);
//! ```
use std::fmt;

use crate::{
    constants::{EARTH_MAJOR_AXIS, WGS84_INVERSE_FLATTENING},
    geodesy::{Ellipsoid, VINCENTY_MAX_ITER, VINCENTY_TOLERANCE},
    skill_errors::SkillError,
};

pub mod alignment;
pub mod evaluator;
pub mod skill_record;

pub use alignment::{align, Alignment};
pub use evaluator::{evaluate_skill, run_skill_analysis, skill_score, SkillAnalysis};
pub use skill_record::{RunSkill, SkillArray, SkillField, SkillRecord, SkillSummary, SkillTable};

/// Parameters of the skill evaluation.
///
/// Defaults
/// -----------------
/// * `semi_major_axis`: 6 378 137 m (WGS84)
/// * `inverse_flattening`: 298.257 223 563 (WGS84)
/// * `vincenty_tolerance`: 1e-12 rad
/// * `vincenty_max_iter`: 200
/// * `parallel`: true
///
/// Notes & Validation
/// -----------------
/// * `semi_major_axis > 0`, `inverse_flattening > 1` (finite values only).
/// * `vincenty_tolerance > 0`, `vincenty_max_iter ≥ 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillParams {
    /// Semi-major axis of the reference ellipsoid (m).
    pub semi_major_axis: f64,
    /// Inverse flattening `1/f` of the reference ellipsoid.
    pub inverse_flattening: f64,
    /// Convergence tolerance on λ for the Vincenty inverse solution (rad).
    pub vincenty_tolerance: f64,
    /// Iteration cap for the Vincenty inverse solution.
    pub vincenty_max_iter: usize,
    /// Score runs and particles on the rayon thread pool.
    pub parallel: bool,
}

impl SkillParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fluent, validating builder starting from the defaults.
    ///
    /// # Example
    ///
    /// ```rust
    /// use driftskill::skill::SkillParams;
    ///
    /// let params = SkillParams::builder()
    ///     .vincenty_max_iter(500)
    ///     .parallel(false)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(params.vincenty_max_iter, 500);
    /// assert!(SkillParams::builder().vincenty_tolerance(0.0).build().is_err());
    /// ```
    pub fn builder() -> SkillParamsBuilder {
        SkillParamsBuilder::new()
    }

    /// Reference ellipsoid with the configured iteration controls.
    pub fn ellipsoid(&self) -> Ellipsoid {
        Ellipsoid {
            a: self.semi_major_axis,
            f: 1.0 / self.inverse_flattening,
            tolerance: self.vincenty_tolerance,
            max_iter: self.vincenty_max_iter,
        }
    }
}

impl Default for SkillParams {
    fn default() -> Self {
        SkillParams {
            semi_major_axis: EARTH_MAJOR_AXIS,
            inverse_flattening: WGS84_INVERSE_FLATTENING,
            vincenty_tolerance: VINCENTY_TOLERANCE,
            vincenty_max_iter: VINCENTY_MAX_ITER,
            parallel: true,
        }
    }
}

/// Builder for [`SkillParams`], with validation.
#[derive(Debug, Clone)]
pub struct SkillParamsBuilder {
    params: SkillParams,
}

impl Default for SkillParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SkillParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: SkillParams::default(),
        }
    }

    pub fn semi_major_axis(mut self, v: f64) -> Self {
        self.params.semi_major_axis = v;
        self
    }
    pub fn inverse_flattening(mut self, v: f64) -> Self {
        self.params.inverse_flattening = v;
        self
    }
    /// Use the axis and flattening of `ellipsoid`, keeping the iteration controls.
    pub fn ellipsoid(mut self, ellipsoid: Ellipsoid) -> Self {
        self.params.semi_major_axis = ellipsoid.a;
        self.params.inverse_flattening = 1.0 / ellipsoid.f;
        self
    }
    pub fn vincenty_tolerance(mut self, v: f64) -> Self {
        self.params.vincenty_tolerance = v;
        self
    }
    pub fn vincenty_max_iter(mut self, v: usize) -> Self {
        self.params.vincenty_max_iter = v;
        self
    }
    pub fn parallel(mut self, v: bool) -> Self {
        self.params.parallel = v;
        self
    }

    /// Validate and return the parameters.
    ///
    /// Return
    /// ----------
    /// * [`SkillError::InvalidSkillParameter`] naming the first invalid field
    pub fn build(self) -> Result<SkillParams, SkillError> {
        let p = &self.params;

        if !(p.semi_major_axis.is_finite() && p.semi_major_axis > 0.0) {
            return Err(SkillError::InvalidSkillParameter(
                "semi_major_axis must be > 0".into(),
            ));
        }
        // f = 1/inverse_flattening must lie in [0, 1)
        if !(p.inverse_flattening.is_finite() && p.inverse_flattening > 1.0) {
            return Err(SkillError::InvalidSkillParameter(
                "inverse_flattening must be > 1".into(),
            ));
        }
        if !(p.vincenty_tolerance.is_finite() && p.vincenty_tolerance > 0.0) {
            return Err(SkillError::InvalidSkillParameter(
                "vincenty_tolerance must be > 0".into(),
            ));
        }
        if p.vincenty_max_iter == 0 {
            return Err(SkillError::InvalidSkillParameter(
                "vincenty_max_iter must be >= 1".into(),
            ));
        }

        Ok(self.params)
    }
}

impl fmt::Display for SkillParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            const PARAM_COL: usize = 44;
            writeln!(f, "Skill Evaluation Parameters")?;
            writeln!(f, "---------------------------")?;

            macro_rules! line {
                ($fmt:expr, $val:expr, $comment:expr) => {{
                    let s = format!($fmt, $val);
                    let pad = if s.len() < PARAM_COL {
                        " ".repeat(PARAM_COL - s.len())
                    } else {
                        " ".to_string()
                    };
                    writeln!(f, "  {}{}# {}", s, pad, $comment)
                }};
            }

            writeln!(f, "[Reference ellipsoid]")?;
            line!(
                "semi_major_axis    = {:.3} m",
                self.semi_major_axis,
                "Equatorial radius"
            )?;
            line!(
                "inverse_flattening = {:.9}",
                self.inverse_flattening,
                "1/f"
            )?;

            writeln!(f, "\n[Vincenty inverse solution]")?;
            line!(
                "vincenty_tolerance = {:.1e}",
                self.vincenty_tolerance,
                "Convergence threshold on lambda (rad)"
            )?;
            line!(
                "vincenty_max_iter  = {}",
                self.vincenty_max_iter,
                "Iteration cap"
            )?;

            writeln!(f, "\n[Execution]")?;
            line!("parallel           = {}", self.parallel, "Use rayon")?;
            Ok(())
        } else {
            write!(
                f,
                "SkillParams(a={:.3}m, 1/f={:.9}, tol={:.1e}, max_iter={}, parallel={})",
                self.semi_major_axis,
                self.inverse_flattening,
                self.vincenty_tolerance,
                self.vincenty_max_iter,
                self.parallel
            )
        }
    }
}

#[cfg(test)]
mod skill_params_test {
    use super::*;

    #[test]
    fn test_default_is_wgs84() {
        let params = SkillParams::default();
        assert_eq!(params.ellipsoid(), Ellipsoid::WGS84);
        assert!(params.parallel);
        assert_eq!(SkillParams::builder().build().unwrap(), params);
    }

    #[test]
    fn test_builder_validation() {
        let cases = [
            SkillParams::builder().semi_major_axis(-1.0),
            SkillParams::builder().semi_major_axis(f64::NAN),
            SkillParams::builder().inverse_flattening(0.5),
            SkillParams::builder().inverse_flattening(f64::NAN),
            SkillParams::builder().vincenty_tolerance(0.0),
            SkillParams::builder().vincenty_max_iter(0),
        ];
        for builder in cases {
            assert!(matches!(
                builder.build(),
                Err(SkillError::InvalidSkillParameter(_))
            ));
        }
    }

    #[test]
    fn test_builder_ellipsoid() {
        let grs80 = Ellipsoid {
            f: 1.0 / 298.257_222_101,
            ..Ellipsoid::WGS84
        };
        let params = SkillParams::builder()
            .ellipsoid(grs80)
            .vincenty_max_iter(50)
            .build()
            .unwrap();
        assert_eq!(params.semi_major_axis, grs80.a);
        assert!((params.inverse_flattening - 298.257_222_101).abs() < 1e-6);
        assert_eq!(params.ellipsoid().max_iter, 50);
    }

    #[test]
    fn test_display() {
        let params = SkillParams::default();
        assert_eq!(
            params.to_string(),
            "SkillParams(a=6378137.000m, 1/f=298.257223563, tol=1.0e-12, max_iter=200, parallel=true)"
        );
        let pretty = format!("{params:#}");
        assert!(pretty.starts_with("Skill Evaluation Parameters\n"));
        assert!(pretty.contains("vincenty_max_iter  = 200"));
    }
}
