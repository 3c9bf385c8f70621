use std::fmt;

use hifitime::Epoch;
use thiserror::Error;

use crate::simulation::RunId;

/// A single rejected row of a drifter source.
///
/// `line` is the 1-based line number in the source (header included), so it can be
/// reported back to whoever produced the file.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: u64,
    pub reason: String,
}

impl RowError {
    pub fn new(line: u64, reason: impl Into<String>) -> Self {
        RowError {
            line,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

/// Which of the two aligned series an [`AlignmentError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series {
    Observed,
    Simulated,
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Series::Observed => write!(f, "observed"),
            Series::Simulated => write!(f, "simulated"),
        }
    }
}

/// Failures of the timestamp alignment between an observed and a simulated series.
///
/// Variants
/// -----------------
/// * `NoCommonTimestamps` – The two time grids do not share a single timestamp.
/// * `DuplicateTimestamp` – A timestamp appears twice in one series, so the
///   timestamp → index mapping is ambiguous.
/// * `CountMismatch` – Both directions of the membership test selected a different
///   number of points.
/// * `NonChronological` – The aligned indices of one series are not strictly increasing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlignmentError {
    #[error("The observed and simulated time grids share no timestamp")]
    NoCommonTimestamps,
    #[error("Duplicate timestamp {time} in the {series} series")]
    DuplicateTimestamp { series: Series, time: Epoch },
    #[error("Aligned point count mismatch: {observed} observed vs {simulated} simulated")]
    CountMismatch { observed: usize, simulated: usize },
    #[error("The {series} series is not in chronological order")]
    NonChronological { series: Series },
}

fn first_row_error(errors: &[RowError]) -> String {
    errors
        .first()
        .map(|e| e.to_string())
        .unwrap_or_else(|| "<none>".to_string())
}

#[derive(Error, Debug)]
pub enum SkillError {
    #[error("Missing required column(s) in drifter source: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error(
        "Malformed drifter input: {} invalid row(s), first at {}",
        .errors.len(),
        first_row_error(.errors)
    )]
    MalformedInput { errors: Vec<RowError> },

    #[error("Unable to parse time units: {0}")]
    TimeUnits(String),

    #[error("Alignment failed for run {run}: {source}")]
    Alignment {
        run: RunId,
        #[source]
        source: AlignmentError,
    },

    #[error("Unable to read run {run}: {reason}")]
    RunRead { run: RunId, reason: String },

    #[error("Malformed simulation run: {0}")]
    MalformedRun(String),

    #[error("Invalid skill parameter: {0}")]
    InvalidSkillParameter(String),

    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),
}

impl SkillError {
    /// `true` for the errors that make the inputs of a whole evaluation unusable.
    ///
    /// Run-scoped errors (`Alignment`, `RunRead`, `MalformedRun`) return `false`: the
    /// evaluator records them against their run and keeps going.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SkillError::Alignment { .. } | SkillError::RunRead { .. } | SkillError::MalformedRun(_)
        )
    }

    /// The run an error is attached to, if any.
    pub fn run_id(&self) -> Option<&RunId> {
        match self {
            SkillError::Alignment { run, .. } | SkillError::RunRead { run, .. } => Some(run),
            _ => None,
        }
    }
}

impl PartialEq for SkillError {
    fn eq(&self, other: &Self) -> bool {
        use SkillError::*;
        match (self, other) {
            (MissingColumns(a), MissingColumns(b)) => a == b,
            (MalformedInput { errors: a }, MalformedInput { errors: b }) => a == b,
            (TimeUnits(a), TimeUnits(b)) => a == b,
            (
                Alignment {
                    run: ra,
                    source: sa,
                },
                Alignment {
                    run: rb,
                    source: sb,
                },
            ) => ra == rb && sa == sb,
            (
                RunRead {
                    run: ra,
                    reason: a,
                },
                RunRead {
                    run: rb,
                    reason: b,
                },
            ) => ra == rb && a == b,
            (MalformedRun(a), MalformedRun(b)) => a == b,
            (InvalidSkillParameter(a), InvalidSkillParameter(b)) => a == b,
            (InvalidDateRange(a), InvalidDateRange(b)) => a == b,

            // Not comparable: equal when the variant matches
            (Csv(_), Csv(_)) => true,
            (IoError(_), IoError(_)) => true,

            _ => false,
        }
    }
}

#[cfg(test)]
mod skill_errors_test {
    use super::*;

    #[test]
    fn test_malformed_input_message() {
        let err = SkillError::MalformedInput {
            errors: vec![
                RowError::new(3, "invalid hour 25"),
                RowError::new(7, "latitude out of range"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Malformed drifter input: 2 invalid row(s), first at line 3: invalid hour 25"
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn test_run_scoped_errors_are_not_fatal() {
        let run = RunId::new(1, "run_01");
        let err = SkillError::Alignment {
            run: run.clone(),
            source: AlignmentError::NoCommonTimestamps,
        };
        assert!(!err.is_fatal());
        assert_eq!(
            err.to_string(),
            "Alignment failed for run #1 (run_01): The observed and simulated time grids share no timestamp"
        );

        let err = SkillError::RunRead {
            run: run.clone(),
            reason: "missing lat".into(),
        };
        assert!(!err.is_fatal());
        assert_eq!(err.run_id(), Some(&run));
        assert_eq!(SkillError::MalformedRun("x".into()).run_id(), None);
        assert!(SkillError::TimeUnits("furlongs".into()).is_fatal());
    }

    #[test]
    fn test_missing_columns_message() {
        let err = SkillError::MissingColumns(vec!["hour".into(), "lon".into()]);
        assert_eq!(
            err.to_string(),
            "Missing required column(s) in drifter source: hour, lon"
        );
    }
}
