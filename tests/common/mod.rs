#![allow(dead_code)]

use std::borrow::Cow;

use approx::assert_relative_eq;
use driftskill::drifter::{TrackPoint, Trajectory};
use driftskill::simulation::{RunSource, SimulationRun};
use driftskill::skill::SkillRecord;
use driftskill::time::hour_epoch;
use driftskill::SkillError;
use hifitime::Epoch;
use tracing_subscriber::EnvFilter;

pub const UNITS: &str = "hours since 2016-01-01 00:00:00";

/// Geodesic length of 0.01° of longitude on the WGS84 equator (m).
pub const EQUATOR_STEP: f64 = 1113.194_907_791;

/// Route library logs to the test output; `RUST_LOG` overrides the `warn` default.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

pub fn at(hour: u8) -> Epoch {
    hour_epoch(2016, 1, 1, hour).unwrap()
}

pub fn hours(hs: &[u8]) -> Vec<Epoch> {
    hs.iter().map(|&h| at(h)).collect()
}

/// Drifter sitting at (0, 0) at the given hours of 2016-01-01.
pub fn drifter_at_origin(hs: &[u8]) -> Trajectory {
    hs.iter().map(|&h| TrackPoint::new(at(h), 0.0, 0.0)).collect()
}

/// Run whose particles move along the equator; `lons[p][k]` is particle `p` at hour `times[k]`.
pub fn equatorial_run(label: &str, times: &[f64], lons: &[Vec<f64>]) -> SimulationRun {
    let lats = vec![vec![0.0; times.len()]; lons.len()];
    SimulationRun::from_rows(label, times.to_vec(), UNITS, &lats, lons).unwrap()
}

pub fn assert_record_close(actual: &SkillRecord, length: f64, separation: f64, skill: f64) {
    assert_relative_eq!(actual.trajectory_length, length, epsilon = 1e-3);
    assert_relative_eq!(actual.separation_distance, separation, epsilon = 1e-3);
    assert_relative_eq!(actual.skill_score, skill, epsilon = 1e-6);
}

/// Run source standing for a file that cannot be read.
pub struct UnreadableRun(pub &'static str);

impl RunSource for UnreadableRun {
    fn label(&self) -> String {
        self.0.to_string()
    }

    fn read_run(&self) -> Result<Cow<'_, SimulationRun>, SkillError> {
        Err(SkillError::MalformedRun("variable 'lat' not found".into()))
    }
}

/// Either an in-memory run or an unreadable one, to mix both in one batch.
pub enum TestSource {
    Run(SimulationRun),
    Unreadable(UnreadableRun),
}

impl RunSource for TestSource {
    fn label(&self) -> String {
        match self {
            TestSource::Run(r) => RunSource::label(r),
            TestSource::Unreadable(u) => u.label(),
        }
    }

    fn read_run(&self) -> Result<Cow<'_, SimulationRun>, SkillError> {
        match self {
            TestSource::Run(r) => r.read_run(),
            TestSource::Unreadable(u) => u.read_run(),
        }
    }
}
