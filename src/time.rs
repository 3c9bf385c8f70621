//! # Calendar timestamps, CF time units and date ranges
//!
//! Every timestamp handled by the crate is a [`hifitime::Epoch`] built on
//! [`CIVIL_TIME_SCALE`]. Drifter rows carry calendar fields (year, month, day, hour) while
//! model output carries offsets such as `"hours since 2016-01-01 00:00:00"`; both are
//! calendar labels without leap seconds, so they are placed on a uniform scale where
//! `2016-12-31T23:00 + 2 h == 2017-01-01T01:00` holds exactly.
//!
//! Alignment never compares `Epoch`s directly: it goes through [`epoch_key`], an exact
//! integer count of nanoseconds since 1970-01-01 on the civil scale.
use std::str::FromStr;
use std::sync::LazyLock;

use hifitime::{Duration, Epoch, TimeScale};
use regex::Regex;

use crate::constants::{NANOS_PER_SECOND, SECONDS_PER_DAY, SECONDS_PER_HOUR, MJD};
use crate::skill_errors::SkillError;

/// Time scale used to carry calendar labels (uniform, no leap seconds).
pub const CIVIL_TIME_SCALE: TimeScale = TimeScale::TAI;

const MAX_OFFSET_SECONDS: f64 = 1e13;

static UNITS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*([a-z]+)\s+since\s+(.+?)\s*$").expect("valid time units regex")
});

static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(\d{4})-(\d{1,2})-(\d{1,2})(?:[T ](\d{1,2}):(\d{1,2})(?::(\d{1,2})(?:\.(\d{1,9}))?)?)?\s*(?:Z|UTC|[+-]00:?00)?$",
    )
    .expect("valid reference date regex")
});

/// Build a calendar timestamp on [`CIVIL_TIME_SCALE`].
///
/// Arguments
/// ---------
/// * `year`, `month`, `day`, `hour`, `minute`, `second`, `nanos`: calendar fields
///
/// Return
/// ------
/// * the corresponding [`Epoch`], or a human readable reason if the fields do not form a
///   valid Gregorian date
pub fn civil_epoch(
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    nanos: u32,
) -> Result<Epoch, String> {
    if hour > 23 || minute > 59 || second > 59 {
        return Err(format!(
            "invalid time of day {hour:02}:{minute:02}:{second:02}"
        ));
    }
    Epoch::maybe_from_gregorian(
        year,
        month,
        day,
        hour,
        minute,
        second,
        nanos,
        CIVIL_TIME_SCALE,
    )
    .map_err(|e| format!("invalid date {year:04}-{month:02}-{day:02}: {e}"))
}

/// Timestamp of a drifter fix, floored to the hour (minutes and seconds are not tracked).
pub fn hour_epoch(year: i32, month: u8, day: u8, hour: u8) -> Result<Epoch, String> {
    civil_epoch(year, month, day, hour, 0, 0, 0)
}

fn unix_reference() -> Epoch {
    Epoch::from_gregorian(1970, 1, 1, 0, 0, 0, 0, CIVIL_TIME_SCALE)
}

/// Exact alignment key of a timestamp: nanoseconds since 1970-01-01T00:00:00 (civil scale).
pub fn epoch_key(epoch: &Epoch) -> i128 {
    (*epoch - unix_reference()).total_nanoseconds()
}

/// Encode a civil timestamp as a Modified Julian Date (days) for numeric output.
pub fn epoch_to_mjd(epoch: &Epoch) -> MJD {
    epoch.to_mjd_tai_days()
}

fn duration_from_seconds(seconds: f64) -> Duration {
    Duration::from_total_nanoseconds((seconds * NANOS_PER_SECOND).round() as i128)
}

/// Unit of a CF-style relative time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Length of one unit in seconds.
    pub fn seconds(&self) -> f64 {
        match self {
            TimeUnit::Microseconds => 1e-6,
            TimeUnit::Milliseconds => 1e-3,
            TimeUnit::Seconds => 1.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => SECONDS_PER_HOUR,
            TimeUnit::Days => SECONDS_PER_DAY,
        }
    }
}

impl FromStr for TimeUnit {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "microseconds" | "microsecond" | "us" => Ok(TimeUnit::Microseconds),
            "milliseconds" | "millisecond" | "msecs" | "msec" | "ms" => Ok(TimeUnit::Milliseconds),
            "seconds" | "second" | "secs" | "sec" | "s" => Ok(TimeUnit::Seconds),
            "minutes" | "minute" | "mins" | "min" => Ok(TimeUnit::Minutes),
            "hours" | "hour" | "hrs" | "hr" | "h" => Ok(TimeUnit::Hours),
            "days" | "day" | "d" => Ok(TimeUnit::Days),
            other => Err(SkillError::TimeUnits(format!("unknown time unit '{other}'"))),
        }
    }
}

/// Parsed `"<unit> since <reference date>"` descriptor of a model time axis.
///
/// # Example
///
/// ```rust
/// use driftskill::time::{hour_epoch, TimeUnits};
///
/// let units: TimeUnits = "hours since 2016-01-01 00:00:00".parse().unwrap();
/// assert_eq!(units.to_epoch(6.0), Some(hour_epoch(2016, 1, 1, 6).unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TimeUnits {
    pub unit: TimeUnit,
    pub reference: Epoch,
}

impl FromStr for TimeUnits {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = UNITS_RE.captures(s).ok_or_else(|| {
            SkillError::TimeUnits(format!("'{s}' is not of the form '<unit> since <date>'"))
        })?;
        let unit = caps[1].parse::<TimeUnit>()?;
        let reference = parse_reference_date(&caps[2])?;
        Ok(TimeUnits { unit, reference })
    }
}

impl TimeUnits {
    /// Convert one relative offset into an absolute timestamp.
    ///
    /// Return
    /// ------
    /// * `None` if the offset is not finite or does not fit the time representation
    pub fn to_epoch(&self, value: f64) -> Option<Epoch> {
        let seconds = value * self.unit.seconds();
        // about 300 000 years, well inside the Duration range
        if !seconds.is_finite() || seconds.abs() > MAX_OFFSET_SECONDS {
            return None;
        }
        Some(self.reference + duration_from_seconds(seconds))
    }

    /// Convert a full time axis.
    ///
    /// Return
    /// ------
    /// * the absolute timestamps, or the index of the first unconvertible value
    pub fn to_epochs(&self, values: &[f64]) -> Result<Vec<Epoch>, usize> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| self.to_epoch(*v).ok_or(i))
            .collect()
    }
}

fn parse_reference_date(date_str: &str) -> Result<Epoch, SkillError> {
    let invalid = || SkillError::TimeUnits(format!("invalid reference date '{date_str}'"));
    let caps = REFERENCE_RE.captures(date_str.trim()).ok_or_else(invalid)?;

    let field = |i: usize| -> Result<u32, SkillError> {
        caps.get(i)
            .map_or(Ok(0), |m| m.as_str().parse::<u32>().map_err(|_| invalid()))
    };
    let narrow = |v: u32| u8::try_from(v).map_err(|_| invalid());

    let year = caps[1].parse::<i32>().map_err(|_| invalid())?;
    let month = narrow(field(2)?)?;
    let day = narrow(field(3)?)?;
    let hour = narrow(field(4)?)?;
    let minute = narrow(field(5)?)?;
    let second = narrow(field(6)?)?;
    let nanos = match caps.get(7) {
        Some(frac) => format!("{:0<9}", frac.as_str())
            .parse::<u32>()
            .map_err(|_| invalid())?,
        None => 0,
    };

    civil_epoch(year, month, day, hour, minute, second, nanos)
        .map_err(|reason| SkillError::TimeUnits(format!("'{date_str}': {reason}")))
}

/// Regularly spaced, inclusive range of timestamps.
///
/// This is the explicit set of instants a caller intends to evaluate against; the
/// observed trajectory is restricted to it before grid intersection.
#[derive(Debug, Clone, PartialEq)]
pub struct DateRange {
    start: Epoch,
    end: Epoch,
    step: Duration,
}

impl DateRange {
    /// Create a new range from `start` to `end` (both included) every `step`.
    ///
    /// Return
    /// ------
    /// * [`SkillError::InvalidDateRange`] if `step` is not strictly positive or `end`
    ///   precedes `start`
    pub fn new(start: Epoch, end: Epoch, step: Duration) -> Result<Self, SkillError> {
        if step.total_nanoseconds() <= 0 {
            return Err(SkillError::InvalidDateRange(
                "step must be strictly positive".into(),
            ));
        }
        if epoch_key(&end) < epoch_key(&start) {
            return Err(SkillError::InvalidDateRange(format!(
                "end {end} precedes start {start}"
            )));
        }
        Ok(DateRange { start, end, step })
    }

    /// Hourly range, the native frequency of drifter fixes.
    pub fn hourly(start: Epoch, end: Epoch) -> Result<Self, SkillError> {
        Self::new(start, end, duration_from_seconds(SECONDS_PER_HOUR))
    }

    pub fn start(&self) -> Epoch {
        self.start
    }

    pub fn end(&self) -> Epoch {
        self.end
    }

    /// Number of timestamps in the range.
    pub fn len(&self) -> usize {
        let span = epoch_key(&self.end) - epoch_key(&self.start);
        (span / self.step.total_nanoseconds()) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over the timestamps of the range, in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = Epoch> + '_ {
        (0..self.len()).map(move |i| {
            let offset = self.step.total_nanoseconds() * i as i128;
            self.start + Duration::from_total_nanoseconds(offset)
        })
    }

    /// Materialize the range.
    pub fn epochs(&self) -> Vec<Epoch> {
        self.iter().collect()
    }
}
