//! # Constants and type definitions for driftskill
//!
//! This module centralizes the **geodetic constants**, **time conversion factors**, and
//! **common type definitions** used throughout the crate.
//!
//! ## Overview
//!
//! - WGS84 ellipsoid parameters
//! - Unit conversions (hours ↔ seconds ↔ nanoseconds)
//! - Core type aliases used across the crate
//! - Identifiers shared between drifter datasets and particle releases
//!
//! These definitions are used by the drifter accessor, the geodesy helpers and the
//! skill evaluator.

// -------------------------------------------------------------------------------------------------
// Geodetic constants
// -------------------------------------------------------------------------------------------------

/// Earth equatorial radius in meters (WGS84)
pub const EARTH_MAJOR_AXIS: f64 = 6_378_137.0;

/// Inverse flattening of the WGS84 ellipsoid
pub const WGS84_INVERSE_FLATTENING: f64 = 298.257_223_563;

/// Numerical epsilon used for floating-point comparisons
pub const EPS: f64 = 1e-12;

// -------------------------------------------------------------------------------------------------
// Time conversions
// -------------------------------------------------------------------------------------------------

/// Number of seconds in a day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Number of seconds in an hour
pub const SECONDS_PER_HOUR: f64 = 3_600.0;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: f64 = 1e9;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Distance in meters
pub type Meter = f64;
/// Modified Julian Date (days)
pub type MJD = f64;

// -------------------------------------------------------------------------------------------------
// Identifiers
// -------------------------------------------------------------------------------------------------

/// Identifier of a drifter (and of the particles released along its track).
///
/// This can be:
/// - A numeric buoy identifier (e.g. `Int(44)`)
/// - A free-form designation (e.g. `"WMO-4402503"`)
///
/// The representation is part of the identity: `Int(44)` and `String("44")` are
/// different drifters, in the same way the source file distinguishes them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DrifterId {
    /// Integer-based identifier
    Int(u64),
    /// String-based identifier
    String(String),
}

impl std::fmt::Display for DrifterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DrifterId::Int(n) => write!(f, "{n}"),
            DrifterId::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<u64> for DrifterId {
    fn from(n: u64) -> Self {
        DrifterId::Int(n)
    }
}

impl From<String> for DrifterId {
    fn from(s: String) -> Self {
        DrifterId::String(s)
    }
}

impl From<&str> for DrifterId {
    fn from(s: &str) -> Self {
        DrifterId::String(s.to_string())
    }
}

impl std::str::FromStr for DrifterId {
    type Err = std::num::ParseIntError;

    /// Parse a `DrifterId` the way a tabular reader sees the `id` column.
    /// - Pure digits → `Int(u64)`
    /// - Otherwise  → `String(String)`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.parse::<u64>() {
            Ok(n) => Ok(DrifterId::Int(n)),
            Err(e) => {
                // Digits that overflow u64 are still a parse failure, anything else is a designation
                if !s.is_empty() && s.chars().any(|c| !c.is_ascii_digit()) {
                    Ok(DrifterId::String(s.to_string()))
                } else {
                    Err(e)
                }
            }
        }
    }
}
