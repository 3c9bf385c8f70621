//! # Ellipsoidal geodesics
//!
//! Distances between geographic positions on a reference ellipsoid, computed with
//! **Vincenty's inverse formula**. Drifter separations are typically a few kilometers,
//! a scale at which a spherical Earth already introduces measurable error, so every
//! distance of the crate goes through an [`Ellipsoid`] (WGS84 by default).
//!
//! ## Overview
//! -----------------
//! * [`Ellipsoid::inverse`] – geodesic distance between two points.
//! * [`Ellipsoid::line_length`] – cumulative distance along a polyline, the equivalent
//!   of summing `inverse` over consecutive points.
//!
//! ## Non-convergence
//! -----------------
//! Vincenty's iteration on λ may fail to converge for nearly antipodal points. The
//! failure is reported as [`GeodesicError::NoConvergence`]; callers decide how to
//! surface it. Exactly antipodal points are solved directly: the shortest geodesic
//! between them runs over the poles and measures half a meridian. Non-finite
//! coordinates are not an error: they propagate as `NaN`.
use itertools::Itertools;
use thiserror::Error;

use crate::constants::{Degree, Meter, EARTH_MAJOR_AXIS, EPS, WGS84_INVERSE_FLATTENING};

/// Default convergence tolerance on λ (radians) for the Vincenty iteration.
pub const VINCENTY_TOLERANCE: f64 = 1e-12;

/// Default iteration cap for the Vincenty iteration.
pub const VINCENTY_MAX_ITER: usize = 200;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum GeodesicError {
    #[error("Vincenty iteration did not converge after {0} iterations (near-antipodal points?)")]
    NoConvergence(usize),
}

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: Degree,
    pub lon: Degree,
}

impl GeoPoint {
    pub fn new(lat: Degree, lon: Degree) -> Self {
        GeoPoint { lat, lon }
    }

    fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

impl From<(Degree, Degree)> for GeoPoint {
    fn from((lat, lon): (Degree, Degree)) -> Self {
        GeoPoint { lat, lon }
    }
}

/// Reference ellipsoid, defined by its semi-major axis and flattening.
///
/// Fields
/// -----------------
/// * `a` – semi-major axis in meters
/// * `f` – flattening
/// * `tolerance` – convergence threshold on λ for the inverse solution
/// * `max_iter` – iteration cap for the inverse solution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    pub a: f64,
    pub f: f64,
    pub tolerance: f64,
    pub max_iter: usize,
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Ellipsoid::WGS84
    }
}

impl Ellipsoid {
    /// World Geodetic System 1984 (EPSG:7030).
    pub const WGS84: Self = Self {
        a: EARTH_MAJOR_AXIS,
        f: 1.0 / WGS84_INVERSE_FLATTENING,
        tolerance: VINCENTY_TOLERANCE,
        max_iter: VINCENTY_MAX_ITER,
    };

    /// Semi-minor axis b = a(1-f)
    #[inline]
    pub fn b(&self) -> f64 {
        self.a * (1.0 - self.f)
    }

    /// Length of half a meridian, pole to pole, in meters.
    ///
    /// This is also the distance between any two antipodal points.
    pub fn half_meridian(&self) -> Meter {
        let (a, b) = (self.a, self.b());
        let u_sq = (a * a - b * b) / (b * b);
        b * series_a(u_sq) * std::f64::consts::PI
    }

    /// Geodesic distance between two points (Vincenty inverse problem).
    ///
    /// Arguments
    /// -----------------
    /// * `p1`, `p2` – positions in degrees. Longitudes may use any convention
    ///   (`[-180, 180]` or `[0, 360]`); the difference is wrapped to `[-180, 180]`.
    ///
    /// Return
    /// ----------
    /// * the distance in meters (`NaN` if a coordinate is not finite,
    ///   [`Ellipsoid::half_meridian`] for antipodal points)
    /// * [`GeodesicError::NoConvergence`] if λ does not converge within `max_iter`
    pub fn inverse(&self, p1: GeoPoint, p2: GeoPoint) -> Result<Meter, GeodesicError> {
        if !p1.is_finite() || !p2.is_finite() {
            return Ok(f64::NAN);
        }

        let (a, f, b) = (self.a, self.f, self.b());

        let l = ((p2.lon - p1.lon + 540.0).rem_euclid(360.0) - 180.0).to_radians();

        // Reduced latitudes
        let u1 = ((1.0 - f) * p1.lat.to_radians().tan()).atan();
        let u2 = ((1.0 - f) * p2.lat.to_radians().tan()).atan();
        let (sin_u1, cos_u1) = u1.sin_cos();
        let (sin_u2, cos_u2) = u2.sin_cos();

        let mut lambda = l;
        let mut converged = false;
        let mut cos_sq_alpha = 0.0;
        let mut sin_sigma = 0.0;
        let mut cos_sigma = 0.0;
        let mut cos_2sigma_m = 0.0;
        let mut sigma = 0.0;

        for _ in 0..self.max_iter {
            let (sin_lambda, cos_lambda) = lambda.sin_cos();

            sin_sigma = ((cos_u2 * sin_lambda).powi(2)
                + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
            .sqrt();

            cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;

            if sin_sigma < EPS {
                // σ is 0 (coincident) or π (antipodal)
                return Ok(if cos_sigma > 0.0 {
                    0.0
                } else {
                    self.half_meridian()
                });
            }

            sigma = sin_sigma.atan2(cos_sigma);

            let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
            cos_sq_alpha = 1.0 - sin_alpha.powi(2);

            // equatorial line: cos²α = 0
            cos_2sigma_m = if cos_sq_alpha.abs() < EPS {
                0.0
            } else {
                cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
            };

            let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));

            let lambda_prev = lambda;
            lambda = l
                + (1.0 - c)
                    * f
                    * sin_alpha
                    * (sigma
                        + c * sin_sigma
                            * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))));

            if (lambda - lambda_prev).abs() < self.tolerance {
                converged = true;
                break;
            }
        }

        if !converged {
            return Err(GeodesicError::NoConvergence(self.max_iter));
        }

        let u_sq = cos_sq_alpha * (a * a - b * b) / (b * b);
        let big_a = series_a(u_sq);
        let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));

        let delta_sigma = big_b
            * sin_sigma
            * (cos_2sigma_m
                + big_b / 4.0
                    * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))
                        - big_b / 6.0
                            * cos_2sigma_m
                            * (-3.0 + 4.0 * sin_sigma.powi(2))
                            * (-3.0 + 4.0 * cos_2sigma_m.powi(2))));

        Ok(b * big_a * (sigma - delta_sigma))
    }

    /// Total geodesic length of a polyline, in meters.
    ///
    /// The length is the sum of [`Ellipsoid::inverse`] over consecutive points; fewer
    /// than two points give `0`.
    pub fn line_length<I>(&self, points: I) -> Result<Meter, GeodesicError>
    where
        I: IntoIterator<Item = GeoPoint>,
    {
        points
            .into_iter()
            .tuple_windows()
            .map(|(p, q)| self.inverse(p, q))
            .sum()
    }
}

/// Vincenty's A coefficient.
fn series_a(u_sq: f64) -> f64 {
    1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)))
}
