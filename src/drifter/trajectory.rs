use std::collections::HashSet;

use hifitime::Epoch;

use crate::{
    constants::{Degree, DrifterId},
    geodesy::GeoPoint,
    time::epoch_key,
};

/// One validated drifter fix: who, when and where.
///
/// # Fields
///
/// * `id` - The drifter identifier, in the representation used by the source
/// * `time` - The fix time, floored to the hour
/// * `lat` - Latitude in degrees
/// * `lon` - Longitude in degrees
#[derive(Debug, Clone, PartialEq)]
pub struct DrifterObservation {
    pub id: DrifterId,
    pub time: Epoch,
    pub lat: Degree,
    pub lon: Degree,
}

impl DrifterObservation {
    pub fn track_point(&self) -> TrackPoint {
        TrackPoint {
            time: self.time,
            position: GeoPoint::new(self.lat, self.lon),
        }
    }
}

/// A timestamped position along a trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub time: Epoch,
    pub position: GeoPoint,
}

impl TrackPoint {
    pub fn new(time: Epoch, lat: Degree, lon: Degree) -> Self {
        TrackPoint {
            time,
            position: GeoPoint::new(lat, lon),
        }
    }
}

/// Time-ordered sequence of positions of a single entity.
///
/// The constructor sorts points chronologically with a stable sort, so fixes sharing a
/// timestamp keep their source order. Duplicate timestamps are kept: deciding what they
/// mean is the job of the alignment step, which rejects them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    points: Vec<TrackPoint>,
}

impl Trajectory {
    pub fn new(mut points: Vec<TrackPoint>) -> Self {
        points.sort_by_key(|p| epoch_key(&p.time));
        Trajectory { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn times(&self) -> Vec<Epoch> {
        self.points.iter().map(|p| p.time).collect()
    }

    pub fn first(&self) -> Option<&TrackPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&TrackPoint> {
        self.points.last()
    }

    /// Keep only the points whose timestamp belongs to `dates`.
    ///
    /// Arguments
    /// ---------
    /// * `dates`: the instants the caller intends to evaluate against, in any order
    ///
    /// Return
    /// ------
    /// * a new trajectory, still in chronological order
    pub fn restricted_to(&self, dates: &[Epoch]) -> Trajectory {
        let keys: HashSet<i128> = dates.iter().map(epoch_key).collect();
        Trajectory {
            points: self
                .points
                .iter()
                .filter(|p| keys.contains(&epoch_key(&p.time)))
                .copied()
                .collect(),
        }
    }
}

impl FromIterator<TrackPoint> for Trajectory {
    fn from_iter<I: IntoIterator<Item = TrackPoint>>(iter: I) -> Self {
        Trajectory::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod trajectory_test {
    use super::*;
    use crate::time::hour_epoch;

    fn at(hour: u8) -> Epoch {
        hour_epoch(2016, 1, 1, hour).unwrap()
    }

    #[test]
    fn test_new_sorts_chronologically() {
        let traj = Trajectory::new(vec![
            TrackPoint::new(at(3), 0.3, 0.0),
            TrackPoint::new(at(1), 0.1, 0.0),
            TrackPoint::new(at(2), 0.2, 0.0),
        ]);
        assert_eq!(traj.times(), vec![at(1), at(2), at(3)]);
        assert_eq!(traj.first().unwrap().position.lat, 0.1);
        assert_eq!(traj.last().unwrap().position.lat, 0.3);
    }

    #[test]
    fn test_sort_is_stable_for_duplicates() {
        let traj: Trajectory = [
            TrackPoint::new(at(2), 1.0, 0.0),
            TrackPoint::new(at(1), 0.0, 0.0),
            TrackPoint::new(at(2), 2.0, 0.0),
        ]
        .into_iter()
        .collect();
        let lats: Vec<f64> = traj.points().iter().map(|p| p.position.lat).collect();
        assert_eq!(lats, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_restricted_to() {
        let traj: Trajectory = (0..6).map(|h| TrackPoint::new(at(h), 0.0, 0.0)).collect();
        let kept = traj.restricted_to(&[at(4), at(1), at(9)]);
        assert_eq!(kept.times(), vec![at(1), at(4)]);
        assert!(traj.restricted_to(&[]).is_empty());
    }
}
