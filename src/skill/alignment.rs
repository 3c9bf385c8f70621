//! # Timestamp alignment
//!
//! Pairs the observed and simulated samples taken at the **same instant**. No
//! interpolation happens: a timestamp present in only one of the two series is ignored.
//!
//! ## Algorithm
//! -----------------
//! 1. Build an explicit `timestamp → index` map for each series; a repeated timestamp
//!    makes the mapping ambiguous and is rejected.
//! 2. Select, in each direction and in chronological order, the indices whose timestamp
//!    belongs to the other series. The two index lists must have the same length; the
//!    k-th entries of both then point to the same instant.
//! 3. Both index lists must be strictly increasing, i.e. both series are chronological
//!    over the common instants.
//!
//! Timestamps are compared through [`epoch_key`], never through floating point values.
use std::collections::BTreeMap;

use hifitime::Epoch;

use crate::{
    skill_errors::{AlignmentError, Series},
    time::epoch_key,
};

/// Index pairs of the instants shared by an observed and a simulated series.
///
/// `observed[k]` and `simulated[k]` point to the same timestamp, and both vectors are
/// strictly increasing. An `Alignment` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    observed: Vec<usize>,
    simulated: Vec<usize>,
}

impl Alignment {
    pub fn len(&self) -> usize {
        self.observed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    pub fn observed_indices(&self) -> &[usize] {
        &self.observed
    }

    pub fn simulated_indices(&self) -> &[usize] {
        &self.simulated
    }

    /// `(observed, simulated)` index pairs, chronological.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.observed.iter().copied().zip(self.simulated.iter().copied())
    }
}

fn index_map(series: Series, times: &[Epoch]) -> Result<BTreeMap<i128, usize>, AlignmentError> {
    let mut map = BTreeMap::new();
    for (idx, time) in times.iter().enumerate() {
        if map.insert(epoch_key(time), idx).is_some() {
            return Err(AlignmentError::DuplicateTimestamp { series, time: *time });
        }
    }
    Ok(map)
}

/// Indices of `series` whose timestamp also appears in `other`, chronological.
fn selected(series: &BTreeMap<i128, usize>, other: &BTreeMap<i128, usize>) -> Vec<usize> {
    series
        .iter()
        .filter(|(key, _)| other.contains_key(*key))
        .map(|(_, &idx)| idx)
        .collect()
}

fn strictly_increasing(indices: &[usize]) -> bool {
    indices.windows(2).all(|w| w[0] < w[1])
}

/// Align two time series on their common timestamps.
///
/// Arguments
/// -----------------
/// * `observed` – Timestamps of the observed trajectory.
/// * `simulated` – Time grid of the simulated run.
///
/// Return
/// ----------
/// * the [`Alignment`] of the common instants
/// * [`AlignmentError::DuplicateTimestamp`] if a series repeats a timestamp
/// * [`AlignmentError::NoCommonTimestamps`] if the grids are disjoint
/// * [`AlignmentError::CountMismatch`] if both selected index lists differ in length
/// * [`AlignmentError::NonChronological`] if a series is out of order on the common instants
pub fn align(observed: &[Epoch], simulated: &[Epoch]) -> Result<Alignment, AlignmentError> {
    let obs_map = index_map(Series::Observed, observed)?;
    let sim_map = index_map(Series::Simulated, simulated)?;

    let observed_idx = selected(&obs_map, &sim_map);
    let simulated_idx = selected(&sim_map, &obs_map);

    if observed_idx.is_empty() && simulated_idx.is_empty() {
        return Err(AlignmentError::NoCommonTimestamps);
    }
    // equal whenever both maps have unique keys
    if observed_idx.len() != simulated_idx.len() {
        return Err(AlignmentError::CountMismatch {
            observed: observed_idx.len(),
            simulated: simulated_idx.len(),
        });
    }

    if !strictly_increasing(&observed_idx) {
        return Err(AlignmentError::NonChronological {
            series: Series::Observed,
        });
    }
    if !strictly_increasing(&simulated_idx) {
        return Err(AlignmentError::NonChronological {
            series: Series::Simulated,
        });
    }

    Ok(Alignment {
        observed: observed_idx,
        simulated: simulated_idx,
    })
}

#[cfg(test)]
mod alignment_test {
    use super::*;
    use crate::time::hour_epoch;

    fn hours(hs: &[u8]) -> Vec<Epoch> {
        hs.iter().map(|&h| hour_epoch(2016, 1, 1, h).unwrap()).collect()
    }

    #[test]
    fn test_gapped_observations() {
        let observed = hours(&[1, 2, 4, 7, 9]);
        let simulated = hours(&[0, 1, 2, 3, 4, 5, 6, 7]);
        let al = align(&observed, &simulated).unwrap();
        assert_eq!(al.len(), 4);
        assert_eq!(al.observed_indices(), &[0, 1, 2, 3]);
        assert_eq!(al.simulated_indices(), &[1, 2, 4, 7]);
        for (i, j) in al.pairs() {
            assert_eq!(observed[i], simulated[j]);
        }
    }

    #[test]
    fn test_no_common_timestamps() {
        assert_eq!(
            align(&hours(&[0, 1]), &hours(&[2, 3])),
            Err(AlignmentError::NoCommonTimestamps)
        );
        assert_eq!(
            align(&[], &hours(&[2, 3])),
            Err(AlignmentError::NoCommonTimestamps)
        );
    }

    #[test]
    fn test_duplicates_are_rejected() {
        let dup = hours(&[1, 2, 2]);
        assert_eq!(
            align(&dup, &hours(&[1, 2])),
            Err(AlignmentError::DuplicateTimestamp {
                series: Series::Observed,
                time: dup[2],
            })
        );
        assert!(matches!(
            align(&hours(&[1, 2]), &dup),
            Err(AlignmentError::DuplicateTimestamp {
                series: Series::Simulated,
                ..
            })
        ));
    }

    #[test]
    fn test_non_chronological_grid() {
        assert_eq!(
            align(&hours(&[1, 2, 3]), &hours(&[0, 3, 2, 1])),
            Err(AlignmentError::NonChronological {
                series: Series::Simulated
            })
        );
        assert_eq!(
            align(&hours(&[2, 1]), &hours(&[1, 2])),
            Err(AlignmentError::NonChronological {
                series: Series::Observed
            })
        );
    }

    #[test]
    fn test_out_of_order_outside_common_instants_is_fine() {
        let al = align(&hours(&[1, 2]), &hours(&[5, 1, 2, 0])).unwrap();
        assert_eq!(al.simulated_indices(), &[1, 2]);
    }

    #[test]
    fn test_selected_indices_follow_time_order() {
        let obs = index_map(Series::Observed, &hours(&[4, 1, 9])).unwrap();
        let sim = index_map(Series::Simulated, &hours(&[9, 4, 0])).unwrap();
        assert_eq!(selected(&obs, &sim), vec![0, 2]);
        assert_eq!(selected(&sim, &obs), vec![1, 0]);
        assert!(selected(&obs, &BTreeMap::new()).is_empty());
    }
}
