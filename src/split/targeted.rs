use super::policy::PartitionPolicy;
use super::random::partition_pool;
use super::result::PartitionResult;
use crate::data::filter::{segment, FilterSet};
use crate::data::model::{Dataset, RowSet};
use crate::error::Result;

/// Split only the rows selected by `filters`.
///
/// The policy (baseline, holdout removal) is applied inside the segment.
/// Every row outside the segment goes to train, so holdout is always a
/// subset of the segment. Filters that match nothing give
/// `train = dataset`, an empty holdout and an empty baseline.
pub fn targeted_partition(
    dataset: &Dataset,
    filters: &FilterSet,
    policy: &PartitionPolicy,
    seed: u64,
) -> Result<PartitionResult> {
    policy.validate()?;
    let (seg, complement) = segment(dataset, filters)?;
    Ok(split_segment(&seg, &complement, policy, seed))
}

/// Partition `seg` and fold `complement` into train.
pub(crate) fn split_segment(
    seg: &RowSet,
    complement: &RowSet,
    policy: &PartitionPolicy,
    seed: u64,
) -> PartitionResult {
    let mut result = partition_pool(seg, policy, seed);
    if seg.is_empty() {
        log::warn!("segment is empty: nothing is withheld, all rows go to train");
    }
    result.train.extend(complement.iter().copied());
    result
}
