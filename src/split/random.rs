use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::policy::PartitionPolicy;
use super::result::PartitionResult;
use crate::data::model::{Dataset, RowId, RowSet};
use crate::error::Result;

/// Split the whole dataset into train / holdout (/ baseline) with one seed.
///
/// The same seed, dataset and policy always select the same rows.
pub fn random_partition(
    dataset: &Dataset,
    policy: &PartitionPolicy,
    seed: u64,
) -> Result<PartitionResult> {
    policy.validate()?;
    Ok(partition_pool(&dataset.row_ids(), policy, seed))
}

/// Draw from `pool` with an already-validated policy.
///
/// Each draw is a prefix of a seeded shuffle, which is a uniform sample
/// without replacement. With a baseline the block is reshuffled before
/// taking train, so train is a uniform half of the block.
pub(crate) fn partition_pool(pool: &RowSet, policy: &PartitionPolicy, seed: u64) -> PartitionResult {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut order: Vec<RowId> = pool.iter().copied().collect();
    order.shuffle(&mut rng);

    let n = pool.len();
    let result = match policy.baseline_size(n) {
        None => {
            let train: RowSet = order[..policy.train_size(n)].iter().copied().collect();
            let holdout = pool.difference(&train).copied().collect();
            PartitionResult {
                seed,
                train,
                holdout,
                baseline: None,
            }
        }
        Some(b) => {
            let mut block = order[..b].to_vec();
            block.shuffle(&mut rng);
            let train: RowSet = block[..policy.drawn_train_size(n)].iter().copied().collect();
            let baseline: RowSet = block.into_iter().collect();
            let holdout = if policy.remove_baseline_from_holdout {
                pool.difference(&baseline).copied().collect()
            } else {
                pool.difference(&train).copied().collect()
            };
            PartitionResult {
                seed,
                train,
                holdout,
                baseline: Some(baseline),
            }
        }
    };

    log::debug!(
        "seed {seed}: pool {n} -> train {}, holdout {}, baseline {:?}",
        result.train.len(),
        result.holdout.len(),
        result.baseline.as_ref().map(|b| b.len())
    );

    result
}
