use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::policy::PartitionPolicy;
use super::random::partition_pool;
use super::result::{BootstrapBatch, PartitionResult};
use super::targeted::split_segment;
use crate::data::filter::{segment, FilterSet};
use crate::data::model::{Dataset, RowSet};
use crate::error::{Result, SplitError};

/// Repeat a split once per seed in `policy.seeds`.
///
/// `filters = None` runs whole-dataset splits, `Some` runs targeted splits.
/// The policy and filters are validated once before any seed is drawn;
/// the draws then run in parallel and come back in seed order.
pub fn bootstrap(
    dataset: &Dataset,
    filters: Option<&FilterSet>,
    policy: &PartitionPolicy,
) -> Result<BootstrapBatch> {
    policy.validate()?;
    if policy.seeds.is_empty() {
        return Err(SplitError::InvalidPolicy("no seeds to draw with".into()));
    }

    let results: Vec<PartitionResult> = match filters {
        None => {
            let pool = dataset.row_ids();
            policy
                .seeds
                .par_iter()
                .map(|&seed| partition_pool(&pool, policy, seed))
                .collect()
        }
        Some(filters) => {
            let (seg, complement) = segment(dataset, filters)?;
            policy
                .seeds
                .par_iter()
                .map(|&seed| split_segment(&seg, &complement, policy, seed))
                .collect()
        }
    };

    let distinct_trains: BTreeSet<&RowSet> = results.iter().map(|r| &r.train).collect();
    log::debug!(
        "bootstrap: {} draws, {} distinct train sets",
        results.len(),
        distinct_trains.len()
    );

    Ok(BootstrapBatch { results })
}

/// Draw `count` distinct seeds for a bootstrap batch.
///
/// With `master = None` the master seed comes from OS entropy and is logged
/// so the batch can be replayed.
pub fn draw_seeds(count: usize, master: Option<u64>) -> Vec<u64> {
    let master = master.unwrap_or_else(|| {
        let s: u64 = rand::random();
        log::info!("No bootstrap seed provided, using generated seed {s}");
        s
    });
    let mut rng = StdRng::seed_from_u64(master);

    let mut seen = BTreeSet::new();
    let mut seeds = Vec::with_capacity(count);
    while seeds.len() < count {
        let seed = rng.gen_range(1..=u64::from(u32::MAX));
        if seen.insert(seed) {
            seeds.push(seed);
        }
    }
    seeds
}
