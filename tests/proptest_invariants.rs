use std::collections::BTreeSet;

use holdout_splitter::data::filter::{filter_spec, segment, FilterSet};
use holdout_splitter::data::model::{CellValue, Dataset, Row, RowSet};
use holdout_splitter::split::{
    bootstrap, random_partition, targeted_partition, PartitionPolicy, PartitionResult,
};
use proptest::prelude::*;

/// `n` rows with a `group` column cycling through `0..groups`.
fn grouped(n: usize, groups: i64) -> Dataset {
    Dataset::from_rows(
        vec!["id".into(), "group".into()],
        (0..n)
            .map(|i| {
                Row::new(vec![
                    CellValue::Integer(i as i64),
                    CellValue::Integer(i as i64 % groups),
                ])
            })
            .collect(),
    )
}

fn policy_strategy() -> impl Strategy<Value = PartitionPolicy> {
    (0u32..=100, any::<bool>(), any::<bool>()).prop_map(|(pct, with_baseline, remove)| {
        let mut policy = PartitionPolicy::new(f64::from(pct) / 100.0);
        if with_baseline {
            // keep the baseline within the pool
            policy = PartitionPolicy::new(f64::from(pct / 2) / 100.0).with_baseline(remove);
        }
        policy
    })
}

fn filters_strategy() -> impl Strategy<Value = FilterSet> {
    prop::collection::vec(prop::collection::btree_set(0i64..5, 0..4), 0..3).prop_map(|blocks| {
        blocks
            .into_iter()
            .map(|vals| filter_spec("group", vals.into_iter().map(CellValue::Integer)))
            .collect()
    })
}

fn check_draw(result: &PartitionResult, pool: &RowSet, policy: &PartitionPolicy) {
    assert!(result.train.is_disjoint(&result.holdout));
    assert!(result.holdout.is_subset(pool));
    assert_eq!(result.holdout.len(), policy.holdout_size(pool.len()));

    match &result.baseline {
        Some(baseline) => {
            assert!(policy.with_baseline);
            assert!(result.train.is_subset(baseline));
            assert!(baseline.is_subset(pool));
            if policy.remove_baseline_from_holdout {
                assert!(result.holdout.is_disjoint(baseline));
            }
        }
        None => assert!(!policy.with_baseline),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn filter_covers_dataset(n in 0usize..200, filters in filters_strategy()) {
        let ds = grouped(n, 5);
        let (seg, rest) = segment(&ds, &filters).unwrap();
        prop_assert!(seg.is_disjoint(&rest));
        let union: RowSet = seg.union(&rest).copied().collect();
        prop_assert_eq!(union, ds.row_ids());
    }

    #[test]
    fn random_split_invariants(n in 0usize..300, policy in policy_strategy(), seed in any::<u64>()) {
        let ds = grouped(n, 5);
        let result = random_partition(&ds, &policy, seed).unwrap();
        let pool = ds.row_ids();
        check_draw(&result, &pool, &policy);
        prop_assert_eq!(result.train.len(), policy.drawn_train_size(n));
        if !policy.with_baseline {
            prop_assert_eq!(result.train.len(), policy.train_size(n));
            let union: RowSet = result.train.union(&result.holdout).copied().collect();
            prop_assert_eq!(union, pool);
        }
    }

    #[test]
    fn targeted_split_invariants(
        n in 0usize..300,
        filters in filters_strategy(),
        policy in policy_strategy(),
        seed in any::<u64>(),
    ) {
        let ds = grouped(n, 5);
        let (seg, complement) = segment(&ds, &filters).unwrap();
        let result = targeted_partition(&ds, &filters, &policy, seed).unwrap();

        check_draw(&result, &seg, &policy);
        prop_assert!(complement.is_subset(&result.train));
        let segment_train: RowSet = result.train.intersection(&seg).copied().collect();
        prop_assert_eq!(segment_train.len(), policy.drawn_train_size(seg.len()));
        if seg.is_empty() {
            prop_assert_eq!(&result.train, &ds.row_ids());
            prop_assert!(!result.has_holdout());
        }
    }

    #[test]
    fn same_seed_same_split(
        n in 0usize..200,
        filters in filters_strategy(),
        policy in policy_strategy(),
        seed in any::<u64>(),
    ) {
        let ds = grouped(n, 5);
        prop_assert_eq!(
            random_partition(&ds, &policy, seed).unwrap(),
            random_partition(&ds, &policy, seed).unwrap()
        );
        prop_assert_eq!(
            targeted_partition(&ds, &filters, &policy, seed).unwrap(),
            targeted_partition(&ds, &filters, &policy, seed).unwrap()
        );
    }

    #[test]
    fn bootstrap_is_per_seed_draw(seeds in prop::collection::vec(any::<u64>(), 1..6)) {
        let ds = grouped(120, 3);
        let policy = PartitionPolicy::new(0.25).with_baseline(false).with_seeds(seeds.clone());
        let batch = bootstrap(&ds, None, &policy).unwrap();
        prop_assert_eq!(batch.len(), seeds.len());
        for (result, seed) in batch.results.iter().zip(seeds) {
            prop_assert_eq!(result, &random_partition(&ds, &policy, seed).unwrap());
        }
    }
}

#[test]
fn distinct_seeds_rarely_collide() {
    let ds = grouped(1000, 4);
    let policy = PartitionPolicy::new(0.1).with_seeds((1..=20).collect());
    let batch = bootstrap(&ds, None, &policy).unwrap();
    let trains: BTreeSet<&RowSet> = batch.results.iter().map(|r| &r.train).collect();
    assert_eq!(trains.len(), 20);
}

#[test]
fn thousand_rows_with_baseline_scenario() {
    let ds = grouped(1000, 4);
    let policy = PartitionPolicy::new(0.1).with_baseline(true);
    let r = random_partition(&ds, &policy, 42).unwrap();
    let baseline = r.baseline.as_ref().unwrap();
    assert_eq!(baseline.len(), 200);
    assert_eq!(r.train.len(), 100);
    assert!(r.train.is_subset(baseline));
    assert_eq!(r.holdout.len(), 800);
    assert!(r.holdout.is_disjoint(baseline));
}
