use std::fmt;

use crate::data::model::RowSet;

/// Which output set a block of rows belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PartitionKind {
    Train,
    Holdout,
    Baseline,
}

impl PartitionKind {
    pub fn name(self) -> &'static str {
        match self {
            PartitionKind::Train => "train",
            PartitionKind::Holdout => "holdout",
            PartitionKind::Baseline => "baseline",
        }
    }
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Row identifiers of one draw. `baseline` is `None` when the policy has
/// no baseline; otherwise `train ⊆ baseline`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionResult {
    /// Seed the draw was made with.
    pub seed: u64,
    pub train: RowSet,
    pub holdout: RowSet,
    pub baseline: Option<RowSet>,
}

impl PartitionResult {
    pub fn rows(&self, kind: PartitionKind) -> Option<&RowSet> {
        match kind {
            PartitionKind::Train => Some(&self.train),
            PartitionKind::Holdout => Some(&self.holdout),
            PartitionKind::Baseline => self.baseline.as_ref(),
        }
    }

    /// The output sets present in this result, in train/holdout/baseline order.
    pub fn parts(&self) -> impl Iterator<Item = (PartitionKind, &RowSet)> {
        [
            PartitionKind::Train,
            PartitionKind::Holdout,
            PartitionKind::Baseline,
        ]
        .into_iter()
        .filter_map(move |kind| self.rows(kind).map(|rows| (kind, rows)))
    }

    /// `false` for a degenerate split that withheld nothing, e.g. a targeted
    /// split whose filters matched no rows.
    pub fn has_holdout(&self) -> bool {
        !self.holdout.is_empty()
    }
}

/// One [`PartitionResult`] per seed, in seed order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapBatch {
    pub results: Vec<PartitionResult>,
}

impl BootstrapBatch {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results paired with their 1-based batch number.
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &PartitionResult)> {
        self.results.iter().enumerate().map(|(i, r)| (i + 1, r))
    }
}
