use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::data::filter::{FilterSet, FilterSpec};
use crate::data::model::CellValue;
use crate::error::{Result, SplitError};

// ---------------------------------------------------------------------------
// PartitionPolicy
// ---------------------------------------------------------------------------

/// How a pool of rows is divided into train / holdout / baseline.
///
/// The defaults mirror the interactive tool: 10 % train (90 % holdout),
/// baseline on, baseline removed from holdout, seed 42.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionPolicy {
    /// Share of the pool used for training, in `[0, 1]`.
    pub train_fraction: f64,
    /// Draw a baseline block of twice the train size, train taken from inside it.
    pub with_baseline: bool,
    /// Exclude the whole baseline block from holdout, not only the train rows.
    /// Ignored without a baseline.
    pub remove_baseline_from_holdout: bool,
    /// One seed per draw. A single seed for a plain split, several for bootstrap.
    pub seeds: Vec<u64>,
}

impl Default for PartitionPolicy {
    fn default() -> Self {
        Self {
            train_fraction: 0.1,
            with_baseline: true,
            remove_baseline_from_holdout: true,
            seeds: vec![42],
        }
    }
}

impl PartitionPolicy {
    /// Plain train/holdout split, no baseline, seed 42.
    pub fn new(train_fraction: f64) -> Self {
        Self {
            train_fraction,
            with_baseline: false,
            remove_baseline_from_holdout: false,
            ..Self::default()
        }
    }

    pub fn with_baseline(mut self, remove_from_holdout: bool) -> Self {
        self.with_baseline = true;
        self.remove_baseline_from_holdout = remove_from_holdout;
        self
    }

    pub fn with_seeds(mut self, seeds: Vec<u64>) -> Self {
        self.seeds = seeds;
        self
    }

    /// Check the fraction and baseline preconditions. Seeds are checked by
    /// the bootstrap orchestrator, single draws take their seed explicitly.
    pub fn validate(&self) -> Result<()> {
        let f = self.train_fraction;
        if !(0.0..=1.0).contains(&f) {
            return Err(SplitError::InvalidPolicy(format!(
                "train fraction {f} is outside [0, 1]"
            )));
        }
        if self.with_baseline && 2.0 * f > 1.0 {
            return Err(SplitError::InvalidPolicy(format!(
                "baseline of twice the train fraction ({}) exceeds the dataset",
                2.0 * f
            )));
        }
        Ok(())
    }

    /// `round(train_fraction * pool)` rows.
    pub fn train_size(&self, pool: usize) -> usize {
        round_share(self.train_fraction, pool)
    }

    /// `round(2 * train_fraction * pool)` rows, or `None` without a baseline.
    pub fn baseline_size(&self, pool: usize) -> Option<usize> {
        self.with_baseline
            .then(|| round_share(2.0 * self.train_fraction, pool))
    }

    /// Number of train rows actually drawn from a pool: half of the baseline
    /// block (rounded half up) when there is one.
    pub fn drawn_train_size(&self, pool: usize) -> usize {
        match self.baseline_size(pool) {
            Some(b) => b.div_ceil(2),
            None => self.train_size(pool),
        }
    }

    /// Number of holdout rows a pool of `pool` rows yields.
    pub fn holdout_size(&self, pool: usize) -> usize {
        match self.baseline_size(pool) {
            Some(b) if self.remove_baseline_from_holdout => pool - b,
            _ => pool - self.drawn_train_size(pool),
        }
    }
}

fn round_share(fraction: f64, pool: usize) -> usize {
    ((fraction * pool as f64).round() as usize).min(pool)
}

// ---------------------------------------------------------------------------
// PartitionRequest – the JSON request shape
// ---------------------------------------------------------------------------

/// A full split request as read from JSON:
///
/// ```json
/// {
///   "train_fraction": 0.2,
///   "with_baseline": false,
///   "filters": [{ "region": ["north", "east"] }, { "age": [30, 31] }],
///   "seeds": [7, 8, 9]
/// }
/// ```
///
/// Missing fields take the [`PartitionPolicy`] defaults; missing `filters`
/// means a whole-dataset split. Any other key is an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartitionRequest {
    #[serde(flatten)]
    pub policy: PartitionPolicy,
    #[serde(default)]
    pub filters: Vec<BTreeMap<String, Vec<JsonValue>>>,
    /// Keys neither the policy nor `filters` claimed.
    #[serde(flatten)]
    unknown: BTreeMap<String, JsonValue>,
}

impl PartitionRequest {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let request: Self = serde_json::from_str(text)?;
        if !request.unknown.is_empty() {
            let keys: Vec<&str> = request.unknown.keys().map(String::as_str).collect();
            return Err(serde::de::Error::custom(format!(
                "unknown request field(s): {}",
                keys.join(", ")
            )));
        }
        Ok(request)
    }

    /// Filter blocks with JSON values converted to cells.
    pub fn filter_set(&self) -> FilterSet {
        self.filters
            .iter()
            .map(|block| {
                block
                    .iter()
                    .map(|(col, vals)| (col.clone(), vals.iter().map(CellValue::from_json).collect()))
                    .collect::<FilterSpec>()
            })
            .collect()
    }
}
