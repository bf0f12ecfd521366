use std::fmt;

use super::policy::PartitionPolicy;
use crate::data::filter::{segment, FilterSet};
use crate::data::model::Dataset;
use crate::error::Result;

/// Expected sizes of a split, computed without drawing any rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPreview {
    /// Rows in the dataset.
    pub total: usize,
    /// Rows in the targeted segment, `None` for a whole-dataset split.
    pub segment: Option<usize>,
    /// Train rows drawn from the pool (segment or dataset).
    pub pool_train: usize,
    /// Train rows including the folded-in complement.
    pub total_train: usize,
    pub holdout: usize,
    pub baseline: Option<usize>,
}

impl SplitPreview {
    pub fn compute(
        dataset: &Dataset,
        filters: Option<&FilterSet>,
        policy: &PartitionPolicy,
    ) -> Result<Self> {
        policy.validate()?;
        let total = dataset.len();
        let (pool, complement, seg) = match filters {
            None => (total, 0, None),
            Some(filters) => {
                let (seg, complement) = segment(dataset, filters)?;
                (seg.len(), complement.len(), Some(seg.len()))
            }
        };
        let pool_train = policy.drawn_train_size(pool);
        Ok(SplitPreview {
            total,
            segment: seg,
            pool_train,
            total_train: pool_train + complement,
            holdout: policy.holdout_size(pool),
            baseline: policy.baseline_size(pool),
        })
    }

    /// Share of the dataset, in percent rounded to two decimals.
    pub fn percent(&self, rows: usize) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (rows as f64 * 10_000.0 / self.total as f64).round() / 100.0
    }
}

impl fmt::Display for SplitPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset size:         {} rows", self.total)?;
        if let Some(seg) = self.segment {
            writeln!(f, "Segment size:         {seg} rows ({}%)", self.percent(seg))?;
            writeln!(
                f,
                "Segment training size: {} rows ({}%)",
                self.pool_train,
                self.percent(self.pool_train)
            )?;
        }
        writeln!(
            f,
            "Training size:        {} rows ({}%)",
            self.total_train,
            self.percent(self.total_train)
        )?;
        write!(
            f,
            "Holdout size:         {} rows ({}%)",
            self.holdout,
            self.percent(self.holdout)
        )?;
        if let Some(b) = self.baseline {
            write!(f, "\nBaseline size:        {b} rows ({}%)", self.percent(b))?;
        }
        Ok(())
    }
}
