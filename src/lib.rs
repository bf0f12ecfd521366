//! Train / holdout / baseline partitioning of tabular datasets.
//!
//! [`data`] holds the table model, the file collaborators (loader, label
//! metadata, sink) and the filter engine; [`split`] holds the partition
//! engines built on top of it.

pub mod data;
pub mod error;
pub mod split;

pub use error::SplitError;
