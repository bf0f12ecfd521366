use thiserror::Error;

/// Precondition failures raised by the partition engines.
///
/// All of these are detected before any random draw takes place, so a
/// failing request never produces a partial result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SplitError {
    /// Fraction out of range, baseline oversubscribed, or no seeds to draw with.
    #[error("invalid partition policy: {0}")]
    InvalidPolicy(String),

    /// A filter references a column the dataset does not have.
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// The dataset has no rows.
    #[error("dataset has no rows")]
    EmptyDataset,
}

pub type Result<T> = std::result::Result<T, SplitError>;
