/// Partition engines: whole-dataset, targeted, and bootstrap draws.
///
/// ```text
///   Dataset + PartitionPolicy (+ FilterSet)
///        │
///        ▼
///   ┌───────────┐     ┌──────────────┐
///   │ bootstrap │ ──▶ │   targeted   │  filter::segment, fold complement into train
///   └───────────┘     └──────────────┘
///        │                  │
///        ▼                  ▼
///   ┌──────────────────────────┐
///   │          random          │  seeded draw of train / holdout / baseline
///   └──────────────────────────┘
///        │
///        ▼
///   PartitionResult (row identifier sets)
/// ```

pub mod bootstrap;
pub mod policy;
pub mod preview;
pub mod random;
pub mod result;
pub mod targeted;

pub use bootstrap::{bootstrap, draw_seeds};
pub use policy::{PartitionPolicy, PartitionRequest};
pub use preview::SplitPreview;
pub use random::random_partition;
pub use result::{BootstrapBatch, PartitionKind, PartitionResult};
pub use targeted::targeted_partition;
