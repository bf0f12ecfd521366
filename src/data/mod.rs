/// Data layer: core types, loading, filtering and writing.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet  (+ .labels.json)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset          labels: value → display label
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  Vec<Row>, column index, unique values
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  column-value constraints → (segment, complement)
///   └──────────┘
///        │
///        ▼  (split engines)
///   ┌──────────┐
///   │  writer   │  DatasetView → named output file
///   └──────────┘
/// ```

pub mod filter;
pub mod labels;
pub mod loader;
pub mod model;
pub mod writer;
