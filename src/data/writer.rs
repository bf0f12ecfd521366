use std::fmt;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::{Map, Value as JsonValue};

use super::labels::{sidecar_path, ValueLabels};
use super::loader::FileFormat;
use super::model::{CellValue, Dataset, DatasetView};
use crate::split::{BootstrapBatch, PartitionKind};

// ---------------------------------------------------------------------------
// Output naming
// ---------------------------------------------------------------------------

/// Name of one persisted partition: `<kind>_<rows>[_batch_<n>]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionName {
    pub kind: PartitionKind,
    pub rows: usize,
    /// 1-based position in a bootstrap batch.
    pub batch: Option<usize>,
}

impl fmt::Display for PartitionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind, self.rows)?;
        if let Some(n) = self.batch {
            write!(f, "_batch_{n}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Receives finished partitions for persistence.
pub trait Sink {
    fn write_partition(&mut self, name: &PartitionName, view: DatasetView<'_>) -> Result<()>;
}

/// Hand every partition of a fully computed batch to `sink`.
///
/// With `numbered` the names carry the batch position. Returns how many
/// partitions were written.
pub fn publish<S: Sink + ?Sized>(
    sink: &mut S,
    dataset: &Dataset,
    batch: &BootstrapBatch,
    numbered: bool,
) -> Result<usize> {
    let mut written = 0;
    for (n, result) in batch.numbered() {
        for (kind, rows) in result.parts() {
            let name = PartitionName {
                kind,
                rows: rows.len(),
                batch: numbered.then_some(n),
            };
            sink.write_partition(&name, dataset.view(rows))
                .with_context(|| format!("writing partition {name}"))?;
            written += 1;
        }
    }
    Ok(written)
}

/// Writes each partition as a file in an output directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    out_dir: PathBuf,
    format: FileFormat,
    labels: Option<ValueLabels>,
    written: Vec<PathBuf>,
}

impl FileSink {
    pub fn new(out_dir: impl Into<PathBuf>, format: FileFormat) -> Self {
        Self {
            out_dir: out_dir.into(),
            format,
            labels: None,
            written: Vec::new(),
        }
    }

    /// Copy these labels next to every written file.
    pub fn with_labels(mut self, labels: Option<ValueLabels>) -> Self {
        self.labels = labels;
        self
    }

    pub fn path_for(&self, name: &PartitionName) -> PathBuf {
        self.out_dir
            .join(format!("{name}.{}", self.format.extension()))
    }

    /// Files written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Create the output directory and remove the regular files already in
    /// it. Sub-directories are left alone. Returns the number removed.
    pub fn clean(&self) -> Result<usize> {
        std::fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("creating {}", self.out_dir.display()))?;
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.out_dir)
            .with_context(|| format!("listing {}", self.out_dir.display()))?
        {
            let path = entry?.path();
            if path.is_file() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("removing {}", path.display()))?;
                removed += 1;
            }
        }
        log::info!("Emptied {} ({removed} files)", self.out_dir.display());
        Ok(removed)
    }
}

impl Sink for FileSink {
    fn write_partition(&mut self, name: &PartitionName, view: DatasetView<'_>) -> Result<()> {
        std::fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("creating {}", self.out_dir.display()))?;
        let path = self.path_for(name);
        write_view(&path, self.format, view)?;
        if let Some(labels) = &self.labels {
            labels.save(&sidecar_path(&path))?;
        }
        log::info!("Wrote {} rows to {}", view.len(), path.display());
        self.written.push(path);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

/// Write a view to `path` in the given format.
pub fn write_view(path: &Path, format: FileFormat, view: DatasetView<'_>) -> Result<()> {
    match format {
        FileFormat::Csv => write_csv(path, view),
        FileFormat::Json => write_json(path, view),
        FileFormat::Parquet => write_parquet(path, view),
    }
    .with_context(|| format!("writing {}", path.display()))
}

fn write_csv(path: &Path, view: DatasetView<'_>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record(view.columns())?;
    for (_, row) in view.iter() {
        writer.write_record(row.cells.iter().map(|c| c.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Records-oriented JSON, the same shape the loader reads.
fn write_json(path: &Path, view: DatasetView<'_>) -> Result<()> {
    let records: Vec<JsonValue> = view
        .iter()
        .map(|(_, row)| {
            let obj: Map<String, JsonValue> = view
                .columns()
                .iter()
                .zip(&row.cells)
                .map(|(col, cell)| (col.clone(), cell.to_json()))
                .collect();
            JsonValue::Object(obj)
        })
        .collect();
    let file = std::fs::File::create(path).context("creating JSON file")?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer(&mut out, &records).context("serialising JSON")?;
    out.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, view: DatasetView<'_>) -> Result<()> {
    let mut fields = Vec::with_capacity(view.columns().len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(view.columns().len());

    for (idx, name) in view.columns().iter().enumerate() {
        let cells: Vec<&CellValue> = view.iter().map(|(_, row)| &row.cells[idx]).collect();
        let (data_type, array) = build_column(&cells);
        fields.push(Field::new(name, data_type, true));
        arrays.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// Pick the narrowest Arrow type that holds every non-null cell:
/// Boolean, Int64, Float64 (ints and floats mixed), else Utf8.
fn build_column(cells: &[&CellValue]) -> (DataType, ArrayRef) {
    let non_null = || cells.iter().filter(|c| !c.is_null());
    let any = non_null().next().is_some();

    if any && non_null().all(|c| matches!(c, CellValue::Bool(_))) {
        let values: Vec<Option<bool>> = cells
            .iter()
            .map(|c| match c {
                CellValue::Bool(b) => Some(*b),
                _ => None,
            })
            .collect();
        return (DataType::Boolean, Arc::new(BooleanArray::from(values)));
    }
    if any && non_null().all(|c| matches!(c, CellValue::Integer(_))) {
        let values: Vec<Option<i64>> = cells
            .iter()
            .map(|c| match c {
                CellValue::Integer(i) => Some(*i),
                _ => None,
            })
            .collect();
        return (DataType::Int64, Arc::new(Int64Array::from(values)));
    }
    if any && non_null().all(|c| matches!(c, CellValue::Integer(_) | CellValue::Float(_))) {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|c| match c {
                CellValue::Integer(i) => Some(*i as f64),
                CellValue::Float(f) => Some(*f),
                _ => None,
            })
            .collect();
        return (DataType::Float64, Arc::new(Float64Array::from(values)));
    }

    let values: Vec<Option<String>> = cells
        .iter()
        .map(|c| (!c.is_null()).then(|| c.to_string()))
        .collect();
    (DataType::Utf8, Arc::new(StringArray::from(values)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_file;
    use crate::data::model::{Row, RowSet};
    use crate::split::PartitionResult;

    fn mixed() -> Dataset {
        Dataset::from_rows(
            vec!["region".into(), "age".into(), "score".into(), "member".into()],
            vec![
                Row::new(vec![
                    CellValue::String("north".into()),
                    CellValue::Integer(31),
                    CellValue::Float(0.5),
                    CellValue::Bool(true),
                ]),
                Row::new(vec![
                    CellValue::String("south".into()),
                    CellValue::Null,
                    CellValue::Integer(2),
                    CellValue::Bool(false),
                ]),
                Row::new(vec![
                    CellValue::String("east".into()),
                    CellValue::Integer(58),
                    CellValue::Float(1.0),
                    CellValue::Null,
                ]),
            ],
        )
    }

    #[test]
    fn names_encode_kind_rows_and_batch() {
        let plain = PartitionName {
            kind: PartitionKind::Holdout,
            rows: 800,
            batch: None,
        };
        assert_eq!(plain.to_string(), "holdout_800");
        let numbered = PartitionName {
            kind: PartitionKind::Baseline,
            rows: 200,
            batch: Some(3),
        };
        assert_eq!(numbered.to_string(), "baseline_200_batch_3");
    }

    #[test]
    fn every_format_reads_back() {
        let ds = mixed();
        let rows = RowSet::from([0, 2]);
        let dir = tempfile::tempdir().unwrap();

        for format in [FileFormat::Csv, FileFormat::Json, FileFormat::Parquet] {
            let path = dir.path().join(format!("out.{}", format.extension()));
            write_view(&path, format, ds.view(&rows)).unwrap();
            let back = load_file(&path).unwrap();

            assert_eq!(back.len(), 2, "{format:?}");
            assert_eq!(back.columns, ds.columns, "{format:?}");
            let region = back.column_index("region").unwrap();
            let age = back.column_index("age").unwrap();
            let score = back.column_index("score").unwrap();
            assert_eq!(back.rows[1].cells[region], CellValue::String("east".into()));
            assert_eq!(back.rows[0].cells[age], CellValue::Integer(31));
            assert_eq!(back.rows[1].cells[score], CellValue::Float(1.0), "{format:?}");
        }
    }

    #[test]
    fn publish_writes_one_file_per_part() {
        let ds = mixed();
        let dir = tempfile::tempdir().unwrap();
        let result = PartitionResult {
            seed: 1,
            train: RowSet::from([0]),
            holdout: RowSet::from([1, 2]),
            baseline: Some(RowSet::from([0, 1])),
        };
        let batch = BootstrapBatch {
            results: vec![result.clone(), result],
        };

        let mut sink = FileSink::new(dir.path(), FileFormat::Csv);
        let written = publish(&mut sink, &ds, &batch, true).unwrap();
        assert_eq!(written, 6);
        assert!(dir.path().join("train_1_batch_1.csv").is_file());
        assert!(dir.path().join("holdout_2_batch_2.csv").is_file());
        assert!(dir.path().join("baseline_2_batch_2.csv").is_file());

        assert_eq!(sink.clean().unwrap(), 6);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn labels_follow_each_output() {
        let ds = mixed();
        let dir = tempfile::tempdir().unwrap();
        let labels = ValueLabels::default();
        let mut sink = FileSink::new(dir.path(), FileFormat::Json).with_labels(Some(labels));
        let rows = RowSet::from([1]);
        let name = PartitionName {
            kind: PartitionKind::Train,
            rows: 1,
            batch: None,
        };
        sink.write_partition(&name, ds.view(&rows)).unwrap();
        assert_eq!(sink.written().len(), 1);
        assert!(ValueLabels::load_sidecar(&sink.written()[0]).unwrap().is_some());
    }
}
