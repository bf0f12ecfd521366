use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray, StringArray};
use arrow::compute::{can_cast_types, cast};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type, UInt64Type};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Dataset, Row};

// ---------------------------------------------------------------------------
// File formats
// ---------------------------------------------------------------------------

/// Tabular file formats understood by the loader and the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Json,
    Parquet,
}

impl FileFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        Self::from_extension(&ext)
    }

    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "json" => Ok(FileFormat::Json),
            "parquet" | "pq" => Ok(FileFormat::Parquet),
            other => bail!("Unsupported file extension: .{other}"),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Json => "json",
            FileFormat::Parquet => "parquet",
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a tabular dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with column names, cell types guessed per value
/// * `.json`    – records: `[{ "region": "north", "age": 31 }, ...]`
/// * `.parquet` – flat columns of strings, integers, floats or booleans
pub fn load_file(path: &Path) -> Result<Dataset> {
    let dataset = match FileFormat::from_path(path)? {
        FileFormat::Csv => load_csv(path),
        FileFormat::Json => load_json(path),
        FileFormat::Parquet => load_parquet(path),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} rows with columns {:?} from {}",
        dataset.len(),
        dataset.columns,
        path.display()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per row.
/// Short records are padded with nulls.
fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(Row::new(record.iter().map(CellValue::infer).collect()));
    }

    Ok(Dataset::from_rows(columns, rows))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "region": "north", "age": 31, "score": 0.72 },
///   ...
/// ]
/// ```
///
/// Columns are collected in first-seen order (keys keep their file order
/// within a record); a key absent from a record is a null cell.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    let mut known: BTreeSet<String> = BTreeSet::new();
    let mut objects = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if known.insert(key.clone()) {
                columns.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let rows = objects
        .into_iter()
        .map(|obj| {
            Row::new(
                columns
                    .iter()
                    .map(|c| obj.get(c).map(CellValue::from_json).unwrap_or(CellValue::Null))
                    .collect(),
            )
        })
        .collect();

    Ok(Dataset::from_rows(columns, rows))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`). Dictionary columns (pandas
/// categoricals) are unpacked, narrow and unsigned integers widen to
/// `Integer`, and any other type (dates, timestamps, decimals, nested
/// values) is read as its display text.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let batch_columns = batch
            .columns()
            .iter()
            .zip(&columns)
            .map(|(col, name)| {
                normalize_column(col).with_context(|| format!("converting column '{name}'"))
            })
            .collect::<Result<Vec<_>>>()?;
        for row in 0..batch.num_rows() {
            let cells = batch_columns
                .iter()
                .map(|col| extract_cell_value(col, row))
                .collect();
            rows.push(Row::new(cells));
        }
    }

    Ok(Dataset::from_rows(columns, rows))
}

/// Bring a column to one of the types [`extract_cell_value`] reads directly.
fn normalize_column(col: &ArrayRef) -> Result<ArrayRef> {
    let normalized = match col.data_type() {
        DataType::Utf8
        | DataType::LargeUtf8
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt64
        | DataType::Float32
        | DataType::Float64
        | DataType::Boolean => Arc::clone(col),
        DataType::Int8
        | DataType::Int16
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32 => cast(col, &DataType::Int64)?,
        DataType::Float16 => cast(col, &DataType::Float64)?,
        DataType::Dictionary(_, values) => {
            let unpacked = cast(col, values)?;
            normalize_column(&unpacked)?
        }
        other if can_cast_types(other, &DataType::Utf8) => cast(col, &DataType::Utf8)?,
        _ => {
            let formatter = ArrayFormatter::try_new(col.as_ref(), &FormatOptions::default())?;
            let text: StringArray = (0..col.len())
                .map(|i| (!col.is_null(i)).then(|| formatter.value(i).to_string()))
                .collect();
            Arc::new(text)
        }
    };
    Ok(normalized)
}

/// Extract a single cell from a column prepared by [`normalize_column`].
fn extract_cell_value(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt64 => {
            let v = col.as_primitive::<UInt64Type>().value(row);
            i64::try_from(v)
                .map(CellValue::Integer)
                .unwrap_or_else(|_| CellValue::String(v.to_string()))
        }
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        _ => ArrayFormatter::try_new(col.as_ref(), &FormatOptions::default())
            .map(|f| CellValue::String(f.value(row).to_string()))
            .unwrap_or(CellValue::Null),
    }
}

/// Unique values of every column, keyed by column name. Handy for listing
/// filter choices without holding on to the dataset.
pub fn column_choices(dataset: &Dataset) -> BTreeMap<String, Vec<CellValue>> {
    dataset
        .unique_values
        .iter()
        .map(|(col, vals)| (col.clone(), vals.iter().filter(|v| !v.is_null()).cloned().collect()))
        .collect()
}
