use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::Value as JsonValue;

use crate::error::{Result, SplitError};

// ---------------------------------------------------------------------------
// CellValue – a single cell of the table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common dataframe dtypes.
/// Filter value sets are `BTreeSet`s, so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            // `{:?}` keeps the decimal point, so `1.0` reads back as a float
            CellValue::Float(v) => write!(f, "{v:?}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Guess the type of a textual cell: integer, then float, then bool,
    /// falling back to a string. An empty cell is `Null`.
    pub fn infer(s: &str) -> CellValue {
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::String(s.to_string())
    }

    pub fn from_json(val: &JsonValue) -> CellValue {
        match val {
            JsonValue::String(s) => CellValue::String(s.clone()),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    CellValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    CellValue::Float(f)
                } else {
                    CellValue::String(n.to_string())
                }
            }
            JsonValue::Bool(b) => CellValue::Bool(*b),
            JsonValue::Null => CellValue::Null,
            other => CellValue::String(other.to_string()),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            CellValue::String(s) => JsonValue::String(s.clone()),
            CellValue::Integer(i) => JsonValue::from(*i),
            // NaN and infinities have no JSON form
            CellValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            CellValue::Bool(b) => JsonValue::Bool(*b),
            CellValue::Null => JsonValue::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Row identifiers
// ---------------------------------------------------------------------------

/// Stable identifier of a row: its position in the loaded dataset.
pub type RowId = usize;

/// An ordered, duplicate-free set of row identifiers.
pub type RowSet = BTreeSet<RowId>;

// ---------------------------------------------------------------------------
// Row / Dataset
// ---------------------------------------------------------------------------

/// One row of the source table; `cells[i]` belongs to `Dataset::columns[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub cells: Vec<CellValue>,
}

impl Row {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Row { cells }
    }
}

/// The full parsed table with pre-computed column indices.
///
/// The partition engines only ever read a `Dataset`; every output is a
/// [`DatasetView`] over the original rows.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Ordered column names.
    pub columns: Vec<String>,
    /// All rows, in load order. A row's index is its [`RowId`].
    pub rows: Vec<Row>,
    /// For each column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<CellValue>>,
}

impl Dataset {
    /// Build column indices from the loaded rows. Rows shorter than the
    /// header are padded with `Null`, longer ones truncated.
    pub fn from_rows(columns: Vec<String>, mut rows: Vec<Row>) -> Self {
        let mut unique_values: BTreeMap<String, BTreeSet<CellValue>> = columns
            .iter()
            .map(|c| (c.clone(), BTreeSet::new()))
            .collect();

        for row in &mut rows {
            row.cells.resize(columns.len(), CellValue::Null);
            for (col, val) in columns.iter().zip(&row.cells) {
                if let Some(set) = unique_values.get_mut(col) {
                    set.insert(val.clone());
                }
            }
        }

        Dataset {
            columns,
            rows,
            unique_values,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fail with [`SplitError::EmptyDataset`] when there is nothing to split.
    pub fn ensure_non_empty(&self) -> Result<()> {
        if self.is_empty() {
            return Err(SplitError::EmptyDataset);
        }
        Ok(())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Every row identifier, ascending.
    pub fn row_ids(&self) -> RowSet {
        (0..self.rows.len()).collect()
    }

    /// Borrow the rows named by `rows` as a dataset view.
    pub fn view<'a>(&'a self, rows: &'a RowSet) -> DatasetView<'a> {
        DatasetView {
            dataset: self,
            rows,
        }
    }
}

// ---------------------------------------------------------------------------
// DatasetView – a row subset of a Dataset, without copying
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct DatasetView<'a> {
    dataset: &'a Dataset,
    rows: &'a RowSet,
}

impl<'a> DatasetView<'a> {
    pub fn columns(&self) -> &'a [String] {
        &self.dataset.columns
    }

    pub fn row_ids(&self) -> &'a RowSet {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in original order. Identifiers outside the dataset are skipped.
    pub fn iter(&self) -> impl Iterator<Item = (RowId, &'a Row)> + 'a {
        let dataset = self.dataset;
        self.rows
            .iter()
            .filter_map(move |&id| dataset.rows.get(id).map(|row| (id, row)))
    }

    /// Copy the viewed rows into a standalone dataset.
    pub fn to_dataset(&self) -> Dataset {
        Dataset::from_rows(
            self.dataset.columns.clone(),
            self.iter().map(|(_, row)| row.clone()).collect(),
        )
    }
}
