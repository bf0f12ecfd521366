use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::model::CellValue;

/// Optional column/value label metadata travelling alongside a dataset,
/// as survey formats carry it. Only used for display and passed through
/// to outputs unchanged.
///
/// ```json
/// {
///   "column_labels": { "region": "Region of residence" },
///   "value_labels": { "gender": { "1": "Male", "2": "Female" } }
/// }
/// ```
///
/// Value label keys are the displayed form of the cell (`1`, `north`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueLabels {
    pub column_labels: BTreeMap<String, String>,
    pub value_labels: BTreeMap<String, BTreeMap<String, String>>,
}

impl ValueLabels {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading labels {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing labels {}", path.display()))
    }

    /// Load `<data file>.labels.json` when it exists.
    pub fn load_sidecar(data_path: &Path) -> Result<Option<Self>> {
        let path = sidecar_path(data_path);
        if !path.is_file() {
            return Ok(None);
        }
        Self::load(&path).map(Some)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).context("serialising labels")?;
        std::fs::write(path, text).with_context(|| format!("writing labels {}", path.display()))
    }

    pub fn label(&self, column: &str, value: &CellValue) -> Option<&str> {
        self.value_labels
            .get(column)?
            .get(&value.to_string())
            .map(String::as_str)
    }

    /// `value - label` when a label exists, the bare value otherwise.
    pub fn display_value(&self, column: &str, value: &CellValue) -> String {
        match self.label(column, value) {
            Some(label) => format!("{value} - {label}"),
            None => value.to_string(),
        }
    }

    pub fn display_column(&self, column: &str) -> String {
        match self.column_labels.get(column) {
            Some(label) => format!("{column} ({label})"),
            None => column.to_string(),
        }
    }
}

/// `survey.csv` → `survey.csv.labels.json`.
pub fn sidecar_path(data_path: &Path) -> PathBuf {
    let mut name = data_path.as_os_str().to_owned();
    name.push(".labels.json");
    PathBuf::from(name)
}
