//! Dataset Module - Tabular traffic records
//!
//! Loads labeled/unlabeled CSV files into a column-typed [`Table`]. A column whose CSV
//! dtype is a string is categorical; every other column is read as `f64`.

pub mod split;

#[cfg(test)]
mod tests;

use std::fs::File;
use std::path::Path;

use polars::prelude::*;

use crate::constants::{DEFAULT_TARGET_COLUMN, MISSING_TEXT};
use crate::error::{DetectError, DetectResult};
use crate::models::{FeatureRecord, FeatureValue};

pub use split::{train_test_split, SplitIndices};

/// Values of one column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, ColumnData::Text(_))
    }

    /// Cell as a raw feature value
    pub fn value(&self, row: usize) -> Option<FeatureValue> {
        match self {
            ColumnData::Numeric(v) => v
                .get(row)
                .map(|&x| if x.is_nan() { FeatureValue::Missing } else { FeatureValue::Number(x) }),
            ColumnData::Text(v) => v.get(row).map(|s| FeatureValue::Text(s.clone())),
        }
    }

    /// Every cell rendered as a string
    pub fn to_strings(&self) -> Vec<String> {
        match self {
            ColumnData::Numeric(v) => v.iter().map(|x| x.to_string()).collect(),
            ColumnData::Text(v) => v.clone(),
        }
    }

    fn take(&self, indices: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(indices.iter().map(|&i| v[i]).collect()),
            ColumnData::Text(v) => ColumnData::Text(indices.iter().map(|&i| v[i].clone()).collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: &str, values: Vec<f64>) -> Self {
        Self { name: name.to_string(), data: ColumnData::Numeric(values) }
    }

    pub fn text(name: &str, values: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            data: ColumnData::Text(values.iter().map(|s| s.to_string()).collect()),
        }
    }
}

/// Column-major table with a fixed column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    /// Build a table; every column must have the same length
    pub fn new(columns: Vec<Column>) -> DetectResult<Self> {
        let n_rows = columns.first().map(|c| c.data.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.data.len() != n_rows) {
            return Err(DetectError::ShapeMismatch {
                expected: format!("{} rows", n_rows),
                actual: format!("{} rows in column '{}'", bad.data.len(), bad.name),
            });
        }
        Ok(Self { columns, n_rows })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Names of string-typed columns, in table order
    pub fn categorical_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.data.is_categorical())
            .map(|c| c.name.clone())
            .collect()
    }

    /// `"class"` when present, otherwise the last column
    pub fn target_column(&self) -> Option<String> {
        if self.column(DEFAULT_TARGET_COLUMN).is_some() {
            return Some(DEFAULT_TARGET_COLUMN.to_string());
        }

        let last = self.columns.last()?;
        tracing::warn!(
            "'{}' column not found, using last column '{}' as target",
            DEFAULT_TARGET_COLUMN,
            last.name
        );
        Some(last.name.clone())
    }

    /// Separate the target column from the features; labels are rendered as strings
    pub fn split_target(mut self, target: &str) -> DetectResult<(Table, Vec<String>)> {
        let idx = self
            .columns
            .iter()
            .position(|c| c.name == target)
            .ok_or_else(|| DetectError::ColumnNotFound(target.to_string()))?;

        let labels = self.columns.remove(idx).data.to_strings();
        Ok((self, labels))
    }

    /// Rows at `indices`, in that order
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column { name: c.name.clone(), data: c.data.take(indices) })
                .collect(),
            n_rows: indices.len(),
        }
    }

    /// One row as a feature record
    pub fn record(&self, row: usize) -> Option<FeatureRecord> {
        if row >= self.n_rows {
            return None;
        }
        self.columns
            .iter()
            .map(|c| c.data.value(row).map(|v| (c.name.clone(), v)))
            .collect()
    }
}

/// Load a CSV file with a header row
pub fn load_csv(path: impl AsRef<Path>) -> DetectResult<Table> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DetectError::InputNotFound(path.display().to_string()));
    }

    let file = File::open(path)?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .into_reader_with_file_handle(file)
        .finish()?;

    let table = from_dataframe(&df)?;
    tracing::info!(
        path = %path.display(),
        rows = table.n_rows(),
        columns = table.n_cols(),
        "Loaded dataset"
    );
    Ok(table)
}

fn from_dataframe(df: &DataFrame) -> DetectResult<Table> {
    let columns = df
        .get_columns()
        .iter()
        .map(|column| {
            let series = column.as_materialized_series();
            let name = series.name().to_string();

            let data = if matches!(series.dtype(), DataType::String) {
                let values = series
                    .str()?
                    .into_iter()
                    .map(|v| v.unwrap_or(MISSING_TEXT).to_string())
                    .collect();
                ColumnData::Text(values)
            } else {
                let cast = series.cast(&DataType::Float64)?;
                let values = cast
                    .f64()?
                    .into_iter()
                    .map(|v| v.unwrap_or(f64::NAN))
                    .collect();
                ColumnData::Numeric(values)
            };

            Ok(Column { name, data })
        })
        .collect::<DetectResult<Vec<_>>>()?;

    Table::new(columns)
}
