//! Tabular dataset model.
//!
//! A [`Dataset`] is an ordered list of unique column names plus rows of
//! cells aligned to the columns by position. Every structural mutation goes
//! through methods on [`Dataset`] so the invariant *row length equals column
//! count* holds at all times: column insertion and removal are applied
//! atomically to the header and to every row.

use crate::error::{QcError, Result};

/// A single cell value. Study data is heterogeneous: a column may carry
/// numbers, free text, and missing markers side by side.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum CellValue {
    Number(f64),
    Text(String),
    Missing,
}

impl CellValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Lenient numeric view: numbers pass through, text is trimmed and
    /// parsed, missing is `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => text.trim().parse::<f64>().ok(),
            Self::Missing => None,
        }
    }

    /// String form used for value-set coercion and comment accumulation.
    /// Integer-valued floats render without a trailing `.0`, so coercing
    /// `1.0` into a string set yields `"1"`. Missing renders empty.
    pub fn token(&self) -> String {
        match self {
            Self::Number(value) => value.to_string(),
            Self::Text(text) => text.clone(),
            Self::Missing => String::new(),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Column-aligned table of study records.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    /// Create an empty dataset with the given header.
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        check_unique(&columns)?;
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Create a dataset from a header and pre-built rows. Ragged rows are a
    /// structural mismatch.
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<CellValue>>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut dataset = Self::new(columns)?;
        for row in rows {
            dataset.push_row(row)?;
        }
        Ok(dataset)
    }

    pub fn push_row(&mut self, row: Vec<CellValue>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(QcError::StructuralMismatch(format!(
                "row has {} cells but the dataset has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Position of a column by exact name. Case-normalization of incoming
    /// headers happens upstream of the engine.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn value(&self, row: usize, column: usize) -> &CellValue {
        &self.rows[row][column]
    }

    pub fn set_value(&mut self, row: usize, column: usize, value: CellValue) {
        self.rows[row][column] = value;
    }

    /// Append a column filled with `fill`, returning its index. The header
    /// and every row are extended in the same call.
    pub fn add_column(&mut self, name: impl Into<String>, fill: CellValue) -> Result<usize> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(QcError::StructuralMismatch(format!(
                "column \"{name}\" already exists"
            )));
        }
        self.columns.push(name);
        for row in &mut self.rows {
            row.push(fill.clone());
        }
        Ok(self.columns.len() - 1)
    }

    /// Drop every column for which `keep` returns false, preserving the
    /// relative order of the survivors. Header and rows move in lockstep.
    pub fn retain_columns<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        let mask: Vec<bool> = self.columns.iter().map(|name| keep(name)).collect();
        if mask.iter().all(|kept| *kept) {
            return;
        }
        let mut columns = Vec::with_capacity(self.columns.len());
        for (name, kept) in self.columns.drain(..).zip(&mask) {
            if *kept {
                columns.push(name);
            }
        }
        self.columns = columns;
        for row in &mut self.rows {
            let mut cells = Vec::with_capacity(self.columns.len());
            for (cell, kept) in row.drain(..).zip(&mask) {
                if *kept {
                    cells.push(cell);
                }
            }
            *row = cells;
        }
    }

    /// Rearrange columns into `order`, which must be a permutation of
    /// `0..width`. Header and rows are rearranged together.
    pub fn reorder_columns(&mut self, order: &[usize]) -> Result<()> {
        let width = self.columns.len();
        let mut seen = vec![false; width];
        if order.len() != width {
            return Err(QcError::StructuralMismatch(format!(
                "column order has {} entries for {} columns",
                order.len(),
                width
            )));
        }
        for &index in order {
            if index >= width || seen[index] {
                return Err(QcError::StructuralMismatch(format!(
                    "column order is not a permutation (index {index})"
                )));
            }
            seen[index] = true;
        }
        self.columns = order.iter().map(|&i| self.columns[i].clone()).collect();
        for row in &mut self.rows {
            *row = order.iter().map(|&i| row[i].clone()).collect();
        }
        Ok(())
    }

    /// Keep only rows for which `keep` returns true.
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[CellValue]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }
}

fn check_unique(columns: &[String]) -> Result<()> {
    for (index, name) in columns.iter().enumerate() {
        if columns[..index].contains(name) {
            return Err(QcError::StructuralMismatch(format!(
                "duplicate column name \"{name}\""
            )));
        }
    }
    Ok(())
}
