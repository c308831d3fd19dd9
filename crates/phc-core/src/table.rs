//! Row-oriented text view over a raw export.
//!
//! Raw exports arrive with every column typed as `String`. Preprocessors read
//! them into a [`TextTable`], apply their row filters and derivations on plain
//! vectors, then hand the result to a [`FrameBuilder`] to produce typed columns.

use polars::prelude::DataFrame;

use crate::data_utils::{column_names, column_strings};
use crate::error::{Result, WarehouseError};
use crate::frame_builder::{ColumnValues, FrameBuilder};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextTable {
    headers: Vec<String>,
    columns: Vec<Vec<Option<String>>>,
    height: usize,
}

impl TextTable {
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let headers = column_names(df);
        let mut columns = Vec::with_capacity(headers.len());
        for name in &headers {
            columns.push(column_strings(df, name)?);
        }
        Ok(Self {
            headers,
            columns,
            height: df.height(),
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<String>]> {
        self.position(name).map(|idx| self.columns[idx].as_slice())
    }

    /// Like [`TextTable::column`], but a missing column is an error for `dataset`.
    pub fn required(&self, dataset: &str, name: &str) -> Result<&[Option<String>]> {
        self.column(name)
            .ok_or_else(|| WarehouseError::missing_columns(dataset, vec![name.to_string()]))
    }

    pub fn value(&self, name: &str, row: usize) -> Option<&str> {
        self.column(name)
            .and_then(|values| values.get(row))
            .and_then(|value| value.as_deref())
    }

    /// Fails with every absent column named at once.
    pub fn require(&self, dataset: &str, required: &[&str]) -> Result<()> {
        let missing: Vec<String> = required
            .iter()
            .filter(|name| !self.has_column(name))
            .map(|name| (*name).to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(WarehouseError::missing_columns(dataset, missing))
        }
    }

    /// Keeps rows whose mask entry is `true`; returns how many were removed.
    pub fn retain(&mut self, keep: &[bool]) -> usize {
        debug_assert_eq!(keep.len(), self.height);
        for column in &mut self.columns {
            *column = retain_by_mask(std::mem::take(column), keep);
        }
        let kept = keep.iter().filter(|k| **k).count();
        let removed = self.height - kept;
        self.height = kept;
        removed
    }

    /// Replaces the named column, or appends it when absent.
    pub fn set_column(&mut self, name: &str, values: Vec<Option<String>>) {
        debug_assert_eq!(values.len(), self.height);
        match self.position(name) {
            Some(idx) => self.columns[idx] = values,
            None => {
                self.headers.push(name.to_string());
                self.columns.push(values);
            }
        }
    }

    /// Renames `from` to `to`, replacing any column already called `to`.
    pub fn rename(&mut self, from: &str, to: &str) {
        if from == to || !self.has_column(from) {
            return;
        }
        self.drop_column(to);
        if let Some(idx) = self.position(from) {
            self.headers[idx] = to.to_string();
        }
    }

    pub fn drop_column(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(idx) => {
                self.headers.remove(idx);
                self.columns.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Drops the named columns that are present; returns how many were dropped.
    pub fn drop_columns(&mut self, names: &[&str]) -> usize {
        names.iter().filter(|name| self.drop_column(name)).count()
    }

    /// Starts a typed frame with every remaining column as text.
    pub fn into_builder(self) -> FrameBuilder {
        let mut builder = FrameBuilder::new(self.height);
        for (name, values) in self.headers.into_iter().zip(self.columns) {
            builder.set(name, ColumnValues::Str(values));
        }
        builder
    }

    pub fn into_frame(self) -> Result<DataFrame> {
        self.into_builder().build()
    }
}

/// Keeps the elements whose mask entry is `true`.
pub fn retain_by_mask<T>(values: Vec<T>, keep: &[bool]) -> Vec<T> {
    values
        .into_iter()
        .zip(keep.iter())
        .filter_map(|(value, keep)| keep.then_some(value))
        .collect()
}
