//! Assembles typed polars columns into a `DataFrame`.

use chrono::NaiveDate;
use polars::prelude::{Column, DataFrame, DataType, IntoColumn, NamedFrom, Series};

use crate::datetime::date_to_days;
use crate::error::Result;

/// Column values before they become a polars `Series`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Str(Vec<Option<String>>),
    Int(Vec<Option<i64>>),
    Int32(Vec<Option<i32>>),
    Float(Vec<Option<f64>>),
    Date(Vec<Option<NaiveDate>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Str(values) => values.len(),
            ColumnValues::Int(values) => values.len(),
            ColumnValues::Int32(values) => values.len(),
            ColumnValues::Float(values) => values.len(),
            ColumnValues::Date(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn into_column(self, name: &str) -> Result<Column> {
        let series = match self {
            ColumnValues::Str(values) => Series::new(name.into(), values),
            ColumnValues::Int(values) => Series::new(name.into(), values),
            ColumnValues::Int32(values) => Series::new(name.into(), values),
            ColumnValues::Float(values) => Series::new(name.into(), values),
            ColumnValues::Date(values) => {
                let days: Vec<Option<i32>> = values
                    .into_iter()
                    .map(|value| value.map(date_to_days))
                    .collect();
                Series::new(name.into(), days).cast(&DataType::Date)?
            }
        };
        Ok(series.into_column())
    }
}

/// Ordered set of named columns of equal length.
#[derive(Debug, Clone, Default)]
pub struct FrameBuilder {
    height: usize,
    columns: Vec<(String, ColumnValues)>,
}

impl FrameBuilder {
    pub fn new(height: usize) -> Self {
        Self {
            height,
            columns: Vec::new(),
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Replaces a column in place, or appends it when absent.
    pub fn set(&mut self, name: impl Into<String>, values: ColumnValues) -> &mut Self {
        let name = name.into();
        debug_assert_eq!(values.len(), self.height, "column {name} has wrong length");
        match self.columns.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = values,
            None => self.columns.push((name, values)),
        }
        self
    }

    pub fn with(mut self, name: impl Into<String>, values: ColumnValues) -> Self {
        self.set(name, values);
        self
    }

    pub fn build(self) -> Result<DataFrame> {
        let mut cols = Vec::with_capacity(self.columns.len());
        for (name, values) in self.columns {
            cols.push(values.into_column(&name)?);
        }
        Ok(DataFrame::new(cols)?)
    }
}
