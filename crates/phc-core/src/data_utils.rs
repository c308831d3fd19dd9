//! Polars `AnyValue` and column access helpers.

use chrono::NaiveDate;
use polars::prelude::{AnyValue, BooleanChunked, DataFrame, NewChunkedArray};

use crate::datetime::{days_to_date, parse_flexible_date};
use crate::error::Result;

/// Converts a cell to text, `None` for null. Dates render as `YYYY-MM-DD`.
pub fn any_to_string(value: AnyValue<'_>) -> Option<String> {
    match value {
        AnyValue::Null => None,
        AnyValue::String(s) => Some(s.to_string()),
        AnyValue::StringOwned(s) => Some(s.to_string()),
        AnyValue::Date(days) => days_to_date(days).map(|d| d.format("%Y-%m-%d").to_string()),
        AnyValue::Float32(v) => Some(format_numeric(f64::from(v))),
        AnyValue::Float64(v) => Some(format_numeric(v)),
        other => Some(other.to_string()),
    }
}

/// Converts a cell to a calendar date, parsing text when needed.
pub fn any_to_date(value: AnyValue<'_>) -> Option<NaiveDate> {
    match value {
        AnyValue::Date(days) => days_to_date(days),
        AnyValue::String(s) => parse_flexible_date(s),
        AnyValue::StringOwned(s) => parse_flexible_date(&s),
        _ => None,
    }
}

pub fn any_to_i64(value: AnyValue<'_>) -> Option<i64> {
    match value {
        AnyValue::Int8(v) => Some(i64::from(v)),
        AnyValue::Int16(v) => Some(i64::from(v)),
        AnyValue::Int32(v) => Some(i64::from(v)),
        AnyValue::Int64(v) => Some(v),
        AnyValue::UInt8(v) => Some(i64::from(v)),
        AnyValue::UInt16(v) => Some(i64::from(v)),
        AnyValue::UInt32(v) => Some(i64::from(v)),
        AnyValue::UInt64(v) => i64::try_from(v).ok(),
        AnyValue::String(s) => s.trim().parse().ok(),
        AnyValue::StringOwned(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Formats a float without a trailing `.0` for whole numbers.
pub fn format_numeric(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// Names from `required` that `df` lacks, in the order given.
pub fn missing_columns(df: &DataFrame, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|name| !has_column(df, name))
        .map(|name| (*name).to_string())
        .collect()
}

pub fn column_strings(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df.column(name)?;
    let mut values = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        values.push(any_to_string(column.get(idx)?));
    }
    Ok(values)
}

pub fn column_dates(df: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDate>>> {
    let column = df.column(name)?;
    let mut values = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        values.push(any_to_date(column.get(idx)?));
    }
    Ok(values)
}

pub fn column_i64(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let column = df.column(name)?;
    let mut values = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        values.push(any_to_i64(column.get(idx)?));
    }
    Ok(values)
}

/// Drops the named columns that exist; absent names are ignored.
pub fn drop_existing(df: &DataFrame, names: &[&str]) -> Result<DataFrame> {
    let mut out = df.clone();
    for name in names {
        if has_column(&out, name) {
            out = out.drop(name)?;
        }
    }
    Ok(out)
}

pub fn filter_rows(df: &DataFrame, keep: &[bool]) -> Result<DataFrame> {
    let mask = BooleanChunked::from_slice("keep".into(), keep);
    Ok(df.filter(&mask)?)
}
