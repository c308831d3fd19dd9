#![allow(dead_code)]

use phc_core::data_utils::{column_i64, column_names, column_strings};
use polars::prelude::*;

/// Builds an all-text frame, the shape ingestion produces.
pub fn text_frame(columns: &[(&str, Vec<Option<&str>>)]) -> DataFrame {
    let cols: Vec<Column> = columns
        .iter()
        .map(|(name, values)| Series::new((*name).into(), values.clone()).into_column())
        .collect();
    DataFrame::new(cols).expect("build frame")
}

pub fn some(values: &[&'static str]) -> Vec<Option<&'static str>> {
    values.iter().map(|v| Some(*v)).collect()
}

pub fn repeat(value: &'static str, n: usize) -> Vec<Option<&'static str>> {
    vec![Some(value); n]
}

pub fn names(df: &DataFrame) -> Vec<String> {
    column_names(df)
}

pub fn strings(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    column_strings(df, name).expect("string column")
}

pub fn owned(values: &[&str]) -> Vec<Option<String>> {
    values.iter().map(|v| Some((*v).to_string())).collect()
}

pub fn ints(df: &DataFrame, name: &str) -> Vec<Option<i64>> {
    column_i64(df, name).expect("integer column")
}

pub fn floats(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .expect("float column")
        .as_materialized_series()
        .f64()
        .expect("f64 dtype")
        .into_iter()
        .collect()
}
