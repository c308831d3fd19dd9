//! Dimension generators.
//!
//! Each generator takes every preprocessed fact table that carries its natural
//! key, unions the key columns in input order, keeps the first occurrence of
//! each distinct tuple and numbers the survivors 1..N. Key assignment is a
//! pure function of input order.

pub mod date;
pub mod doctor;
pub mod facility;

use std::collections::HashSet;

use phc_model::DimensionKind;
use polars::prelude::DataFrame;

use crate::data_utils::{column_strings, missing_columns};
use crate::error::{Result, WarehouseError};
use crate::frame::FactFrame;

pub use date::generate_date;
pub use doctor::{generate_doctor, generate_doctor_with_config, hub_rng};
pub use facility::generate_facility;

/// Borrows the data of each fact frame, in order.
pub fn fact_data<'a>(frames: impl IntoIterator<Item = &'a FactFrame>) -> Vec<&'a DataFrame> {
    frames.into_iter().map(|frame| &frame.data).collect()
}

/// Checks the generator precondition: at least one input, each carrying
/// every required column.
pub(crate) fn validate_inputs(
    dimension: DimensionKind,
    inputs: &[&DataFrame],
    required: &[&str],
) -> Result<()> {
    if inputs.is_empty() {
        return Err(WarehouseError::EmptyInput {
            dimension: dimension.to_string(),
        });
    }
    for (index, df) in inputs.iter().enumerate() {
        let missing = missing_columns(df, required);
        if !missing.is_empty() {
            return Err(WarehouseError::MissingDimensionColumns {
                dimension: dimension.to_string(),
                index,
                columns: missing,
            });
        }
    }
    Ok(())
}

/// Distinct key tuples across all inputs, in first-seen order. Nulls compare
/// equal to each other.
pub(crate) fn distinct_keys(
    inputs: &[&DataFrame],
    columns: &[&str],
) -> Result<Vec<Vec<Option<String>>>> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for df in inputs {
        let values = columns
            .iter()
            .map(|name| column_strings(df, name))
            .collect::<Result<Vec<_>>>()?;
        for row in 0..df.height() {
            let key: Vec<Option<String>> = values.iter().map(|col| col[row].clone()).collect();
            if seen.insert(key.clone()) {
                keys.push(key);
            }
        }
    }
    Ok(keys)
}

/// Splits key tuples into one value vector per key column.
pub(crate) fn key_columns(keys: &[Vec<Option<String>>], width: usize) -> Vec<Vec<Option<String>>> {
    (0..width)
        .map(|idx| keys.iter().map(|key| key.get(idx).cloned().flatten()).collect())
        .collect()
}

/// Dense 1-based surrogate keys for `count` rows.
pub(crate) fn surrogate_keys(count: usize) -> Vec<Option<i64>> {
    (1..=count)
        .map(|id| Some(i64::try_from(id).unwrap_or(i64::MAX)))
        .collect()
}
