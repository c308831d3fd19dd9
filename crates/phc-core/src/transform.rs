//! Fact table transformer.
//!
//! Replaces the descriptive columns of a preprocessed fact table with
//! surrogate keys from the dimensions. Every lookup is a left join: all fact
//! rows survive in order, and a row without a matching dimension entry gets a
//! null key. [`check_missing_keys`] reports those rows without failing.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Instant;

use chrono::NaiveDate;
use phc_model::columns::{
    DATE, DATE_ID, DOCTOR_DESCRIPTIVE, DOCTOR_ID, DOCTOR_KEY, FACILITY_DESCRIPTIVE, FACILITY_KEY,
    PHC_ID,
};
use phc_model::{DimensionKind, FactKind};
use polars::prelude::{DataFrame, IntoColumn, NamedFrom, Series};
use serde::Serialize;
use tracing::{debug, info_span, warn};

use crate::data_utils::{column_dates, column_i64, column_strings, drop_existing, missing_columns};
use crate::error::{Result, WarehouseError};
use crate::frame::{Dimensions, FactFrame};

const FACILITY_DATE_KEYS: &[&str] = &[PHC_ID, DATE_ID];
const FACILITY_DATE_DOCTOR_KEYS: &[&str] = &[PHC_ID, DATE_ID, DOCTOR_ID];

/// Null-key count for one foreign key column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingKeyCount {
    pub column: String,
    pub unmatched: usize,
    pub total: usize,
}

impl MissingKeyCount {
    pub fn is_clean(&self) -> bool {
        self.unmatched == 0
    }
}

/// Foreign key columns a final fact table of `kind` carries.
pub fn key_columns_for(kind: FactKind) -> &'static [&'static str] {
    if kind.has_doctor() {
        FACILITY_DATE_DOCTOR_KEYS
    } else {
        FACILITY_DATE_KEYS
    }
}

pub fn transform_appointment(
    fact: &DataFrame,
    facility: &DataFrame,
    date: &DataFrame,
    doctor: &DataFrame,
) -> Result<DataFrame> {
    transform_with_doctor(FactKind::Appointment, fact, facility, date, doctor)
}

pub fn transform_consultation(
    fact: &DataFrame,
    facility: &DataFrame,
    date: &DataFrame,
    doctor: &DataFrame,
) -> Result<DataFrame> {
    transform_with_doctor(FactKind::Consultation, fact, facility, date, doctor)
}

pub fn transform_patient_registration(
    fact: &DataFrame,
    facility: &DataFrame,
    date: &DataFrame,
) -> Result<DataFrame> {
    transform_without_doctor(FactKind::PatientRegistration, fact, facility, date)
}

pub fn transform_phc_login(
    fact: &DataFrame,
    facility: &DataFrame,
    date: &DataFrame,
) -> Result<DataFrame> {
    transform_without_doctor(FactKind::PhcLogin, fact, facility, date)
}

/// Transforms a preprocessed fact frame against the dimensions and records
/// unmatched keys in its quality report. Logging of unmatched keys is left to
/// [`check_missing_keys`].
pub fn transform_fact(fact: &FactFrame, dimensions: &Dimensions) -> Result<FactFrame> {
    let kind = fact.kind;
    let span = info_span!("transform", fact = %kind);
    let _guard = span.enter();
    let start = Instant::now();

    let facility = &dimensions.facility.data;
    let date = &dimensions.date.data;
    let data = match kind {
        FactKind::Appointment => {
            transform_appointment(&fact.data, facility, date, &dimensions.doctor.data)?
        }
        FactKind::Consultation => {
            transform_consultation(&fact.data, facility, date, &dimensions.doctor.data)?
        }
        FactKind::PatientRegistration => {
            transform_patient_registration(&fact.data, facility, date)?
        }
        FactKind::PhcLogin => transform_phc_login(&fact.data, facility, date)?,
    };

    let mut quality = fact.quality.clone();
    for missing in count_missing_keys(&data, key_columns_for(kind)) {
        quality.record_unmatched(kind.as_str(), missing.column, missing.unmatched);
    }
    debug!(
        fact = %kind,
        rows = data.height(),
        columns = data.width(),
        duration_ms = start.elapsed().as_millis(),
        "transform complete"
    );
    Ok(FactFrame::new(kind, data).with_quality(quality))
}

/// Counts null (unmatched) rows per key column and logs a warning for every
/// column with unmatched rows. A column that is absent counts every row as
/// unmatched. Never fails.
pub fn check_missing_keys(df: &DataFrame, key_columns: &[&str]) -> Vec<MissingKeyCount> {
    let counts = count_missing_keys(df, key_columns);
    for count in counts.iter().filter(|count| !count.is_clean()) {
        warn!(
            column = %count.column,
            unmatched = count.unmatched,
            total = count.total,
            "missing foreign key values: {} unmatched rows",
            count.unmatched
        );
    }
    counts
}

fn count_missing_keys(df: &DataFrame, key_columns: &[&str]) -> Vec<MissingKeyCount> {
    let total = df.height();
    key_columns
        .iter()
        .map(|name| MissingKeyCount {
            column: (*name).to_string(),
            unmatched: df
                .column(name)
                .map(|column| column.null_count())
                .unwrap_or(total),
            total,
        })
        .collect()
}

fn transform_with_doctor(
    kind: FactKind,
    fact: &DataFrame,
    facility: &DataFrame,
    date: &DataFrame,
    doctor: &DataFrame,
) -> Result<DataFrame> {
    let phc_ids = lookup_text_keys(
        kind,
        fact,
        DimensionKind::Facility,
        facility,
        &FACILITY_KEY,
        PHC_ID,
    )?;
    let date_ids = lookup_date_keys(kind, fact, date)?;
    let doctor_ids = lookup_text_keys(
        kind,
        fact,
        DimensionKind::Doctor,
        doctor,
        &DOCTOR_KEY,
        DOCTOR_ID,
    )?;
    let mut descriptive: Vec<&str> = FACILITY_DESCRIPTIVE.to_vec();
    descriptive.extend(DOCTOR_DESCRIPTIVE);
    attach_keys(
        fact,
        vec![(PHC_ID, phc_ids), (DATE_ID, date_ids), (DOCTOR_ID, doctor_ids)],
        &descriptive,
    )
}

fn transform_without_doctor(
    kind: FactKind,
    fact: &DataFrame,
    facility: &DataFrame,
    date: &DataFrame,
) -> Result<DataFrame> {
    let phc_ids = lookup_text_keys(
        kind,
        fact,
        DimensionKind::Facility,
        facility,
        &FACILITY_KEY,
        PHC_ID,
    )?;
    let date_ids = lookup_date_keys(kind, fact, date)?;
    attach_keys(
        fact,
        vec![(PHC_ID, phc_ids), (DATE_ID, date_ids)],
        &FACILITY_DESCRIPTIVE,
    )
}

fn require(dataset: &str, df: &DataFrame, columns: &[&str]) -> Result<()> {
    let missing = missing_columns(df, columns);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(WarehouseError::missing_columns(dataset, missing))
    }
}

/// Left-join lookup of `id_column` on text key columns. The first dimension
/// row wins for a repeated key.
fn lookup_text_keys(
    kind: FactKind,
    fact: &DataFrame,
    dimension_kind: DimensionKind,
    dimension: &DataFrame,
    key: &[&str],
    id_column: &str,
) -> Result<Vec<Option<i64>>> {
    require(kind.as_str(), fact, key)?;
    let mut dimension_columns = key.to_vec();
    dimension_columns.push(id_column);
    require(dimension_kind.as_str(), dimension, &dimension_columns)?;

    let dimension_keys = text_tuples(dimension, key)?;
    let ids = column_i64(dimension, id_column)?;
    let index = build_index(dimension_keys.into_iter().zip(ids));
    Ok(text_tuples(fact, key)?
        .iter()
        .map(|tuple| index.get(tuple).copied())
        .collect())
}

fn lookup_date_keys(
    kind: FactKind,
    fact: &DataFrame,
    dimension: &DataFrame,
) -> Result<Vec<Option<i64>>> {
    require(kind.as_str(), fact, &[DATE])?;
    require(DimensionKind::Date.as_str(), dimension, &[DATE, DATE_ID])?;

    let days = column_dates(dimension, DATE)?;
    let ids = column_i64(dimension, DATE_ID)?;
    let index: HashMap<NaiveDate, i64> = build_index(
        days.into_iter()
            .zip(ids)
            .filter_map(|(day, id)| day.map(|day| (day, id))),
    );
    Ok(column_dates(fact, DATE)?
        .into_iter()
        .map(|day| day.and_then(|day| index.get(&day).copied()))
        .collect())
}

fn build_index<K: Eq + Hash>(
    entries: impl IntoIterator<Item = (K, Option<i64>)>,
) -> HashMap<K, i64> {
    let mut index = HashMap::new();
    for (key, id) in entries {
        if let Some(id) = id {
            index.entry(key).or_insert(id);
        }
    }
    index
}

fn text_tuples(df: &DataFrame, columns: &[&str]) -> Result<Vec<Vec<Option<String>>>> {
    let values = columns
        .iter()
        .map(|name| column_strings(df, name))
        .collect::<Result<Vec<_>>>()?;
    Ok((0..df.height())
        .map(|row| values.iter().map(|col| col[row].clone()).collect())
        .collect())
}

fn attach_keys(
    fact: &DataFrame,
    keys: Vec<(&str, Vec<Option<i64>>)>,
    descriptive: &[&str],
) -> Result<DataFrame> {
    let mut out = fact.clone();
    for (name, values) in keys {
        out.with_column(Series::new(name.into(), values).into_column())?;
    }
    drop_existing(&out, descriptive)
}
