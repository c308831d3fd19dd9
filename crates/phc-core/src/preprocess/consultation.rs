//! Teleconsultation export: one row per call.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveTime};
use phc_model::columns::{
    AGE_GROUP, BLOCK_NAME, CALL_DURATION, CONSULTATION_STATUS, DATE, DISTRICT_NAME, DOCTOR, HOUR,
    OPD_NO, PHC_NAME, SPECIALIZATION,
};
use phc_model::{FactKind, QualityReport, WarehouseConfig};
use polars::prelude::DataFrame;

use super::{FactPreprocessor, RowFilter, ensure_any_parsed};
use crate::age::{AgeBands, parse_age_with_unit};
use crate::datetime::{DMY_FORMAT, hour_bucket_of, parse_dmy, parse_time_of_day};
use crate::error::Result;
use crate::frame::FactFrame;
use crate::frame_builder::ColumnValues;
use crate::table::TextTable;

pub const CONSULT_DATE: &str = "ConsultDate";
pub const START_TIME: &str = "StartTime";
pub const END_TIME: &str = "EndTime";
pub const AGE: &str = "Age";
pub const PATIENT_CASE_ID: &str = "PatientCaseID";
pub const DISTRICT: &str = "District";
pub const BLOCK: &str = "Block";
pub const PHC: &str = "PHC";
pub const PATIENT: &str = "Patient";

pub const VALID_CALL: &str = "Valid Call";
pub const INVALID_CALL: &str = "Invalid Call";

const REQUIRED: &[&str] = &[
    CONSULT_DATE,
    START_TIME,
    END_TIME,
    AGE,
    PATIENT_CASE_ID,
    OPD_NO,
    DISTRICT,
    BLOCK,
    PHC,
    DOCTOR,
    SPECIALIZATION,
];

/// Identifying and administrative columns removed from the fact table.
pub const DROPPED_COLUMNS: &[&str] = &[
    "SrNo",
    "Cluster",
    "PatientName",
    AGE,
    END_TIME,
    PATIENT_CASE_ID,
    "ReferredBy",
    "Designation",
    "LTName",
    "Qualification",
    "ApprovalDate",
    "complaint",
    "WorkbookName",
    "Age (in Years)",
];

const TIME_FORMATS_HINT: &str = "HH:MM[:SS] or hh:mm[:ss] AM/PM";
const AGE_FORMAT_HINT: &str = "<number> <unit>";

#[derive(Debug, Clone)]
struct Call {
    date: Option<NaiveDate>,
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
    age: Option<i64>,
}

pub struct ConsultationPreprocessor;

impl FactPreprocessor for ConsultationPreprocessor {
    fn kind(&self) -> FactKind {
        FactKind::Consultation
    }

    fn required_columns(&self) -> &'static [&'static str] {
        REQUIRED
    }

    fn description(&self) -> &'static str {
        "Derives call duration, validity, hour and age group per consultation"
    }

    fn preprocess(&self, raw: &DataFrame, config: &WarehouseConfig) -> Result<FactFrame> {
        let kind = self.kind();
        let dataset = kind.as_str();
        let mut table = TextTable::from_frame(raw)?;
        table.require(dataset, self.required_columns())?;

        let mut calls = parse_calls(&table, dataset)?;
        let raw_dates = table.required(dataset, CONSULT_DATE)?;
        let dates: Vec<_> = calls.iter().map(|c| c.date).collect();
        ensure_any_parsed(kind, CONSULT_DATE, raw_dates, &dates, DMY_FORMAT)?;
        let starts: Vec<_> = calls.iter().map(|c| c.start).collect();
        ensure_any_parsed(
            kind,
            START_TIME,
            table.required(dataset, START_TIME)?,
            &starts,
            TIME_FORMATS_HINT,
        )?;
        let ends: Vec<_> = calls.iter().map(|c| c.end).collect();
        ensure_any_parsed(
            kind,
            END_TIME,
            table.required(dataset, END_TIME)?,
            &ends,
            TIME_FORMATS_HINT,
        )?;
        let ages: Vec<_> = calls.iter().map(|c| c.age).collect();
        ensure_any_parsed(
            kind,
            AGE,
            table.required(dataset, AGE)?,
            &ages,
            AGE_FORMAT_HINT,
        )?;

        let mut quality = QualityReport::new();
        let mut filter = RowFilter {
            kind,
            quality: &mut quality,
        };

        let keep: Vec<bool> = calls.iter().map(|c| c.date.is_some()).collect();
        filter.apply(
            &mut table,
            &mut calls,
            &keep,
            "consult_date",
            "unparseable consultation date",
        );
        let keep: Vec<bool> = calls
            .iter()
            .map(|c| c.start.is_some() && c.end.is_some())
            .collect();
        filter.apply(
            &mut table,
            &mut calls,
            &keep,
            "call_time",
            "unparseable call time",
        );
        let keep: Vec<bool> = calls.iter().map(|c| c.age.is_some()).collect();
        filter.apply(&mut table, &mut calls, &keep, "age", "unparseable age");

        table.rename(DISTRICT, DISTRICT_NAME);
        table.rename(BLOCK, BLOCK_NAME);
        table.rename(CONSULT_DATE, DATE);
        table.rename(PHC, PHC_NAME);
        table.rename(PATIENT, "PatientName");
        filter.missing_facility(&mut table, &mut calls, PHC_NAME);

        let keep = first_occurrences(table.required(dataset, PATIENT_CASE_ID)?);
        filter.apply(
            &mut table,
            &mut calls,
            &keep,
            "dedupe_case_id",
            "duplicate patient case id",
        );

        let keep: Vec<bool> = table
            .required(dataset, OPD_NO)?
            .iter()
            .map(|value| value.as_deref().and_then(visit_number_key).is_some())
            .collect();
        filter.apply(
            &mut table,
            &mut calls,
            &keep,
            "visit_number",
            "non-numeric visit number",
        );
        let visit_numbers = dense_visit_numbers(table.required(dataset, OPD_NO)?);

        let hours: Vec<Option<String>> = calls
            .iter()
            .map(|c| c.start.map(hour_bucket_of))
            .collect();
        table.set_column(START_TIME, hours);
        table.rename(START_TIME, HOUR);
        table.drop_columns(DROPPED_COLUMNS);

        let bands = AgeBands::from_config(&config.age_bands);
        let threshold = config.consultation.valid_call_threshold_secs;
        let durations: Vec<Option<f64>> = calls.iter().map(call_duration_secs).collect();
        let statuses: Vec<Option<String>> = durations
            .iter()
            .map(|duration| duration.map(|secs| call_status(secs, threshold).to_string()))
            .collect();
        let age_groups: Vec<Option<String>> = calls
            .iter()
            .map(|c| c.age.map(|age| bands.categorize(age).to_string()))
            .collect();

        let mut builder = table.into_builder();
        builder
            .set(
                DATE,
                ColumnValues::Date(calls.iter().map(|c| c.date).collect()),
            )
            .set(OPD_NO, ColumnValues::Int(visit_numbers))
            .set(CALL_DURATION, ColumnValues::Float(durations))
            .set(CONSULTATION_STATUS, ColumnValues::Str(statuses))
            .set(AGE_GROUP, ColumnValues::Str(age_groups));

        Ok(FactFrame::new(kind, builder.build()?).with_quality(quality))
    }
}

fn parse_calls(table: &TextTable, dataset: &str) -> Result<Vec<Call>> {
    let dates = table.required(dataset, CONSULT_DATE)?;
    let starts = table.required(dataset, START_TIME)?;
    let ends = table.required(dataset, END_TIME)?;
    let ages = table.required(dataset, AGE)?;
    Ok((0..table.height())
        .map(|row| Call {
            date: dates[row].as_deref().and_then(parse_dmy),
            start: starts[row].as_deref().and_then(parse_time_of_day),
            end: ends[row].as_deref().and_then(parse_time_of_day),
            age: ages[row].as_deref().and_then(parse_age_with_unit),
        })
        .collect())
}

fn call_duration_secs(call: &Call) -> Option<f64> {
    let (start, end) = (call.start?, call.end?);
    Some((end - start).num_milliseconds() as f64 / 1000.0)
}

/// Calls shorter than `threshold_secs` are invalid.
pub fn call_status(duration_secs: f64, threshold_secs: f64) -> &'static str {
    if duration_secs < threshold_secs {
        INVALID_CALL
    } else {
        VALID_CALL
    }
}

/// Marks the first row of each distinct value; nulls compare equal.
fn first_occurrences(values: &[Option<String>]) -> Vec<bool> {
    let mut seen = HashSet::new();
    values.iter().map(|value| seen.insert(value.as_deref())).collect()
}

/// Numeric identity of a visit number: digits only, leading zeros ignored.
fn visit_number_key(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let key = trimmed.trim_start_matches('0');
    Some(if key.is_empty() { "0" } else { key })
}

/// Re-keys visit numbers to 1..N in first-seen order.
fn dense_visit_numbers(values: &[Option<String>]) -> Vec<Option<i64>> {
    let mut ids: HashMap<&str, i64> = HashMap::new();
    values
        .iter()
        .map(|value| {
            let key = value.as_deref().and_then(visit_number_key)?;
            let next = i64::try_from(ids.len()).unwrap_or(i64::MAX).saturating_add(1);
            Some(*ids.entry(key).or_insert(next))
        })
        .collect()
}
