//! Appointment export: one row per patient appointment, pivoted into counts
//! per consultation status.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use phc_model::columns::{
    BLOCK_NAME, COUNT_APPOINTMENTS, DATE, DISTRICT_NAME, DOCTOR, PHC_NAME, SPECIALIZATION,
};
use phc_model::{FactKind, QualityReport, WarehouseConfig};
use polars::prelude::DataFrame;

use super::{FactPreprocessor, RowFilter, all_present};
use crate::datetime::{DMY_FORMAT, parse_dmy};
use crate::error::{Result, WarehouseError};
use crate::frame::FactFrame;
use crate::frame_builder::{ColumnValues, FrameBuilder};
use crate::table::TextTable;

pub const APPOINTMENT_TIME: &str = "AppointmentTime";
pub const CONSULT_STATUS: &str = "ConsultStatus";
pub const PATIENT_NAME: &str = "PatientName";

const REQUIRED: &[&str] = &[
    DISTRICT_NAME,
    BLOCK_NAME,
    PHC_NAME,
    DOCTOR,
    SPECIALIZATION,
    CONSULT_STATUS,
];

/// Columns of the pivoted frame other than the per-status counts.
const PIVOT_COLUMNS: &[&str] = &[
    DATE,
    DISTRICT_NAME,
    BLOCK_NAME,
    PHC_NAME,
    DOCTOR,
    SPECIALIZATION,
    COUNT_APPOINTMENTS,
];

/// (date, district, block, phc, doctor, specialization)
type GroupKey = (NaiveDate, String, String, String, String, String);

pub struct AppointmentPreprocessor;

impl FactPreprocessor for AppointmentPreprocessor {
    fn kind(&self) -> FactKind {
        FactKind::Appointment
    }

    fn required_columns(&self) -> &'static [&'static str] {
        REQUIRED
    }

    fn description(&self) -> &'static str {
        "Pivots appointments into per-status counts"
    }

    fn preprocess(&self, raw: &DataFrame, _config: &WarehouseConfig) -> Result<FactFrame> {
        let kind = self.kind();
        let dataset = kind.as_str();
        let mut table = TextTable::from_frame(raw)?;
        table.require(dataset, self.required_columns())?;
        let date_column = appointment_date_column(&table).ok_or_else(|| {
            WarehouseError::missing_columns(dataset, vec![APPOINTMENT_TIME.to_string()])
        })?;

        let mut quality = QualityReport::new();
        let mut filter = RowFilter {
            kind,
            quality: &mut quality,
        };
        let mut rows: Vec<()> = vec![(); table.height()];

        // Appointments are counted by patient name; unnamed rows do not count.
        if let Some(names) = table.column(PATIENT_NAME) {
            let keep: Vec<bool> = names.iter().map(Option::is_some).collect();
            filter.apply(
                &mut table,
                &mut rows,
                &keep,
                "patient_name",
                "missing patient name",
            );
        }
        filter.missing_facility(&mut table, &mut rows, PHC_NAME);

        let keep = all_present(
            &[
                table.required(dataset, date_column)?,
                table.required(dataset, DISTRICT_NAME)?,
                table.required(dataset, BLOCK_NAME)?,
                table.required(dataset, DOCTOR)?,
                table.required(dataset, SPECIALIZATION)?,
                table.required(dataset, CONSULT_STATUS)?,
            ],
            table.height(),
        );
        filter.apply(
            &mut table,
            &mut rows,
            &keep,
            "group_key",
            "missing date, doctor, geography or status",
        );

        let mut statuses = BTreeSet::new();
        let mut groups: BTreeMap<GroupKey, BTreeMap<String, i64>> = BTreeMap::new();
        for row in 0..table.height() {
            let text = |column: &str| table.value(column, row).unwrap_or_default().to_string();
            let raw_date = table.value(date_column, row).unwrap_or_default();
            let date = parse_dmy(raw_date).ok_or_else(|| {
                WarehouseError::parse(
                    dataset,
                    date_column,
                    Some(raw_date),
                    format!("expected {DMY_FORMAT}"),
                )
            })?;
            let status = text(CONSULT_STATUS);
            let key = (
                date,
                text(DISTRICT_NAME),
                text(BLOCK_NAME),
                text(PHC_NAME),
                text(DOCTOR),
                text(SPECIALIZATION),
            );
            *groups.entry(key).or_default().entry(status.clone()).or_insert(0) += 1;
            statuses.insert(status);
        }

        if let Some(status) = statuses
            .iter()
            .find(|status| PIVOT_COLUMNS.contains(&status.as_str()))
        {
            return Err(WarehouseError::Validation {
                message: format!(
                    "{dataset}: {CONSULT_STATUS} value '{status}' collides with the {status} column"
                ),
            });
        }

        Ok(FactFrame::new(kind, pivot(&groups, &statuses)?).with_quality(quality))
    }
}

/// `AppointmentTime`, or `Date` in exports that were already renamed.
fn appointment_date_column(table: &TextTable) -> Option<&'static str> {
    [APPOINTMENT_TIME, DATE]
        .into_iter()
        .find(|name| table.has_column(name))
}

fn pivot(
    groups: &BTreeMap<GroupKey, BTreeMap<String, i64>>,
    statuses: &BTreeSet<String>,
) -> Result<DataFrame> {
    let height = groups.len();
    let mut dates = Vec::with_capacity(height);
    let mut keys: [Vec<Option<String>>; 5] = Default::default();
    let mut counts: Vec<Vec<Option<i64>>> = vec![Vec::with_capacity(height); statuses.len()];
    let mut totals = Vec::with_capacity(height);

    for ((date, district, block, phc, doctor, specialization), by_status) in groups {
        dates.push(Some(*date));
        for (slot, value) in keys
            .iter_mut()
            .zip([district, block, phc, doctor, specialization])
        {
            slot.push(Some(value.clone()));
        }
        let mut total = 0;
        for (slot, status) in counts.iter_mut().zip(statuses) {
            let count = by_status.get(status).copied().unwrap_or(0);
            total += count;
            slot.push(Some(count));
        }
        totals.push(Some(total));
    }

    let [district, block, phc, doctor, specialization] = keys;
    let mut builder = FrameBuilder::new(height)
        .with(DATE, ColumnValues::Date(dates))
        .with(DISTRICT_NAME, ColumnValues::Str(district))
        .with(BLOCK_NAME, ColumnValues::Str(block))
        .with(PHC_NAME, ColumnValues::Str(phc))
        .with(DOCTOR, ColumnValues::Str(doctor))
        .with(SPECIALIZATION, ColumnValues::Str(specialization));
    for (status, values) in statuses.iter().zip(counts) {
        builder.set(status.as_str(), ColumnValues::Int(values));
    }
    builder.set(COUNT_APPOINTMENTS, ColumnValues::Int(totals));
    builder.build()
}
