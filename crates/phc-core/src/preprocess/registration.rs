//! Patient registration export: one row per registered patient, aggregated
//! into hourly counts per facility, gender and age group.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use phc_model::columns::{
    AGE_GROUP, BLOCK_NAME, COUNT_PATIENT_REGISTERED, DATE, DISTRICT_NAME, GENDER, HOUR, PHC_NAME,
};
use phc_model::{FactKind, QualityReport, WarehouseConfig};
use polars::prelude::DataFrame;

use super::{FactPreprocessor, RowFilter, all_present, ensure_any_parsed};
use crate::age::{AgeBands, UNKNOWN_AGE_GROUP, parse_age_year_substring};
use crate::datetime::{REGISTRATION_TIMESTAMP_FORMAT, hour_bucket, parse_registration_timestamp};
use crate::error::Result;
use crate::frame::FactFrame;
use crate::frame_builder::{ColumnValues, FrameBuilder};
use crate::table::TextTable;

pub const AGE: &str = "Age";
pub const REGISTRATION_DATE: &str = "Registration Date";
pub const DISTRICT: &str = "District";
pub const BLOCK: &str = "Block";
pub const PHC: &str = "PHC";
pub const PATIENT_NAME: &str = "Patient Name";

const REQUIRED: &[&str] = &[
    AGE,
    REGISTRATION_DATE,
    DISTRICT,
    BLOCK,
    PHC,
    GENDER,
    PATIENT_NAME,
];

/// (date, district, block, phc, gender, age group, hour)
type GroupKey = (NaiveDate, String, String, String, String, String, String);

#[derive(Debug, Clone)]
struct Registration {
    age_group: Option<String>,
    registered_at: Option<NaiveDateTime>,
}

pub struct PatientRegistrationPreprocessor;

impl FactPreprocessor for PatientRegistrationPreprocessor {
    fn kind(&self) -> FactKind {
        FactKind::PatientRegistration
    }

    fn required_columns(&self) -> &'static [&'static str] {
        REQUIRED
    }

    fn description(&self) -> &'static str {
        "Counts registrations per facility, gender, age group and hour"
    }

    fn preprocess(&self, raw: &DataFrame, config: &WarehouseConfig) -> Result<FactFrame> {
        let kind = self.kind();
        let dataset = kind.as_str();
        let mut table = TextTable::from_frame(raw)?;
        table.require(dataset, self.required_columns())?;

        let bands = AgeBands::from_config(&config.age_bands);
        let ages = table.required(dataset, AGE)?;
        let timestamps = table.required(dataset, REGISTRATION_DATE)?;
        let mut rows: Vec<Registration> = ages
            .iter()
            .zip(timestamps)
            .map(|(age, timestamp)| Registration {
                age_group: age
                    .as_deref()
                    .and_then(parse_age_year_substring)
                    .map(|years| bands.categorize(years).to_string()),
                registered_at: timestamp.as_deref().and_then(parse_registration_timestamp),
            })
            .collect();
        let parsed: Vec<_> = rows.iter().map(|r| r.registered_at).collect();
        ensure_any_parsed(
            kind,
            REGISTRATION_DATE,
            timestamps,
            &parsed,
            REGISTRATION_TIMESTAMP_FORMAT,
        )?;
        let parsed_ages: Vec<_> = rows.iter().map(|r| r.age_group.as_deref()).collect();
        ensure_any_parsed(kind, AGE, ages, &parsed_ages, "<number> Years")?;

        let mut quality = QualityReport::new();
        let mut filter = RowFilter {
            kind,
            quality: &mut quality,
        };

        let keep: Vec<bool> = rows.iter().map(|r| r.age_group.is_some()).collect();
        filter.apply(&mut table, &mut rows, &keep, "age", "unparseable age");
        let keep: Vec<bool> = rows
            .iter()
            .map(|r| r.age_group.as_deref() != Some(UNKNOWN_AGE_GROUP))
            .collect();
        filter.apply(
            &mut table,
            &mut rows,
            &keep,
            "age_group",
            "unknown age group",
        );
        let keep: Vec<bool> = rows.iter().map(|r| r.registered_at.is_some()).collect();
        filter.apply(
            &mut table,
            &mut rows,
            &keep,
            "registration_date",
            "unparseable registration date",
        );
        filter.missing_facility(&mut table, &mut rows, PHC);

        let keep = all_present(
            &[
                table.required(dataset, DISTRICT)?,
                table.required(dataset, BLOCK)?,
                table.required(dataset, GENDER)?,
            ],
            table.height(),
        );
        filter.apply(
            &mut table,
            &mut rows,
            &keep,
            "group_key",
            "missing geography or gender",
        );

        let mut groups: BTreeMap<GroupKey, i64> = BTreeMap::new();
        for (row, registration) in rows.iter().enumerate() {
            let (Some(at), Some(age_group)) =
                (registration.registered_at, registration.age_group.clone())
            else {
                continue;
            };
            let text = |column: &str| table.value(column, row).unwrap_or_default().to_string();
            let key = (
                at.date(),
                text(DISTRICT),
                text(BLOCK),
                text(PHC),
                text(GENDER),
                age_group,
                hour_bucket(at.hour()),
            );
            let named = i64::from(table.value(PATIENT_NAME, row).is_some());
            *groups.entry(key).or_insert(0) += named;
        }

        Ok(FactFrame::new(kind, aggregate(groups)?).with_quality(quality))
    }
}

fn aggregate(groups: BTreeMap<GroupKey, i64>) -> Result<DataFrame> {
    let height = groups.len();
    let mut dates = Vec::with_capacity(height);
    let mut keys: [Vec<Option<String>>; 6] = Default::default();
    let mut counts = Vec::with_capacity(height);
    for ((date, district, block, phc, gender, age_group, hour), count) in groups {
        dates.push(Some(date));
        for (slot, value) in keys
            .iter_mut()
            .zip([district, block, phc, gender, age_group, hour])
        {
            slot.push(Some(value));
        }
        counts.push(Some(count));
    }
    let [district, block, phc, gender, age_group, hour] = keys;
    FrameBuilder::new(height)
        .with(DATE, ColumnValues::Date(dates))
        .with(DISTRICT_NAME, ColumnValues::Str(district))
        .with(BLOCK_NAME, ColumnValues::Str(block))
        .with(PHC_NAME, ColumnValues::Str(phc))
        .with(GENDER, ColumnValues::Str(gender))
        .with(AGE_GROUP, ColumnValues::Str(age_group))
        .with(HOUR, ColumnValues::Str(hour))
        .with(COUNT_PATIENT_REGISTERED, ColumnValues::Int(counts))
        .build()
}
