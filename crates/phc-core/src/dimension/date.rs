//! Date dimension: every calendar day between the earliest and latest
//! observed fact date, inclusive.

use chrono::{Datelike, NaiveDate};
use phc_model::columns::{
    DATE, DATE_ID, DAY, DAY_NAME, MONTH, MONTH_NAME, MONTH_YEAR, QUARTER, WEEK, WEEKDAY, YEAR,
    YEAR_MONTH, YEAR_MONTH_NAME,
};
use phc_model::{DimensionKind, QualityReport};
use polars::prelude::DataFrame;
use tracing::{debug, warn};

use super::validate_inputs;
use crate::data_utils::{column_dates, column_strings};
use crate::datetime::date_id;
use crate::error::{Result, WarehouseError};
use crate::frame::DimensionFrame;
use crate::frame_builder::{ColumnValues, FrameBuilder};

pub fn generate_date(inputs: &[&DataFrame]) -> Result<DimensionFrame> {
    let kind = DimensionKind::Date;
    validate_inputs(kind, inputs, &[DATE])?;

    let mut quality = QualityReport::new();
    let mut range: Option<(NaiveDate, NaiveDate)> = None;
    let mut unparseable = 0;
    for df in inputs {
        let raw = column_strings(df, DATE)?;
        let dates = column_dates(df, DATE)?;
        for (text, date) in raw.iter().zip(dates) {
            match date {
                Some(date) => {
                    range = Some(match range {
                        Some((lo, hi)) => (lo.min(date), hi.max(date)),
                        None => (date, date),
                    });
                }
                None if text.is_some() => unparseable += 1,
                None => {}
            }
        }
    }
    if unparseable > 0 {
        warn!(dimension = %kind, unparseable, "dropping unparseable dates");
    }
    quality.record_exclusion(kind.as_str(), "date_parse", "unparseable date", unparseable);

    let (start, end) = range.ok_or_else(|| WarehouseError::Validation {
        message: "no parseable date in any input".to_string(),
    })?;
    let days: Vec<NaiveDate> = start.iter_days().take_while(|day| *day <= end).collect();
    debug!(dimension = %kind, %start, %end, rows = days.len(), "dimension generated");
    Ok(DimensionFrame::new(kind, calendar(&days)?).with_quality(quality))
}

fn calendar(days: &[NaiveDate]) -> Result<DataFrame> {
    let int = |f: fn(&NaiveDate) -> i32| -> ColumnValues {
        ColumnValues::Int32(days.iter().map(|day| Some(f(day))).collect())
    };
    let text = |pattern: &str| -> ColumnValues {
        ColumnValues::Str(
            days.iter()
                .map(|day| Some(day.format(pattern).to_string()))
                .collect(),
        )
    };
    FrameBuilder::new(days.len())
        .with(DATE, ColumnValues::Date(days.iter().copied().map(Some).collect()))
        .with(YEAR, int(|day| day.year()))
        .with(MONTH, int(|day| calendar_number(day.month())))
        .with(MONTH_NAME, text("%B"))
        .with(DAY, int(|day| calendar_number(day.day())))
        .with(DAY_NAME, text("%A"))
        .with(WEEK, int(|day| calendar_number(day.iso_week().week())))
        .with(WEEKDAY, text("%A"))
        .with(QUARTER, int(|day| calendar_number(day.month0() / 3 + 1)))
        .with(YEAR_MONTH, text("%Y-%m"))
        .with(YEAR_MONTH_NAME, text("%Y - %B"))
        .with(
            DATE_ID,
            ColumnValues::Int(days.iter().map(|day| Some(date_id(*day))).collect()),
        )
        .with(MONTH_YEAR, text("%b %Y"))
        .build()
}

fn calendar_number(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
