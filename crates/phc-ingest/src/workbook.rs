//! Spreadsheet loading for `.xlsx` / `.xls` exports.
//!
//! The first sheet is read with its first row as the header. Cells become
//! text the way the CSV exports spell them, so both sources feed the same
//! preprocessors.

use std::path::Path;

use calamine::{Data, ExcelDateTime, Range, Reader, open_workbook_auto};
use chrono::NaiveTime;
use polars::prelude::*;
use tracing::debug;

use crate::error::{IngestError, Result};

const DATE_TEXT: &str = "%d-%m-%Y";
const TIME_TEXT: &str = "%H:%M:%S";
const TIMESTAMP_TEXT: &str = "%d-%m-%Y %I:%M:%S %p";

/// Reads the first sheet of a workbook into a text-typed DataFrame.
pub(crate) fn read_workbook_file(path: &Path) -> Result<DataFrame> {
    let workbook_error = |e: calamine::Error| IngestError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut workbook = open_workbook_auto(path).map_err(workbook_error)?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| IngestError::NoSheets {
            path: path.to_path_buf(),
        })?;
    let range = workbook.worksheet_range(&sheet).map_err(workbook_error)?;

    let df = range_to_frame(&range)?;
    debug!(
        path = %path.display(),
        sheet = %sheet,
        rows = df.height(),
        columns = df.width(),
        "read workbook sheet"
    );
    Ok(df)
}

/// Header row plus text columns. A range without cells is an empty frame.
pub(crate) fn range_to_frame(range: &Range<Data>) -> Result<DataFrame> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(DataFrame::empty());
    };
    let names = header_names(header);

    let mut columns: Vec<Vec<Option<String>>> =
        vec![Vec::with_capacity(range.height().saturating_sub(1)); names.len()];
    for row in rows {
        for (values, cell) in columns.iter_mut().zip(row) {
            values.push(cell_text(cell));
        }
    }

    let cols: Vec<Column> = names
        .into_iter()
        .zip(columns)
        .map(|(name, values)| Series::new(name.into(), values).into_column())
        .collect();
    Ok(DataFrame::new(cols)?)
}

/// Blank headers become `Unnamed: <index>`; repeats get `_duplicated_<n>`.
fn header_names(header: &[Data]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(header.len());
    for (idx, cell) in header.iter().enumerate() {
        let base = cell_text(cell)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| format!("Unnamed: {idx}"));
        let mut name = base.clone();
        let mut n = 0;
        while names.contains(&name) {
            name = format!("{base}_duplicated_{n}");
            n += 1;
        }
        names.push(name);
    }
    names
}

/// Cell as export text. Empty and error cells are null.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::DateTime(value) => Some(datetime_text(value)),
        other => Some(other.to_string()),
    }
}

/// Serial values below one day are times of day; whole days are dates.
fn datetime_text(value: &ExcelDateTime) -> String {
    match value.as_datetime() {
        Some(datetime) if value.as_f64() < 1.0 => datetime.format(TIME_TEXT).to_string(),
        Some(datetime) if datetime.time() == NaiveTime::MIN => {
            datetime.format(DATE_TEXT).to_string()
        }
        Some(datetime) => datetime.format(TIMESTAMP_TEXT).to_string(),
        None => value.as_f64().to_string(),
    }
}
