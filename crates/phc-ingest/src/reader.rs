//! Loading for source exports (CSV or spreadsheet).
//!
//! Every column is read as text. Interpreting dates, times and numbers is
//! the preprocessors' job, so a malformed cell never fails ingestion.

use std::path::{Path, PathBuf};
use std::time::Instant;

use phc_model::columns::WORKBOOK_NAME;
use polars::prelude::*;
use tracing::{debug, info};

use crate::discovery::{SourceFormat, list_source_files};
use crate::error::{IngestError, Result};
use crate::workbook::read_workbook_file;

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').trim().to_string()
}

/// Reads one CSV or spreadsheet export into a text-typed DataFrame.
///
/// Column names are trimmed and a `WorkbookName` column holding the source
/// path is appended.
pub fn read_source_file(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(IngestError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut df = match SourceFormat::from_path(path) {
        Some(SourceFormat::Csv) => read_csv_file(path)?,
        Some(SourceFormat::Workbook) => read_workbook_file(path)?,
        None => {
            return Err(IngestError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| normalize_header(name.as_str()))
        .collect();
    df.set_column_names(names)?;

    let source = path.display().to_string();
    let provenance = Series::new(WORKBOOK_NAME.into(), vec![source; df.height()]);
    df.with_column(provenance)?;

    debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "read source file"
    );
    Ok(df)
}

fn read_csv_file(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Reads a single export, or every export under a directory.
///
/// Directory contents are concatenated row-wise in sorted path order. The
/// result carries the union of all columns; a file without a column
/// contributes nulls for it.
pub fn read_source(location: &Path) -> Result<DataFrame> {
    if location.is_file() {
        return read_source_file(location);
    }
    if !location.is_dir() {
        return Err(IngestError::SourceNotFound {
            path: location.to_path_buf(),
        });
    }

    let start = Instant::now();
    let files = list_source_files(location)?;
    if files.is_empty() {
        return Err(IngestError::NoSourceFiles {
            path: location.to_path_buf(),
        });
    }
    let frames = files
        .iter()
        .map(PathBuf::as_path)
        .map(read_source_file)
        .collect::<Result<Vec<_>>>()?;
    let combined = concat_union(frames)?;

    info!(
        path = %location.display(),
        files = files.len(),
        rows = combined.height(),
        duration_ms = start.elapsed().as_millis(),
        "source loaded"
    );
    Ok(combined)
}

/// Row-wise concatenation over the union of columns, in first-seen order.
pub fn concat_union(frames: Vec<DataFrame>) -> Result<DataFrame> {
    let mut names: Vec<String> = Vec::new();
    for df in &frames {
        for name in df.get_column_names() {
            if !names.iter().any(|known| known == name.as_str()) {
                names.push(name.to_string());
            }
        }
    }

    let mut combined: Option<DataFrame> = None;
    for mut df in frames {
        for name in &names {
            if df.get_column_index(name).is_none() {
                let nulls = Series::new(name.as_str().into(), vec![None::<String>; df.height()]);
                df.with_column(nulls)?;
            }
        }
        let aligned = df.select(names.iter().map(String::as_str))?;
        if let Some(existing) = combined.as_mut() {
            existing.vstack_mut(&aligned)?;
        } else {
            combined = Some(aligned);
        }
    }
    Ok(combined.unwrap_or_default())
}
