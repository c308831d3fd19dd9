//! Table and report writers.

use std::fs::File;
use std::path::{Path, PathBuf};

use polars::prelude::{CsvWriter, DataFrame, ParquetWriter, SerWriter};
use serde::Serialize;
use tracing::debug;

use crate::error::{OutputError, Result};
use crate::format::OutputFormat;

/// File name of the data-quality report.
pub const QUALITY_REPORT_FILE: &str = "quality_report.json";

/// Creates the output directory if needed.
pub fn ensure_output_dir(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| OutputError::CreateDir {
        path: dir.to_path_buf(),
        source: e,
    })?;
    Ok(dir.to_path_buf())
}

/// Path a table named `name` is written to.
pub fn table_path(dir: &Path, name: &str, format: OutputFormat) -> PathBuf {
    dir.join(format!("{name}.{}", format.extension()))
}

/// Writes one table as `<dir>/<name>.<ext>` and returns the path.
pub fn write_table(
    df: &DataFrame,
    dir: &Path,
    name: &str,
    format: OutputFormat,
) -> Result<PathBuf> {
    let dir = ensure_output_dir(dir)?;
    let path = table_path(&dir, name, format);
    let mut file = File::create(&path).map_err(|e| OutputError::Write {
        path: path.clone(),
        source: e,
    })?;
    let encode_error = |e: polars::prelude::PolarsError| OutputError::Encode {
        path: path.clone(),
        message: e.to_string(),
    };

    let mut data = df.clone();
    match format {
        OutputFormat::Parquet => {
            ParquetWriter::new(&mut file)
                .finish(&mut data)
                .map_err(encode_error)?;
        }
        OutputFormat::Csv => {
            CsvWriter::new(&mut file)
                .include_header(true)
                .finish(&mut data)
                .map_err(encode_error)?;
        }
    }

    debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        format = %format,
        "table written"
    );
    Ok(path)
}

/// Writes each named table, in order.
pub fn write_tables(
    dir: &Path,
    tables: &[(&str, &DataFrame)],
    format: OutputFormat,
) -> Result<Vec<PathBuf>> {
    tables
        .iter()
        .map(|(name, df)| write_table(df, dir, name, format))
        .collect()
}

/// Writes a report as pretty-printed JSON.
pub fn write_quality_report<T: Serialize>(report: &T, path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_output_dir(parent)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).map_err(|e| OutputError::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(path = %path.display(), "quality report written");
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_path_uses_format_extension() {
        let dir = Path::new("/out");
        assert_eq!(
            table_path(dir, "Processed_Dim_PHC", OutputFormat::Csv),
            PathBuf::from("/out/Processed_Dim_PHC.csv")
        );
        assert_eq!(
            table_path(dir, "Processed_Dim_PHC", OutputFormat::Parquet),
            PathBuf::from("/out/Processed_Dim_PHC.parquet")
        );
    }
}
