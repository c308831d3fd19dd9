//! Persistence for the PHC warehouse.
//!
//! Final fact tables and dimensions are written as Parquet (the default) or
//! CSV, one file per table, next to a JSON data-quality report.

mod error;
mod format;
mod writer;

pub use error::{OutputError, Result};
pub use format::OutputFormat;
pub use writer::{
    QUALITY_REPORT_FILE, ensure_output_dir, table_path, write_quality_report, write_table,
    write_tables,
};
