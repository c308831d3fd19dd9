//! Source export ingestion for the PHC warehouse.
//!
//! Locates the CSV and spreadsheet exports under each source directory and
//! loads them into text-typed Polars DataFrames, one frame per fact kind.
//!
//! ```ignore
//! use std::path::Path;
//! use phc_ingest::read_source;
//!
//! let appointments = read_source(Path::new("Raw/Appointment Reports"))?;
//! ```

mod discovery;
mod error;
mod reader;
mod workbook;

// === Error Types ===
pub use error::{IngestError, Result};

// === File Discovery ===
pub use discovery::{
    SourceFile, SourceFormat, describe_source_files, is_source_file, list_source_files,
};

// === Reading ===
pub use reader::{concat_union, read_source, read_source_file};
