use std::path::PathBuf;

use phc_core::MissingKeyCount;
use phc_model::QualityReport;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableRole {
    Fact,
    Dimension,
}

#[derive(Debug, Clone)]
pub struct TableSummary {
    /// Output table name, e.g. `Processed_Appointment`.
    pub name: String,
    pub role: TableRole,
    pub rows: usize,
    pub columns: usize,
    /// Null foreign keys summed over the key columns. `None` for dimensions.
    pub unmatched_keys: Option<usize>,
    pub output: Option<PathBuf>,
}

/// Missing-key diagnostic for one final fact table.
#[derive(Debug, Clone, Serialize)]
pub struct TableDiagnostic {
    pub table: String,
    pub keys: Vec<MissingKeyCount>,
}

/// Content of `quality_report.json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub quality: QualityReport,
    pub missing_keys: Vec<TableDiagnostic>,
}

#[derive(Debug)]
pub struct BuildResult {
    pub raw_dir: PathBuf,
    pub output_dir: PathBuf,
    pub dry_run: bool,
    pub tables: Vec<TableSummary>,
    pub report: RunReport,
    pub quality_report: Option<PathBuf>,
}

/// Process exit code for a successful build whose fact keys stayed unmatched
/// under `--fail-on-unmatched`.
pub const EXIT_UNMATCHED_KEYS: i32 = 2;

impl BuildResult {
    pub fn total_unmatched(&self) -> usize {
        self.tables
            .iter()
            .filter_map(|table| table.unmatched_keys)
            .sum()
    }

    pub fn exit_code(&self, fail_on_unmatched: bool) -> i32 {
        if fail_on_unmatched && self.total_unmatched() > 0 {
            EXIT_UNMATCHED_KEYS
        } else {
            0
        }
    }
}
