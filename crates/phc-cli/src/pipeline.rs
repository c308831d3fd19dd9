//! Warehouse build pipeline with explicit stages.
//!
//! The stages run in order:
//! 1. **Ingest**: read every export folder into a text DataFrame
//! 2. **Preprocess**: turn each raw table into a preprocessed fact
//! 3. **Dimensions**: derive Facility, Doctor and Date from all facts
//! 4. **Transform**: replace descriptive fact columns with surrogate keys
//! 5. **Diagnostics**: count fact rows whose keys stayed null
//! 6. **Anonymise**: replace PHC and doctor names in the dimensions
//! 7. **Output**: write tables and the quality report
//!
//! Dimensions need every preprocessed fact, so stage 3 only starts after
//! stage 2 has finished for all four exports.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use polars::prelude::{DataFrame, NamedFrom, Series};
use tracing::{debug, info, info_span, trace};

use phc_core::data_utils::{column_i64, column_strings};
use phc_core::{
    Dimensions, FactFrame, check_missing_keys, default_registry, generate_dimensions,
    key_columns_for, transform_fact,
};
use phc_ingest::read_source;
use phc_model::columns::{DOCTOR, DOCTOR_ID, PHC_ID, PHC_NAME};
use phc_model::{FactKind, QualityReport, SourceDirs, WarehouseConfig};
use phc_output::{OutputFormat, QUALITY_REPORT_FILE, write_quality_report, write_table};

use crate::logging::redact_value;
use crate::types::{RunReport, TableDiagnostic};

// ============================================================================
// Stage 1: Ingest
// ============================================================================

/// Reads each export folder under `raw_dir`, in [`FactKind::ALL`] order.
pub fn ingest(raw_dir: &Path, sources: &SourceDirs) -> Result<Vec<(FactKind, DataFrame)>> {
    let mut tables = Vec::with_capacity(FactKind::ALL.len());
    for kind in FactKind::ALL {
        let location = raw_dir.join(sources.dir_for(kind));
        let span = info_span!("ingest", fact = %kind, source = %location.display());
        let df = span
            .in_scope(|| read_source(&location))
            .with_context(|| format!("read {kind} exports from {}", location.display()))?;
        info!(fact = %kind, rows = df.height(), columns = df.width(), "source ingested");
        tables.push((kind, df));
    }
    Ok(tables)
}

// ============================================================================
// Stage 2: Preprocess
// ============================================================================

pub fn preprocess(
    raw: &[(FactKind, DataFrame)],
    config: &WarehouseConfig,
) -> Result<Vec<FactFrame>> {
    default_registry()
        .preprocess_all(raw, config)
        .context("preprocess fact tables")
}

// ============================================================================
// Stage 3: Dimensions
// ============================================================================

pub fn build_dimensions(facts: &[FactFrame], config: &WarehouseConfig) -> Result<Dimensions> {
    let span = info_span!("dimensions", facts = facts.len());
    let _guard = span.enter();
    let start = Instant::now();

    let dimensions = generate_dimensions(facts, config).context("generate dimensions")?;
    for dimension in dimensions.iter() {
        info!(
            dimension = %dimension.kind,
            rows = dimension.record_count(),
            "dimension generated"
        );
    }
    debug!(
        duration_ms = start.elapsed().as_millis(),
        "dimension generation complete"
    );
    Ok(dimensions)
}

// ============================================================================
// Stage 4: Transform
// ============================================================================

pub fn transform(facts: &[FactFrame], dimensions: &Dimensions) -> Result<Vec<FactFrame>> {
    facts
        .iter()
        .map(|fact| {
            transform_fact(fact, dimensions)
                .with_context(|| format!("transform {} fact table", fact.kind))
        })
        .collect()
}

// ============================================================================
// Stage 5: Diagnostics
// ============================================================================

/// Missing-key counts for every final fact table. Never fails.
pub fn diagnose(facts: &[FactFrame]) -> Vec<TableDiagnostic> {
    let span = info_span!("diagnostics");
    let _guard = span.enter();
    facts
        .iter()
        .map(|fact| TableDiagnostic {
            table: fact.kind.output_name().to_string(),
            keys: check_missing_keys(&fact.data, key_columns_for(fact.kind)),
        })
        .collect()
}

// ============================================================================
// Stage 6: Anonymise
// ============================================================================

/// Synthetic display name, e.g. `display_name("PHC", 7, 2)` is `"PHC 07"`.
pub fn display_name(prefix: &str, id: i64, width: usize) -> String {
    format!("{prefix} {id:0width$}")
}

/// Replaces `PHCName` and `Doctor` in the dimensions with names derived from
/// their surrogate keys.
pub fn anonymize(dimensions: &mut Dimensions, width: usize) -> Result<()> {
    let span = info_span!("anonymise");
    let _guard = span.enter();
    replace_names(&mut dimensions.facility.data, PHC_NAME, PHC_ID, "PHC", width)
        .context("anonymise facility names")?;
    replace_names(&mut dimensions.doctor.data, DOCTOR, DOCTOR_ID, "Doctor", width)
        .context("anonymise doctor names")?;
    Ok(())
}

fn replace_names(
    df: &mut DataFrame,
    name_column: &str,
    id_column: &str,
    prefix: &str,
    width: usize,
) -> Result<()> {
    let ids = column_i64(df, id_column)?;
    let originals = column_strings(df, name_column)?;
    let names: Vec<Option<String>> = ids
        .iter()
        .map(|id| id.map(|id| display_name(prefix, id, width)))
        .collect();
    for (original, name) in originals.iter().zip(&names) {
        trace!(
            column = name_column,
            original = redact_value(original.as_deref().unwrap_or_default()),
            replacement = ?name,
            "display name replaced"
        );
    }
    df.with_column(Series::new(name_column.into(), names))?;
    Ok(())
}

// ============================================================================
// Stage 7: Output
// ============================================================================

#[derive(Debug, Clone)]
pub struct OutputConfig<'a> {
    pub output_dir: &'a Path,
    pub format: OutputFormat,
}

#[derive(Debug, Default)]
pub struct WrittenOutputs {
    /// (table name, path) in write order.
    pub tables: Vec<(String, PathBuf)>,
    pub quality_report: Option<PathBuf>,
}

impl WrittenOutputs {
    pub fn path_for(&self, name: &str) -> Option<&PathBuf> {
        self.tables
            .iter()
            .find(|(table, _)| table == name)
            .map(|(_, path)| path)
    }
}

/// Writes the four fact tables, the three dimensions and the quality report.
pub fn output(
    config: &OutputConfig<'_>,
    facts: &[FactFrame],
    dimensions: &Dimensions,
    report: &RunReport,
) -> Result<WrittenOutputs> {
    let span = info_span!("output", dir = %config.output_dir.display(), format = %config.format);
    let _guard = span.enter();
    let start = Instant::now();

    let mut written = WrittenOutputs::default();
    let tables = facts
        .iter()
        .map(|fact| (fact.kind.output_name(), &fact.data))
        .chain(
            dimensions
                .iter()
                .map(|dimension| (dimension.kind.output_name(), &dimension.data)),
        );
    for (name, data) in tables {
        let path = write_table(data, config.output_dir, name, config.format)
            .with_context(|| format!("write {name}"))?;
        written.tables.push((name.to_string(), path));
    }
    let report_path = config.output_dir.join(QUALITY_REPORT_FILE);
    written.quality_report =
        Some(write_quality_report(report, &report_path).context("write quality report")?);

    info!(
        tables = written.tables.len(),
        duration_ms = start.elapsed().as_millis(),
        "outputs written"
    );
    Ok(written)
}

/// Merges quality entries from every fact and dimension.
pub fn collect_quality(facts: &[FactFrame], dimensions: &Dimensions) -> QualityReport {
    let mut quality = QualityReport::new();
    for fact in facts {
        quality.extend(fact.quality.clone());
    }
    quality.extend(dimensions.quality());
    quality
}
