//! End-to-end warehouse build over the pipeline stages.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use phc_core::{Dimensions, FactFrame};
use phc_model::WarehouseConfig;
use phc_output::OutputFormat;

use crate::pipeline::{
    OutputConfig, WrittenOutputs, anonymize, build_dimensions, collect_quality, diagnose, ingest,
    output, preprocess, transform,
};
use crate::types::{BuildResult, RunReport, TableDiagnostic, TableRole, TableSummary};

/// Name of the output folder created next to the raw export folder.
pub const DEFAULT_OUTPUT_FOLDER: &str = "Processed";

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub raw_dir: PathBuf,
    /// Defaults to [`default_output_dir`] of `raw_dir`.
    pub output_dir: Option<PathBuf>,
    pub format: OutputFormat,
    pub config: WarehouseConfig,
    pub dry_run: bool,
    pub anonymize: bool,
}

impl BuildOptions {
    pub fn new(raw_dir: impl Into<PathBuf>, config: WarehouseConfig) -> Self {
        Self {
            raw_dir: raw_dir.into(),
            output_dir: None,
            format: OutputFormat::default(),
            config,
            dry_run: false,
            anonymize: true,
        }
    }
}

/// `<RAW_DIR>/../Processed`.
pub fn default_output_dir(raw_dir: &Path) -> PathBuf {
    match raw_dir.parent() {
        Some(parent) => parent.join(DEFAULT_OUTPUT_FOLDER),
        None => PathBuf::from(DEFAULT_OUTPUT_FOLDER),
    }
}

/// Runs every stage. Nothing is written unless all stages before output
/// succeed.
pub fn build_warehouse(options: &BuildOptions) -> Result<BuildResult> {
    let raw_dir = &options.raw_dir;
    let span = info_span!("build", raw_dir = %raw_dir.display());
    let _guard = span.enter();
    let start = Instant::now();

    let config = &options.config;
    config.validate().context("invalid configuration")?;
    let output_dir = options
        .output_dir
        .clone()
        .unwrap_or_else(|| default_output_dir(raw_dir));

    let raw = ingest(raw_dir, &config.sources)?;
    let preprocessed = preprocess(&raw, config)?;
    let mut dimensions = build_dimensions(&preprocessed, config)?;
    let facts = transform(&preprocessed, &dimensions)?;
    let missing_keys = diagnose(&facts);
    if options.anonymize {
        anonymize(&mut dimensions, config.display_name_width)?;
    }
    let report = RunReport {
        quality: collect_quality(&facts, &dimensions),
        missing_keys,
    };

    let written = if options.dry_run {
        info!(output_dir = %output_dir.display(), "dry run, no files written");
        WrittenOutputs::default()
    } else {
        output(
            &OutputConfig {
                output_dir: &output_dir,
                format: options.format,
            },
            &facts,
            &dimensions,
            &report,
        )?
    };

    let tables = summarize(&facts, &dimensions, &report.missing_keys, &written);
    info!(
        tables = tables.len(),
        excluded_rows = report.quality.excluded_rows(),
        duration_ms = start.elapsed().as_millis(),
        "build complete"
    );
    Ok(BuildResult {
        raw_dir: raw_dir.clone(),
        output_dir,
        dry_run: options.dry_run,
        tables,
        quality_report: written.quality_report.clone(),
        report,
    })
}

fn summarize(
    facts: &[FactFrame],
    dimensions: &Dimensions,
    missing_keys: &[TableDiagnostic],
    written: &WrittenOutputs,
) -> Vec<TableSummary> {
    let mut tables = Vec::new();
    for fact in facts {
        let name = fact.kind.output_name();
        let unmatched = missing_keys
            .iter()
            .find(|diagnostic| diagnostic.table == name)
            .map(|diagnostic| diagnostic.keys.iter().map(|key| key.unmatched).sum::<usize>());
        tables.push(TableSummary {
            name: name.to_string(),
            role: TableRole::Fact,
            rows: fact.data.height(),
            columns: fact.data.width(),
            unmatched_keys: unmatched,
            output: written.path_for(name).cloned(),
        });
    }
    for dimension in dimensions.iter() {
        let name = dimension.kind.output_name();
        tables.push(TableSummary {
            name: name.to_string(),
            role: TableRole::Dimension,
            rows: dimension.data.height(),
            columns: dimension.data.width(),
            unmatched_keys: None,
            output: written.path_for(name).cloned(),
        });
    }
    tables
}
