use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::Table;
use tracing::info;

use phc_cli::build::{BuildOptions, build_warehouse};
use phc_cli::types::BuildResult;
use phc_ingest::describe_source_files;
use phc_model::{FactKind, WarehouseConfig};
use phc_output::OutputFormat;

use crate::cli::{BuildArgs, OutputFormatArg, SourcesArgs};
use crate::summary::apply_table_style;

/// Loads the deployment configuration, or the built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<WarehouseConfig> {
    match path {
        Some(path) => {
            let config = WarehouseConfig::load(path)
                .with_context(|| format!("load configuration from {}", path.display()))?;
            info!(path = %path.display(), "configuration loaded");
            Ok(config)
        }
        None => Ok(WarehouseConfig::default()),
    }
}

pub fn run_build(args: &BuildArgs) -> Result<BuildResult> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config.doctor.seed = Some(seed);
    }
    let mut options = BuildOptions::new(&args.raw_dir, config);
    options.output_dir = args.output_dir.clone();
    options.format = match args.format {
        OutputFormatArg::Parquet => OutputFormat::Parquet,
        OutputFormatArg::Csv => OutputFormat::Csv,
    };
    options.dry_run = args.dry_run;
    options.anonymize = !args.no_anonymize;
    build_warehouse(&options)
}

pub fn run_sources(args: &SourcesArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let mut table = Table::new();
    match &args.raw_dir {
        None => {
            table.set_header(vec!["Fact", "Folder"]);
            apply_table_style(&mut table);
            for kind in FactKind::ALL {
                table.add_row(vec![kind.to_string(), config.sources.dir_for(kind).to_string()]);
            }
        }
        Some(raw_dir) => {
            table.set_header(vec!["Fact", "Folder", "Files", "Size"]);
            apply_table_style(&mut table);
            for kind in FactKind::ALL {
                let folder = config.sources.dir_for(kind);
                let location = raw_dir.join(folder);
                let (files, size) = if location.is_dir() {
                    let files = describe_source_files(&location)
                        .with_context(|| format!("list {}", location.display()))?;
                    let size: u64 = files.iter().map(|file| file.size_bytes).sum();
                    (files.len().to_string(), format_size(size))
                } else {
                    ("missing".to_string(), "-".to_string())
                };
                table.add_row(vec![kind.to_string(), folder.to_string(), files, size]);
            }
        }
    }
    println!("{table}");
    Ok(())
}

fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}
