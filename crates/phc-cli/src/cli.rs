//! CLI argument definitions for the warehouse builder.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "phc-warehouse",
    version,
    about = "Build the PHC star-schema warehouse from raw telemedicine exports",
    long_about = "Build the PHC star-schema warehouse from raw telemedicine exports.\n\n\
                  Reads the Appointment, Patient Registration, Consultation and PHC Login\n\
                  exports, derives the Facility, Doctor and Date dimensions, and writes\n\
                  keyed fact tables as Parquet or CSV."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow patient-identifying values in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build the warehouse from a raw export folder.
    Build(BuildArgs),

    /// List the source folders a raw export folder is expected to contain.
    Sources(SourcesArgs),
}

#[derive(Parser)]
pub struct BuildArgs {
    /// Folder holding one sub-folder per source export.
    #[arg(value_name = "RAW_DIR")]
    pub raw_dir: PathBuf,

    /// Output directory for warehouse tables (default: <RAW_DIR>/../Processed).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Table file format.
    #[arg(long = "format", value_enum, default_value = "parquet")]
    pub format: OutputFormatArg,

    /// Deployment configuration (TOML). Built-in defaults apply when omitted.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Seed for doctor hub assignment (overrides the configuration).
    #[arg(long = "seed", value_name = "N")]
    pub seed: Option<u64>,

    /// Run every stage and report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Keep real PHC and doctor names in the dimension tables.
    #[arg(long = "no-anonymize")]
    pub no_anonymize: bool,

    /// Exit with status 2 when any fact row has a null foreign key.
    #[arg(long = "fail-on-unmatched")]
    pub fail_on_unmatched: bool,
}

#[derive(Parser)]
pub struct SourcesArgs {
    /// Raw export folder to inspect. Without it, only the expected folder
    /// names are listed.
    #[arg(value_name = "RAW_DIR")]
    pub raw_dir: Option<PathBuf>,

    /// Deployment configuration (TOML).
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormatArg {
    Parquet,
    Csv,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
