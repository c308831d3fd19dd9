//! Error types for the warehouse core.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Fatal conditions that stop a warehouse build.
///
/// Data-quality conditions are not errors; they are recorded in
/// [`phc_model::QualityReport`] and the build continues.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// A raw or preprocessed table lacks columns the step needs.
    #[error("{dataset}: missing required column(s): {}", .columns.join(", "))]
    MissingColumns {
        dataset: String,
        columns: Vec<String>,
    },

    /// A dimension generator was given no input tables.
    #[error("{dimension} dimension requires a non-empty list of input tables")]
    EmptyInput { dimension: String },

    /// A dimension generator input lacks a natural-key column.
    #[error("{dimension} dimension input at index {index} is missing column(s): {}", .columns.join(", "))]
    MissingDimensionColumns {
        dimension: String,
        index: usize,
        columns: Vec<String>,
    },

    /// A required date/time/age field could not be parsed.
    #[error("{dataset}: cannot parse column '{column}' (value '{sample}'): {message}")]
    Parse {
        dataset: String,
        column: String,
        sample: String,
        message: String,
    },

    /// Input violates a precondition not tied to a single column.
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// Configuration cannot be used by the transforms.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    #[error("dataframe operation failed: {0}")]
    Polars(#[from] PolarsError),
}

impl WarehouseError {
    pub(crate) fn missing_columns(dataset: impl Into<String>, columns: Vec<String>) -> Self {
        Self::MissingColumns {
            dataset: dataset.into(),
            columns,
        }
    }

    pub(crate) fn parse(
        dataset: impl Into<String>,
        column: impl Into<String>,
        sample: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self::Parse {
            dataset: dataset.into(),
            column: column.into(),
            sample: sample.unwrap_or("<null>").to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WarehouseError>;
