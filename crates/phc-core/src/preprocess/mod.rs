//! Fact preprocessors and their registry.
//!
//! Each raw export has its own preprocessor that cleans and reshapes it into a
//! fact table with the standard geography columns (`Date`, `DistrictName`,
//! `BlockName`, `PHCName`) plus its measures.
//!
//! Rows that fail per-row parsing are removed by named filter steps and
//! counted in the frame's [`QualityReport`]. A required date, time or age
//! column in which nothing parses is a [`WarehouseError::Parse`].

pub mod appointment;
pub mod consultation;
pub mod login;
pub mod registration;

use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::Instant;

use phc_model::{FactKind, QualityReport, WarehouseConfig};
use polars::prelude::DataFrame;
use tracing::{debug, info_span, warn};

use crate::error::{Result, WarehouseError};
use crate::frame::FactFrame;
use crate::table::{TextTable, retain_by_mask};

pub use appointment::AppointmentPreprocessor;
pub use consultation::ConsultationPreprocessor;
pub use login::PhcLoginPreprocessor;
pub use registration::PatientRegistrationPreprocessor;

/// Cleans one raw export into a preprocessed fact table.
pub trait FactPreprocessor: Send + Sync {
    fn kind(&self) -> FactKind;

    /// Raw columns that must be present; checked before any parsing.
    fn required_columns(&self) -> &'static [&'static str];

    /// Short summary, recorded on the preprocess span.
    fn description(&self) -> &'static str {
        "Fact preprocessor"
    }

    fn preprocess(&self, raw: &DataFrame, config: &WarehouseConfig) -> Result<FactFrame>;
}

/// Preprocessors indexed by fact kind.
pub struct PreprocessorRegistry {
    processors: BTreeMap<FactKind, Box<dyn FactPreprocessor>>,
}

impl Default for PreprocessorRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(AppointmentPreprocessor));
        registry.register(Box::new(ConsultationPreprocessor));
        registry.register(Box::new(PatientRegistrationPreprocessor));
        registry.register(Box::new(PhcLoginPreprocessor));
        registry
    }
}

impl PreprocessorRegistry {
    fn empty() -> Self {
        Self {
            processors: BTreeMap::new(),
        }
    }

    /// Registers a preprocessor, replacing any previous one for its kind.
    pub fn register(&mut self, processor: Box<dyn FactPreprocessor>) {
        self.processors.insert(processor.kind(), processor);
    }

    pub fn get(&self, kind: FactKind) -> Option<&dyn FactPreprocessor> {
        self.processors.get(&kind).map(|p| p.as_ref())
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    pub fn preprocess(
        &self,
        kind: FactKind,
        raw: &DataFrame,
        config: &WarehouseConfig,
    ) -> Result<FactFrame> {
        let processor = self.get(kind).ok_or_else(|| WarehouseError::Validation {
            message: format!("no preprocessor registered for {kind}"),
        })?;
        let span = info_span!("preprocess", fact = %kind, step = processor.description());
        let _guard = span.enter();
        let start = Instant::now();
        let frame = processor.preprocess(raw, config)?;
        debug!(
            fact = %kind,
            input_rows = raw.height(),
            output_rows = frame.record_count(),
            excluded_rows = frame.quality.excluded_rows(),
            duration_ms = start.elapsed().as_millis(),
            "preprocess complete"
        );
        Ok(frame)
    }

    /// Runs every supplied raw table through its preprocessor, in input order.
    pub fn preprocess_all(
        &self,
        raws: &[(FactKind, DataFrame)],
        config: &WarehouseConfig,
    ) -> Result<Vec<FactFrame>> {
        raws.iter()
            .map(|(kind, raw)| self.preprocess(*kind, raw, config))
            .collect()
    }
}

static DEFAULT_REGISTRY: OnceLock<PreprocessorRegistry> = OnceLock::new();

/// Registry with the four standard preprocessors.
pub fn default_registry() -> &'static PreprocessorRegistry {
    DEFAULT_REGISTRY.get_or_init(PreprocessorRegistry::default)
}

/// Records rows removed by a named filter step and warns when any were.
pub(crate) fn record_filter(
    quality: &mut QualityReport,
    kind: FactKind,
    step: &str,
    reason: &str,
    removed: usize,
) {
    if removed > 0 {
        warn!(fact = %kind, step, reason, removed, "rows excluded");
    }
    quality.record_exclusion(kind.as_str(), step, reason, removed);
}

/// One named exclusion step over a raw table and its parsed per-row values.
pub(crate) struct RowFilter<'a> {
    pub kind: FactKind,
    pub quality: &'a mut QualityReport,
}

impl RowFilter<'_> {
    /// Keeps rows where `keep` is true in both `table` and `rows`.
    pub fn apply<T>(
        &mut self,
        table: &mut TextTable,
        rows: &mut Vec<T>,
        keep: &[bool],
        step: &str,
        reason: &str,
    ) {
        let removed = table.retain(keep);
        *rows = retain_by_mask(std::mem::take(rows), keep);
        record_filter(self.quality, self.kind, step, reason, removed);
    }

    /// Drops rows without a facility name.
    pub fn missing_facility<T>(
        &mut self,
        table: &mut TextTable,
        rows: &mut Vec<T>,
        phc_column: &str,
    ) {
        let keep: Vec<bool> = match table.column(phc_column) {
            Some(values) => values.iter().map(Option::is_some).collect(),
            None => return,
        };
        self.apply(table, rows, &keep, "missing_facility", "missing facility name");
    }
}

/// Fails when a non-empty required column has no parseable value at all.
pub(crate) fn ensure_any_parsed<T>(
    kind: FactKind,
    column: &str,
    raw: &[Option<String>],
    parsed: &[Option<T>],
    expected: &str,
) -> Result<()> {
    if raw.is_empty() || parsed.iter().any(Option::is_some) {
        return Ok(());
    }
    let sample = raw.iter().flatten().next().map(String::as_str);
    Err(WarehouseError::parse(
        kind.as_str(),
        column,
        sample,
        format!("no value matches {expected}"),
    ))
}

/// Mask that keeps rows where every listed value is present.
pub(crate) fn all_present(columns: &[&[Option<String>]], height: usize) -> Vec<bool> {
    (0..height)
        .map(|row| {
            columns
                .iter()
                .all(|values| values.get(row).is_some_and(Option::is_some))
        })
        .collect()
}
