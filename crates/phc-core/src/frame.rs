//! Table wrappers passed between warehouse stages.

use phc_model::{DimensionKind, FactKind, QualityReport};
use polars::prelude::DataFrame;

/// A preprocessed or final fact table with the quality conditions its
/// preprocessing produced.
#[derive(Debug, Clone)]
pub struct FactFrame {
    pub kind: FactKind,
    pub data: DataFrame,
    pub quality: QualityReport,
}

impl FactFrame {
    pub fn new(kind: FactKind, data: DataFrame) -> Self {
        Self {
            kind,
            data,
            quality: QualityReport::new(),
        }
    }

    pub fn with_quality(mut self, quality: QualityReport) -> Self {
        self.quality = quality;
        self
    }

    pub fn record_count(&self) -> usize {
        self.data.height()
    }

    /// File stem used when the table is written out.
    pub fn dataset_name(&self) -> &'static str {
        self.kind.output_name()
    }
}

/// A generated dimension table.
#[derive(Debug, Clone)]
pub struct DimensionFrame {
    pub kind: DimensionKind,
    pub data: DataFrame,
    pub quality: QualityReport,
}

impl DimensionFrame {
    pub fn new(kind: DimensionKind, data: DataFrame) -> Self {
        Self {
            kind,
            data,
            quality: QualityReport::new(),
        }
    }

    pub fn with_quality(mut self, quality: QualityReport) -> Self {
        self.quality = quality;
        self
    }

    pub fn record_count(&self) -> usize {
        self.data.height()
    }

    pub fn dataset_name(&self) -> &'static str {
        self.kind.output_name()
    }
}

/// The three dimensions a fact table is keyed against.
#[derive(Debug, Clone)]
pub struct Dimensions {
    pub facility: DimensionFrame,
    pub doctor: DimensionFrame,
    pub date: DimensionFrame,
}

impl Dimensions {
    pub fn iter(&self) -> impl Iterator<Item = &DimensionFrame> {
        [&self.facility, &self.doctor, &self.date].into_iter()
    }

    pub fn quality(&self) -> QualityReport {
        let mut report = QualityReport::new();
        for dimension in self.iter() {
            report.extend(dimension.quality.clone());
        }
        report
    }
}
