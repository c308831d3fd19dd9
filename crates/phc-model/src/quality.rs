//! Data-quality report.
//!
//! Non-fatal conditions (rows removed by a filter step, districts without a
//! division, fact rows that found no dimension entry) are collected here so a
//! human can review them after a successful run.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityKind {
    /// Rows removed from a table by a named filter step.
    Excluded,
    /// Rows kept, but an attribute lookup produced no value.
    Unmapped,
    /// Fact rows whose foreign key stayed null after the dimension join.
    Unmatched,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityEntry {
    /// Table the condition was observed on (e.g. "Consultation", "Facility").
    pub dataset: String,
    /// Step or column that produced the condition.
    pub step: String,
    pub reason: String,
    pub kind: QualityKind,
    pub rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    pub entries: Vec<QualityEntry>,
}

impl QualityReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record rows removed by a filter step. Zero counts are not recorded.
    pub fn record_exclusion(
        &mut self,
        dataset: impl Into<String>,
        step: impl Into<String>,
        reason: impl Into<String>,
        rows: usize,
    ) {
        self.push(dataset, step, reason, QualityKind::Excluded, rows);
    }

    pub fn record_unmapped(
        &mut self,
        dataset: impl Into<String>,
        step: impl Into<String>,
        reason: impl Into<String>,
        rows: usize,
    ) {
        self.push(dataset, step, reason, QualityKind::Unmapped, rows);
    }

    pub fn record_unmatched(
        &mut self,
        dataset: impl Into<String>,
        column: impl Into<String>,
        rows: usize,
    ) {
        self.push(
            dataset,
            column,
            "no matching dimension entry",
            QualityKind::Unmatched,
            rows,
        );
    }

    fn push(
        &mut self,
        dataset: impl Into<String>,
        step: impl Into<String>,
        reason: impl Into<String>,
        kind: QualityKind,
        rows: usize,
    ) {
        if rows == 0 {
            return;
        }
        self.entries.push(QualityEntry {
            dataset: dataset.into(),
            step: step.into(),
            reason: reason.into(),
            kind,
            rows,
        });
    }

    pub fn extend(&mut self, other: QualityReport) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rows_of_kind(&self, kind: QualityKind) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.kind == kind)
            .map(|entry| entry.rows)
            .sum()
    }

    pub fn excluded_rows(&self) -> usize {
        self.rows_of_kind(QualityKind::Excluded)
    }

    pub fn for_dataset<'a>(&'a self, dataset: &'a str) -> impl Iterator<Item = &'a QualityEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.dataset == dataset)
    }
}
