// ============================================================
// Layer 2 — IngestUseCase
// ============================================================
// Moves rows from a RecordSource (a CSV upload) into the
// RecordStore:
//
//   Step 1: Load and parse rows     (Layer 4 - data)
//   Step 2: Upsert by student ID    (Layer 6 - infra)
//
// Outcomes are derived while parsing, so re-ingesting a student
// with new final-term marks replaces their label too.

use anyhow::{Context, Result};

use crate::domain::student::Outcome;
use crate::domain::traits::{RecordSource, RecordStore};

/// Counts for one ingestion batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestReport {
    pub written:    usize,
    pub pass:       usize,
    pub fail:       usize,
    /// Rows whose final-term marks were not numeric
    pub unlabelled: usize,
}

pub struct IngestUseCase<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> IngestUseCase<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    pub fn execute(&self, source: &dyn RecordSource) -> Result<IngestReport> {
        let rows = source.load_all().context("Could not read the upload")?;

        let mut report = IngestReport::default();
        for row in &rows {
            match row.outcome {
                Some(Outcome::Pass) => report.pass += 1,
                Some(Outcome::Fail) => report.fail += 1,
                None                => report.unlabelled += 1,
            }
        }
        if report.unlabelled > 0 {
            tracing::warn!(
                "{} rows have non-numeric final-term marks and will not be used for training",
                report.unlabelled
            );
        }

        report.written = self.store.upsert_many(rows)?;
        tracing::info!(
            "Ingested {} rows ({} Pass, {} Fail)",
            report.written,
            report.pass,
            report.fail
        );
        Ok(report)
    }
}
