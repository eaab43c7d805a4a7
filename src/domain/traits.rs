// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The persistence seams of the pipeline. The application
// layer is written against these traits only, so a use case can
// run on the in-memory stores in tests and on the file-backed
// stores from the CLI without any change.
//
//   RecordSource — where raw rows come from (CSV upload)
//   RecordStore  — per-student rows keyed by student ID
//   ModelStore   — the single live model artifact
//
// All take &self: implementations own whatever interior
// mutability they need.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use crate::domain::error::PipelineResult;
use crate::domain::student::StudentRecord;
use crate::ml::evaluation::EvaluationReport;
use crate::ml::model::{ArtifactMetadata, ModelArtifact, TrainedModel};

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Any component that can produce student rows for ingestion.
///
/// Implementations:
///   - CsvLoader → a CSV file with the six ingestion columns
pub trait RecordSource {
    /// Load every row, with outcomes already derived
    fn load_all(&self) -> PipelineResult<Vec<StudentRecord>>;
}

// ─── RecordStore ──────────────────────────────────────────────────────────────
/// Tabular storage for student rows.
///
/// Implementations:
///   - InMemoryRecordStore → tests and one-shot pipelines
///   - JsonRecordStore     → records.json in the data directory
pub trait RecordStore {
    /// Insert or replace rows by student ID. A row replaces any stored
    /// row with the same ID wholesale; within one batch the last row
    /// for an ID wins. Returns the number of rows written.
    fn upsert_many(&self, records: Vec<StudentRecord>) -> PipelineResult<usize>;

    /// Every stored row, ordered by student ID
    fn read_all(&self) -> PipelineResult<Vec<StudentRecord>>;

    /// Look up one row by ID
    fn get(&self, student_id: &str) -> PipelineResult<Option<StudentRecord>> {
        Ok(self
            .read_all()?
            .into_iter()
            .find(|r| r.student_id == student_id))
    }
}

// ─── ModelStore ───────────────────────────────────────────────────────────────
/// Single-slot storage for the trained classifier.
///
/// Implementations:
///   - InMemoryModelStore → tests
///   - FileModelStore     → model.json, published by atomic rename
pub trait ModelStore {
    /// Publish a model, replacing the live artifact wholesale.
    /// The store assigns the version number and timestamp.
    fn save(
        &self,
        model:  &TrainedModel,
        report: Option<&EvaluationReport>,
    ) -> PipelineResult<ArtifactMetadata>;

    /// The live artifact, Ok(None) if nothing was ever published,
    /// or ArtifactCorrupt if it exists but cannot be used.
    fn load(&self) -> PipelineResult<Option<ModelArtifact>>;

    /// Restore the artifact that was live before the last save.
    /// Fails with ModelAbsent when there is nothing to restore.
    fn rollback(&self) -> PipelineResult<ArtifactMetadata>;
}
