// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between an uploaded CSV and the feature matrix
// the trainer consumes.
//
//   CSV upload
//       │
//       ▼
//   CsvLoader         → StudentRecords with derived outcome
//       │
//       ▼
//   RecordStore       → (infra) upsert / read_all
//       │
//       ▼
//   Preprocessor      → coerce, drop incomplete rows, class check
//       │
//       ▼
//   Dataset           → n×3 ndarray feature matrix + labels
//       │
//       ▼
//   stratified_split  → seeded train / holdout indices
//
// Reference: Rust Book §13 (Iterators and Closures)

/// Reads student rows from CSV using the csv crate
pub mod loader;

/// Coerces and filters raw rows into a Dataset
pub mod preprocessor;

/// Feature matrix and label vector
pub mod dataset;

/// Seeded, stratified train/holdout split
pub mod splitter;
