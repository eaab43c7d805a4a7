// ============================================================
// Layer 4 — CSV Record Loader
// ============================================================
// Reads an uploaded CSV of student results using the csv crate.
//
// Required header columns (any order, extras ignored):
//   student_id, name, attendance, mid_term_marks,
//   final_term_marks, previous_gpa
//
// Each row becomes a StudentRecord. Indicator cells are kept raw
// (FieldValue) so that Data Preparation decides what is usable;
// the outcome label is derived here as final_term_marks >= 60.
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use std::{fs::File, io::Read, path::PathBuf};

use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::student::{FieldValue, StudentRecord};
use crate::domain::traits::RecordSource;

pub const REQUIRED_COLUMNS: [&str; 6] = [
    "student_id",
    "name",
    "attendance",
    "mid_term_marks",
    "final_term_marks",
    "previous_gpa",
];

/// Loads student rows from a CSV file.
/// Implements the RecordSource trait from Layer 3.
pub struct CsvLoader {
    path: PathBuf,
}

impl CsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for CsvLoader {
    fn load_all(&self) -> PipelineResult<Vec<StudentRecord>> {
        let file = File::open(&self.path).map_err(|e| {
            PipelineError::DataValidation(format!("cannot open '{}': {e}", self.path.display()))
        })?;
        let records = read_records(file)?;
        tracing::info!("Loaded {} rows from '{}'", records.len(), self.path.display());
        Ok(records)
    }
}

/// Parse CSV from any reader. Split out so tests can feed strings.
pub fn read_records<R: Read>(input: R) -> PipelineResult<Vec<StudentRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::DataValidation(format!("cannot read CSV header: {e}")))?
        .clone();

    // Position of each required column in this file's header
    let mut idx = [0usize; 6];
    let mut missing = Vec::new();
    for (slot, col) in REQUIRED_COLUMNS.iter().enumerate() {
        match headers.iter().position(|h| h == *col) {
            Some(i) => idx[slot] = i,
            None => missing.push(*col),
        }
    }
    if !missing.is_empty() {
        return Err(PipelineError::DataValidation(format!(
            "CSV is missing required columns: {}",
            missing.join(", ")
        )));
    }

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        // Header is line 1, first data row is line 2
        let row = row.map_err(|e| {
            PipelineError::DataValidation(format!("malformed CSV row {}: {e}", line + 2))
        })?;
        let cell = |slot: usize| row.get(idx[slot]).unwrap_or("");

        let student_id = cell(0);
        if student_id.is_empty() {
            tracing::warn!("Skipping CSV row {}: empty student_id", line + 2);
            continue;
        }

        records.push(StudentRecord::new(
            student_id,
            cell(1),
            FieldValue::from_cell(cell(2)),
            FieldValue::from_cell(cell(3)),
            FieldValue::from_cell(cell(4)),
            FieldValue::from_cell(cell(5)),
        ));
    }

    Ok(records)
}
