// ============================================================
// Layer 4 — Data Preparation
// ============================================================
// Turns raw student rows into a model-ready Dataset.
//
// Cleaning steps (applied in order):
//   1. Coerce each feature cell to a number; non-numeric text,
//      blanks, NaN and infinities count as missing
//   2. Drop rows missing any feature or the outcome label
//   3. Drop rows with a feature outside FEATURE_RANGES, the same
//      bounds inference enforces
//   4. Fail with EmptyDataset if nothing survives
//   5. Fail with SingleClass if only Pass or only Fail remains
//
// Final-term marks are not read here: they only ever feed the
// label, which was derived at ingestion.

use crate::data::dataset::Dataset;
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::student::{StudentRecord, FEATURE_NAMES, FEATURE_RANGES};

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean `records` into a Dataset, or explain why that is impossible.
    pub fn prepare(&self, records: &[StudentRecord]) -> PipelineResult<Dataset> {
        let mut rows          = Vec::with_capacity(records.len());
        let mut bad_cells     = [0usize; 3];
        let mut out_of_range  = [0usize; 3];
        let mut missing_label = 0usize;

        for record in records {
            // Count every unusable feature cell, not just the first per row
            for (i, cell) in record.feature_cells().iter().enumerate() {
                if cell.as_number().is_none() {
                    bad_cells[i] += 1;
                }
            }
            if record.outcome.is_none() {
                missing_label += 1;
            }

            let (Some(fv), Some(outcome)) = (record.features(), record.outcome) else {
                continue;
            };
            if let Some(i) = fv.first_out_of_range() {
                out_of_range[i] += 1;
                continue;
            }
            rows.push((record.student_id.clone(), fv, outcome));
        }

        let dropped = records.len() - rows.len();
        for (name, count) in FEATURE_NAMES.iter().zip(bad_cells) {
            if count > 0 {
                tracing::debug!("{count} rows have a missing or non-numeric '{name}'");
            }
        }
        for ((name, (lo, hi)), count) in FEATURE_NAMES.iter().zip(FEATURE_RANGES).zip(out_of_range) {
            if count > 0 {
                tracing::warn!("{count} rows have '{name}' outside [{lo}, {hi}]");
            }
        }
        if missing_label > 0 {
            tracing::debug!("{missing_label} rows have no outcome label");
        }
        tracing::info!("Prepared {} rows ({} dropped)", rows.len(), dropped);

        if rows.is_empty() {
            return Err(PipelineError::EmptyDataset { dropped });
        }

        let first = rows[0].2;
        if rows.iter().all(|(_, _, o)| *o == first) {
            return Err(PipelineError::SingleClass { class: first });
        }

        Dataset::from_rows(rows)
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::student::{FieldValue, Outcome};

    fn rec(id: &str, att: FieldValue, mid: FieldValue, fin: f64, gpa: FieldValue) -> StudentRecord {
        StudentRecord::new(id, id, att, mid, fin, gpa)
    }

    #[test]
    fn test_drops_incomplete_rows() {
        let records = vec![
            rec("S1", 90.0.into(), 80.0.into(), 75.0, 3.5.into()),
            rec("S2", "abc".into(), 80.0.into(), 75.0, 3.5.into()),
            rec("S3", 40.0.into(), FieldValue::Missing, 20.0, 1.5.into()),
            rec("S4", 40.0.into(), 30.0.into(), 20.0, FieldValue::Number(f64::NAN)),
            rec("S5", 45.0.into(), "35".into(), 25.0, 2.0.into()),
        ];
        let ds = Preprocessor::new().prepare(&records).unwrap();
        assert_eq!(ds.ids(), &["S1".to_string(), "S5".to_string()]);
    }

    #[test]
    fn test_cleaned_features_are_all_finite() {
        let cells: Vec<FieldValue> = vec![
            50.0.into(), "x".into(), FieldValue::Missing, " 70 ".into(),
            FieldValue::Number(f64::INFINITY), 3.0.into(), "nan".into(),
        ];
        let mut records = Vec::new();
        for (i, a) in cells.iter().enumerate() {
            for (j, m) in cells.iter().enumerate() {
                let fin = if (i + j) % 2 == 0 { 75.0 } else { 30.0 };
                records.push(rec(&format!("S{i}-{j}"), a.clone(), m.clone(), fin, 2.0.into()));
            }
        }
        let ds = Preprocessor::new().prepare(&records).unwrap();
        assert!(!ds.is_empty());
        assert!(ds.features().iter().all(|v| v.is_finite()));
        assert!(ds.labels().iter().all(|&y| y == 0.0 || y == 1.0));
    }

    #[test]
    fn test_empty_after_cleaning() {
        let records = vec![rec("S1", "n/a".into(), 80.0.into(), 75.0, 3.5.into())];
        match Preprocessor::new().prepare(&records) {
            Err(PipelineError::EmptyDataset { dropped }) => assert_eq!(dropped, 1),
            other => panic!("expected EmptyDataset, got {other:?}"),
        }
        assert!(matches!(
            Preprocessor::new().prepare(&[]),
            Err(PipelineError::EmptyDataset { dropped: 0 })
        ));
    }

    #[test]
    fn test_single_class_rejected() {
        let records = vec![
            rec("S1", 90.0.into(), 80.0.into(), 75.0, 3.5.into()),
            rec("S2", 85.0.into(), 70.0.into(), 65.0, 3.0.into()),
        ];
        match Preprocessor::new().prepare(&records) {
            Err(PipelineError::SingleClass { class }) => assert_eq!(class, Outcome::Pass),
            other => panic!("expected SingleClass, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_rows_dropped() {
        let records = vec![
            rec("S1", 90.0.into(), 80.0.into(), 75.0, 3.5.into()),
            rec("S2", 40.0.into(), 30.0.into(), 20.0, 1.5.into()),
            rec("S3", 1e200.into(), 80.0.into(), 75.0, 3.5.into()),
            rec("S4", 60.0.into(), (-5.0).into(), 20.0, 2.0.into()),
            rec("S5", 70.0.into(), 65.0.into(), 70.0, 4.5.into()),
            rec("S6", 100.0.into(), 0.0.into(), 61.0, 4.0.into()),
        ];
        let ds = Preprocessor::new().prepare(&records).unwrap();
        assert_eq!(ds.ids(), &["S1".to_string(), "S2".to_string(), "S6".to_string()]);
        assert!(ds.features().iter().all(|&v| (0.0..=100.0).contains(&v)));
    }

    #[test]
    fn test_unlabelled_rows_dropped() {
        let mut unlabelled = rec("S3", 90.0.into(), 80.0.into(), 0.0, 3.5.into());
        unlabelled.outcome = None;
        let records = vec![
            rec("S1", 90.0.into(), 80.0.into(), 75.0, 3.5.into()),
            rec("S2", 40.0.into(), 30.0.into(), 20.0, 1.5.into()),
            unlabelled,
        ];
        let ds = Preprocessor::new().prepare(&records).unwrap();
        assert_eq!(ds.len(), 2);
    }
}
