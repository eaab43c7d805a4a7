// ============================================================
// Layer 4 — Dataset
// ============================================================
// The cleaned, model-ready view of the record store:
//
//   features: n × 3 matrix, columns in FEATURE_NAMES order
//   labels:   n-vector of 0.0 (Fail) / 1.0 (Pass)
//   ids:      student ID of each row, for tracing results back
//
// Rows stay aligned across all three; `select` picks a subset
// (a split partition) without breaking that alignment.
//
// Reference: ndarray crate documentation (Array2, Axis)

use ndarray::{Array1, Array2, Axis};

use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::student::{FeatureVector, Outcome, FEATURE_NAMES};

/// Model-ready data: one row per student, columns in FEATURE_NAMES order.
/// Every cell is finite; labels are 0.0 (Fail) or 1.0 (Pass).
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Array2<f64>,
    labels:   Array1<f64>,
    ids:      Vec<String>,
}

impl Dataset {
    pub fn from_rows(rows: Vec<(String, FeatureVector, Outcome)>) -> PipelineResult<Self> {
        let n = rows.len();
        let mut flat   = Vec::with_capacity(n * FEATURE_NAMES.len());
        let mut labels = Vec::with_capacity(n);
        let mut ids    = Vec::with_capacity(n);

        for (id, fv, outcome) in rows {
            flat.extend_from_slice(&fv.to_array());
            labels.push(outcome.label());
            ids.push(id);
        }

        let features = Array2::from_shape_vec((n, FEATURE_NAMES.len()), flat)
            .map_err(|e| PipelineError::DataValidation(format!("feature matrix shape: {e}")))?;
        Ok(Self { features, labels: Array1::from(labels), ids })
    }

    pub fn len(&self) -> usize { self.labels.len() }

    pub fn is_empty(&self) -> bool { self.labels.is_empty() }

    pub fn features(&self) -> &Array2<f64> { &self.features }

    pub fn labels(&self) -> &Array1<f64> { &self.labels }

    pub fn ids(&self) -> &[String] { &self.ids }

    pub fn outcomes(&self) -> Vec<Outcome> {
        self.labels.iter().map(|&y| Outcome::from(y >= 0.5)).collect()
    }

    /// (fail count, pass count)
    pub fn class_counts(&self) -> (usize, usize) {
        let pass = self.labels.iter().filter(|&&y| y >= 0.5).count();
        (self.len() - pass, pass)
    }

    /// Row subset in the given index order
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.select(Axis(0), indices),
            labels:   self.labels.select(Axis(0), indices),
            ids:      indices.iter().map(|&i| self.ids[i].clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::from_rows(vec![
            ("S1".into(), FeatureVector::new(90.0, 80.0, 3.5), Outcome::Pass),
            ("S2".into(), FeatureVector::new(40.0, 30.0, 1.5), Outcome::Fail),
            ("S3".into(), FeatureVector::new(85.0, 70.0, 3.0), Outcome::Pass),
        ])
        .unwrap()
    }

    #[test]
    fn test_shape_and_order() {
        let ds = sample();
        assert_eq!(ds.features().dim(), (3, 3));
        assert_eq!(ds.features()[[1, 2]], 1.5);
        assert_eq!(ds.labels().to_vec(), vec![1.0, 0.0, 1.0]);
        assert_eq!(ds.class_counts(), (1, 2));
    }

    #[test]
    fn test_select_keeps_rows_aligned() {
        let sub = sample().select(&[2, 1]);
        assert_eq!(sub.ids(), &["S3".to_string(), "S2".to_string()]);
        assert_eq!(sub.features()[[0, 0]], 85.0);
        assert_eq!(sub.outcomes(), vec![Outcome::Pass, Outcome::Fail]);
    }
}
