use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::domain::student::{FeatureVector, Outcome, FEATURE_NAMES};
use crate::ml::evaluation::EvaluationReport;

/// Numerically stable logistic function σ(z) = 1 / (1 + e^(−z))
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Fitted logistic-regression parameters plus the feature ordering
/// they were fitted against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub feature_order: Vec<String>,
    pub weights:       [f64; 3],
    pub bias:          f64,
}

impl TrainedModel {
    pub fn new(weights: [f64; 3], bias: f64) -> Self {
        Self {
            feature_order: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            weights,
            bias,
        }
    }

    /// Weighted feature sum plus bias (the log-odds of passing)
    pub fn decision(&self, x: [f64; 3]) -> f64 {
        self.bias + self.weights.iter().zip(x).map(|(w, v)| w * v).sum::<f64>()
    }

    pub fn pass_probability(&self, fv: &FeatureVector) -> f64 {
        sigmoid(self.decision(fv.to_array()))
    }

    /// Pass iff the log-odds are strictly positive
    pub fn predict(&self, fv: &FeatureVector) -> Outcome {
        Outcome::from(self.decision(fv.to_array()) > 0.0)
    }

    /// Row-wise predictions over an n×3 matrix
    pub fn predict_matrix(&self, x: &Array2<f64>) -> Vec<Outcome> {
        self.decisions(x).iter().map(|&z| Outcome::from(z > 0.0)).collect()
    }

    pub fn decisions(&self, x: &Array2<f64>) -> Array1<f64> {
        x.dot(&Array1::from(self.weights.to_vec())) + self.bias
    }

    /// Verify the model can serve FeatureVector inputs: the feature
    /// order must match exactly and every parameter must be finite.
    pub fn check_contract(&self) -> Result<(), String> {
        if self.feature_order.len() != FEATURE_NAMES.len()
            || self.feature_order.iter().zip(FEATURE_NAMES).any(|(a, b)| a != b)
        {
            return Err(format!(
                "feature order {:?} does not match {:?}",
                self.feature_order, FEATURE_NAMES
            ));
        }
        if !self.bias.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err("model parameters are not finite".to_string());
        }
        Ok(())
    }
}

/// Version and timestamp assigned by the model store on save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub version:    u64,
    pub trained_at: DateTime<Utc>,
}

/// What the model store persists: the model, its metadata, and the
/// holdout report that accompanied the fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub metadata: ArtifactMetadata,
    pub model:    TrainedModel,
    #[serde(default)]
    pub report:   Option<EvaluationReport>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_sigmoid_range_and_symmetry() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-12);
        assert!(sigmoid(800.0) <= 1.0 && sigmoid(800.0) > 0.999);
        assert!(sigmoid(-800.0) >= 0.0 && sigmoid(-800.0) < 0.001);
    }

    #[test]
    fn test_decision_and_prediction() {
        let m = TrainedModel::new([0.1, 0.05, 1.0], -15.0);
        let good = FeatureVector::new(90.0, 80.0, 3.5);
        let weak = FeatureVector::new(40.0, 30.0, 1.5);
        assert!((m.decision(good.to_array()) - (9.0 + 4.0 + 3.5 - 15.0)).abs() < 1e-12);
        assert_eq!(m.predict(&good), Outcome::Pass);
        assert_eq!(m.predict(&weak), Outcome::Fail);
        assert!(m.pass_probability(&good) > 0.5);
    }

    #[test]
    fn test_zero_log_odds_is_fail() {
        let m = TrainedModel::new([0.0; 3], 0.0);
        let fv = FeatureVector::new(50.0, 50.0, 2.0);
        assert_eq!(m.pass_probability(&fv), 0.5);
        assert_eq!(m.predict(&fv), Outcome::Fail);
    }

    #[test]
    fn test_predict_matrix_matches_rowwise() {
        let m = TrainedModel::new([0.1, 0.05, 1.0], -15.0);
        let x = array![[90.0, 80.0, 3.5], [40.0, 30.0, 1.5]];
        assert_eq!(m.predict_matrix(&x), vec![Outcome::Pass, Outcome::Fail]);
    }

    #[test]
    fn test_contract_rejects_reordered_features() {
        let mut m = TrainedModel::new([1.0, 2.0, 3.0], 0.0);
        assert!(m.check_contract().is_ok());
        m.feature_order.swap(0, 2);
        assert!(m.check_contract().is_err());

        let m = TrainedModel::new([f64::NAN, 2.0, 3.0], 0.0);
        assert!(m.check_contract().is_err());
    }
}
