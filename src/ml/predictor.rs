// ============================================================
// Layer 5 — Predictor
// ============================================================
// Scores one student with the live model artifact.
//
//   PredictionInput ──validate──▶ FeatureVector
//                                     │
//                                     ▼
//                      σ(b + w·x) = pass probability
//                                     │
//                                     ▼
//                      Pass iff b + w·x > 0

use serde::Serialize;

use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::student::{FeatureVector, Outcome, PredictionInput};
use crate::domain::traits::ModelStore;
use crate::ml::model::{ArtifactMetadata, ModelArtifact};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub outcome:          Outcome,
    pub pass_probability: f64,
}

pub struct Predictor {
    artifact: ModelArtifact,
}

impl Predictor {
    /// Wrap an artifact, rejecting one that cannot serve FeatureVectors
    pub fn new(artifact: ModelArtifact) -> PipelineResult<Self> {
        artifact.model.check_contract().map_err(|reason| PipelineError::ArtifactCorrupt {
            path:   format!("model version {}", artifact.metadata.version),
            reason,
        })?;
        Ok(Self { artifact })
    }

    /// Load the live artifact. ModelAbsent when nothing was published,
    /// ArtifactCorrupt when the stored artifact is unusable.
    pub fn from_store(store: &dyn ModelStore) -> PipelineResult<Self> {
        let artifact = store.load()?.ok_or(PipelineError::ModelAbsent)?;
        tracing::debug!(
            "Loaded model version {} trained at {}",
            artifact.metadata.version,
            artifact.metadata.trained_at
        );
        Self::new(artifact)
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.artifact.metadata
    }

    /// Validate the raw input, then score it
    pub fn predict(&self, input: &PredictionInput) -> PipelineResult<Prediction> {
        let features = input.validate()?;
        Ok(self.predict_features(&features))
    }

    pub fn predict_features(&self, features: &FeatureVector) -> Prediction {
        let model = &self.artifact.model;
        Prediction {
            outcome:          model.predict(features),
            pass_probability: model.pass_probability(features),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::model_store::InMemoryModelStore;
    use crate::ml::model::TrainedModel;

    fn store_with(model: TrainedModel) -> InMemoryModelStore {
        let store = InMemoryModelStore::new();
        store.save(&model, None).unwrap();
        store
    }

    #[test]
    fn test_no_model_is_model_absent() {
        let store = InMemoryModelStore::new();
        assert!(matches!(Predictor::from_store(&store), Err(PipelineError::ModelAbsent)));
    }

    #[test]
    fn test_predicts_probability_and_class() {
        let store = store_with(TrainedModel::new([0.1, 0.05, 1.0], -15.0));
        let predictor = Predictor::from_store(&store).unwrap();

        let p = predictor.predict(&PredictionInput::from_numbers(90.0, 80.0, 3.5)).unwrap();
        assert_eq!(p.outcome, Outcome::Pass);
        assert!(p.pass_probability > 0.5 && p.pass_probability <= 1.0);

        let p = predictor.predict(&PredictionInput::from_numbers(40.0, 30.0, 1.5)).unwrap();
        assert_eq!(p.outcome, Outcome::Fail);
        assert!(p.pass_probability < 0.5 && p.pass_probability >= 0.0);
    }

    #[test]
    fn test_missing_feature_gives_no_prediction() {
        let store = store_with(TrainedModel::new([0.1, 0.05, 1.0], -15.0));
        let predictor = Predictor::from_store(&store).unwrap();

        let mut input = PredictionInput::from_numbers(90.0, 80.0, 3.5);
        input.previous_gpa = None;
        match predictor.predict(&input) {
            Err(PipelineError::MissingFeature { field }) => assert_eq!(field, "previous_gpa"),
            other => panic!("expected MissingFeature, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_mismatched_feature_order() {
        let mut model = TrainedModel::new([0.1, 0.05, 1.0], -15.0);
        model.feature_order.reverse();
        let artifact = ModelArtifact {
            metadata: ArtifactMetadata { version: 3, trained_at: chrono::Utc::now() },
            model,
            report: None,
        };
        assert!(matches!(Predictor::new(artifact), Err(PipelineError::ArtifactCorrupt { .. })));
    }
}
