// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Scores one student end to end:
//
//   Step 1: Load the live model         (Layer 5 - ml)
//   Step 2: Validate the three features (Layer 3 - domain)
//   Step 3: Predict class + probability (Layer 5 - ml)
//   Step 4: Map probability to a tier   (Layer 3 - domain)
//   Step 5: Fire the advice rules       (Layer 3 - domain)
//
// A missing or unreadable model is a normal outcome here, not an
// error: the caller gets PredictionOutcome::NoModel with the reason.
// Invalid inputs are errors.
//
// assess_all runs Steps 2–5 for every stored student against one
// loaded model. A row whose indicators fail validation is reported
// next to the results instead of aborting the run. Results come
// back High risk first, then Medium, then Low.

use anyhow::Result;
use serde::Serialize;

use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::recommendation::{recommend, Advice};
use crate::domain::risk::RiskTier;
use crate::domain::student::{FeatureVector, PredictionInput};
use crate::domain::traits::{ModelStore, RecordStore};
use crate::ml::predictor::{Prediction, Predictor};

/// A scored student: prediction, risk tier and advice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id:    Option<String>,
    pub features:      FeatureVector,
    pub prediction:    Prediction,
    pub risk:          RiskTier,
    pub advice:        Vec<Advice>,
    /// Version of the model that produced the prediction
    pub model_version: u64,
}

#[derive(Debug)]
pub enum PredictionOutcome {
    /// No usable model; `reason` is ModelAbsent or ArtifactCorrupt
    NoModel { reason: PipelineError },
    Scored(Assessment),
}

impl PredictionOutcome {
    pub fn assessment(&self) -> Option<&Assessment> {
        match self {
            Self::Scored(a)       => Some(a),
            Self::NoModel { .. } => None,
        }
    }
}

/// Per-tier head count over one roster run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TierCounts {
    pub high:   usize,
    pub medium: usize,
    pub low:    usize,
}

impl TierCounts {
    fn add(&mut self, tier: RiskTier) {
        match tier {
            RiskTier::High   => self.high += 1,
            RiskTier::Medium => self.medium += 1,
            RiskTier::Low    => self.low += 1,
        }
    }
}

/// A stored row that could not be scored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    pub student_id: String,
    pub reason:     String,
}

/// Every stored student scored against one model version
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskReport {
    pub model_version: u64,
    pub counts:        TierCounts,
    /// High risk first; ties keep student ID order
    pub assessments:   Vec<Assessment>,
    pub skipped:       Vec<SkippedRow>,
}

#[derive(Debug)]
pub enum RosterOutcome {
    NoModel { reason: PipelineError },
    Report(RiskReport),
}

pub struct PredictUseCase<'a> {
    models:  &'a dyn ModelStore,
    records: &'a dyn RecordStore,
}

impl<'a> PredictUseCase<'a> {
    pub fn new(models: &'a dyn ModelStore, records: &'a dyn RecordStore) -> Self {
        Self { models, records }
    }

    /// Score an ad-hoc input.
    pub fn predict(&self, input: &PredictionInput) -> Result<PredictionOutcome> {
        // ── Step 1: Load model ───────────────────────────────────────────────
        let predictor = match Predictor::from_store(self.models) {
            Ok(p) => p,
            Err(reason) if reason.is_model_unavailable() => {
                tracing::warn!("No prediction: {reason}");
                return Ok(PredictionOutcome::NoModel { reason });
            }
            Err(e) => return Err(e.into()),
        };

        // ── Steps 2–5 ────────────────────────────────────────────────────────
        Ok(PredictionOutcome::Scored(score(&predictor, input)?))
    }

    /// Score a stored student by ID, from their stored indicator cells.
    pub fn assess(&self, student_id: &str) -> Result<PredictionOutcome> {
        let record = self
            .records
            .get(student_id)?
            .ok_or_else(|| PipelineError::DataValidation(format!("unknown student ID '{student_id}'")))?;

        let mut outcome = self.predict(&record.prediction_input())?;
        if let PredictionOutcome::Scored(a) = &mut outcome {
            a.student_id = Some(record.student_id);
        }
        Ok(outcome)
    }

    /// Score every stored student with the live model.
    pub fn assess_all(&self) -> Result<RosterOutcome> {
        let predictor = match Predictor::from_store(self.models) {
            Ok(p) => p,
            Err(reason) if reason.is_model_unavailable() => {
                tracing::warn!("No risk report: {reason}");
                return Ok(RosterOutcome::NoModel { reason });
            }
            Err(e) => return Err(e.into()),
        };

        let mut assessments = Vec::new();
        let mut skipped     = Vec::new();
        let mut counts      = TierCounts::default();

        for record in self.records.read_all()? {
            match score(&predictor, &record.prediction_input()) {
                Ok(mut a) => {
                    counts.add(a.risk);
                    a.student_id = Some(record.student_id);
                    assessments.push(a);
                }
                Err(e) => skipped.push(SkippedRow {
                    student_id: record.student_id,
                    reason:     e.to_string(),
                }),
            }
        }

        // read_all is ID-ordered and the sort is stable
        assessments.sort_by(|a, b| b.risk.cmp(&a.risk));

        tracing::info!(
            "Risk report: {} High, {} Medium, {} Low, {} skipped",
            counts.high,
            counts.medium,
            counts.low,
            skipped.len()
        );

        Ok(RosterOutcome::Report(RiskReport {
            model_version: predictor.metadata().version,
            counts,
            assessments,
            skipped,
        }))
    }
}

/// Steps 2–5 against an already loaded model
fn score(predictor: &Predictor, input: &PredictionInput) -> PipelineResult<Assessment> {
    let features   = input.validate()?;
    let prediction = predictor.predict_features(&features);
    let risk       = RiskTier::from_probability(prediction.pass_probability);
    let advice     = recommend(&features, risk);

    tracing::debug!(
        "P(pass)={:.4} → {} with {} recommendations",
        prediction.pass_probability,
        risk,
        advice.len()
    );

    Ok(Assessment {
        student_id: None,
        features,
        prediction,
        risk,
        advice,
        model_version: predictor.metadata().version,
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::student::{FieldValue, Outcome, StudentRecord};
    use crate::infra::model_store::{FileModelStore, InMemoryModelStore};
    use crate::infra::record_store::InMemoryRecordStore;
    use crate::ml::model::TrainedModel;

    fn model() -> TrainedModel {
        TrainedModel::new([0.1, 0.05, 1.0], -15.0)
    }

    #[test]
    fn test_no_model_is_an_outcome() {
        let models  = InMemoryModelStore::new();
        let records = InMemoryRecordStore::new();
        let out = PredictUseCase::new(&models, &records)
            .predict(&PredictionInput::from_numbers(90.0, 80.0, 3.5))
            .unwrap();
        assert!(matches!(out, PredictionOutcome::NoModel { reason: PipelineError::ModelAbsent }));
    }

    #[test]
    fn test_corrupt_artifact_is_no_model() {
        let dir    = tempfile::tempdir().unwrap();
        let models = FileModelStore::new(dir.path()).unwrap();
        std::fs::write(models.model_path(), "garbage").unwrap();

        let records = InMemoryRecordStore::new();
        let out = PredictUseCase::new(&models, &records)
            .predict(&PredictionInput::from_numbers(90.0, 80.0, 3.5))
            .unwrap();
        assert!(matches!(out, PredictionOutcome::NoModel { reason: PipelineError::ArtifactCorrupt { .. } }));
    }

    #[test]
    fn test_scored_strong_student() {
        let models = InMemoryModelStore::new();
        models.save(&model(), None).unwrap();
        let records = InMemoryRecordStore::new();

        let out = PredictUseCase::new(&models, &records)
            .predict(&PredictionInput::from_numbers(90.0, 80.0, 3.5))
            .unwrap();
        let a = out.assessment().unwrap();

        assert_eq!(a.prediction.outcome, Outcome::Pass);
        // decision = 9 + 4 + 3.5 − 15 = 1.5 → σ ≈ 0.818
        assert_eq!(a.risk, RiskTier::Low);
        let codes: Vec<_> = a.advice.iter().map(|adv| adv.code).collect();
        assert_eq!(codes, vec!["Performing well", "Suggest enrichment"]);
        assert_eq!(a.model_version, 1);
    }

    #[test]
    fn test_missing_feature_is_error() {
        let models = InMemoryModelStore::new();
        models.save(&model(), None).unwrap();
        let records = InMemoryRecordStore::new();

        let input = PredictionInput {
            attendance:     Some(FieldValue::Number(90.0)),
            mid_term_marks: None,
            previous_gpa:   Some(FieldValue::Number(3.5)),
        };
        let err = PredictUseCase::new(&models, &records).predict(&input).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MissingFeature { field: "mid_term_marks" })
        ));
    }

    fn roster() -> InMemoryRecordStore {
        let records = InMemoryRecordStore::new();
        records
            .upsert_many(vec![
                // decision 1.5 → P ≈ 0.82, Low
                StudentRecord::new("S001", "Ada", 90.0, 80.0, 75.0, 3.5),
                // decision −8 → High
                StudentRecord::new("S002", "Ben", 40.0, 30.0, 20.0, 1.5),
                // decision 0.25 → P ≈ 0.56, Medium
                StudentRecord::new("S003", "Cy", 85.0, 75.0, 65.0, 3.0),
                StudentRecord::new("S004", "Dee", "absent", 60.0, 50.0, 2.0),
                // decision −4.5 → High
                StudentRecord::new("S005", "Eve", 60.0, 50.0, 40.0, 2.0),
            ])
            .unwrap();
        records
    }

    #[test]
    fn test_assess_all_orders_by_tier_and_counts() {
        let models = InMemoryModelStore::new();
        models.save(&model(), None).unwrap();
        let records = roster();

        let report = match PredictUseCase::new(&models, &records).assess_all().unwrap() {
            RosterOutcome::Report(r) => r,
            other => panic!("expected a report, got {other:?}"),
        };

        let order: Vec<_> = report
            .assessments
            .iter()
            .map(|a| (a.student_id.as_deref().unwrap(), a.risk))
            .collect();
        assert_eq!(
            order,
            vec![
                ("S002", RiskTier::High),
                ("S005", RiskTier::High),
                ("S003", RiskTier::Medium),
                ("S001", RiskTier::Low),
            ]
        );
        assert_eq!(report.counts, TierCounts { high: 2, medium: 1, low: 1 });
        assert_eq!(report.model_version, 1);
    }

    #[test]
    fn test_assess_all_keeps_invalid_rows_as_skipped() {
        let models = InMemoryModelStore::new();
        models.save(&model(), None).unwrap();
        let records = roster();

        let RosterOutcome::Report(report) = PredictUseCase::new(&models, &records).assess_all().unwrap() else {
            panic!("expected a report");
        };
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].student_id, "S004");
        assert!(report.skipped[0].reason.contains("attendance"));
    }

    #[test]
    fn test_assess_all_without_model() {
        let models  = InMemoryModelStore::new();
        let records = roster();
        let out = PredictUseCase::new(&models, &records).assess_all().unwrap();
        assert!(matches!(out, RosterOutcome::NoModel { reason: PipelineError::ModelAbsent }));
    }

    #[test]
    fn test_assess_stored_student() {
        let models = InMemoryModelStore::new();
        models.save(&model(), None).unwrap();
        let records = InMemoryRecordStore::new();
        records
            .upsert_many(vec![StudentRecord::new("S002", "Ben", 40.0, 30.0, 20.0, 1.5)])
            .unwrap();

        let use_case = PredictUseCase::new(&models, &records);
        let out = use_case.assess("S002").unwrap();
        let a = out.assessment().unwrap();
        assert_eq!(a.student_id.as_deref(), Some("S002"));
        assert_eq!(a.risk, RiskTier::High);
        assert_eq!(a.advice[0].code, "Immediate intervention");

        let err = use_case.assess("S999").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::DataValidation(_))
        ));
    }
}
