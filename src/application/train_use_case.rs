// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Read every stored row       (Layer 6 - infra)
//   Step 2: Clean into a Dataset        (Layer 4 - data)
//   Step 3: Split, fit, evaluate, save  (Layer 5 - ml)
//   Step 4: Save config + log the run   (Layer 6 - infra)
//
// If Step 2 fails (no usable rows, only one class) or the fit in
// Step 3 cannot move off its starting point, nothing is published
// and the previous model stays live.
//
// Reference: Rust Book §13 (Iterators and Closures)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::preprocessor::Preprocessor;
use crate::domain::traits::{ModelStore, RecordStore};
use crate::infra::{
    metrics::{RunRecord, TrainingLog},
    model_store::FileModelStore,
    record_store::JsonRecordStore,
};
use crate::ml::trainer::{run_training, FitParams, TrainingRun};

// ─── Training Configuration ──────────────────────────────────────────────────
// Hyperparameters for a training run. Fixed per deployment, not
// searched. Serialisable so the config of the last run can be
// saved next to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:         String,
    pub holdout_fraction: f64,
    pub seed:             u64,
    pub c:                f64,
    pub max_iter:         usize,
    pub tolerance:        f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        let fit = FitParams::default();
        Self {
            data_dir:         "data".to_string(),
            holdout_fraction: 0.2,
            seed:             42,
            c:                fit.c,
            max_iter:         fit.max_iter,
            tolerance:        fit.tolerance,
        }
    }
}

impl TrainConfig {
    pub fn fit_params(&self) -> FitParams {
        FitParams { c: self.c, max_iter: self.max_iter, tolerance: self.tolerance }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Train on the stores in `data_dir`, then record the run there.
    pub fn execute(&self) -> Result<TrainingRun> {
        let cfg     = &self.config;
        let records = JsonRecordStore::new(&cfg.data_dir)?;
        let models  = FileModelStore::new(&cfg.data_dir)?;

        let run = self.execute_with(&records, &models)?;

        // ── Step 4: Save config and append to the training log ──────────────
        models.save_config(cfg)?;
        TrainingLog::new(&cfg.data_dir)?
            .log(&RunRecord::from(&run))
            .context("Model was published but the training log could not be written")?;

        Ok(run)
    }

    /// Steps 1–3 against any pair of stores.
    pub fn execute_with(
        &self,
        records: &dyn RecordStore,
        models:  &dyn ModelStore,
    ) -> Result<TrainingRun> {
        let cfg = &self.config;

        // ── Step 1: Read rows ────────────────────────────────────────────────
        let rows = records.read_all()?;
        tracing::info!("Read {} stored rows", rows.len());

        // ── Step 2: Clean ────────────────────────────────────────────────────
        let dataset = Preprocessor::new()
            .prepare(&rows)
            .context("Training data could not be prepared")?;
        let (fail, pass) = dataset.class_counts();
        tracing::info!("Training set: {} Pass, {} Fail", pass, fail);

        // ── Step 3: Split, fit, evaluate, publish (Layer 5) ──────────────────
        let run = run_training(cfg, &dataset, models)?;
        Ok(run)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::PipelineError;
    use crate::domain::student::{Outcome, PredictionInput, StudentRecord};
    use crate::infra::model_store::InMemoryModelStore;
    use crate::infra::record_store::InMemoryRecordStore;
    use crate::ml::model::TrainedModel;
    use crate::ml::predictor::Predictor;

    /// The two reference students plus synthetic rows of both classes
    fn class_records() -> Vec<StudentRecord> {
        let mut rows = vec![
            StudentRecord::new("S001", "Ada", 90.0, 80.0, 75.0, 3.5),
            StudentRecord::new("S002", "Ben", 40.0, 30.0, 20.0, 1.5),
        ];
        for i in 0..20 {
            let k = i as f64;
            rows.push(StudentRecord::new(
                format!("P{i:03}"), "Pass", 78.0 + k % 20.0, 62.0 + (k * 3.0) % 35.0, 65.0 + k, 2.7 + (k * 0.06) % 1.2,
            ));
            rows.push(StudentRecord::new(
                format!("F{i:03}"), "Fail", 35.0 + (k * 2.0) % 30.0, 18.0 + (k * 4.0) % 30.0, 15.0 + k * 2.0, 1.0 + (k * 0.07) % 1.3,
            ));
        }
        rows
    }

    fn stores_with(rows: Vec<StudentRecord>) -> (InMemoryRecordStore, InMemoryModelStore) {
        let records = InMemoryRecordStore::new();
        records.upsert_many(rows).unwrap();
        (records, InMemoryModelStore::new())
    }

    #[test]
    fn test_reference_records_get_outcomes() {
        let rows = class_records();
        assert_eq!(rows[0].outcome, Some(Outcome::Pass));
        assert_eq!(rows[1].outcome, Some(Outcome::Fail));
    }

    #[test]
    fn test_end_to_end_training_and_prediction() {
        let (records, models) = stores_with(class_records());
        let run = TrainUseCase::new(TrainConfig::default())
            .execute_with(&records, &models)
            .unwrap();

        assert!((0.0..=1.0).contains(&run.report.accuracy));
        assert_eq!(run.metadata.version, 1);

        let predictor = Predictor::from_store(&models).unwrap();
        let p = predictor.predict(&PredictionInput::from_numbers(90.0, 80.0, 3.5)).unwrap();
        assert!(p.pass_probability > 0.5);
        assert_eq!(p.outcome, Outcome::Pass);
    }

    #[test]
    fn test_out_of_range_row_does_not_spoil_the_fit() {
        let mut rows = class_records();
        rows.push(StudentRecord::new("X001", "Outlier", 1e200, 80.0, 75.0, 3.5));
        let (records, models) = stores_with(rows);

        let run = TrainUseCase::new(TrainConfig::default())
            .execute_with(&records, &models)
            .unwrap();
        assert!(run.converged);
        assert!(run.model.weights.iter().any(|&w| w != 0.0));

        let predictor = Predictor::from_store(&models).unwrap();
        let p = predictor.predict(&PredictionInput::from_numbers(90.0, 80.0, 3.5)).unwrap();
        assert_eq!(p.outcome, Outcome::Pass);
    }

    #[test]
    fn test_training_is_deterministic() {
        let use_case = TrainUseCase::new(TrainConfig::default());

        let (r1, m1) = stores_with(class_records());
        let (r2, m2) = stores_with(class_records());
        let a = use_case.execute_with(&r1, &m1).unwrap();
        let b = use_case.execute_with(&r2, &m2).unwrap();

        assert_eq!(a.report, b.report);
        assert_eq!(a.model, b.model);
    }

    #[test]
    fn test_single_class_keeps_prior_artifact() {
        let passing: Vec<_> = class_records()
            .into_iter()
            .filter(|r| r.outcome == Some(Outcome::Pass))
            .collect();
        let (records, models) = stores_with(passing);

        let prior = TrainedModel::new([0.1, 0.05, 1.0], -15.0);
        models.save(&prior, None).unwrap();

        let err = TrainUseCase::new(TrainConfig::default())
            .execute_with(&records, &models)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::SingleClass { class: Outcome::Pass })
        ));

        let live = models.load().unwrap().unwrap();
        assert_eq!(live.metadata.version, 1);
        assert_eq!(live.model, prior);
    }

    #[test]
    fn test_single_class_persists_nothing() {
        let failing: Vec<_> = class_records()
            .into_iter()
            .filter(|r| r.outcome == Some(Outcome::Fail))
            .collect();
        let (records, models) = stores_with(failing);

        assert!(TrainUseCase::new(TrainConfig::default())
            .execute_with(&records, &models)
            .is_err());
        assert!(models.load().unwrap().is_none());
    }

    #[test]
    fn test_execute_writes_config_and_log() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_string_lossy().into_owned();

        JsonRecordStore::new(&data_dir).unwrap().upsert_many(class_records()).unwrap();

        let cfg = TrainConfig { data_dir: data_dir.clone(), ..TrainConfig::default() };
        let run = TrainUseCase::new(cfg.clone()).execute().unwrap();
        assert_eq!(run.metadata.version, 1);

        let saved = FileModelStore::new(&data_dir).unwrap().load_config().unwrap();
        assert_eq!(saved, Some(cfg));

        let log = std::fs::read_to_string(dir.path().join("training_log.csv")).unwrap();
        assert_eq!(log.lines().count(), 2);
    }
}
