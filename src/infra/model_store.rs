// ============================================================
// Layer 6 — Model Store
// ============================================================
// Holds the single live model artifact plus one rollback slot.
//
// What gets saved per training run:
//   1. model.json        — ModelArtifact (weights, bias, feature
//                          order, version, timestamp, report)
//   2. model.prev.json   — the artifact that model.json replaced
//   3. train_config.json — the TrainConfig of the latest run
//
// Publishing is atomic: the new artifact is written to
// model.json.tmp, synced, and renamed over model.json. A reader
// therefore sees the old artifact or the new one, never a mix.
// A failed training run never calls save(), so the previous
// artifact stays live.
//
// Versions increase by one per save, counting from the highest
// version held in either slot. Rollback swaps the two slots, so
// a second rollback restores the newer artifact again.
//
// File layout:
//   data/
//     model.json
//     model.prev.json
//     train_config.json
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §15.5 (RefCell and Interior Mutability)

use chrono::Utc;
use std::{
    cell::RefCell,
    fs,
    io,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::TrainConfig;
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::traits::ModelStore;
use crate::infra::write_atomic;
use crate::ml::evaluation::EvaluationReport;
use crate::ml::model::{ArtifactMetadata, ModelArtifact, TrainedModel};

pub const MODEL_FILE:    &str = "model.json";
pub const PREVIOUS_FILE: &str = "model.prev.json";
pub const CONFIG_FILE:   &str = "train_config.json";

fn next_metadata(live: Option<&ModelArtifact>, previous: Option<&ModelArtifact>) -> ArtifactMetadata {
    let highest = live
        .into_iter()
        .chain(previous)
        .map(|a| a.metadata.version)
        .max()
        .unwrap_or(0);
    ArtifactMetadata { version: highest + 1, trained_at: Utc::now() }
}

fn build_artifact(
    metadata: ArtifactMetadata,
    model:    &TrainedModel,
    report:   Option<&EvaluationReport>,
) -> ModelArtifact {
    ModelArtifact { metadata, model: model.clone(), report: report.cloned() }
}

// ─── In-memory store ──────────────────────────────────────────────────────────

/// Model store backed by memory. Same versioning and rollback
/// semantics as FileModelStore.
#[derive(Default)]
pub struct InMemoryModelStore {
    live:     RefCell<Option<ModelArtifact>>,
    previous: RefCell<Option<ModelArtifact>>,
}

impl InMemoryModelStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModelStore for InMemoryModelStore {
    fn save(
        &self,
        model:  &TrainedModel,
        report: Option<&EvaluationReport>,
    ) -> PipelineResult<ArtifactMetadata> {
        let metadata = next_metadata(self.live.borrow().as_ref(), self.previous.borrow().as_ref());
        let artifact = build_artifact(metadata, model, report);

        let replaced = self.live.replace(Some(artifact));
        if replaced.is_some() {
            *self.previous.borrow_mut() = replaced;
        }
        Ok(metadata)
    }

    fn load(&self) -> PipelineResult<Option<ModelArtifact>> {
        Ok(self.live.borrow().clone())
    }

    fn rollback(&self) -> PipelineResult<ArtifactMetadata> {
        let restored = self.previous.borrow_mut().take().ok_or(PipelineError::ModelAbsent)?;
        let metadata = restored.metadata;
        let replaced = self.live.replace(Some(restored));
        *self.previous.borrow_mut() = replaced;
        Ok(metadata)
    }
}

// ─── File-backed store ────────────────────────────────────────────────────────

/// Model store rooted at a data directory.
pub struct FileModelStore {
    dir: PathBuf,
}

impl FileModelStore {
    /// Create the store, creating the directory if it doesn't exist.
    pub fn new(dir: impl Into<PathBuf>) -> PipelineResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| storage_error(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    pub fn previous_path(&self) -> PathBuf {
        self.dir.join(PREVIOUS_FILE)
    }

    /// Save the training configuration next to the model.
    pub fn save_config(&self, cfg: &TrainConfig) -> PipelineResult<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)
            .map_err(|e| storage_error(&path, e))?;
        write_atomic(&path, json.as_bytes()).map_err(|e| storage_error(&path, e))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Load the configuration of the latest run, if any.
    pub fn load_config(&self) -> PipelineResult<Option<TrainConfig>> {
        let path = self.dir.join(CONFIG_FILE);
        let json = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error(&path, e)),
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| storage_error(&path, e))
    }

    /// Read and validate one artifact file. A missing file is Ok(None);
    /// anything unreadable or unusable is ArtifactCorrupt.
    fn read_artifact(path: &Path) -> PipelineResult<Option<ModelArtifact>> {
        let json = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(corrupt(path, e)),
        };
        let artifact: ModelArtifact = serde_json::from_str(&json).map_err(|e| corrupt(path, e))?;
        artifact.model.check_contract().map_err(|reason| corrupt(path, reason))?;
        Ok(Some(artifact))
    }

    fn write_artifact(path: &Path, artifact: &ModelArtifact) -> PipelineResult<()> {
        let json = serde_json::to_string_pretty(artifact).map_err(|e| storage_error(path, e))?;
        write_atomic(path, json.as_bytes()).map_err(|e| storage_error(path, e))
    }
}

impl ModelStore for FileModelStore {
    fn save(
        &self,
        model:  &TrainedModel,
        report: Option<&EvaluationReport>,
    ) -> PipelineResult<ArtifactMetadata> {
        let live_path = self.model_path();
        let prev_path = self.previous_path();

        // A corrupt live file is replaced, but never moved into the rollback slot
        let live = Self::read_artifact(&live_path).unwrap_or_else(|e| {
            tracing::warn!("Replacing unreadable model artifact: {e}");
            None
        });
        let previous = Self::read_artifact(&prev_path).unwrap_or(None);

        let metadata = next_metadata(live.as_ref(), previous.as_ref());
        let artifact = build_artifact(metadata, model, report);

        if let Some(current) = &live {
            Self::write_artifact(&prev_path, current)?;
        }
        Self::write_artifact(&live_path, &artifact)?;

        tracing::info!(
            "Published model version {} to '{}'",
            metadata.version,
            live_path.display()
        );
        Ok(metadata)
    }

    fn load(&self) -> PipelineResult<Option<ModelArtifact>> {
        Self::read_artifact(&self.model_path())
    }

    fn rollback(&self) -> PipelineResult<ArtifactMetadata> {
        let live_path = self.model_path();
        let prev_path = self.previous_path();

        let restored = Self::read_artifact(&prev_path)?.ok_or(PipelineError::ModelAbsent)?;
        let current  = Self::read_artifact(&live_path).unwrap_or(None);

        match &current {
            Some(current) => Self::write_artifact(&prev_path, current)?,
            None => fs::remove_file(&prev_path).map_err(|e| storage_error(&prev_path, e))?,
        }
        Self::write_artifact(&live_path, &restored)?;

        tracing::info!("Rolled back to model version {}", restored.metadata.version);
        Ok(restored.metadata)
    }
}

fn corrupt(path: &Path, reason: impl ToString) -> PipelineError {
    PipelineError::ArtifactCorrupt {
        path:   path.display().to_string(),
        reason: reason.to_string(),
    }
}

fn storage_error(path: &Path, reason: impl ToString) -> PipelineError {
    PipelineError::Storage {
        path:   path.display().to_string(),
        reason: reason.to_string(),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::student::FeatureVector;

    fn model(bias: f64) -> TrainedModel {
        TrainedModel::new([0.1, 0.05, 1.0], bias)
    }

    fn sample_inputs() -> Vec<FeatureVector> {
        vec![
            FeatureVector::new(90.0, 80.0, 3.5),
            FeatureVector::new(40.0, 30.0, 1.5),
            FeatureVector::new(75.0, 65.0, 2.8),
            FeatureVector::new(0.0, 0.0, 0.0),
            FeatureVector::new(100.0, 100.0, 4.0),
        ]
    }

    #[test]
    fn test_empty_store_loads_none() {
        let dir   = tempfile::tempdir().unwrap();
        let store = FileModelStore::new(dir.path()).unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_round_trip_preserves_predictions() {
        let dir   = tempfile::tempdir().unwrap();
        let store = FileModelStore::new(dir.path()).unwrap();
        let m     = model(-15.0);

        let meta   = store.save(&m, None).unwrap();
        let loaded = store.load().unwrap().unwrap();

        assert_eq!(meta.version, 1);
        assert_eq!(loaded.metadata, meta);
        for fv in sample_inputs() {
            assert_eq!(loaded.model.predict(&fv), m.predict(&fv));
            assert_eq!(loaded.model.pass_probability(&fv), m.pass_probability(&fv));
        }
        assert!(!dir.path().join("model.json.tmp").exists());
    }

    #[test]
    fn test_versions_increase_and_previous_is_kept() {
        let dir   = tempfile::tempdir().unwrap();
        let store = FileModelStore::new(dir.path()).unwrap();

        assert_eq!(store.save(&model(-15.0), None).unwrap().version, 1);
        assert_eq!(store.save(&model(-14.0), None).unwrap().version, 2);

        let prev = FileModelStore::read_artifact(&store.previous_path()).unwrap().unwrap();
        assert_eq!(prev.metadata.version, 1);
        assert_eq!(prev.model.bias, -15.0);
    }

    #[test]
    fn test_corrupt_artifact_is_reported() {
        let dir   = tempfile::tempdir().unwrap();
        let store = FileModelStore::new(dir.path()).unwrap();
        fs::write(store.model_path(), "{ not json").unwrap();

        assert!(matches!(store.load(), Err(PipelineError::ArtifactCorrupt { .. })));
    }

    #[test]
    fn test_reordered_features_are_corrupt() {
        let dir   = tempfile::tempdir().unwrap();
        let store = FileModelStore::new(dir.path()).unwrap();
        let mut m = model(-15.0);
        m.feature_order.reverse();
        store.save(&m, None).unwrap();

        assert!(matches!(store.load(), Err(PipelineError::ArtifactCorrupt { .. })));
    }

    #[test]
    fn test_rollback_swaps_slots() {
        let dir   = tempfile::tempdir().unwrap();
        let store = FileModelStore::new(dir.path()).unwrap();

        assert!(matches!(store.rollback(), Err(PipelineError::ModelAbsent)));

        store.save(&model(-15.0), None).unwrap();
        store.save(&model(-14.0), None).unwrap();

        assert_eq!(store.rollback().unwrap().version, 1);
        assert_eq!(store.load().unwrap().unwrap().model.bias, -15.0);

        assert_eq!(store.rollback().unwrap().version, 2);
        assert_eq!(store.load().unwrap().unwrap().model.bias, -14.0);

        // Saving after a rollback still gets a fresh version number
        store.rollback().unwrap();
        assert_eq!(store.save(&model(-13.0), None).unwrap().version, 3);
    }

    #[test]
    fn test_config_round_trip() {
        let dir   = tempfile::tempdir().unwrap();
        let store = FileModelStore::new(dir.path()).unwrap();
        assert!(store.load_config().unwrap().is_none());

        let cfg = TrainConfig { seed: 7, ..TrainConfig::default() };
        store.save_config(&cfg).unwrap();
        assert_eq!(store.load_config().unwrap().unwrap().seed, 7);
    }

    #[test]
    fn test_in_memory_rollback() {
        let store = InMemoryModelStore::new();
        assert!(matches!(store.rollback(), Err(PipelineError::ModelAbsent)));

        store.save(&model(-15.0), None).unwrap();
        store.save(&model(-14.0), None).unwrap();
        assert_eq!(store.rollback().unwrap().version, 1);
        assert_eq!(store.load().unwrap().unwrap().model.bias, -15.0);
        assert_eq!(store.save(&model(-13.0), None).unwrap().version, 3);
    }
}
