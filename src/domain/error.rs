// ============================================================
// Layer 3 — Pipeline Error Taxonomy
// ============================================================
// Every failure the prediction pipeline can report to a caller.
// Library layers return Result<T, PipelineError>; the CLI wraps
// these in anyhow for context when printing.
//
// Reference: Rust Book §9 (Recoverable Errors with Result)
//            thiserror crate documentation

use thiserror::Error;

use crate::domain::student::Outcome;

/// Shorthand used across the data, ml and infra layers.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Input rows, columns or values that cannot be used as given
    #[error("data validation failed: {0}")]
    DataValidation(String),

    /// Nothing survived cleaning
    #[error("no usable rows remain after cleaning ({dropped} dropped); upload complete records")]
    EmptyDataset { dropped: usize },

    /// A binary classifier needs both pass and fail examples
    #[error("only one class present in the outcome column (all {class}); cannot train a classifier")]
    SingleClass { class: Outcome },

    /// No artifact has been published yet
    #[error("no trained model is available; train one first")]
    ModelAbsent,

    /// The artifact exists but cannot be used
    #[error("model artifact '{path}' is unreadable: {reason}")]
    ArtifactCorrupt { path: String, reason: String },

    /// A required feature was not supplied at inference time
    #[error("missing feature: {field}")]
    MissingFeature { field: &'static str },

    /// A store file could not be read or written
    #[error("storage error at '{path}': {reason}")]
    Storage { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// True for the two "nothing to predict with" cases
    pub fn is_model_unavailable(&self) -> bool {
        matches!(self, Self::ModelAbsent | Self::ArtifactCorrupt { .. })
    }
}
