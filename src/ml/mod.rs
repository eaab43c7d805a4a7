// ============================================================
// Layer 5 — ML / Model Layer
// ============================================================
// All numerical model code lives here.
//
//   model.rs      — TrainedModel (3 weights + bias + feature
//                   order), the persisted ModelArtifact envelope
//                   and the logistic function
//
//   trainer.rs    — Newton–Raphson fit of an L2-regularised
//                   logistic regression, stratified holdout,
//                   evaluation and publishing to the ModelStore
//
//   evaluation.rs — Accuracy, confusion matrix and per-class
//                   precision / recall / F1 on the holdout
//
//   predictor.rs  — Loads the live artifact and scores inputs

/// Logistic model parameters and artifact envelope
pub mod model;

/// Fit, evaluate, publish
pub mod trainer;

/// Holdout metrics
pub mod evaluation;

/// Inference over the live artifact
pub mod predictor;
