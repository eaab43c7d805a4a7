// ============================================================
// Layer 4 — Stratified Train/Holdout Splitter
// ============================================================
// Splits row indices into two sets:
//   - Training set: used to fit the classifier
//   - Holdout set:  used only for the EvaluationReport
//
// The split is stratified: each class is shuffled and divided
// on its own, so Pass/Fail appear in both partitions in roughly
// the same ratio as in the full dataset.
//
// Per class with n_c rows, the holdout takes
//   round(n_c * holdout_fraction), clamped to [1, n_c - 1]
// so every class is represented on both sides. That needs at
// least two rows per class.
//
// The shuffle uses a StdRng seeded from the config, so the same
// input and seed always produce the same partition.
//
// Reference: rand crate documentation (SeedableRng, SliceRandom)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::student::Outcome;

/// Row indices of each partition, in ascending order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train:   Vec<usize>,
    pub holdout: Vec<usize>,
}

/// Stratified split of `labels` into (train, holdout) indices.
pub fn stratified_split(
    labels:           &[Outcome],
    holdout_fraction: f64,
    seed:             u64,
) -> PipelineResult<Split> {
    if !(holdout_fraction > 0.0 && holdout_fraction < 1.0) {
        return Err(PipelineError::DataValidation(format!(
            "holdout fraction must be in (0, 1), got {holdout_fraction}"
        )));
    }

    let mut rng     = StdRng::seed_from_u64(seed);
    let mut train   = Vec::new();
    let mut holdout = Vec::new();

    // Fixed class order (Fail, then Pass) keeps the RNG stream stable
    for class in [Outcome::Fail, Outcome::Pass] {
        let mut indices: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, o)| **o == class)
            .map(|(i, _)| i)
            .collect();

        if indices.is_empty() {
            continue;
        }
        if indices.len() < 2 {
            return Err(PipelineError::DataValidation(format!(
                "class {class} has {} row(s); a stratified split needs at least 2 per class",
                indices.len()
            )));
        }

        indices.shuffle(&mut rng);

        let n_c    = indices.len();
        let n_hold = ((n_c as f64) * holdout_fraction).round() as usize;
        let n_hold = n_hold.clamp(1, n_c - 1);

        holdout.extend_from_slice(&indices[..n_hold]);
        train.extend_from_slice(&indices[n_hold..]);
    }

    train.sort_unstable();
    holdout.sort_unstable();

    tracing::debug!(
        "Stratified split: {} training, {} holdout",
        train.len(),
        holdout.len(),
    );

    Ok(Split { train, holdout })
}
