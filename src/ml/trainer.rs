// ============================================================
// Layer 5 — Training
// ============================================================
// Fits an L2-regularised logistic regression and publishes it.
//
// Objective (minimised), with θ = [b, w1, w2, w3] and λ = 1/C:
//
//   J(θ) = Σ_i [ log(1 + e^{z_i}) − y_i z_i ] + (λ/2) ‖w‖²,
//   z_i  = b + w·x_i
//
// The intercept b is not penalised.
//
// Optimiser: damped Newton–Raphson.
//   g = Xᵀ(p − y) + λ D θ
//   H = Xᵀ diag(p(1 − p)) X + λ D        (D = diag(0, 1, 1, 1))
//   step Δ = H⁻¹ g, then backtracking on J until Armijo holds.
// Converged when max |g_j| < tolerance. If max_iter is reached
// first, the latest iterate is returned; every accepted step is
// non-increasing in J, so that is also the best one seen.
//
// run_training then evaluates on the holdout partition and saves
// through the ModelStore, which replaces the live artifact.

use ndarray::{s, Array1, Array2};

use crate::application::train_use_case::TrainConfig;
use crate::data::{dataset::Dataset, splitter::stratified_split};
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::student::FEATURE_NAMES;
use crate::domain::traits::ModelStore;
use crate::ml::evaluation::EvaluationReport;
use crate::ml::model::{sigmoid, ArtifactMetadata, TrainedModel};

/// Smallest backtracking factor tried before the step is abandoned
const MIN_STEP: f64 = 1e-10;

/// Armijo sufficient-decrease constant
const ARMIJO_C: f64 = 1e-4;

/// Relative slack on J so steps are not rejected over rounding noise
const OBJECTIVE_SLACK: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitParams {
    /// Inverse regularisation strength; larger C = weaker penalty
    pub c:         f64,
    pub max_iter:  usize,
    pub tolerance: f64,
}

impl Default for FitParams {
    fn default() -> Self {
        Self { c: 1.0, max_iter: 1000, tolerance: 1e-6 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub model:      TrainedModel,
    pub iterations: usize,
    pub converged:  bool,
    pub objective:  f64,
}

/// Everything one training run produced
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRun {
    pub model:      TrainedModel,
    pub report:     EvaluationReport,
    pub metadata:   ArtifactMetadata,
    pub iterations: usize,
    pub converged:  bool,
}

/// Split, fit, evaluate and publish.
pub fn run_training(
    cfg:     &TrainConfig,
    dataset: &Dataset,
    store:   &dyn ModelStore,
) -> PipelineResult<TrainingRun> {
    let split   = stratified_split(&dataset.outcomes(), cfg.holdout_fraction, cfg.seed)?;
    let train   = dataset.select(&split.train);
    let holdout = dataset.select(&split.holdout);
    tracing::info!("Split: {} train, {} holdout", train.len(), holdout.len());

    let fit = fit_logistic(train.features(), train.labels(), &cfg.fit_params())?;
    if fit.converged {
        tracing::info!("Converged after {} Newton steps (objective {:.6})", fit.iterations, fit.objective);
    } else {
        tracing::warn!(
            "Stopped after {} Newton steps without converging; using latest parameters (objective {:.6})",
            fit.iterations,
            fit.objective
        );
    }

    let predicted = fit.model.predict_matrix(holdout.features());
    let report    = EvaluationReport::from_predictions(&holdout.outcomes(), &predicted, train.len());
    tracing::info!("Holdout accuracy: {:.2}%", report.accuracy * 100.0);

    let metadata = store.save(&fit.model, Some(&report))?;
    tracing::info!("Published model version {}", metadata.version);

    Ok(TrainingRun {
        model: fit.model,
        report,
        metadata,
        iterations: fit.iterations,
        converged: fit.converged,
    })
}

/// Fit θ on an n×3 feature matrix and 0/1 labels.
pub fn fit_logistic(
    x:      &Array2<f64>,
    y:      &Array1<f64>,
    params: &FitParams,
) -> PipelineResult<FitResult> {
    let (n, d) = x.dim();
    if d != FEATURE_NAMES.len() {
        return Err(PipelineError::DataValidation(format!(
            "expected {} feature columns, got {d}",
            FEATURE_NAMES.len()
        )));
    }
    if n == 0 || n != y.len() {
        return Err(PipelineError::DataValidation(format!(
            "cannot fit on {n} rows with {} labels",
            y.len()
        )));
    }
    if !(params.c > 0.0 && params.c.is_finite()) {
        return Err(PipelineError::DataValidation(format!(
            "regularisation C must be positive, got {}",
            params.c
        )));
    }
    let lambda = 1.0 / params.c;

    // Leading column of ones carries the intercept
    let xa = Array2::from_shape_fn((n, d + 1), |(i, j)| if j == 0 { 1.0 } else { x[[i, j - 1]] });

    let mut theta = Array1::<f64>::zeros(d + 1);
    let mut obj   = objective(&xa, y, &theta, lambda);
    let mut iterations = 0;
    let mut converged  = false;

    while iterations < params.max_iter {
        let p    = xa.dot(&theta).mapv(sigmoid);
        let grad = gradient(&xa, y, &p, &theta, lambda);

        if grad.iter().all(|g| g.abs() < params.tolerance) {
            converged = true;
            break;
        }

        let hess = hessian(&xa, &p, lambda);
        let mut step = match solve(&hess, &grad) {
            Some(s) if s.dot(&grad) > 0.0 => s,
            // Singular or indefinite: fall back to plain gradient descent
            _ => grad.clone(),
        };

        // Backtracking line search
        let slope = step.dot(&grad);
        let slack = OBJECTIVE_SLACK * obj.abs().max(1.0);
        let mut t = 1.0;
        let mut next = &theta - &step;
        let mut next_obj = objective(&xa, y, &next, lambda);
        while !(next_obj <= obj - ARMIJO_C * t * slope + slack) && t > MIN_STEP {
            t *= 0.5;
            step.mapv_inplace(|v| v * 0.5);
            next = &theta - &step;
            next_obj = objective(&xa, y, &next, lambda);
        }

        iterations += 1;
        if t <= MIN_STEP {
            if iterations == 1 {
                // Nothing was learned; publishing θ = 0 would replace a real model
                return Err(PipelineError::DataValidation(
                    "line search made no progress from the initial parameters; \
                     check the feature values for extreme magnitudes"
                        .to_string(),
                ));
            }
            tracing::debug!("Line search stalled at step {iterations}");
            break;
        }

        theta = next;
        obj   = next_obj;
    }

    let model = TrainedModel::new([theta[1], theta[2], theta[3]], theta[0]);
    model.check_contract().map_err(PipelineError::DataValidation)?;

    Ok(FitResult { model, iterations, converged, objective: obj })
}

/// log(1 + e^z) without overflow
fn log1p_exp(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

fn objective(xa: &Array2<f64>, y: &Array1<f64>, theta: &Array1<f64>, lambda: f64) -> f64 {
    let z = xa.dot(theta);
    let nll: f64 = z.iter().zip(y).map(|(&z, &y)| log1p_exp(z) - y * z).sum();
    let penalty = theta.slice(s![1..]).mapv(|w| w * w).sum();
    nll + 0.5 * lambda * penalty
}

fn gradient(
    xa:     &Array2<f64>,
    y:      &Array1<f64>,
    p:      &Array1<f64>,
    theta:  &Array1<f64>,
    lambda: f64,
) -> Array1<f64> {
    let mut g = xa.t().dot(&(p - y));
    for j in 1..g.len() {
        g[j] += lambda * theta[j];
    }
    g
}

fn hessian(xa: &Array2<f64>, p: &Array1<f64>, lambda: f64) -> Array2<f64> {
    let (n, k) = xa.dim();
    let w = p.mapv(|pi| pi * (1.0 - pi));
    let weighted = Array2::from_shape_fn((n, k), |(i, j)| xa[[i, j]] * w[i]);
    let mut h = xa.t().dot(&weighted);
    for j in 1..k {
        h[[j, j]] += lambda;
    }
    h
}

/// Solve A·v = b by Gaussian elimination with partial pivoting.
/// None if A is (numerically) singular.
fn solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    let mut m = a.clone();
    let mut v = b.clone();

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| m[[i, col]].abs().total_cmp(&m[[j, col]].abs()))?;
        if m[[pivot, col]].abs() < 1e-12 {
            return None;
        }
        if pivot != col {
            for k in 0..n {
                m.swap([col, k], [pivot, k]);
            }
            v.swap(col, pivot);
        }
        for row in col + 1..n {
            let factor = m[[row, col]] / m[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                m[[row, k]] -= factor * m[[col, k]];
            }
            v[row] -= factor * v[col];
        }
    }

    for col in (0..n).rev() {
        let tail: f64 = (col + 1..n).map(|k| m[[col, k]] * v[k]).sum();
        v[col] = (v[col] - tail) / m[[col, col]];
    }

    v.iter().all(|x| x.is_finite()).then_some(v)
}
