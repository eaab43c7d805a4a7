// ============================================================
// Layer 5 — Holdout Evaluation
// ============================================================
// Scores a fitted model on the holdout partition.
//
// Confusion matrix layout (rows = actual, columns = predicted):
//
//                  Predicted Fail   Predicted Pass
//   Actual Fail         TN               FP
//   Actual Pass         FN               TP
//
// Per-class precision / recall / F1 treat that class as the
// positive one. A ratio with a zero denominator is reported as
// 0.0 rather than NaN so the report stays comparable across runs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::student::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// counts[actual][predicted], index 0 = Fail, 1 = Pass
    pub counts: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    pub fn from_outcomes(actual: &[Outcome], predicted: &[Outcome]) -> Self {
        let mut counts = [[0usize; 2]; 2];
        for (&a, &p) in actual.iter().zip(predicted) {
            counts[a as usize][p as usize] += 1;
        }
        Self { counts }
    }

    pub fn true_negatives(&self)  -> usize { self.counts[0][0] }
    pub fn false_positives(&self) -> usize { self.counts[0][1] }
    pub fn false_negatives(&self) -> usize { self.counts[1][0] }
    pub fn true_positives(&self)  -> usize { self.counts[1][1] }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Precision, recall and F1 with `class` as the positive label
    pub fn class_metrics(&self, class: Outcome) -> ClassMetrics {
        let c = class as usize;
        let o = 1 - c;
        let tp = self.counts[c][c];
        let fp = self.counts[o][c];
        let fn_ = self.counts[c][o];

        let precision = ratio(tp, tp + fp);
        let recall    = ratio(tp, tp + fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        ClassMetrics { precision, recall, f1, support: tp + fn_ }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    /// Number of holdout rows whose actual class this is
    pub support:   usize,
}

/// Holdout metrics for one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy:     f64,
    pub confusion:    ConfusionMatrix,
    pub fail:         ClassMetrics,
    pub pass:         ClassMetrics,
    pub macro_avg:    ClassMetrics,
    pub weighted_avg: ClassMetrics,
    pub train_size:   usize,
    pub holdout_size: usize,
}

impl EvaluationReport {
    pub fn from_predictions(actual: &[Outcome], predicted: &[Outcome], train_size: usize) -> Self {
        let confusion = ConfusionMatrix::from_outcomes(actual, predicted);
        let total     = confusion.total();
        let accuracy  = ratio(confusion.true_negatives() + confusion.true_positives(), total);

        let fail = confusion.class_metrics(Outcome::Fail);
        let pass = confusion.class_metrics(Outcome::Pass);

        let macro_avg = ClassMetrics {
            precision: (fail.precision + pass.precision) / 2.0,
            recall:    (fail.recall + pass.recall) / 2.0,
            f1:        (fail.f1 + pass.f1) / 2.0,
            support:   total,
        };

        let weigh = |a: f64, b: f64| {
            if total == 0 {
                0.0
            } else {
                (a * fail.support as f64 + b * pass.support as f64) / total as f64
            }
        };
        let weighted_avg = ClassMetrics {
            precision: weigh(fail.precision, pass.precision),
            recall:    weigh(fail.recall, pass.recall),
            f1:        weigh(fail.f1, pass.f1),
            support:   total,
        };

        Self {
            accuracy,
            confusion,
            fail,
            pass,
            macro_avg,
            weighted_avg,
            train_size,
            holdout_size: total,
        }
    }
}

/// Plain-text classification report
impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Accuracy: {:.2}% ({} holdout rows, {} training rows)",
            self.accuracy * 100.0, self.holdout_size, self.train_size)?;
        writeln!(f)?;
        writeln!(f, "Confusion matrix     Predicted Fail  Predicted Pass")?;
        writeln!(f, "  Actual Fail        {:>14}  {:>14}",
            self.confusion.true_negatives(), self.confusion.false_positives())?;
        writeln!(f, "  Actual Pass        {:>14}  {:>14}",
            self.confusion.false_negatives(), self.confusion.true_positives())?;
        writeln!(f)?;
        writeln!(f, "{:>14} {:>10} {:>10} {:>10} {:>10}", "", "precision", "recall", "f1-score", "support")?;
        let rows = [
            ("Fail", &self.fail),
            ("Pass", &self.pass),
            ("macro avg", &self.macro_avg),
            ("weighted avg", &self.weighted_avg),
        ];
        for (name, m) in rows {
            writeln!(f, "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, m.precision, m.recall, m.f1, m.support)?;
        }
        Ok(())
    }
}
