// ============================================================
// Layer 3 — Student Domain Types
// ============================================================
// The records the pipeline consumes and the feature triple the
// model is trained on.
//
// Raw indicator cells are kept as FieldValue rather than f64:
// an uploaded sheet may contain "absent", "" or "n/a" in a marks
// column, and those cells must survive storage untouched so that
// Data Preparation can decide what to drop.
//
// Final-term marks are never a feature. The outcome label is
// derived from them, so feeding them to the model would leak the
// answer into the input.
//
// Reference: Rust Book §5 (Structs), §6 (Enums and Pattern Matching)

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::error::{PipelineError, PipelineResult};

/// Final-term mark at or above which a student counts as passing
pub const PASS_MARK: f64 = 60.0;

/// Fixed feature ordering shared by training and inference
pub const FEATURE_NAMES: [&str; 3] = ["attendance", "mid_term_marks", "previous_gpa"];

/// Accepted range per feature, in FEATURE_NAMES order.
/// Enforced when training rows are prepared and when inputs are scored.
pub const FEATURE_RANGES: [(f64, f64); 3] = [(0.0, 100.0), (0.0, 100.0), (0.0, 4.0)];

// ─── FieldValue ───────────────────────────────────────────────────────────────
/// One raw indicator cell as it arrived from ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

impl FieldValue {
    /// Build a cell from CSV text. Blank → Missing, parseable → Number,
    /// anything else is kept verbatim as Text.
    pub fn from_cell(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(v) => Self::Number(v),
            Err(_) => Self::Text(raw.to_string()),
        }
    }

    /// Numeric coercion: non-numeric text, NaN and infinities are missing.
    pub fn as_number(&self) -> Option<f64> {
        let v = match self {
            Self::Number(v) => *v,
            Self::Text(s)   => s.trim().parse::<f64>().ok()?,
            Self::Missing   => return None,
        };
        v.is_finite().then_some(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

// ─── Outcome ──────────────────────────────────────────────────────────────────
/// Binary course outcome. Fail sorts before Pass (label 0 / 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Fail,
    Pass,
}

impl Outcome {
    pub fn from_final_marks(final_term_marks: f64) -> Self {
        if final_term_marks >= PASS_MARK { Self::Pass } else { Self::Fail }
    }

    /// Numeric label used in the model's target vector
    pub fn label(self) -> f64 {
        match self {
            Self::Fail => 0.0,
            Self::Pass => 1.0,
        }
    }
}

impl From<bool> for Outcome {
    fn from(passed: bool) -> Self {
        if passed { Self::Pass } else { Self::Fail }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fail => write!(f, "Fail"),
            Self::Pass => write!(f, "Pass"),
        }
    }
}

// ─── StudentRecord ────────────────────────────────────────────────────────────
/// One row of the Record Store, keyed by `student_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub student_id: String,
    pub name:       String,

    /// Attendance percentage, expected in [0, 100]
    #[serde(default)]
    pub attendance: FieldValue,

    /// Mid-term marks, expected in [0, 100]
    #[serde(default)]
    pub mid_term_marks: FieldValue,

    /// Final-term marks, expected in [0, 100]; source of the label only
    #[serde(default)]
    pub final_term_marks: FieldValue,

    /// Previous GPA, expected in [0, 4]
    #[serde(default)]
    pub previous_gpa: FieldValue,

    /// Derived at ingestion as final_term_marks >= 60.
    /// None when the final-term cell is not numeric.
    #[serde(default)]
    pub outcome: Option<Outcome>,
}

impl StudentRecord {
    /// Create a record and derive its outcome from the final-term cell
    pub fn new(
        student_id:       impl Into<String>,
        name:             impl Into<String>,
        attendance:       impl Into<FieldValue>,
        mid_term_marks:   impl Into<FieldValue>,
        final_term_marks: impl Into<FieldValue>,
        previous_gpa:     impl Into<FieldValue>,
    ) -> Self {
        let final_term_marks = final_term_marks.into();
        let outcome = final_term_marks.as_number().map(Outcome::from_final_marks);
        Self {
            student_id: student_id.into(),
            name:       name.into(),
            attendance:     attendance.into(),
            mid_term_marks: mid_term_marks.into(),
            final_term_marks,
            previous_gpa:   previous_gpa.into(),
            outcome,
        }
    }

    /// The three feature cells in FEATURE_NAMES order
    pub fn feature_cells(&self) -> [&FieldValue; 3] {
        [&self.attendance, &self.mid_term_marks, &self.previous_gpa]
    }

    /// Coerced feature vector, or None if any feature is not numeric
    pub fn features(&self) -> Option<FeatureVector> {
        Some(FeatureVector {
            attendance:     self.attendance.as_number()?,
            mid_term_marks: self.mid_term_marks.as_number()?,
            previous_gpa:   self.previous_gpa.as_number()?,
        })
    }

    /// Inference input built from this record's raw cells
    pub fn prediction_input(&self) -> PredictionInput {
        PredictionInput {
            attendance:     Some(self.attendance.clone()),
            mid_term_marks: Some(self.mid_term_marks.clone()),
            previous_gpa:   Some(self.previous_gpa.clone()),
        }
    }
}

// ─── FeatureVector ────────────────────────────────────────────────────────────
/// Validated model input: (attendance, mid-term marks, previous GPA).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub attendance:     f64,
    pub mid_term_marks: f64,
    pub previous_gpa:   f64,
}

impl FeatureVector {
    pub fn new(attendance: f64, mid_term_marks: f64, previous_gpa: f64) -> Self {
        Self { attendance, mid_term_marks, previous_gpa }
    }

    /// Values in FEATURE_NAMES order
    pub fn to_array(&self) -> [f64; 3] {
        [self.attendance, self.mid_term_marks, self.previous_gpa]
    }

    /// Index of the first feature outside its FEATURE_RANGES bounds
    pub fn first_out_of_range(&self) -> Option<usize> {
        self.to_array()
            .iter()
            .zip(FEATURE_RANGES)
            .position(|(v, (lo, hi))| !(lo..=hi).contains(v))
    }
}

// ─── PredictionInput ──────────────────────────────────────────────────────────
/// Unvalidated inference request. Any field may be absent or non-numeric
/// until `validate` turns it into a FeatureVector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    #[serde(default)]
    pub attendance:     Option<FieldValue>,
    #[serde(default)]
    pub mid_term_marks: Option<FieldValue>,
    #[serde(default)]
    pub previous_gpa:   Option<FieldValue>,
}

impl PredictionInput {
    pub fn from_numbers(attendance: f64, mid_term_marks: f64, previous_gpa: f64) -> Self {
        Self {
            attendance:     Some(FieldValue::Number(attendance)),
            mid_term_marks: Some(FieldValue::Number(mid_term_marks)),
            previous_gpa:   Some(FieldValue::Number(previous_gpa)),
        }
    }

    /// Check presence, numeric type and range of every feature.
    /// Fields are checked in FEATURE_NAMES order, so the first
    /// offending field is the one reported.
    pub fn validate(&self) -> PipelineResult<FeatureVector> {
        let cells = [&self.attendance, &self.mid_term_marks, &self.previous_gpa];
        let mut values = [0.0f64; 3];

        for (i, cell) in cells.iter().enumerate() {
            let field = FEATURE_NAMES[i];
            let value = match cell {
                None | Some(FieldValue::Missing) => {
                    return Err(PipelineError::MissingFeature { field });
                }
                Some(v) => v.as_number().ok_or_else(|| {
                    PipelineError::DataValidation(format!("feature '{field}' is not numeric: {v:?}"))
                })?,
            };

            let (lo, hi) = FEATURE_RANGES[i];
            if !(lo..=hi).contains(&value) {
                return Err(PipelineError::DataValidation(format!(
                    "feature '{field}' = {value} is outside [{lo}, {hi}]"
                )));
            }
            values[i] = value;
        }

        Ok(FeatureVector::new(values[0], values[1], values[2]))
    }
}
