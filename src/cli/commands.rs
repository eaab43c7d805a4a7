// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the subcommands and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → u64, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;
use crate::domain::student::{FieldValue, PredictionInput};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload student rows from a CSV file into the record store
    Ingest(IngestArgs),

    /// Train the pass/fail classifier on the stored rows
    Train(TrainArgs),

    /// Predict pass/fail and risk for ad-hoc indicator values
    Predict(PredictArgs),

    /// Predict pass/fail and risk for one stored student, or all of them
    Assess(AssessArgs),

    /// Show the outcome distribution and indicator means
    Summary(OutputArgs),

    /// Restore the model that was live before the last training run
    Rollback,
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// CSV with columns student_id, name, attendance, mid_term_marks,
    /// final_term_marks, previous_gpa
    #[arg(long)]
    pub file: PathBuf,
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Fraction of each class held out for evaluation
    #[arg(long, default_value_t = 0.2)]
    pub holdout_fraction: f64,

    /// Seed for the stratified shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Inverse L2 regularisation strength
    #[arg(long, default_value_t = 1.0)]
    pub c: f64,

    /// Cap on Newton iterations
    #[arg(long, default_value_t = 1000)]
    pub max_iter: usize,

    /// Stop once every gradient component is below this
    #[arg(long, default_value_t = 1e-6)]
    pub tolerance: f64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The data directory is a global flag and is filled in by the caller.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            holdout_fraction: a.holdout_fraction,
            seed:             a.seed,
            c:                a.c,
            max_iter:         a.max_iter,
            tolerance:        a.tolerance,
            ..TrainConfig::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Attendance percentage, 0–100
    #[arg(long)]
    pub attendance: Option<String>,

    /// Mid-term marks, 0–100
    #[arg(long)]
    pub mid_term_marks: Option<String>,

    /// Previous GPA, 0–4
    #[arg(long)]
    pub previous_gpa: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Raw strings go through the same cell coercion as CSV input, so a
/// missing flag and a non-numeric value are reported differently.
impl From<&PredictArgs> for PredictionInput {
    fn from(a: &PredictArgs) -> Self {
        let cell = |v: &Option<String>| v.as_deref().map(FieldValue::from_cell);
        PredictionInput {
            attendance:     cell(&a.attendance),
            mid_term_marks: cell(&a.mid_term_marks),
            previous_gpa:   cell(&a.previous_gpa),
        }
    }
}

#[derive(Args, Debug)]
pub struct AssessArgs {
    /// ID of a student in the record store
    #[arg(long, required_unless_present = "all", conflicts_with = "all")]
    pub student_id: Option<String>,

    /// Score every stored student, highest risk first
    #[arg(long)]
    pub all: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct OutputArgs {
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}
