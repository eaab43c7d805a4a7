// ============================================================
// Layer 6 — Training Log
// ============================================================
// Records one CSV row per successful training run.
//
// Failed runs publish nothing and log nothing here; their
// reason goes to the tracing output instead.
//
// Output file: data/training_log.csv
//
// Example CSV output:
//   version,trained_at,train_rows,holdout_rows,accuracy,iterations,converged
//   1,2024-03-01T10:15:02.118Z,32,8,0.875000,7,true
//   2,2024-03-02T09:01:44.530Z,40,10,0.900000,8,true
//
// How to read the log:
//   - accuracy is measured on the stratified holdout only
//   - converged=false means the fit hit its iteration cap; the
//     published weights are the last iterate
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::ml::trainer::TrainingRun;

pub const TRAINING_LOG_FILE: &str = "training_log.csv";

const HEADER: &str = "version,trained_at,train_rows,holdout_rows,accuracy,iterations,converged";

/// One row of the training log
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub version:      u64,
    pub trained_at:   DateTime<Utc>,
    pub train_rows:   usize,
    pub holdout_rows: usize,
    /// Holdout accuracy in [0.0, 1.0]
    pub accuracy:     f64,
    pub iterations:   usize,
    pub converged:    bool,
}

impl From<&TrainingRun> for RunRecord {
    fn from(run: &TrainingRun) -> Self {
        Self {
            version:      run.metadata.version,
            trained_at:   run.metadata.trained_at,
            train_rows:   run.report.train_size,
            holdout_rows: run.report.holdout_size,
            accuracy:     run.report.accuracy,
            iterations:   run.iterations,
            converged:    run.converged,
        }
    }
}

/// Appends training runs to a CSV file.
pub struct TrainingLog {
    csv_path: PathBuf,
}

impl TrainingLog {
    /// Open the log, writing the CSV header if the file is new.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join(TRAINING_LOG_FILE);
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created training log: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one run as a new row.
    pub fn log(&self, r: &RunRecord) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{},{},{},{:.6},{},{}",
            r.version,
            r.trained_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            r.train_rows,
            r.holdout_rows,
            r.accuracy,
            r.iterations,
            r.converged,
        )?;

        tracing::debug!("Logged training run v{}: accuracy={:.4}", r.version, r.accuracy);
        Ok(())
    }
}
