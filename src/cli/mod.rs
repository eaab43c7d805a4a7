// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Six commands are supported:
//   1. `ingest`   — load a CSV into the record store
//   2. `train`    — fit, evaluate and publish the classifier
//   3. `predict`  — score ad-hoc indicator values
//   4. `assess`   — score a stored student by ID, or every
//                   stored student with --all
//   5. `summary`  — class distribution and indicator means
//   6. `rollback` — restore the previous model artifact
//
// Every command works inside one data directory (--data-dir).
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{AssessArgs, Commands, IngestArgs, OutputArgs, PredictArgs, TrainArgs};

use crate::application::predict_use_case::{Assessment, PredictionOutcome, RiskReport, RosterOutcome};
use crate::domain::student::PredictionInput;
use crate::infra::{model_store::FileModelStore, record_store::JsonRecordStore};

#[derive(Parser, Debug)]
#[command(
    name = "student-risk",
    version = "0.1.0",
    about = "Predict student pass/fail outcomes and give risk-tiered advice."
)]
pub struct Cli {
    /// Directory holding records, the model artifact and the training log
    #[arg(long, global = true, default_value = "data")]
    pub data_dir: String,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        let Cli { data_dir, command } = self;
        match command {
            Commands::Ingest(args)  => run_ingest(&data_dir, &args),
            Commands::Train(args)   => run_train(data_dir, args),
            Commands::Predict(args) => run_predict(&data_dir, &args),
            Commands::Assess(args)  => run_assess(&data_dir, &args),
            Commands::Summary(args) => run_summary(&data_dir, args),
            Commands::Rollback      => run_rollback(&data_dir),
        }
    }
}

fn run_ingest(data_dir: &str, args: &IngestArgs) -> Result<()> {
    use crate::application::ingest_use_case::IngestUseCase;
    use crate::data::loader::CsvLoader;

    let store  = JsonRecordStore::new(data_dir)?;
    let report = IngestUseCase::new(&store).execute(&CsvLoader::new(&args.file))?;

    println!(
        "Ingested {} rows ({} Pass, {} Fail, {} without a usable final-term mark).",
        report.written, report.pass, report.fail, report.unlabelled
    );
    Ok(())
}

/// Converts CLI args into a TrainConfig and hands off to Layer 2.
fn run_train(data_dir: String, args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::{TrainConfig, TrainUseCase};

    tracing::info!("Training on rows in: {}", data_dir);
    let cfg = TrainConfig { data_dir, ..args.into() };
    let run = TrainUseCase::new(cfg).execute()?;

    println!("{}", run.report);
    if !run.converged {
        println!("Note: the fit stopped at the iteration cap ({} steps).", run.iterations);
    }
    println!("Published model version {}.", run.metadata.version);
    Ok(())
}

fn run_predict(data_dir: &str, args: &PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let models  = FileModelStore::new(data_dir)?;
    let records = JsonRecordStore::new(data_dir)?;
    let outcome = PredictUseCase::new(&models, &records).predict(&PredictionInput::from(args))?;
    print_outcome(&outcome, args.output)
}

fn run_assess(data_dir: &str, args: &AssessArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let models  = FileModelStore::new(data_dir)?;
    let records = JsonRecordStore::new(data_dir)?;
    let use_case = PredictUseCase::new(&models, &records);

    match &args.student_id {
        Some(id) => print_outcome(&use_case.assess(id)?, args.output),
        None => match use_case.assess_all()? {
            RosterOutcome::NoModel { reason } => {
                println!("No risk report available: {reason}");
                Ok(())
            }
            RosterOutcome::Report(report) if args.output.json => {
                println!("{}", serde_json::to_string_pretty(&report)?);
                Ok(())
            }
            RosterOutcome::Report(report) => {
                print_report(&report);
                Ok(())
            }
        },
    }
}

fn run_summary(data_dir: &str, args: OutputArgs) -> Result<()> {
    use crate::application::summary_use_case::SummaryUseCase;

    let store   = JsonRecordStore::new(data_dir)?;
    let summary = SummaryUseCase::new(&store).execute()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{summary}");
    }
    Ok(())
}

fn run_rollback(data_dir: &str) -> Result<()> {
    use crate::domain::traits::ModelStore;

    let meta = FileModelStore::new(data_dir)?.rollback()?;
    println!(
        "Model version {} (trained {}) is live again.",
        meta.version,
        meta.trained_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    Ok(())
}

fn print_outcome(outcome: &PredictionOutcome, output: OutputArgs) -> Result<()> {
    let assessment = match outcome {
        PredictionOutcome::Scored(a) => a,
        PredictionOutcome::NoModel { reason } => {
            println!("No prediction available: {reason}");
            return Ok(());
        }
    };

    if output.json {
        println!("{}", serde_json::to_string_pretty(assessment)?);
    } else {
        print_assessment(assessment);
    }
    Ok(())
}

fn print_assessment(a: &Assessment) {
    if let Some(id) = &a.student_id {
        println!("Student:    {id}");
    }
    println!(
        "Prediction: {} (pass probability {:.2}%)",
        a.prediction.outcome,
        a.prediction.pass_probability * 100.0
    );
    println!("Risk:       {}", a.risk);
    println!("Model:      version {}", a.model_version);
    println!("\nRecommendations:");
    for advice in &a.advice {
        println!("  - {}", advice.message);
    }
}

fn print_report(r: &RiskReport) {
    println!("Model:  version {}", r.model_version);
    println!(
        "Tiers:  {} High, {} Medium, {} Low",
        r.counts.high, r.counts.medium, r.counts.low
    );
    println!();
    println!("{:<12} {:<12} {:>10}  {}", "Student", "Risk", "P(pass)", "Prediction");
    for a in &r.assessments {
        println!(
            "{:<12} {:<12} {:>9.2}%  {}",
            a.student_id.as_deref().unwrap_or("-"),
            a.risk.to_string(),
            a.prediction.pass_probability * 100.0,
            a.prediction.outcome
        );
    }
    if !r.skipped.is_empty() {
        println!("\nSkipped {} rows:", r.skipped.len());
        for s in &r.skipped {
            println!("  {}: {}", s.student_id, s.reason);
        }
    }
}
