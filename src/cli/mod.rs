//! diarisk CLI
//!
//! Commands for training the four scenarios, validating persisted
//! artifacts, and running single-row predictions.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::data::load_training_csv;
use crate::inference::{predict, ModelRegistry, PredictRequest};
use crate::pipeline::{run_validation, train_scenarios, TrainOptions};
use crate::scenario::{Mode, ScenarioKey};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}

fn accent(s: &str) -> ColoredString {
    s.truecolor(120, 170, 255)
}

fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}

fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

fn bad(s: &str) -> ColoredString {
    s.truecolor(230, 90, 80)
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "diarisk")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Diabetes-risk scenario training and serving")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train the four scenarios from a source CSV
    Train {
        /// Source CSV with Korean column names and the 당뇨 target
        #[arg(long)]
        csv: PathBuf,

        /// Artifact output directory
        #[arg(long)]
        out_dir: PathBuf,

        /// Also overwrite the legacy single-pair serving artifacts
        #[arg(long, default_value_t = false)]
        overwrite_runtime: bool,
    },

    /// Validate persisted artifacts against the per-scenario pass bars
    Validate {
        /// Source CSV used for training
        #[arg(long)]
        csv: PathBuf,

        /// Directory holding the trained artifacts
        #[arg(long)]
        artifacts: PathBuf,
    },

    /// Predict one row from a trained artifact directory
    Predict {
        /// Directory holding the trained artifacts
        #[arg(long)]
        artifacts: PathBuf,

        /// Input mode (detailed, simple)
        #[arg(long, default_value = "detailed")]
        mode: String,

        #[arg(long)]
        pregnancies: Option<f64>,
        #[arg(long)]
        glucose: Option<f64>,
        #[arg(long)]
        bmi: Option<f64>,
        #[arg(long)]
        age: Option<f64>,
    },

    /// Show source data information
    Info {
        /// Source CSV
        #[arg(long)]
        csv: PathBuf,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(csv: &PathBuf, out_dir: &PathBuf, overwrite_runtime: bool) -> anyhow::Result<()> {
    section("Train");

    step_run("Training four scenarios");
    let start = Instant::now();
    let manifest = train_scenarios(&TrainOptions {
        csv: csv.clone(),
        out_dir: out_dir.clone(),
        overwrite_runtime,
    })?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    println!(
        "  {:<6} {:<28} {:>10} {:>10}",
        muted("Key"),
        muted("Winner"),
        muted("Threshold"),
        muted("Test acc")
    );
    println!("  {}", dim(&"─".repeat(58)));

    for key in ScenarioKey::ALL {
        if let Some(entry) = manifest.scenarios.get(key.as_str()) {
            println!(
                "  {:<6} {:<28} {:>10.2} {:>10.4}",
                key.as_str().white(),
                entry.winner_model,
                entry.threshold,
                entry.metrics.test.accuracy
            );
        }
    }

    println!();
    println!(
        "  {} {}",
        ok("saved"),
        dim(&format!("{}", out_dir.display()))
    );
    println!();
    Ok(())
}

pub fn cmd_validate(csv: &PathBuf, artifacts: &PathBuf) -> anyhow::Result<()> {
    section("Validate");

    let report = run_validation(csv, artifacts)?;

    println!();
    println!(
        "  {:<6} {:>10} {:>10} {:>8} {:>8} {:>8}",
        muted("Key"),
        muted("Test acc"),
        muted("Bar"),
        muted("Prec"),
        muted("Recall"),
        muted("F1")
    );
    println!("  {}", dim(&"─".repeat(58)));

    for (key, result) in &report.results {
        let verdict = if result.passed { ok("PASS") } else { bad("FAIL") };
        println!(
            "  {:<6} {:>10.4} {:>10.2} {:>8.4} {:>8.4} {:>8.4}  {}",
            key.white(),
            result.test_accuracy,
            result.pass_accuracy_threshold,
            result.test_precision,
            result.test_recall,
            result.test_f1,
            verdict
        );
    }

    println!();
    if report.passed_all {
        println!("  {}", ok("all scenarios passed"));
    } else {
        println!("  {}", bad("one or more scenarios failed"));
    }
    println!();

    if !report.passed_all {
        anyhow::bail!("validation failed");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_predict(
    artifacts: &PathBuf,
    mode: &str,
    pregnancies: Option<f64>,
    glucose: Option<f64>,
    bmi: Option<f64>,
    age: Option<f64>,
) -> anyhow::Result<()> {
    section("Predict");

    let mode = match mode {
        "detailed" => Mode::Detailed,
        "simple" => Mode::Simple,
        other => anyhow::bail!("invalid mode: {other}"),
    };

    step_run("Loading registry");
    let registry = ModelRegistry::load(artifacts)?;
    step_done(&format!("{} scenario(s)", registry.len()));

    let request = PredictRequest {
        pregnancies,
        glucose,
        bmi,
        age,
        ..Default::default()
    };

    let response = predict(&registry, mode, &request)?;

    println!();
    println!("  {:<14} {}", muted("Scenario"), response.scenario.white());
    println!(
        "  {:<14} {}",
        muted("Probability"),
        format!("{:.4}", response.probability).white().bold()
    );
    println!("  {:<14} {:.2}", muted("Threshold"), response.threshold);
    println!("  {:<14} {}", muted("Label"), response.label.white().bold());
    println!();
    Ok(())
}

pub fn cmd_info(csv: &PathBuf) -> anyhow::Result<()> {
    section("Data Info");

    let df = load_training_csv(csv)?;

    println!("  {:<12} {}", muted("File"), csv.display());
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    println!();

    println!(
        "  {:<20} {:<12} {:>6}",
        muted("Column"),
        muted("Type"),
        muted("Nulls")
    );
    println!("  {}", dim(&"─".repeat(44)));

    for col in df.get_columns() {
        println!(
            "  {:<20} {:<12} {:>6}",
            col.name(),
            format!("{:?}", col.dtype()).truecolor(140, 140, 140),
            col.null_count()
        );
    }

    println!();
    Ok(())
}
