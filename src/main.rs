//! diarisk - Main Entry Point

use clap::Parser;
use diarisk::cli::{cmd_info, cmd_predict, cmd_train, cmd_validate, Cli, Commands};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "diarisk=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            csv,
            out_dir,
            overwrite_runtime,
        } => {
            cmd_train(&csv, &out_dir, overwrite_runtime)?;
        }
        Commands::Validate { csv, artifacts } => {
            cmd_validate(&csv, &artifacts)?;
        }
        Commands::Predict {
            artifacts,
            mode,
            pregnancies,
            glucose,
            bmi,
            age,
        } => {
            cmd_predict(&artifacts, &mode, pregnancies, glucose, bmi, age)?;
        }
        Commands::Info { csv } => {
            cmd_info(&csv)?;
        }
    }

    Ok(())
}
