//! Copies trained model artifacts into `models/` so the server can find them.
//!
//! Scans the current directory (or `LOCATOR_ROOT`). Takes no flags.

use std::path::PathBuf;

use anyhow::{Context, Result};
use lifestyle_locator::{CopyOutcome, Locator, MODELS_DIR};
use tracing::{error, info, warn};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .without_time()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    let root = match std::env::var("LOCATOR_ROOT") {
        Ok(root) if !root.is_empty() => PathBuf::from(root),
        _ => std::env::current_dir().context("cannot determine current directory")?,
    };

    let locator = Locator::new(root);
    info!("Searching for model files in: {} ...", locator.root().display());

    let report = locator.run()?;
    if report.created_dest {
        info!("Created models directory at: {}", locator.dest().display());
    }

    for outcome in &report.outcomes {
        match outcome {
            CopyOutcome::Copied { name, source } => {
                info!("Found and copied: {} (source: {})", name, source.display());
            }
            CopyOutcome::Failed { name, error, .. } => {
                error!("Error copying {}: {}", name, error);
            }
        }
    }

    if report.copied() == 0 {
        warn!("No model files found!");
        warn!("Run the training export to generate the model artifacts, then run this again.");
    } else {
        info!("Copied {} files to '{}/'.", report.copied(), MODELS_DIR);
        info!("Restart the server to load them.");
    }

    Ok(())
}
