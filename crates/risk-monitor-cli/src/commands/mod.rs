pub mod actions;
pub mod alerts;
pub mod config;
pub mod evaluate;
pub mod explain;
pub mod portfolio;

use std::sync::Arc;

use clap::Args;
use serde::de::DeserializeOwned;

use risk_monitor_core::engine::{InMemorySignalSource, RiskEngine, StaticOsintProvider};
use risk_monitor_core::{Dataset, RiskScore, ScoringConfig};

use crate::input;

/// Arguments for commands that work on a stored risk score
#[derive(Args)]
pub struct ScoreArgs {
    /// Path to a RiskScore JSON file (as produced by `urm evaluate`)
    #[arg(long)]
    pub input: Option<String>,
}

/// Read `--input` or, failing that, piped stdin.
pub fn read_input<T: DeserializeOwned>(
    path: Option<&str>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_json(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(data)
    } else {
        Err(format!("--input file (or JSON on stdin) is required: {what}").into())
    }
}

pub fn read_score(args: &ScoreArgs) -> Result<RiskScore, Box<dyn std::error::Error>> {
    read_input(args.input.as_deref(), "a RiskScore")
}

/// Engine serving a dataset, with the dataset's embedded signals as OSINT.
pub fn build_engine(
    dataset: Dataset,
    config: ScoringConfig,
) -> Result<RiskEngine, Box<dyn std::error::Error>> {
    let osint = StaticOsintProvider::from_dataset(&dataset);
    let engine = RiskEngine::new(config, Arc::new(InMemorySignalSource::new(dataset)))?
        .with_osint(Arc::new(osint));
    Ok(engine)
}
