mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::evaluate::EvaluateArgs;
use commands::explain::ExplainArgs;
use commands::portfolio::{ListArgs, RiskyArgs, SummaryArgs};
use commands::ScoreArgs;

/// Explainable credit, AML and OSINT risk scoring
#[derive(Parser)]
#[command(
    name = "urm",
    version,
    about = "Explainable credit, AML and OSINT risk scoring",
    long_about = "Scores customers from their profile, transaction history and external \
                  intelligence. Every score carries the factor trace it was computed from, \
                  so explanations, alerts and recommended actions can be rendered later \
                  without recomputation."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Scoring configuration file (JSON or YAML)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Debug-level logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one customer or every customer in a dataset
    Evaluate(EvaluateArgs),
    /// Re-render the explanation of a stored risk score
    Explain(ExplainArgs),
    /// Recommended actions for a stored risk score
    Actions(ScoreArgs),
    /// Alerts raised by a stored risk score
    Alerts(ScoreArgs),
    /// Rank a dataset's customers by combined risk
    Risky(RiskyArgs),
    /// Search, filter and page a dataset's scores
    List(ListArgs),
    /// Portfolio statistics for a dataset
    Summary(SummaryArgs),
    /// Print the validated effective configuration
    Config,
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "risk_monitor_core=debug,urm=debug"
    } else {
        "risk_monitor_core=info,urm=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match input::file::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(2);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Evaluate(args) => commands::evaluate::run_evaluate(args, config).await,
        Commands::Explain(args) => commands::explain::run_explain(args, &config),
        Commands::Actions(args) => commands::actions::run_actions(args),
        Commands::Alerts(args) => commands::alerts::run_alerts(args, &config),
        Commands::Risky(args) => commands::portfolio::run_risky(args, config).await,
        Commands::List(args) => commands::portfolio::run_list(args, config).await,
        Commands::Summary(args) => commands::portfolio::run_summary(args, config).await,
        Commands::Config => commands::config::run_config(&config),
        Commands::Version => {
            println!("urm {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
