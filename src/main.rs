//! Agent Quality - command line entry point
//!
//! Records feedback into a JSON-lines ledger and routes tasks over it.
//! Results are printed to stdout as JSON.

use agent_quality::config::QualityConfig;
use agent_quality::feedback::{FeedbackLimits, JsonlFeedbackStore};
use agent_quality::observability::{init_default_logging, metrics};
use agent_quality::routing::QualityController;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{error, info};

/// Quality-based agent routing over a feedback ledger
#[derive(Parser)]
#[command(name = "agent-quality")]
#[command(about = "Route tasks to the best agent based on recorded feedback")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Feedback ledger path
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "AGENT_QUALITY_LEDGER",
        default_value = "feedback.jsonl"
    )]
    ledger: PathBuf,

    /// Print a metrics snapshot as JSON to stderr after the command
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a feedback score for an agent on a task type
    Record {
        agent_id: String,
        task_type: String,
        score: f64,
    },
    /// Record anonymized client feedback for a task
    Anonymized {
        task_id: String,
        content: String,
        rating: f64,
    },
    /// Pick the best agent for a task type among candidates
    Route {
        task_type: String,
        #[arg(required = true, num_args = 1..)]
        candidates: Vec<String>,
    },
    /// Show an agent's feedback history
    History {
        agent_id: String,
        #[arg(long)]
        task_type: Option<String>,
    },
    /// Show anonymized feedback for a task
    Feedback { task_id: String },
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_default_logging() {
        eprintln!("Failed to initialize logging: {e}");
    }

    info!("Starting agent-quality v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let show_metrics = cli.metrics;
    let result = run(cli, config).await;

    if show_metrics {
        match serde_json::to_string_pretty(&metrics().snapshot()) {
            Ok(snapshot) => eprintln!("{snapshot}"),
            Err(e) => error!("Failed to serialize metrics: {}", e),
        }
    }

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<QualityConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(QualityConfig::load_from_file(path)?)
        }
        None => {
            for path_str in ["quality.toml", "config/quality.toml"] {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(QualityConfig::load_from_file(&path)?);
                }
            }

            info!("No configuration file found, using defaults");
            Ok(QualityConfig::default())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli, config: QualityConfig) -> Result<(), Box<dyn std::error::Error>> {
    if let Commands::Config { show } = cli.command {
        if show {
            println!("{}", toml::to_string_pretty(&config)?);
        }
        info!("Configuration validation complete");
        return Ok(());
    }

    let store =
        JsonlFeedbackStore::open(&cli.ledger, FeedbackLimits::from(&config.feedback)).await?;
    let controller = QualityController::from_config(Arc::new(store), &config);

    match cli.command {
        Commands::Record {
            agent_id,
            task_type,
            score,
        } => {
            let record = controller
                .record_feedback(&agent_id, &task_type, score)
                .await?;
            print_json(&record)
        }
        Commands::Anonymized {
            task_id,
            content,
            rating,
        } => {
            let entry = controller
                .record_anonymized_feedback(&task_id, &content, rating)
                .await?;
            print_json(&entry)
        }
        Commands::Route {
            task_type,
            candidates,
        } => {
            let candidates: Vec<&str> = candidates.iter().map(String::as_str).collect();
            let decision = controller.route_task(&task_type, &candidates).await?;
            print_json(&decision)
        }
        Commands::History {
            agent_id,
            task_type,
        } => {
            let history = controller
                .get_agent_feedback_history(&agent_id, task_type.as_deref())
                .await?;
            print_json(&history)
        }
        Commands::Feedback { task_id } => {
            let entries = controller.get_anonymized_feedback(&task_id).await?;
            print_json(&entries)
        }
        Commands::Config { .. } => Ok(()),
    }
}
