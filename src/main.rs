use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use orbithub::config::OrbitConfig;
use orbithub::features::SatelliteInput;
use orbithub::query::FilterRequest;
use orbithub::requests::PortalRequest;
use orbithub::AppState;

#[derive(Parser, Debug)]
#[command(name = "orbithub", version, about = "Satellite sustainability tiers")]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fits the tier model on the raw dataset and saves the artifact.
    Train,
    /// Builds (or serves) the classified snapshot.
    Materialize {
        /// Recompute even if a snapshot already exists.
        #[arg(long)]
        force: bool,
    },
    /// Queries the classified dataset.
    Filter {
        /// Tier (GOLD, SILVER, BRONZE, OURO, PRATA) or PENDING.
        #[arg(long)]
        classification: Option<String>,
        /// Case-insensitive substring of the purpose.
        #[arg(long)]
        purpose: Option<String>,
        /// Maximum rows, 0 for all. Defaults to `query.default_limit`.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Lists the satellites awaiting classification.
    Pending {
        #[arg(long, default_value_t = 0)]
        limit: usize,
    },
    /// Classifies satellites given as a JSON object or array (inline or a file path).
    Classify { input: String },
    /// Records a portal data request given as JSON (inline or a file path).
    Request { input: String },
}

/// Inline JSON, or the contents of the file it names.
fn read_json_arg(input: &str) -> Result<String> {
    let path = Path::new(input);
    if path.is_file() {
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    } else {
        Ok(input.to_string())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = OrbitConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let state = AppState::init(config);

    match cli.command {
        Commands::Train => {
            let model = state.train()?;
            print_json(&json!({
                "model": state.config().model_path(),
                "training_rows": model.training_rows,
                "clusters": model.kmeans.centroids.len(),
                "inertia": model.kmeans.inertia,
                "label_map": model.label_map,
            }))?;
        }
        Commands::Materialize { force } => {
            let table = state.materialize(force)?;
            print_json(&json!({
                "snapshot": state.config().snapshot_path(),
                "rows": table.len(),
                "columns": table.columns.len(),
            }))?;
        }
        Commands::Filter {
            classification,
            purpose,
            limit,
        } => {
            let request = FilterRequest {
                classification,
                purpose,
                limit,
            };
            print_json(&state.filter(&request)?)?;
        }
        Commands::Pending { limit } => {
            let names: Vec<_> = state.pending(limit)?.into_iter().map(|r| r.name).collect();
            print_json(&names)?;
        }
        Commands::Classify { input } => {
            let text = read_json_arg(&input)?;
            let value: serde_json::Value =
                serde_json::from_str(&text).context("parsing satellite input")?;
            let inputs: Vec<SatelliteInput> = if value.is_array() {
                serde_json::from_value(value)?
            } else {
                vec![serde_json::from_value(value)?]
            };
            let tiers = state.classify_adhoc(&inputs)?;
            let out: Vec<_> = inputs
                .iter()
                .zip(tiers)
                .map(|(input, tier)| json!({ "object_name": input.object_name, "tier": tier }))
                .collect();
            print_json(&out)?;
        }
        Commands::Request { input } => {
            let text = read_json_arg(&input)?;
            let request: PortalRequest =
                serde_json::from_str(&text).context("parsing portal request")?;
            let path = state.persist_request(&request)?;
            print_json(&json!({ "status": "received", "path": path }))?;
        }
    }

    state.teardown();
    Ok(())
}
