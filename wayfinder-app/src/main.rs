use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use wayfinder_common::observability::init_logging;
use wayfinder_config::{WayfinderConfig, WayfinderConfigLoader};
use wiring::Overrides;

mod oneshot;
mod wiring;

#[derive(Debug, Parser)]
#[command(name = "wayfinder", version, about = "Plan a trip from where you are")]
struct Cli {
    /// YAML config file; missing is fine, defaults and env still apply.
    #[arg(long, short, env = "WAYFINDER_CONFIG", default_value = "wayfinder.yaml")]
    config: PathBuf,

    /// Fixed latitude (implies the fixed location provider).
    #[arg(long, allow_hyphen_values = true, requires = "lng")]
    lat: Option<f64>,

    /// Fixed longitude.
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    lng: Option<f64>,

    /// Trip-planning webhook URL.
    #[arg(long)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Plan once and print the reply instead of opening the chat UI.
    Plan {
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Html,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins over file, flags win over both)
    let mut cfg: WayfinderConfig = WayfinderConfigLoader::new()
        .with_optional_file(&cli.config)
        .load()
        .with_context(|| format!("loading {}", cli.config.display()))?;
    Overrides {
        lat: cli.lat,
        lng: cli.lng,
        endpoint: cli.endpoint,
    }
    .apply(&mut cfg)?;

    match cli.command {
        Some(Cmd::Plan { prompt, format }) => {
            init_logging(wiring::log_config(&cfg.logging, true))?;
            oneshot::run(&cfg, &prompt.join(" "), format).await
        }
        None => {
            // stderr would draw over the alternate screen
            let log_path = init_logging(wiring::log_config(&cfg.logging, false))?;
            tracing::info!(path = %log_path.display(), "app.logging.ready");
            wiring::run_tui(cfg).await
        }
    }
}
