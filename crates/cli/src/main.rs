use std::str::FromStr;

use anyhow::Result;
use clap::{ArgAction, Parser};
use tracing::info;

mod config;

#[derive(Parser, Debug)]
#[command(
    name = "modelgen",
    version,
    about = "Generate the Java-binding schema for the Gloo CRD model"
)]
struct Cli {
    /// Emit compact JSON instead of pretty-printed
    #[arg(long = "compact", action = ArgAction::SetTrue)]
    compact: bool,
}

fn init_tracing() {
    let env = std::env::var("MODELGEN_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // stdout carries the generated document; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let (registry, config) = config::gloo_model()?;
    info!(
        types = registry.len(),
        roots = config.roots.len(),
        "type graph registered"
    );

    let doc = modelgen_schema::generate(&registry, &config)?;
    let out = if cli.compact {
        serde_json::to_string(&doc)?
    } else {
        serde_json::to_string_pretty(&doc)?
    };
    println!("{out}");
    Ok(())
}
