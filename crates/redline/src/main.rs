mod cli;
mod commands;
mod compare;
mod config;
mod report;
mod store;

use clap::Parser;
use config::{CliOverrides, ResolvedRunConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("redline=info,redline_diff=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    match cli.command {
        cli::Command::Init { force } => {
            commands::init(force)?;
        }
        cli::Command::Diff {
            first,
            second,
            output,
            json,
            diff,
        } => {
            let config = ResolvedRunConfig::new(CliOverrides::from(diff))?;
            let code = commands::diff(config, &first, &second, output.as_deref(), json).await?;
            std::process::exit(code);
        }
        cli::Command::Batch {
            filter,
            parallel,
            diff,
        } => {
            let config = ResolvedRunConfig::new(CliOverrides::from(diff))?;
            let code = commands::batch(config, filter.as_deref(), parallel).await?;
            std::process::exit(code);
        }
    }

    Ok(())
}
