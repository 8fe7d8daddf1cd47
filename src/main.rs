//! Podsum CLI entry point.

use anyhow::Result;
use clap::Parser;
use podsum::cli::{commands, Cli, Commands};
use podsum::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Initialize logging
    let log_level = cli.log_level(&settings.general.log_level);
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("podsum={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    settings.apply_env()?;
    settings.validate()?;

    std::fs::create_dir_all(settings.data_dir())?;

    match &cli.command {
        Commands::Process { audio_url } => {
            commands::run_process(audio_url, &settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::List { incomplete } => {
            commands::run_list(*incomplete, &settings).await?;
        }

        Commands::Show { episode_id } => {
            commands::run_show(episode_id, &settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, &settings)?;
        }
    }

    Ok(())
}
