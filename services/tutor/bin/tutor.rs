//! Main Entrypoint for the Socratic Tutor
//!
//! This binary is responsible for:
//! 1. Loading runtime settings from the environment and command line.
//! 2. Loading and validating the pedagogical configuration document.
//! 3. Selecting the mastery domain and building the model client.
//! 4. Running the interactive session until the learner exits.

use anyhow::Context;
use clap::Parser;
use socratic_core::{ChatGateway, OpenAICompatibleClient, StaticConfiguration, Tutor};
use socratic_tutor::{
    cli::Cli,
    config::Config,
    repl::{run_session, select_domain},
};
use std::io::Write;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let cli = Cli::parse();
    let config = cli.apply(Config::from_env().context("Failed to load configuration")?);

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let static_config = Arc::new(
        StaticConfiguration::load(&config.config_path).with_context(|| {
            format!(
                "Failed to load tutor configuration from '{}'",
                config.config_path.display()
            )
        })?,
    );
    info!(path = %config.config_path.display(), "Configuration loaded.");

    let mut input = BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();

    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(out, " SOCRATIC TUTOR: POLYGLOT SYSTEMS ARCHITECT")?;
    writeln!(out, "{}", "=".repeat(60))?;

    // --- 3. Choose Domain and Backend ---
    let domain = match config.domain.clone() {
        Some(domain) => domain,
        None => match select_domain(&static_config, &mut input, &mut out).await? {
            Some(domain) => domain,
            None => return Ok(()),
        },
    };

    let gateway: Arc<dyn ChatGateway> = Arc::new(OpenAICompatibleClient::new(
        config.openai_config(),
        config.chat_model.clone(),
    ));
    info!(
        provider = ?config.provider,
        model = %config.chat_model,
        domain = %domain,
        "Starting tutoring session"
    );

    let mut tutor = Tutor::new(static_config, &domain, gateway)
        .with_history_window(config.history_window)
        .with_record_backend_errors(config.record_backend_errors);

    // --- 4. Run the Session ---
    run_session(&mut tutor, &mut input, &mut out).await?;

    info!("Session has ended.");
    Ok(())
}
