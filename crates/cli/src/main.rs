//! Bookchat CLI
//!
//! Main entry point for the bookchat command-line tool.
//! Serves the robotics book chatbot and answers one-off questions.

mod commands;

use anyhow::Context;
use bookchat_core::{config::AppConfig, logging};
use clap::{Parser, Subcommand};
use commands::{AskCommand, CheckCommand, ServeCommand};
use std::path::PathBuf;

/// Bookchat - grounded Q&A over the robotics book
#[derive(Parser, Debug)]
#[command(name = "bookchat")]
#[command(about = "Answer questions about the robotics book from its own passages", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "BOOKCHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level or filter directive (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "BOOKCHAT_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP service (POST /chat, GET /health)
    Serve(ServeCommand),

    /// Answer a single question
    Ask(AskCommand),

    /// Validate configuration and make sure the collection exists
    Check(CheckCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let bind = match &cli.command {
        Commands::Serve(cmd) => cmd.bind.clone(),
        _ => None,
    };

    let config = AppConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .with_overrides(cli.log_level, cli.verbose, cli.no_color, cli.log_json, bind);

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_json)
        .context("Failed to initialize logging")?;

    tracing::info!("Bookchat starting");
    tracing::debug!("LLM: {}/{}", config.llm_provider, config.llm_model);
    tracing::debug!(
        "Embedding: {}/{}",
        config.embedding_provider,
        config.embedding_model
    );

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Ask(_) => "ask",
        Commands::Check(_) => "check",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Serve(cmd) => cmd.execute(config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Check(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result.with_context(|| format!("bookchat {} failed", command_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask_with_selection() {
        let cli = Cli::try_parse_from([
            "bookchat",
            "ask",
            "What is PID?",
            "--selected-text",
            "Robots use PID control.",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Commands::Ask(cmd) => {
                assert_eq!(cmd.question, "What is PID?");
                assert_eq!(cmd.selected_text.as_deref(), Some("Robots use PID control."));
                assert!(cmd.json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_bind_and_global_flags() {
        let cli = Cli::try_parse_from(["bookchat", "serve", "--bind", "127.0.0.1:9000", "-v"])
            .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Serve(cmd) => assert_eq!(cmd.bind.as_deref(), Some("127.0.0.1:9000")),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
