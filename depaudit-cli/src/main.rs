//! depaudit -- dependency graph and source security scanning CLI

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::CliError;
use output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<(), CliError> {
    // `config validate` must be able to report a broken file, so loading is deferred.
    let loaded = commands::load_config(&cli.config).await;

    let general = loaded
        .as_ref()
        .map(|config| config.general.clone())
        .unwrap_or_default();
    let level = cli.log_level.as_deref().unwrap_or(&general.log_level);
    logging::init_tracing(level, &general.log_format)?;

    tracing::debug!(config = %cli.config.display(), "depaudit starting");
    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
        Commands::Graph(args) => commands::graph::execute(args, &writer),
        Commands::Jas(args) => commands::jas::execute(args, &loaded?, &writer).await,
    }
}
