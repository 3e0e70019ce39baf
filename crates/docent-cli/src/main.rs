//! Docent CLI - ask questions about firm records in plain language.

use anyhow::Context;
use clap::Parser;
use docent_cli::commands::{self, Workspace};
use docent_cli::{repl, Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load().context("failed to load config")?,
    };

    if let Some(profile_name) = cli.profile.clone() {
        config.switch_profile(profile_name)?;
    }

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);
    let show_query = cli.show_query || config.settings.show_query;
    let fixture = cli.fixture.as_deref();

    match cli.command {
        Some(Command::Profile(args)) => {
            commands::execute_profile(args, &mut config, &formatter)?;
        }
        Some(Command::Schema) => commands::execute_schema(&formatter)?,
        Some(Command::Exemplars) => commands::execute_exemplars(&formatter)?,
        Some(Command::Translate(args)) => {
            let orchestrator = commands::build_orchestrator(&config)?;
            commands::execute_translate(args, &orchestrator, &formatter).await?;
        }
        Some(Command::Ask(args)) => {
            let mut workspace = Workspace::open(&config, fixture)
                .await
                .context("failed to prepare the pipeline")?;
            commands::execute_ask(args, &mut workspace, &formatter, show_query).await?;
        }
        None | Some(Command::Chat) => {
            let mut workspace = Workspace::open(&config, fixture)
                .await
                .context("failed to prepare the pipeline")?;
            repl::run_chat(&config, &mut workspace, &formatter, show_query).await?;
        }
    }

    Ok(())
}
