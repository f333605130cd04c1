// crates/host/src/main.rs

mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use calendar_agent_core::desktop_client::OrgoClient;
use calendar_agent_core::openai_client::OpenAiClient;
use calendar_agent_core::reliability::{Reliability, ReliableDesktop, RetryPolicy};

use calendar_agent_host::config::{self, ProjectConfig, Settings, DEFAULT_PROJECT_FILE};
use calendar_agent_host::log;
use calendar_agent_host::pipeline::{Pipeline, PipelineOptions};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Create calendar events from plain-language requests",
    long_about = None
)]
struct Args {
    /// JSON file holding the remote desktop project id
    #[arg(long, global = true, default_value = DEFAULT_PROJECT_FILE)]
    project_file: PathBuf,

    /// Reference date for relative expressions (YYYY-MM-DD); defaults to today
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    /// Ask the remote desktop to confirm the event exists afterwards
    #[arg(long, global = true)]
    verify: bool,

    /// Generate the instruction but do not send it
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Type requests one after another (default)
    Interactive,
    /// Run the built-in diving example
    Demo,
    /// Test the remote desktop connection
    Check,
    /// Send each line of a file to the remote desktop as-is
    Batch { file: PathBuf },
    /// Write the project file
    Setup { project_id: Option<String> },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let command = args.command.unwrap_or(Command::Interactive);

    if let Command::Setup { project_id } = command {
        return cli::run_setup(&args.project_file, project_id);
    }

    // Fatal setup checks before any pipeline logic
    config::check_credentials(|key| std::env::var(key).ok())?;
    let settings = Settings::from_env()?;
    let project = ProjectConfig::load(&args.project_file)?;

    for key in config::REQUIRED_CREDENTIALS
        .iter()
        .chain(config::OPTIONAL_CREDENTIALS.iter())
    {
        if let Ok(value) = std::env::var(key) {
            log::info(format!("{}: {}", key, config::mask_secret(&value)));
        }
    }
    log::info(format!("Project: {}", project.project_id));
    tracing::info!(
        model = %settings.model,
        threshold = settings.confidence_threshold,
        "settings loaded"
    );

    let client = Arc::new(OpenAiClient::from_env(settings.http_timeout)?);
    let orgo = OrgoClient::from_env(&project.project_id, settings.http_timeout)?;

    let reliability = Reliability::new(RetryPolicy::new(
        settings.max_retries,
        settings.retry_base_delay,
    ));
    let mut desktop = ReliableDesktop::new(orgo, reliability);
    if settings.cache_enabled {
        desktop = desktop.with_cache(settings.cache_ttl);
    }
    let desktop = Arc::new(desktop);

    let options = PipelineOptions {
        confidence_threshold: settings.confidence_threshold,
        today: args
            .today
            .unwrap_or_else(|| chrono::Local::now().date_naive()),
        dry_run: args.dry_run,
        verify: args.verify,
    };
    let pipeline = Arc::new(Pipeline::new(
        client,
        Arc::clone(&desktop),
        settings.model.clone(),
        options,
    ));

    match command {
        Command::Interactive => {
            cli::run_interactive(pipeline)?;
            cli::print_metrics(&desktop.metrics());
            Ok(())
        }
        Command::Demo => {
            let outcome = cli::run_demo(pipeline.as_ref());
            cli::print_metrics(&desktop.metrics());
            outcome
        }
        Command::Check => cli::run_check(desktop.as_ref()),
        Command::Batch { file } => cli::run_batch(desktop.as_ref(), &file),
        Command::Setup { .. } => Ok(()),
    }
}
