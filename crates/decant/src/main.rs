use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use decant::config::Settings;
use decant::{JobRequest, Pipeline};
use decant_store::HttpStoreProvider;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "decant",
    version = env!("CARGO_PKG_VERSION"),
    about = "Republish the files inside an archived blob as individual objects",
    propagate_version = true
)]
struct App {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(name = "run", about = "Run one extraction job")]
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Name of the archive object in the source container.
    #[arg(long)]
    file_name: Option<String>,

    /// Read the whole job request from a JSON file instead of flags.
    #[arg(long, conflicts_with = "file_name")]
    request: Option<PathBuf>,

    /// Source container; falls back to configuration.
    #[arg(long)]
    container_source: Option<String>,

    /// Destination container; falls back to configuration.
    #[arg(long)]
    container_target: Option<String>,

    /// Authenticate with the configured shared credential instead of
    /// delegated identity.
    #[arg(long)]
    shared_key: bool,

    /// Path to a JSON settings file.
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let app = App::parse();
    match app.cmd {
        Commands::Run(args) => run(args).await,
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let settings = Settings::load(args.settings.as_deref()).context("loading settings")?;

    let request = match &args.request {
        Some(path) => {
            let body = std::fs::read_to_string(path)
                .with_context(|| format!("reading request file '{}'", path.display()))?;
            serde_json::from_str(&body)
                .with_context(|| format!("parsing request file '{}'", path.display()))?
        }
        None => {
            let mut request = JobRequest::new(args.file_name.unwrap_or_default());
            request.container_source = args.container_source;
            request.container_target = args.container_target;
            request.use_managed_identity = !args.shared_key;
            request
        }
    };

    let endpoint = settings
        .account_endpoint
        .clone()
        .context("account endpoint not configured (accountEndpoint / DECANT_ACCOUNT_ENDPOINT)")?;
    let provider = HttpStoreProvider::new(endpoint, settings.shared_credential.clone());

    let outcome = Pipeline::new(settings, provider).run(request).await;
    println!("{}", outcome.code());
    if outcome.is_success() {
        Ok(())
    } else {
        std::process::exit(1)
    }
}
