use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use github_digest::config::load_env_file;
use github_digest::notify::Notifier;
use github_digest::{install_crypto_provider, run, Config, GitHubClient, Secrets, SmtpNotifier};

#[derive(Parser)]
#[command(name = "github-digest")]
#[command(about = "Daily digest of GitHub activity mentioning a keyword")]
#[command(version)]
struct Cli {
    /// Print the digest without sending it by email
    #[arg(long)]
    no_email: bool,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run as if today were this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;
    install_crypto_provider();
    info!("Starting github-digest v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_deref())?;
    load_env_file(Path::new(&config.env_file))?;
    let secrets = Secrets::from_env()?;

    let client = GitHubClient::new(&config.github, secrets.github_token.clone())?;
    let notifier = SmtpNotifier::new(config.email.clone(), &secrets);
    let notifier: Option<&dyn Notifier> = if cli.no_email {
        None
    } else {
        Some(&notifier)
    };

    let run_date = cli.date.unwrap_or_else(today);
    let mut stdout = std::io::stdout().lock();
    let outcome = run(&client, notifier, &config, run_date, &mut stdout).await?;

    info!(
        entries = outcome.entries,
        emailed = outcome.emailed,
        "Digest complete"
    );
    Ok(())
}

/// Initialize logging based on verbosity level
///
/// Logs go to stderr; stdout carries only the digest.
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}

/// Load configuration from specified path or default location
fn load_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(path),
        None => Config::load_or_default(),
    }
}

fn parse_date(input: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
