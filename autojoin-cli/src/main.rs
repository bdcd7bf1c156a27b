//! autojoin CLI
//!
//! Opens the collaboration client in a browser, shows the organization with
//! blacklisted channels highlighted, and after `s` keeps the session in the
//! most recently started meeting.
//!
//! Usage:
//!   autojoin                         # reads ./config.json
//!   autojoin --config work.json -v   # debug logging
//!   autojoin --headless --url https://teams.example.com

use anyhow::{Context, Result};
use autojoin::control::{configure, initialize, poll_forever};
use autojoin::{create_engine, Config};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "autojoin")]
#[command(about = "Join the newest meeting in your teams, skipping blacklisted channels")]
struct Args {
    /// Path to the JSON configuration file
    #[clap(long, short = 'c', default_value = "config.json", env = "AUTOJOIN_CONFIG")]
    config: PathBuf,

    /// Client URL, overriding `app_url` from the config file
    #[clap(long)]
    url: Option<String>,

    /// Run the browser without a window
    #[clap(long)]
    headless: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[clap(long, short = 'v')]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    let default = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::load(&args.config)
        .with_context(|| format!("could not load {}", args.config.display()))?;
    if let Some(url) = &args.url {
        config.app_url = url.clone();
    }
    if args.headless {
        config.browser.headless = true;
    }
    config.validate().context("invalid command line overrides")?;
    Ok(config)
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    info!(?config, "Configuration loaded");

    let engine = create_engine(&config.browser)
        .await
        .context("failed to launch the browser")?;
    let mut session = initialize(engine, config)
        .await
        .context("the client never became usable")?;

    let mut stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let Some(teams) = configure(&session, &mut stdin, &mut stdout).await? else {
        info!("Quit requested");
        return Ok(());
    };

    match poll_forever(&mut session, teams).await {
        Ok(never) => match never {},
        Err(e) => Err(e).context("polling stopped"),
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}
