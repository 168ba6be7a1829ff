//! Tessera CLI: operator tooling for did:key identities, compact
//! signatures, verify links and voucher files.
//!
//! Subcommands: init, keygen, did, sign, verify, link, voucher.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::{LoggingConfig, TesseraConfig};

/// Tessera: signed identities, trust and vouchers for local-first apps.
#[derive(Parser, Debug)]
#[command(name = "tessera", version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, global = true, default_value = "tessera.toml")]
    config: PathBuf,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Override the log format (text, json).
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file.
    Init(commands::init::InitArgs),
    /// Generate a key pair and write it as JSON.
    Keygen(commands::keygen::KeygenArgs),
    /// Derive, print or check a DID.
    Did(commands::did::DidArgs),
    /// Sign a JSON payload or entity as a compact JWS.
    Sign(commands::sign::SignArgs),
    /// Verify a compact JWS or a signed entity.
    Verify(commands::verify::VerifyArgs),
    /// Generate or parse verify links.
    Link(commands::link::LinkArgs),
    /// Issue, transfer and validate voucher files.
    Voucher(commands::voucher::VoucherArgs),
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if logging.format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = TesseraConfig::load(&cli.config)?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }
    init_tracing(&config.logging);
    tracing::debug!(path = %cli.config.display(), "configuration loaded");

    match &cli.command {
        Commands::Init(args) => commands::init::run(args, &cli.config),
        Commands::Keygen(args) => commands::keygen::run(args, &config),
        Commands::Did(args) => commands::did::run(args, &config),
        Commands::Sign(args) => commands::sign::run(args, &config),
        Commands::Verify(args) => commands::verify::run(args).await,
        Commands::Link(args) => commands::link::run(args, &config),
        Commands::Voucher(args) => commands::voucher::run(args, &config).await,
    }
}
