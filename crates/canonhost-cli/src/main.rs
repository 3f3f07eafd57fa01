//! canonhost CLI - Redirect requests to their canonical host

use anyhow::{Context, Result};
use axum::http::{HeaderMap, Uri};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use canonhost_cli::config::{RedirectConfig, DEFAULT_CONFIG_FILE};
use canonhost_cli::server::{RedirectServer, RedirectServerConfig};
use canonhost_router::{DomainRegistry, RequestFacts};

/// canonhost - Redirect domains and domain variants to one canonical host
#[derive(Parser, Debug)]
#[command(name = "canonhost")]
#[command(about = "Redirect domains and domain variants to one canonical host", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the redirect configuration file
    #[arg(short, long, global = true, env = "CANONHOST_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a template configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Validate the configuration and print a summary
    Check,
    /// Print the redirect for a URL (e.g., "http://imos.net/de/?x=y")
    Resolve {
        /// Absolute URL of the incoming request
        url: String,
    },
    /// Run the redirect server
    Serve {
        /// Address to listen on (overrides server.bind)
        #[arg(short, long, env = "CANONHOST_BIND")]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level)?;

    match cli.command {
        Commands::Init { force } => handle_init(&cli.config, force),
        Commands::Check => handle_check(&cli.config),
        Commands::Resolve { url } => handle_resolve(&cli.config, &url),
        Commands::Serve { bind } => handle_serve(&cli.config, bind).await,
    }
}

fn handle_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file {:?} already exists (use --force to overwrite)",
            path
        );
    }

    std::fs::write(path, RedirectConfig::template())
        .with_context(|| format!("Failed to write config file: {:?}", path))?;
    println!("Wrote template config to {:?}", path);
    Ok(())
}

/// Load the config and build its registry, warning about shadowed primaries
fn load_registry(path: &Path) -> Result<(RedirectConfig, DomainRegistry)> {
    let config = RedirectConfig::load(path)?;
    let registry = config.build_registry()?;

    for host in registry.conflicting_hosts() {
        warn!(
            "Host {} is both a primary and a secondary domain; the secondary redirect wins",
            host
        );
    }

    Ok((config, registry))
}

fn handle_check(path: &Path) -> Result<()> {
    let (_, registry) = load_registry(path)?;

    println!("Configuration OK: {:?}", path);
    println!("  Primary domains:   {}", registry.primary_count());

    let mut primaries: Vec<_> = registry.primary_domains().values().collect();
    primaries.sort_by(|a, b| a.host.cmp(&b.host));
    for primary in primaries {
        let scheme = if primary.requires_ssl { "https" } else { "http" };
        println!("    {}://{}", scheme, primary.host);
    }

    println!("  Secondary domains: {}", registry.secondary_count());

    let mut secondaries: Vec<_> = registry.secondary_domains().values().collect();
    secondaries.sort_by(|a, b| a.host.cmp(&b.host));
    for secondary in secondaries {
        println!("    {} -> {}", secondary.host, secondary.target);
    }

    match registry.fallback_domain() {
        Some(fallback) => println!("  Fallback domain:   {}", fallback),
        None => println!("  Fallback domain:   none"),
    }

    Ok(())
}

fn handle_resolve(path: &Path, url: &str) -> Result<()> {
    let (_, registry) = load_registry(path)?;

    let uri: Uri = url
        .parse()
        .with_context(|| format!("Invalid URL: {}", url))?;
    if uri.scheme().is_none() {
        anyhow::bail!("URL must be absolute (e.g., http://{})", url);
    }

    let facts = RequestFacts::from_uri_and_headers(&uri, &HeaderMap::new(), false)
        .with_context(|| format!("Invalid URL: {}", url))?;

    match facts.resolve(&registry) {
        Some(location) => println!("{}", location),
        None => println!("no redirect"),
    }

    Ok(())
}

async fn handle_serve(path: &Path, bind: Option<String>) -> Result<()> {
    let (mut config, registry) = load_registry(path)?;

    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    let server_config = RedirectServerConfig::from_settings(&config.server)?;

    info!(
        "Serving {} primary and {} secondary domain(s)",
        registry.primary_count(),
        registry.secondary_count()
    );

    RedirectServer::new(server_config, Arc::new(registry))
        .start()
        .await
}

fn init_logging(log_level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level))
        .context("Failed to initialize logging filter")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}
