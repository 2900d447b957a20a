//! proxy-fetcher CLI - fetch and validate public proxy lists.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use proxy_fetcher::{Context, Manager, ProxyRecord, Settings, ValidationOptions};

/// proxy-fetcher - Public proxy list fetcher and validator
#[derive(Parser)]
#[command(name = "proxy-fetcher")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (TOML, YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a proxy list
    Fetch(FetchArgs),

    /// List registered providers
    Providers,
}

#[derive(Parser)]
struct FetchArgs {
    /// Provider to fetch from
    #[arg(short, long)]
    provider: Option<String>,

    /// Only print proxies that pass validation
    #[arg(long)]
    validate: bool,

    /// Per-probe timeout in milliseconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Maximum number of probes in flight
    #[arg(short = 'n', long)]
    concurrency: Option<usize>,

    /// Maximum number of proxies to display
    #[arg(short, long)]
    limit: Option<usize>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One proxy URL per line with metadata
    Text,
    /// JSON array of records
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    let context = Context::global();
    let settings = Settings::load(cli.config.as_deref())?;
    context.configuration().apply(&settings)?;

    match cli.command {
        Commands::Fetch(args) => run_fetch(context, args).await,
        Commands::Providers => list_providers(&context),
    }
}

fn list_providers(context: &Context) -> Result<()> {
    let current = context.configuration().provider();
    println!("Available providers:\n");
    for name in context.registry().names() {
        let provider = context.registry().lookup(&name)?;
        let marker = if name == current { "*" } else { " " };
        println!("  {} {:<22} {}", marker, name, provider.description());
    }
    println!();
    println!("Usage: proxy-fetcher fetch --provider xroxy --validate");
    Ok(())
}

async fn run_fetch(context: Arc<Context>, args: FetchArgs) -> Result<()> {
    if let Some(provider) = &args.provider {
        context.configuration().set_provider(provider)?;
    }

    let manager = Manager::with_context(context)?;

    let mut options = ValidationOptions::new();
    if let Some(timeout) = args.timeout {
        options = options.with_timeout(Duration::from_millis(timeout));
    }
    if let Some(concurrency) = args.concurrency {
        options = options.with_max_concurrency(concurrency);
    }

    let proxies = if args.validate {
        manager.validated_proxies(Some(options)).await?
    } else {
        manager.fetch_proxies().await?
    };
    let limit = args.limit.unwrap_or(proxies.len());

    match args.format {
        OutputFormat::Text => {
            println!(
                "\n{} proxies from {}{}:\n",
                proxies.len(),
                manager.provider_name(),
                if args.validate { " (validated)" } else { "" }
            );
            for proxy in proxies.iter().take(limit) {
                println!("{}", describe(proxy));
            }
        }
        OutputFormat::Json => {
            let output: Vec<_> = proxies.iter().take(limit).collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn describe(proxy: &ProxyRecord) -> String {
    let mut line = proxy.url();
    if let Some(country) = proxy.country() {
        line.push_str(&format!("\t{}", country));
    }
    if let Some(anonymity) = proxy.anonymity() {
        line.push_str(&format!("\t{}", anonymity));
    }
    if let Some(latency) = proxy.latency() {
        line.push_str(&format!("\t{}ms", latency.as_millis()));
    }
    line
}
