use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use modkit::DbModule;
use modkit_db::{ConnectOpts, DbHandle};
use runtime::{AppConfig, CliArgs, DatabaseConfig};
use tokio_util::sync::CancellationToken;

use api_ingress::{ApiIngress, ApiIngressConfig};
use holo_member::HoloMemberModule;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// holo-server - CRUD service for holo members
#[derive(Parser)]
#[command(name = "holo-server")]
#[command(about = "holo-server - CRUD service for holo members")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Console verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory SQLite database instead of the configured one
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "holo-server starting");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(config),
        Commands::Migrate => migrate_only(config).await,
    }
}

/// Relative SQLite paths are anchored at the home directory; other DSNs pass through.
fn resolve_sqlite_dsn(dsn: &str, base_dir: &Path) -> String {
    let Some(rest) = dsn.strip_prefix("sqlite://") else {
        return dsn.to_string();
    };
    let (path, query) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };
    if path.is_empty() || path.contains(":memory:") || Path::new(path).is_absolute() {
        return dsn.to_string();
    }

    let abs = base_dir.join(path).to_string_lossy().replace('\\', "/");
    match query {
        Some(q) => format!("sqlite://{abs}?{q}"),
        None => format!("sqlite://{abs}"),
    }
}

fn connect_opts(cfg: &DatabaseConfig) -> ConnectOpts {
    let defaults = ConnectOpts::default();
    ConnectOpts {
        max_conns: cfg.max_conns.or(defaults.max_conns),
        min_conns: cfg.min_conns.or(defaults.min_conns),
        acquire_timeout: cfg
            .acquire_timeout_sec
            .map(Duration::from_secs)
            .or(defaults.acquire_timeout),
        sqlite_busy_timeout: cfg
            .busy_timeout_ms
            .map(|ms| Duration::from_millis(u64::from(ms)))
            .unwrap_or(defaults.sqlite_busy_timeout),
        ..defaults
    }
}

async fn connect_db(config: &AppConfig) -> Result<DbHandle> {
    let Some(db_config) = config.database.as_ref() else {
        bail!("database configuration is required");
    };
    if db_config.url.trim().is_empty() {
        bail!("Database URL not configured");
    }

    let dsn = resolve_sqlite_dsn(db_config.url.trim(), Path::new(&config.server.home_dir));
    let db = DbHandle::connect(&dsn, connect_opts(db_config))
        .await
        .context("failed to connect to database")?;
    tracing::info!(engine = db.engine().as_str(), "Connected to database");
    Ok(db)
}

async fn run_server(config: AppConfig) -> Result<()> {
    let ingress_config = ApiIngressConfig::from_app_config(&config)?;
    let bind_addr = ingress_config.resolve_bind_addr(&config);

    let db = connect_db(&config).await?;
    let holo_member = HoloMemberModule::new(db.sea());
    holo_member.migrate(db.seaorm()).await?;

    let mut ingress = ApiIngress::new(ingress_config);
    ingress.register(&holo_member)?;
    let router = ingress.build_router()?;

    let cancel = CancellationToken::new();
    let signals = runtime::cancel_on_shutdown(cancel.clone());

    let listener = api_ingress::bind(&bind_addr).await?;
    let served = api_ingress::serve(listener, router, cancel.clone()).await;

    cancel.cancel();
    signals.await.ok();
    db.close().await;
    tracing::info!("holo-server stopped");
    served
}

async fn migrate_only(config: AppConfig) -> Result<()> {
    let db = connect_db(&config).await?;
    HoloMemberModule::new(db.sea()).migrate(db.seaorm()).await?;
    db.close().await;
    println!("Migrations applied");
    Ok(())
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    let ingress = ApiIngressConfig::from_app_config(&config)?;
    if let Some(db) = &config.database {
        DbHandle::detect(&db.url)?;
    }

    println!("Configuration check passed");
    println!("Bind address: {}", ingress.resolve_bind_addr(&config));
    println!("{}", config.to_yaml()?);
    Ok(())
}
