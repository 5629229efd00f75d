//! hitstats
//!
//! Pageview ingestion and path statistics over ClickHouse:
//! - `hitstats ingest` reads newline-delimited JSON hits from stdin,
//!   classifies their referrers and stores them
//! - `hitstats report [period]` prints the top paths for the configured site

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{error, info, warn};

use clickhouse_client::{check_connection, init_schema, ClickHouseClient, ClickHouseConfig};
use stats_core::{
    Blacklist, DateRange, HitIngestor, HitInput, HitStats, IngestOutcome, PathStatsPage, Period,
    Site,
};
use telemetry::{health, init_tracing, metrics, TracingConfig};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Config {
    #[serde(default)]
    clickhouse: ClickHouseConfig,

    #[serde(default)]
    log: TracingConfig,

    /// Site that hits without a site id and reports belong to
    #[serde(default)]
    site: Site,

    /// Referrer hosts dropped in addition to the built-in spam list
    #[serde(default)]
    blacklist: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Ingest,
    Report(Period),
}

fn parse_command(mut args: impl Iterator<Item = String>) -> Result<Command> {
    match args.next().as_deref() {
        None | Some("ingest") => Ok(Command::Ingest),
        Some("report") => {
            let period = match args.next() {
                Some(p) => p.parse::<Period>()?,
                None => Period::default(),
            };
            Ok(Command::Report(period))
        }
        Some(other) => bail!("unknown command {:?}; expected `ingest` or `report [period]`", other),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = load_config()?;
    init_tracing(&config.log);

    let command = parse_command(std::env::args().skip(1))?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        site = config.site.id,
        command = ?command,
        "Starting hitstats"
    );

    let clickhouse = Arc::new(
        ClickHouseClient::new(config.clickhouse.clone())
            .context("Failed to create ClickHouse client")?,
    );

    if let Err(e) = init_schema(&clickhouse).await {
        error!("Failed to initialize ClickHouse schema: {}", e);
        // Continue anyway - schema might already exist
    }

    if check_connection(&clickhouse).await {
        info!("ClickHouse connection: healthy");
    } else {
        error!("ClickHouse connection: unhealthy");
    }

    match command {
        Command::Ingest => run_ingest(&config, clickhouse).await?,
        Command::Report(period) => run_report(&config, clickhouse, period).await?,
    }

    let snapshot = metrics().snapshot();
    info!(
        metrics = %serde_json::to_string(&snapshot).unwrap_or_default(),
        health = ?health().report().status,
        "Shutdown complete"
    );
    Ok(())
}

/// Counts for one ingest run.
#[derive(Debug, Default)]
struct IngestSummary {
    lines: u64,
    stored: u64,
    dropped: u64,
    rejected: u64,
    failed: u64,
}

async fn run_ingest(config: &Config, clickhouse: Arc<ClickHouseClient>) -> Result<()> {
    let blacklist = Blacklist::new(&config.blacklist);
    info!(hosts = blacklist.len(), "Loaded referrer blacklist");
    let ingestor = HitIngestor::new(clickhouse, blacklist);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut summary = IngestSummary::default();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            _ = &mut shutdown => break,
        };
        let Some(line) = line else { break };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        summary.lines += 1;

        let mut input: HitInput = match serde_json::from_str(line) {
            Ok(input) => input,
            Err(e) => {
                warn!(line = summary.lines, error = %e, "Skipping malformed hit");
                summary.rejected += 1;
                continue;
            }
        };
        if input.site == 0 {
            input.site = config.site.id;
        }

        match ingestor.ingest(input).await {
            Ok(IngestOutcome::Stored(_)) => summary.stored += 1,
            Ok(IngestOutcome::Dropped { .. }) => summary.dropped += 1,
            Err(e) if e.is_validation() => summary.rejected += 1,
            Err(_) => summary.failed += 1,
        }
    }

    info!(
        lines = summary.lines,
        stored = summary.stored,
        dropped = summary.dropped,
        rejected = summary.rejected,
        failed = summary.failed,
        "Ingest finished"
    );
    if summary.failed > 0 {
        bail!("{} hits could not be stored", summary.failed);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct Report {
    site: i64,
    period: Period,
    range: DateRange,
    #[serde(flatten)]
    page: PathStatsPage,
}

async fn run_report(config: &Config, clickhouse: Arc<ClickHouseClient>, period: Period) -> Result<()> {
    let stats = HitStats::new(clickhouse, config.site.clone());
    let range = period.range_ending(Utc::now());

    let page = stats
        .list_path_stats(&range, &[])
        .await
        .context("Failed to load path stats")?;

    let report = Report {
        site: config.site.id,
        period,
        range,
        page,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("HITSTATS")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Manual overrides for nested ClickHouse config
    if let Ok(url) = std::env::var("HITSTATS_CLICKHOUSE_URL") {
        config.clickhouse.url = url;
    }
    if let Ok(database) = std::env::var("HITSTATS_CLICKHOUSE_DATABASE") {
        config.clickhouse.database = database;
    }
    if let Ok(username) = std::env::var("HITSTATS_CLICKHOUSE_USERNAME") {
        config.clickhouse.username = Some(username);
    }
    if let Ok(password) = std::env::var("HITSTATS_CLICKHOUSE_PASSWORD") {
        config.clickhouse.password = Some(password);
    }

    if let Ok(hosts) = std::env::var("HITSTATS_BLACKLIST") {
        config.blacklist = hosts.split(',').map(|s| s.trim().to_string()).collect();
    }

    Ok(config)
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
