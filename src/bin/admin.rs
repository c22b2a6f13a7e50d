//! Operator CLI for linkpulse.
//!
//! Inspects and drives the click pipeline and the snapshot cache without going
//! through HTTP.
//!
//! # Usage
//!
//! ```bash
//! # Number of click events waiting to be flushed
//! cargo run --bin linkpulse-admin -- buffer status
//!
//! # Run one flush now (asks for confirmation unless -y)
//! cargo run --bin linkpulse-admin -- buffer flush
//!
//! # Live click counter of a link
//! cargo run --bin linkpulse-admin -- counter 42
//!
//! # Drop a cached snapshot after editing a link by hand
//! cargo run --bin linkpulse-admin -- cache invalidate s.example.com abc123
//!
//! # Check database connection
//! cargo run --bin linkpulse-admin -- db check
//! ```
//!
//! Reads the same environment (and `.env`) as the server. Buffer, counter and
//! cache commands require Redis: without it the buffer lives inside the server
//! process and cannot be reached from here.

use linkpulse::application::services::ClickService;
use linkpulse::config::{self, Config};
use linkpulse::domain::click_worker::{ClickWorker, DrainOutcome};
use linkpulse::infrastructure::buffer::{EventBuffer, RedisEventBuffer};
use linkpulse::infrastructure::cache::{CacheService, RedisCache, snapshot_key};
use linkpulse::infrastructure::enrichment::{Enricher, GeoIp};
use linkpulse::infrastructure::persistence::PgClickRepository;
use linkpulse::infrastructure::redis_connection;
use linkpulse::server;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use redis::aio::ConnectionManager;
use std::sync::Arc;

/// CLI tool for operating linkpulse.
#[derive(Parser)]
#[command(name = "linkpulse-admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Inspect or flush the click event buffer
    Buffer {
        #[command(subcommand)]
        action: BufferAction,
    },

    /// Show the live click counter of a link
    Counter {
        /// Link ID
        link_id: i64,
    },

    /// Snapshot cache operations
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum BufferAction {
    /// Show the number of pending events
    Status,

    /// Drain the buffer into PostgreSQL now
    Flush {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Drop the cached snapshot for a host and code
    Invalidate {
        /// Host exactly as clients send it, port included
        host: String,
        /// Short code
        code: String,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = config::load_from_env()?;

    match cli.command {
        Commands::Buffer { action } => handle_buffer_action(action, &config).await?,
        Commands::Counter { link_id } => show_counter(link_id, &config).await?,
        Commands::Cache { action } => handle_cache_action(action, &config).await?,
        Commands::Db { action } => handle_db_action(action, &config).await?,
    }

    Ok(())
}

/// Connects to the Redis instance shared with the server.
async fn connect_redis(config: &Config) -> Result<ConnectionManager> {
    let url = config.redis_url.as_deref().context(
        "Redis is not configured (REDIS_URL / REDIS_HOST); the server buffers clicks in its own memory",
    )?;
    redis_connection::connect(url)
        .await
        .context("Failed to connect to Redis")
}

async fn handle_buffer_action(action: BufferAction, config: &Config) -> Result<()> {
    let buffer = Arc::new(RedisEventBuffer::new(connect_redis(config).await?));

    match action {
        BufferAction::Status => {
            println!("{}", "📦 Event buffer".bright_blue().bold());
            println!();

            let pending = buffer.len().await?;
            println!(
                "  Pending events: {}",
                pending.to_string().bright_green().bold()
            );
            println!(
                "  Flush:          every {}s, batch {}",
                config.flush_interval_seconds, config.flush_batch_size
            );
            println!();
        }
        BufferAction::Flush { yes } => flush_buffer(buffer, config, yes).await?,
    }

    Ok(())
}

/// Runs one drain against the configured stores.
///
/// Safe to run while servers are up only if they are stopped or between ticks:
/// two concurrent drains can write the same batch twice.
async fn flush_buffer(buffer: Arc<RedisEventBuffer>, config: &Config, yes: bool) -> Result<()> {
    println!("{}", "🚚 Flush event buffer".bright_blue().bold());
    println!();

    let pending = buffer.len().await?;
    println!("  Pending events: {}", pending.to_string().cyan());

    if pending == 0 {
        println!("{}", "  Nothing to flush".yellow());
        return Ok(());
    }

    println!(
        "{}",
        "ℹ️  If a server is draining right now, this flush is skipped.".bright_black()
    );
    println!();

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt("Flush now?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let pool = Arc::new(server::connect_database(config).await?);
    let geoip = Arc::new(
        GeoIp::from_path(config.geoip_db_path.as_deref())
            .context("Failed to open GeoIP database")?,
    );

    let worker = ClickWorker::new(
        buffer,
        Arc::new(PgClickRepository::new(pool.clone())),
        Arc::new(Enricher::new(geoip.clone())),
        config.flush_config(),
    );
    let report = worker.flush().await;
    geoip.close();

    println!();
    println!("  Batches:   {}", report.batches.to_string().bright_white());
    println!("  Read:      {}", report.read.to_string().bright_white());
    println!("  Inserted:  {}", report.inserted.to_string().bright_green());
    println!("  Malformed: {}", report.discarded.to_string().bright_black());
    println!();

    match report.outcome {
        DrainOutcome::Drained => println!("{}", "✅ Flush complete".green().bold()),
        DrainOutcome::Busy => {
            println!(
                "{}",
                "⏳ Another drain holds the flush lease, try again shortly".yellow()
            );
        }
        outcome => {
            println!(
                "{}",
                format!("❌ Flush stopped early: {:?}", outcome).red().bold()
            );
            anyhow::bail!("flush did not complete");
        }
    }

    Ok(())
}

async fn show_counter(link_id: i64, config: &Config) -> Result<()> {
    let buffer = Arc::new(RedisEventBuffer::new(connect_redis(config).await?));
    let clicks = ClickService::new(buffer, config.enqueue_timeout());

    match clicks.realtime_count(link_id).await? {
        Some(count) => println!(
            "  Link {}: {} clicks",
            link_id.to_string().cyan(),
            count.to_string().bright_green().bold()
        ),
        None => println!(
            "{}",
            format!("  Link {} has no recorded clicks", link_id).yellow()
        ),
    }

    Ok(())
}

async fn handle_cache_action(action: CacheAction, config: &Config) -> Result<()> {
    match action {
        CacheAction::Invalidate { host, code } => {
            let cache = RedisCache::new(connect_redis(config).await?, config.cache_ttl_seconds);
            let key = snapshot_key(&host, &code);

            cache
                .invalidate(&key)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to invalidate {}: {}", key, e))?;

            println!("{} {}", "✅ Invalidated".green().bold(), key.cyan());
        }
    }

    Ok(())
}

async fn handle_db_action(action: DbAction, config: &Config) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            let pool = server::connect_database(config).await?;
            sqlx::query("SELECT 1").fetch_one(&pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
    }

    Ok(())
}
