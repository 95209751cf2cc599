//! CLI administration tool for link-shortener.
//!
//! Runs maintenance against the PostgreSQL store without going through the
//! HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # List expired links without deleting them
//! cargo run --bin admin -- links cleanup --dry-run
//!
//! # Delete expired links (asks for confirmation unless --yes)
//! cargo run --bin admin -- links cleanup --yes
//!
//! # Show a link with its visit statistics
//! cargo run --bin admin -- links show Ab3dE9x
//!
//! # Totals across all links
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required): PostgreSQL connection string
//! - `REDIS_URL` (optional): evict swept links from the shared cache

use link_shortener::application::services::{ExpirySweepService, StatisticsService};
use link_shortener::domain::errors::LinkError;
use link_shortener::infrastructure::cache::{CacheService, NullCache, RedisCache};
use link_shortener::infrastructure::persistence::{PgLinkRepository, PgVisitRepository};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// Days of history shown by `links show`.
const SHOW_DAYS: u32 = 7;

/// CLI tool for managing link-shortener.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage links
    Links {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Show statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Link management subcommands.
#[derive(Subcommand)]
enum LinkAction {
    /// Delete links whose expiry has passed
    Cleanup {
        /// Only list the expired links
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Show a link and its visit statistics
    Show {
        /// Short code
        code: String,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Links { action } => handle_link_action(action, pool).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Dispatches link commands.
async fn handle_link_action(action: LinkAction, pool: PgPool) -> Result<()> {
    let pool = Arc::new(pool);
    let links = Arc::new(PgLinkRepository::new(pool.clone()));

    match action {
        LinkAction::Cleanup { dry_run, yes } => {
            let sweep = ExpirySweepService::new(links, connect_cache().await);
            cleanup(&sweep, dry_run, yes).await?;
        }
        LinkAction::Show { code } => {
            let visits = Arc::new(PgVisitRepository::new(pool));
            show_link(&StatisticsService::new(links, visits), &code).await?;
        }
    }

    Ok(())
}

/// Redis when `REDIS_URL` is set, so swept codes are evicted from the shared
/// cache. An in-process cache lives in the server and cannot be reached here.
async fn connect_cache() -> Arc<dyn CacheService> {
    let Ok(redis_url) = std::env::var("REDIS_URL") else {
        return Arc::new(NullCache::new());
    };

    match RedisCache::connect(&redis_url, 60).await {
        Ok(redis) => Arc::new(redis),
        Err(e) => {
            println!(
                "{} {}",
                "⚠️  Redis unavailable, cache not evicted:".yellow(),
                e
            );
            Arc::new(NullCache::new())
        }
    }
}

/// Lists expired links and deletes them after confirmation.
///
/// # Flow
///
/// 1. Dry run to list the expired links
/// 2. Stop there with `--dry-run` or when nothing expired
/// 3. Confirm deletion (unless `--yes`)
/// 4. Run the sweep and print the report
async fn cleanup(
    sweep: &ExpirySweepService<PgLinkRepository, dyn CacheService>,
    dry_run: bool,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "🧹 Expired Links".bright_blue().bold());
    println!();

    let preview = sweep
        .run(true)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list expired links: {}", e))?;

    if preview.found == 0 {
        println!("{}", "  No expired links".green());
        return Ok(());
    }

    for code in &preview.codes {
        println!("  {}", code.cyan());
    }
    println!();
    println!(
        "  Found: {}",
        preview.found.to_string().bright_white().bold()
    );
    println!();

    if dry_run {
        println!("{}", "Dry run, nothing deleted".yellow());
        return Ok(());
    }

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete these links and their visits?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let report = sweep
        .run(false)
        .await
        .map_err(|e| anyhow::anyhow!("Sweep failed: {}", e))?;

    println!();
    println!(
        "  Deleted: {}",
        report.deleted.to_string().bright_green().bold()
    );
    if report.skipped > 0 {
        println!(
            "  Skipped: {}",
            report.skipped.to_string().bright_black()
        );
    }
    if report.failed > 0 {
        println!("  Failed:  {}", report.failed.to_string().red().bold());
        anyhow::bail!("{} expired links could not be deleted", report.failed);
    }
    println!();
    println!("{}", "✅ Cleanup finished".green().bold());

    Ok(())
}

/// Prints a link with totals and its recent daily visits.
async fn show_link(
    statistics: &StatisticsService<PgLinkRepository, PgVisitRepository>,
    code: &str,
) -> Result<()> {
    let stats = match statistics.statistics(code, Some(SHOW_DAYS)).await {
        Ok(stats) => stats,
        Err(LinkError::NotFound(_)) => {
            println!("{} {}", "❌ Link not found:".red(), code.cyan());
            return Ok(());
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to load link: {}", e)),
    };

    let link = &stats.link;
    let status = if link.is_expired() {
        "EXPIRED".red()
    } else {
        "ACTIVE".green()
    };

    println!("{}", "🔗 Link".bright_blue().bold());
    println!();
    println!("  Code:     {}", link.short_code.cyan());
    println!("  URL:      {}", link.original_url);
    println!("  Status:   {}", status);
    println!(
        "  Created:  {}",
        link.created_at.format("%Y-%m-%d %H:%M").to_string().bright_black()
    );
    match link.expires_at {
        Some(at) => println!("  Expires:  {}", at.format("%Y-%m-%d %H:%M")),
        None => println!("  Expires:  {}", "never".bright_black()),
    }
    println!();
    println!(
        "  Visits:   {}",
        stats.summary.total_visits.to_string().bright_green().bold()
    );
    println!(
        "  Unique:   {}",
        stats.summary.unique_visitors.to_string().bright_green()
    );

    if !stats.visits_by_day.is_empty() {
        println!();
        println!("  {}", format!("Last {} days", SHOW_DAYS).bright_white().bold());
        for day in &stats.visits_by_day {
            println!("  {}  {}", day.date.to_string().bright_black(), day.count);
        }
    }
    println!();

    Ok(())
}

/// Displays system statistics.
///
/// Shows:
/// - Live links (not deleted)
/// - Expired links awaiting the sweep
/// - Total recorded visits
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let links_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM links WHERE deleted_at IS NULL")
            .fetch_one(pool)
            .await?;

    let expired_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM links WHERE deleted_at IS NULL AND expires_at <= NOW()",
    )
    .fetch_one(pool)
    .await?;

    let visits_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM link_visits")
        .fetch_one(pool)
        .await?;

    println!(
        "  Links:   {}",
        links_count.to_string().bright_green().bold()
    );
    println!(
        "  Expired: {}",
        expired_count.to_string().yellow().bold()
    );
    println!(
        "  Visits:  {}",
        visits_count.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            println!("{}", "✅ Database connection OK".green().bold());
            println!("  PostgreSQL: {}", version.bright_white());
        }
    }

    Ok(())
}
