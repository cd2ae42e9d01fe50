//! CLI tool for inspecting the cache used by cached services.
//!
//! Renders keys exactly as cached calls do, reads and deletes entries, and
//! checks that the configured backend is reachable.
//!
//! # Usage
//!
//! ```bash
//! # Show the effective configuration
//! cargo run --bin cachectl -- config
//!
//! # Render the key of price(42)
//! cargo run --bin cachectl -- key price 42
//!
//! # Read an entry
//! cargo run --bin cachectl -- get "v1.0|price|42|"
//!
//! # Delete an entry
//! cargo run --bin cachectl -- del "v1.0|price|42|"
//!
//! # Check the backend
//! cargo run --bin cachectl -- check
//! ```
//!
//! # Environment Variables
//!
//! Same as the library, see `cache_provider::config`. `CACHE_BACKEND` and
//! `REDIS_URL` select the store that `get`, `del` and `check` talk to.

use cache_provider::config::{Config, load_from_env};
use cache_provider::domain::KEY_SEPARATOR;
use cache_provider::infrastructure::cache::{BackendSelector, CacheBackend};
use cache_provider::telemetry;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use std::sync::Arc;

/// CLI tool for the cache provider.
#[derive(Parser)]
#[command(name = "cachectl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the effective configuration
    Config,

    /// Render the cache key of a call with string arguments
    Key {
        /// Literal key of the method (e.g., "price")
        literal: String,

        /// Call arguments, in declaration order
        args: Vec<String>,
    },

    /// Show the value stored under a key
    Get {
        key: String,
    },

    /// Delete the value stored under a key
    Del {
        key: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Check that the backend is reachable
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = load_from_env().context("Invalid cache configuration")?;
    telemetry::init(&config.log_level, &config.log_format)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Config => show_config(&config),
        Commands::Key { literal, args } => {
            let key = render_key(&config.cache_version, &literal, &args);
            println!("{}", key.bright_yellow());
        }
        Commands::Get { key } => get_entry(&backend(&config)?, &key).await?,
        Commands::Del { key, yes } => delete_entry(&backend(&config)?, &key, yes).await?,
        Commands::Check => check_backend(&config).await?,
    }

    Ok(())
}

fn backend(config: &Config) -> Result<Arc<dyn CacheBackend>> {
    BackendSelector::from_config(config)
        .current()
        .context("Failed to select cache backend")
}

fn show_config(config: &Config) {
    println!("{}", "⚙️  Cache Configuration".bright_blue().bold());
    println!();
    println!("  Version:        {}", config.cache_version.cyan());
    println!("  Backend:        {}", config.backend.cyan());
    match config.redis_url {
        Some(ref url) => println!(
            "  Redis:          {}",
            cache_provider::config::mask_connection_string(url).cyan()
        ),
        None => println!("  Redis:          {}", "not configured".bright_black()),
    }
    println!(
        "  Mode:           {}",
        config.validation_mode().to_string().cyan()
    );
    println!(
        "  On get failure: {}",
        config.get_failure.to_string().cyan()
    );
    match config.autogen_path {
        Some(ref path) => println!("  Reports:        {}", path.display().to_string().cyan()),
        None => println!("  Reports:        {}", "disabled".bright_black()),
    }
    println!();
}

/// Renders the key of a call whose arguments are all strings.
///
/// Strings render verbatim, so the key is the prefix followed by each
/// argument and a separator.
fn render_key(version: &str, literal: &str, args: &[String]) -> String {
    let mut key = format!("{version}{KEY_SEPARATOR}{literal}{KEY_SEPARATOR}");
    for arg in args {
        key.push_str(arg);
        key.push(KEY_SEPARATOR);
    }
    key
}

async fn get_entry(backend: &Arc<dyn CacheBackend>, key: &str) -> Result<()> {
    println!("{}", "🔍 Cache Entry".bright_blue().bold());
    println!();
    println!("  Key:     {}", key.cyan());
    println!("  Backend: {}", backend.name().cyan());
    println!();

    match backend
        .get(key)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read key: {}", e))?
    {
        Some(value) => {
            println!("  Type:    {}", value.type_tag.bright_white().bold());
            println!("  Payload:");
            let pretty = serde_json::to_string_pretty(&value.payload)?;
            for line in pretty.lines() {
                println!("    {}", line);
            }
        }
        None => println!("{}", "  No value stored under this key".yellow()),
    }
    println!();

    Ok(())
}

/// Deletes a key with confirmation prompt (default: No).
async fn delete_entry(backend: &Arc<dyn CacheBackend>, key: &str, skip_confirm: bool) -> Result<()> {
    println!("{}", "🗑️  Delete Cache Entry".bright_blue().bold());
    println!();
    println!("  Key:     {}", key.cyan());
    println!("  Backend: {}", backend.name().cyan());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete this entry?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let removed = backend
        .invalidate(key)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to delete key: {}", e))?;

    println!();
    if removed {
        println!("{}", "✅ Entry deleted".green().bold());
    } else {
        println!("{}", "⚠️  Nothing was stored under this key".yellow());
    }
    println!();

    Ok(())
}

async fn check_backend(config: &Config) -> Result<()> {
    println!("{}", "🔌 Checking cache backend...".bright_blue().bold());

    let backend = backend(config)?;
    if backend.health_check().await {
        println!("{} {}", "✅".green(), format!("{} is reachable", backend.name()).green());
        Ok(())
    } else {
        println!("{} {}", "❌".red(), format!("{} is not reachable", backend.name()).red());
        anyhow::bail!("cache backend health check failed")
    }
}
