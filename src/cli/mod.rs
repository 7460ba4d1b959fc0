//! CLI subcommand definitions and handlers.
//!
//! Uses clap derive to define the subcommand hierarchy:
//! - `serve` (default) -- start the voting web front end
//! - `store` -- start the bundled REST response store
//! - `status` -- query a running front end for health info
//! - `config show|path` -- inspect configuration
//! - `version` -- print build/version info

use clap::{Parser, Subcommand};

/// Spot-the-liar voting server.
#[derive(Parser, Debug)]
#[command(
    name = "liarvote",
    version = env!("CARGO_PKG_VERSION"),
    about = "liarvote: two-video spot-the-liar voting with an admin results view"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the voting web front end (default when no subcommand is given).
    Serve,

    /// Start the bundled in-memory REST response store.
    Store {
        /// Admin secret to hand out (default: from config, else generated).
        #[arg(long)]
        admin_secret: Option<String>,
    },

    /// Query a running front end for health/status information.
    Status {
        /// Port of the running instance (default: from config or 3000).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host of the running instance.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Inspect configuration.
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Print version, build date, and git commit information.
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the fully loaded configuration (secrets redacted) as JSON.
    Show,

    /// Print the resolved configuration file path.
    Path,
}

// ---------------------------------------------------------------------------
// Subcommand handlers
// ---------------------------------------------------------------------------

use crate::config::{self, DEFAULT_PORT};
use crate::{logging, server};
use serde_json::Value;

/// Keys whose values are never printed.
const SECRET_KEYS: &[&str] = &["apikey", "api_key", "secret", "password", "token"];

/// Run the `serve` subcommand.
pub async fn handle_serve() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::load_config()?;
    logging::init_logging(&cfg.logging)?;
    server::run_server(&cfg).await?;
    Ok(())
}

/// Run the `store` subcommand.
pub async fn handle_store(admin_secret: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::load_config()?;
    logging::init_logging(&cfg.logging)?;

    let secret = match admin_secret.or_else(|| cfg.store_server.admin_secret.clone()) {
        Some(secret) if !secret.trim().is_empty() => secret,
        _ => {
            let generated = uuid::Uuid::new_v4().simple().to_string();
            tracing::warn!("no admin secret configured; generated one for this run");
            // Printed to the terminal only, never to the log stream.
            println!("Admin secret for this run: {}", generated);
            println!(
                "Admin view: {}/?admin={}",
                cfg.server.public_url(),
                generated
            );
            generated
        }
    };

    server::run_store_server(&cfg, secret).await?;
    Ok(())
}

/// Run the `config show` subcommand.
pub fn handle_config_show() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::load_config()?;
    let redacted = redact_secrets(serde_json::to_value(&cfg)?);
    println!("{}", serde_json::to_string_pretty(&redacted)?);
    Ok(())
}

/// Run the `config path` subcommand.
pub fn handle_config_path() {
    println!("{}", config::get_config_path().display());
}

/// Run the `status` subcommand -- connect to a running instance's health endpoint.
pub async fn handle_status(
    host: &str,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let port = resolve_port(port);
    let url = format!("http://{}:{}/health", host, port);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()?;

    let response = match client.get(&url).send().await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Could not connect to liarvote at {}:{}", host, port);
            eprintln!("  Error: {}", e);
            eprintln!();
            eprintln!("Is the server running? Start it with: liarvote serve");
            std::process::exit(1);
        }
    };

    if !response.status().is_success() {
        eprintln!(
            "Health endpoint returned HTTP {}: {}",
            response.status(),
            response.text().await.unwrap_or_default()
        );
        std::process::exit(1);
    }

    let body: Value = response.json().await?;

    println!("liarvote status");
    println!("===============");
    if let Some(version) = body.get("version").and_then(|v| v.as_str()) {
        println!("  Version:  {}", version);
    }
    if let Some(uptime) = body.get("uptimeSeconds").and_then(|v| v.as_i64()) {
        println!("  Uptime:   {}", format_duration(uptime));
    }
    println!("  Address:  {}:{}", host, port);
    if let Some(sessions) = body.get("sessions").and_then(|v| v.as_u64()) {
        println!("  Sessions: {}", sessions);
    }
    if let Some(status) = body.get("status").and_then(|v| v.as_str()) {
        println!("  Status:   {}", status);
    }

    Ok(())
}

/// Run the `version` subcommand.
pub fn handle_version() {
    println!("liarvote {}", env!("CARGO_PKG_VERSION"));
    println!("  Build date: {}", env!("LIARVOTE_BUILD_DATE"));
    println!("  Git commit: {}", env!("LIARVOTE_GIT_HASH"));
    println!(
        "  Platform:   {} ({})",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Redact known secret keys in a JSON value (recursive).
fn redact_secrets(mut value: Value) -> Value {
    match &mut value {
        Value::Object(map) => {
            let keys: Vec<String> = map.keys().cloned().collect();
            for key in keys {
                let lower = key.to_lowercase();
                if SECRET_KEYS.iter().any(|s| lower.contains(s)) {
                    if map.get(&key).is_some_and(|v| !v.is_null()) {
                        map.insert(key, Value::String("[REDACTED]".to_string()));
                    }
                } else if let Some(child) = map.remove(&key) {
                    map.insert(key, redact_secrets(child));
                }
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                *item = redact_secrets(item.take());
            }
        }
        _ => {}
    }
    value
}

/// Resolve the port to use for connecting to a running instance.
/// Tries (in order): explicit flag, config file value, DEFAULT_PORT.
fn resolve_port(explicit: Option<u16>) -> u16 {
    if let Some(p) = explicit {
        return p;
    }
    config::load_config()
        .map(|cfg| cfg.server.port)
        .unwrap_or(DEFAULT_PORT)
}

/// Format seconds into a human-readable duration string.
fn format_duration(seconds: i64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if days > 0 {
        format!("{}d {}h {}m {}s", days, hours, mins, secs)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
