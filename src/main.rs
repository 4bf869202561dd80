//! mealcard - a CLI for the MySodexo benefit-card service.
//!
//! Logs in once, caches the session, and answers balance queries without
//! re-authenticating on every invocation.

mod api;
mod app;
mod config;
mod models;
mod session;

use std::io;

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::Config;
use session::SessionCache;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn print_usage() {
    println!("Usage: mealcard [ACTION]");
    println!();
    println!("Actions:");
    println!("  --login    Login and store the session");
    println!("  --balance  Print the balance of each card");
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = Config::load()?;
    let cache = SessionCache::new(Config::cache_dir()?);

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("--login") => {
            app::process_login(&config, &cache, app::prompt_credentials)?;
            println!("Login successful, session cached.");
        }
        Some("--balance") => {
            app::process_balance(&config, &cache, app::prompt_credentials)?;
        }
        _ => print_usage(),
    }

    Ok(())
}
