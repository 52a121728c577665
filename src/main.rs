//! Electronics Storage - drawer inventory with GPIO LED locator
//!
//! Serves the drawer UI over HTTP and drives the cabinet's locator LEDs.
//! On a Raspberry Pi (feature `rpi`) the LEDs sit on real GPIO lines;
//! everywhere else a mock backend keeps the application fully usable.

use anyhow::Result;
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use electronics_storage::api::{self, ApiState, DEFAULT_PORT};
use electronics_storage::gpio::{LedBackend, MockBackend};
use electronics_storage::leds::LedController;
use electronics_storage::store::DrawerStore;

/// Elektronikus Alkatrész Tároló - web UI and LED locator for a 32-drawer cabinet
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Listen address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Listen port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Data file path (default: ~/electronics_storage_data.json)
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Use the in-memory GPIO mock even when built with real GPIO support
    #[arg(long)]
    mock_gpio: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level)?;

    info!("Starting Elektronikus Alkatrész Tároló...");

    let backend = make_backend(args.mock_gpio)?;
    let leds = Arc::new(LedController::new(backend));

    let store = match &args.data_file {
        Some(path) => DrawerStore::new(path.clone()),
        None => DrawerStore::at_default_location(),
    };
    info!("Drawer data file: {}", store.path().display());

    print_pin_layout(&leds);

    println!("\n{}", "Available at:".bold());
    println!("  http://localhost:{}", args.port);

    let state = Arc::new(ApiState {
        store,
        leds: leds.clone(),
    });

    api::start_server(state, &args.host, args.port, shutdown_signal()).await?;

    // Leave the cabinet dark on the way out
    leds.set_all(false);
    info!("Shutdown complete");
    Ok(())
}

/// Real GPIO when built with `rpi` and not overridden, mock otherwise
fn make_backend(force_mock: bool) -> Result<Arc<dyn LedBackend>> {
    #[cfg(feature = "rpi")]
    if !force_mock {
        let backend = electronics_storage::gpio::RpiBackend::new()?;
        info!("Using Raspberry Pi GPIO backend");
        return Ok(Arc::new(backend));
    }

    let _ = force_mock;
    info!("Using mock GPIO backend (no hardware writes)");
    Ok(Arc::new(MockBackend::new()))
}

/// Print the drawer -> GPIO assignment the way it is wired, one row per line
fn print_pin_layout(leds: &LedController) {
    println!("\n{}", "=== GPIO pin layout ===".bold().cyan());

    let mut current_row = 0;
    for (id, pin) in leds.assignments() {
        if id.row != current_row {
            if current_row != 0 {
                println!();
            }
            current_row = id.row;
            print!("  ");
        } else {
            print!(" | ");
        }
        print!("{} {}: GPIO {}", "Fiók".dimmed(), id, pin.to_string().green());
    }
    println!();
    println!("  {} {} LED", "Total:".bold(), leds.lit_count());
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    info!("Shutdown signal received");
}
