//! # LoRaWAN Node Runtime
//!
//! Hosts the pub/sub registration adapter.
//!
//! ## Startup Sequence
//!
//! 1. Initialise logging (`RUST_LOG` overrides the `info` default)
//! 2. Load configuration from the TOML file given as first argument, if any
//! 3. Bind the registration intake
//! 4. Drain registrations until Ctrl-C, then shut the intake down
//!
//! Until a routing layer is wired in, every registration is logged and
//! acknowledged.

mod config;

use anyhow::{Context, Result};
use lw_pubsub_adapter::{AdapterError, JsonRegistrationParser, PubSubAdapter};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::RuntimeConfig;

fn load_config() -> Result<RuntimeConfig> {
    match std::env::args_os().nth(1) {
        Some(path) => {
            let config = RuntimeConfig::load(&path)
                .with_context(|| format!("Failed to load {}", path.to_string_lossy()))?;
            info!("Loaded configuration from {}", path.to_string_lossy());
            Ok(config)
        }
        None => {
            info!("No configuration file given, using defaults");
            Ok(RuntimeConfig::default())
        }
    }
}

/// Pull registrations until shutdown.
async fn drain_registrations(adapter: &PubSubAdapter) -> Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            signal = &mut ctrl_c => {
                signal.context("Failed to listen for Ctrl+C")?;
                info!("Received Ctrl+C");
                return Ok(());
            }
            next = adapter.next_registration() => {
                let (registration, mut ack) = match next {
                    Ok(delivered) => delivered,
                    Err(AdapterError::Shutdown) => return Ok(()),
                    Err(e) => return Err(e.into()),
                };

                info!(
                    handoff_id = %ack.id(),
                    dev_addr = %registration.dev_addr,
                    app_id = %registration.recipient.id,
                    app_url = %registration.recipient.address,
                    "Subscribed end-device"
                );

                if let Err(e) = ack.ack() {
                    warn!(dev_addr = %registration.dev_addr, "Ack failed: {}", e);
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("===========================================");
    info!("  LoRaWAN Node Runtime v{}", lw_pubsub_adapter::VERSION);
    info!("===========================================");

    let config = load_config()?;

    let adapter = PubSubAdapter::bind(config.intake, JsonRegistrationParser)
        .await
        .context("Failed to start registration intake")?;
    info!("Registration intake on {}", adapter.local_addr());
    info!("Node is running. Press Ctrl+C to stop.");

    let drained = drain_registrations(&adapter).await;

    // Graceful shutdown
    info!("Initiating graceful shutdown...");
    adapter.shutdown().await?;
    info!(metrics = ?adapter.metrics(), "Registration intake stopped");

    drained
}
