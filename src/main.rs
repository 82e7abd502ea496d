//! Endpoint Registry - Main Entry Point
//!
//! Runs the registry with an in-process directory, logs lifecycle events,
//! and sweeps expired leases until interrupted.

use anyhow::Context;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use endpoint_registry::config::Settings;
use endpoint_registry::device::UnreachableSender;
use endpoint_registry::events::{BroadcastEventSink, LifecycleEventPublisher};
use endpoint_registry::metrics::init_metrics;
use endpoint_registry::registry::{LeaseSweeper, Registry, SystemClock};
use endpoint_registry::InMemoryDirectory;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with RUST_LOG environment variable support
    // Default: info level for endpoint_registry, warn for everything else
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,endpoint_registry=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true))
        .init();

    // Load configuration
    let settings = Settings::load().unwrap_or_else(|e| {
        warn!("Failed to load config: {}, using defaults", e);
        Settings::default()
    });

    info!("Starting Endpoint Registry v{}", endpoint_registry::VERSION);

    if settings.metrics.enabled {
        init_metrics();
    }

    let directory = Arc::new(InMemoryDirectory::new());
    let registry = Arc::new(
        Registry::new(Arc::new(SystemClock))
            .with_directory(directory)
            .with_sender(Arc::new(UnreachableSender))
            .with_response_timeout(settings.device.response_timeout()),
    );

    // Lifecycle events
    let sink = Arc::new(BroadcastEventSink::new(settings.events.channel_capacity));
    let mut events = sink.subscribe();
    registry.add_listener(Arc::new(LifecycleEventPublisher::new(sink.clone())));

    let event_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => info!(
                    "{}: {} (id: {})",
                    event.topic,
                    event.client().endpoint_name,
                    event.client().registration_id
                ),
                Err(RecvError::Lagged(skipped)) => warn!("Event log lagged, skipped {} events", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let sweeper = LeaseSweeper::start(Arc::clone(&registry), settings.sweeper.to_config());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutting down with {} active registrations", registry.len());

    sweeper.stop().await;
    event_task.abort();

    Ok(())
}
