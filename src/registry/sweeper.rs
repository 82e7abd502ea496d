//! Background eviction of expired registrations

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::Registry;

/// Sweeper timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweeperConfig {
    /// Delay before the first sweep
    pub initial_delay: Duration,
    /// Time between sweeps
    pub period: Duration,
    /// How long `stop` waits for an in-flight sweep
    pub stop_timeout: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            period: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
        }
    }
}

/// Periodic task evicting registrations whose lease has run out
pub struct LeaseSweeper {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    ticks: Arc<AtomicU64>,
    stop_timeout: Duration,
}

impl LeaseSweeper {
    /// Spawn the sweeper on the current tokio runtime
    pub fn start(registry: Arc<Registry>, config: SweeperConfig) -> Self {
        let cancel = CancellationToken::new();
        let ticks = Arc::new(AtomicU64::new(0));
        // tokio intervals reject a zero period
        let period = config.period.max(Duration::from_millis(1));

        let handle = tokio::spawn(run(
            registry,
            config.initial_delay,
            period,
            cancel.clone(),
            Arc::clone(&ticks),
        ));

        info!(
            "Lease sweeper started (initial delay: {:?}, period: {:?})",
            config.initial_delay, period
        );

        Self {
            cancel,
            handle,
            ticks,
            stop_timeout: config.stop_timeout,
        }
    }

    /// Completed sweeps so far
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Stop sweeping, waiting up to the configured timeout for an in-flight
    /// sweep. Returns `false` if the task had to be aborted or had failed.
    pub async fn stop(mut self) -> bool {
        self.cancel.cancel();

        match time::timeout(self.stop_timeout, &mut self.handle).await {
            Ok(Ok(())) => {
                info!("Lease sweeper stopped after {} sweeps", self.tick_count());
                true
            }
            Ok(Err(e)) => {
                error!("Lease sweeper task failed: {}", e);
                false
            }
            Err(_) => {
                warn!(
                    "Lease sweeper did not stop within {:?}, aborting",
                    self.stop_timeout
                );
                self.handle.abort();
                false
            }
        }
    }
}

impl Drop for LeaseSweeper {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    registry: Arc<Registry>,
    initial_delay: Duration,
    period: Duration,
    cancel: CancellationToken,
    ticks: Arc<AtomicU64>,
) {
    let mut interval = time::interval_at(Instant::now() + initial_delay, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                // Sweeps run listener callbacks synchronously; keep them off
                // the async workers so `stop` can time out on a stuck one.
                let registry = Arc::clone(&registry);
                let sweep = tokio::task::spawn_blocking(move || {
                    let now = registry.now();
                    registry.sweep(now)
                });

                match sweep.await {
                    Ok(evicted) => {
                        if !evicted.is_empty() {
                            debug!("Sweep evicted {} registrations", evicted.len());
                        }
                    }
                    Err(e) => error!("Lease sweep failed: {}", e),
                }
                ticks.fetch_add(1, Ordering::Release);
            }
        }
    }
}
