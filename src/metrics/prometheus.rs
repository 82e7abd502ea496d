//! Prometheus metrics integration

use once_cell::sync::Lazy;
use prometheus::{opts, register_int_counter, register_int_gauge, Encoder, IntCounter, IntGauge, TextEncoder};

use crate::models::{RegistryError, RegistryResult};

// Define metrics
static REGISTRATIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        opts!("endpoint_registrations_total", "Total number of accepted registrations")
    )
    .expect("Failed to create registrations counter")
});

static REPLACEMENTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        opts!("endpoint_replacements_total", "Registrations that replaced a stale one")
    )
    .expect("Failed to create replacements counter")
});

static UPDATES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        opts!("endpoint_updates_total", "Total number of applied registration updates")
    )
    .expect("Failed to create updates counter")
});

static DEREGISTRATIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        opts!("endpoint_deregistrations_total", "Total number of explicit deregistrations")
    )
    .expect("Failed to create deregistrations counter")
});

static EVICTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        opts!("endpoint_evictions_total", "Registrations evicted after their lease expired")
    )
    .expect("Failed to create evictions counter")
});

static ACTIVE_ENDPOINTS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        opts!("endpoint_active_registrations", "Currently active registrations")
    )
    .expect("Failed to create active registrations gauge")
});

/// Initialize all metrics
pub fn init_metrics() {
    // Force lazy initialization
    Lazy::force(&REGISTRATIONS_TOTAL);
    Lazy::force(&REPLACEMENTS_TOTAL);
    Lazy::force(&UPDATES_TOTAL);
    Lazy::force(&DEREGISTRATIONS_TOTAL);
    Lazy::force(&EVICTIONS_TOTAL);
    Lazy::force(&ACTIVE_ENDPOINTS);
}

pub fn record_registration() {
    REGISTRATIONS_TOTAL.inc();
}

pub fn record_replacement() {
    REPLACEMENTS_TOTAL.inc();
}

pub fn record_update() {
    UPDATES_TOTAL.inc();
}

pub fn record_deregistration() {
    DEREGISTRATIONS_TOTAL.inc();
}

pub fn record_eviction() {
    EVICTIONS_TOTAL.inc();
}

/// Set the active registrations gauge
pub fn set_active_endpoints(count: i64) {
    ACTIVE_ENDPOINTS.set(count);
}

/// Encode all registered metrics in the Prometheus text format
pub fn gather_metrics() -> RegistryResult<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| RegistryError::Internal(format!("Failed to encode metrics: {}", e)))?;

    String::from_utf8(buffer)
        .map_err(|e| RegistryError::Internal(format!("Metrics are not valid UTF-8: {}", e)))
}
