//! Registry configuration settings

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::registry::SweeperConfig;

/// Main registry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub sweeper: SweeperSettings,
    #[serde(default)]
    pub device: DeviceSettings,
    #[serde(default)]
    pub events: EventSettings,
    #[serde(default)]
    pub metrics: MetricsSettings,
}

/// Lease sweeper settings
#[derive(Debug, Clone, Deserialize)]
pub struct SweeperSettings {
    /// Delay before the first sweep in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,
    /// Sweep period in milliseconds
    #[serde(default = "default_period")]
    pub period_ms: u64,
    /// How long shutdown waits for an in-flight sweep, in milliseconds
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_ms: u64,
}

fn default_initial_delay() -> u64 {
    1000
}

fn default_period() -> u64 {
    5000
}

fn default_stop_timeout() -> u64 {
    5000
}

impl SweeperSettings {
    pub fn to_config(&self) -> SweeperConfig {
        SweeperConfig {
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            period: Duration::from_millis(self.period_ms),
            stop_timeout: Duration::from_millis(self.stop_timeout_ms),
        }
    }
}

impl Default for SweeperSettings {
    fn default() -> Self {
        SweeperSettings {
            initial_delay_ms: default_initial_delay(),
            period_ms: default_period(),
            stop_timeout_ms: default_stop_timeout(),
        }
    }
}

/// Device request settings
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSettings {
    /// Response timeout for device requests in milliseconds
    #[serde(default = "default_response_timeout")]
    pub response_timeout_ms: u64,
}

fn default_response_timeout() -> u64 {
    2000
}

impl DeviceSettings {
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

impl Default for DeviceSettings {
    fn default() -> Self {
        DeviceSettings {
            response_timeout_ms: default_response_timeout(),
        }
    }
}

/// Event delivery settings
#[derive(Debug, Clone, Deserialize)]
pub struct EventSettings {
    /// Events buffered per subscriber before the slowest one starts lagging
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    1024
}

impl Default for EventSettings {
    fn default() -> Self {
        EventSettings {
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Metrics settings
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for MetricsSettings {
    fn default() -> Self {
        MetricsSettings { enabled: true }
    }
}

impl Settings {
    /// Load settings from file and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load settings from a specific config file path (without extension)
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_path = path.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("sweeper.initial_delay_ms", default_initial_delay() as i64)?
            .set_default("sweeper.period_ms", default_period() as i64)?
            .set_default("sweeper.stop_timeout_ms", default_stop_timeout() as i64)?
            .set_default("device.response_timeout_ms", default_response_timeout() as i64)?
            .set_default("events.channel_capacity", default_channel_capacity() as i64)?
            .set_default("metrics.enabled", true)?
            // Add config file if it exists
            .add_source(File::with_name(config_path.to_str().unwrap_or("config")).required(false))
            // Add environment variables with prefix ENDPOINT_REGISTRY_
            .add_source(Environment::with_prefix("ENDPOINT_REGISTRY").separator("__"));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.sweeper.period_ms == 0 {
            return Err(ConfigError::Message(
                "sweeper.period_ms must be greater than zero".to_string(),
            ));
        }
        if self.events.channel_capacity == 0 {
            return Err(ConfigError::Message(
                "events.channel_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings::load().unwrap_or_else(|_| Settings {
            // Provide built-in defaults if config loading fails
            sweeper: SweeperSettings::default(),
            device: DeviceSettings::default(),
            events: EventSettings::default(),
            metrics: MetricsSettings::default(),
        })
    }
}
