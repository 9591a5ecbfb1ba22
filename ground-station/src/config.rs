use antenna_controller::{DEFAULT_BAUD_RATE, PortSettings};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use tracking::GroundStation;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the satellite catalog JSON file.
    pub catalog: PathBuf,
    pub ground_station: GroundStation,
    #[serde(default)]
    pub rotator: RotatorConfig,
    pub tracking: TrackingConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotatorConfig {
    /// Serial port to open at startup, if any.
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Catalog name of the satellite followed in continuous mode.
    pub satellite: String,
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_settle_ms() -> u64 {
    2000
}

fn default_interval_seconds() -> u64 {
    2
}

impl Default for RotatorConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, with `GROUND_STATION_` environment overrides.
    ///
    /// Nested keys use a double underscore, e.g. `GROUND_STATION_ROTATOR__PORT=/dev/ttyUSB0`.
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("GROUND_STATION")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }
}

impl RotatorConfig {
    pub fn port_settings(&self, port: &str) -> PortSettings {
        PortSettings::new(port)
            .with_baud_rate(self.baud_rate)
            .with_timeout(Duration::from_millis(self.timeout_ms))
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl TrackingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl ApiConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
