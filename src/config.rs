use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::moku::{DEFAULT_ADDRESS, DEFAULT_PORT};
use crate::types::LockinProfile;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub moku: MokuConfig,
    pub profile: LockinProfile,
    pub scan: ScanTiming,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MokuConfig {
    /// Device address as shown in the Moku GUI (Device Info). IPv6 literals
    /// keep their brackets.
    pub address: String,
    pub port: u16,
    /// Claim ownership even if another client already owns the device
    pub force_connect: bool,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

/// Settle delays between stimulus changes and measurements.
///
/// Defaults match the drum bench: 1 s after a frequency change, 3 s after a
/// radial move, 2 s after an angular advance.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScanTiming {
    pub settle_secs: f64,
    pub radial_settle_secs: f64,
    pub angular_settle_secs: f64,
}

impl ScanTiming {
    pub fn settle(&self) -> Duration {
        Duration::from_secs_f64(self.settle_secs)
    }

    pub fn radial_settle(&self) -> Duration {
        Duration::from_secs_f64(self.radial_settle_secs)
    }

    pub fn angular_settle(&self) -> Duration {
        Duration::from_secs_f64(self.angular_settle_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            moku: MokuConfig::default(),
            profile: LockinProfile::default(),
            scan: ScanTiming::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for MokuConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            force_connect: false,
            connect_timeout_secs: 5,
            read_timeout_secs: 10,
        }
    }
}

impl Default for ScanTiming {
    fn default() -> Self {
        Self {
            settle_secs: 1.0,
            radial_settle_secs: 3.0,
            angular_settle_secs: 2.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Load configuration from file with layered fallbacks
pub fn load_config(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

    if let Some(path) = config_path {
        if path.exists() {
            builder = builder.add_source(File::from(path));
        } else {
            return Err(ConfigError::Message(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
    } else if Path::new("drum.toml").exists() {
        builder = builder.add_source(File::with_name("drum.toml"));
    }

    // Environment variable overrides with prefix "DRUM_"
    builder = builder.add_source(
        Environment::with_prefix("DRUM")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize::<AppConfig>()
}

/// Load configuration with defaults when loading fails
pub fn load_config_or_default(config_path: Option<&Path>) -> AppConfig {
    match load_config(config_path) {
        Ok(config) => {
            log::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            log::warn!("Failed to load config ({}), using defaults", e);
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_drum_bench() {
        let config = AppConfig::default();
        assert_eq!(config.moku.address, DEFAULT_ADDRESS);
        assert_eq!(config.moku.port, DEFAULT_PORT);
        assert!(!config.moku.force_connect);
        assert_eq!(config.scan.settle_secs, 1.0);
        assert_eq!(config.scan.radial_settle_secs, 3.0);
        assert_eq!(config.profile.lowpass_slope, 12);
    }

    #[test]
    fn test_scan_timing_durations() {
        let timing = ScanTiming {
            settle_secs: 0.5,
            radial_settle_secs: 3.0,
            angular_settle_secs: 2.0,
        };
        assert_eq!(timing.settle(), Duration::from_millis(500));
        assert_eq!(timing.radial_settle(), Duration::from_secs(3));
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let result = load_config(Some(Path::new("/nonexistent/drum.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_or_default_falls_back() {
        let config = load_config_or_default(Some(Path::new("/nonexistent/drum.toml")));
        assert_eq!(config.moku.port, DEFAULT_PORT);
    }
}
