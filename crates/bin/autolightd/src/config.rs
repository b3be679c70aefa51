//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `autolight.toml` in the working directory, or at the path named
//! by `AUTOLIGHT_CONFIG`. Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use std::time::Duration;

use autolight_domain::config::ControllerConfig;
use autolight_domain::error::ValidationError;
use serde::Deserialize;

const DEFAULT_PATH: &str = "autolight.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Devices, thresholds and delays of the light controller.
    pub controller: ControllerConfig,
    /// Stdin/stdout bridge settings.
    pub bridge: BridgeConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// JSON-lines bridge configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// How long a status query waits for its reply line.
    #[serde(
        rename = "status_timeout_ms",
        with = "autolight_domain::time::duration_ms"
    )]
    pub status_timeout: Duration,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from the config file (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is unreadable or
    /// malformed, or if the resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let lookup = |key: &str| std::env::var(key).ok();
        let path = lookup("AUTOLIGHT_CONFIG").unwrap_or_else(|| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("AUTOLIGHT_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.controller.validate()?;
        Ok(())
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            status_timeout: Duration::from_secs(2),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "autolightd=info,autolight_app=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration")]
    Validation(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use autolight_domain::config::MotionDevice;
    use autolight_domain::id::DeviceId;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.controller, ControllerConfig::default());
        assert_eq!(config.bridge.status_timeout, Duration::from_secs(2));
        assert_eq!(config.logging.filter, "autolightd=info,autolight_app=info");
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.controller.off_delay, Duration::from_secs(10));
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [controller]
            lux_threshold = 35.0
            off_delay_ms = 70000
            on_safety_delay_ms = 600000

            [controller.devices]
            relay = 0
            lux = 200
            manual_inputs = [0]
            motion = { via = 'binary_sensor', id = 201 }

            [bridge]
            status_timeout_ms = 500

            [logging]
            filter = 'debug'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.controller.lux_threshold, Some(35.0));
        assert_eq!(config.controller.off_delay, Duration::from_secs(70));
        assert_eq!(
            config.controller.devices.motion,
            MotionDevice::BinarySensor {
                id: DeviceId::new(201)
            }
        );
        assert_eq!(config.bridge.status_timeout, Duration::from_millis(500));
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.controller, ControllerConfig::default());
    }

    #[test]
    fn should_report_malformed_file() {
        let path = std::env::temp_dir().join("autolightd-malformed-config.toml");
        std::fs::write(&path, "[controller\n").unwrap();
        let result = Config::from_file(path.to_str().unwrap());
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn should_prefer_rust_log_over_autolight_log() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            "AUTOLIGHT_LOG" => Some("warn".to_string()),
            "RUST_LOG" => Some("trace".to_string()),
            _ => None,
        });
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_keep_file_filter_without_overrides() {
        let mut config = Config::default();
        config.logging.filter = "debug".to_string();
        config.apply_overrides(|_| None);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn should_reject_invalid_controller_section() {
        let mut config = Config::default();
        config.controller.lux_threshold = Some(-1.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(ValidationError::LuxThreshold(_)))
        ));
    }

    #[test]
    fn should_accept_default_configuration() {
        assert!(Config::default().validate().is_ok());
    }
}
