use std::collections::HashMap;

use config::{Config as ConfigLib, ConfigError, Environment, File};
use serde::Deserialize;

use crate::sensor::Thresholds;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub sensor: SensorConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SensorConfig {
    /// Base CRL location, ending in `.crl`
    pub url: String,
    pub timeout_secs: u64,
    /// Do not look for a delta CRL at all
    pub skip_delta: bool,
    /// Fail the run when the delta CRL cannot be fetched or decoded
    pub delta_failure_is_error: bool,
    pub base: Thresholds,
    pub delta: Thresholds,
}

impl Config {
    pub fn load_with_sources(
        env_vars: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        Self::build(env_vars, HashMap::new())
    }

    /// Load from defaults, `config/settings` and the environment, then apply
    /// `overrides` (typically command-line flags) on top.
    pub fn load_with_overrides(overrides: HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::build(None, overrides)
    }

    fn build(
        env_vars: Option<HashMap<String, String>>,
        overrides: HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut builder = ConfigLib::builder()
            .set_default("sensor.url", "")?
            .set_default("sensor.timeout_secs", 30)?
            .set_default("sensor.skip_delta", false)?
            .set_default("sensor.delta_failure_is_error", false)?
            .set_default("sensor.base.warning_hours", 48)?
            .set_default("sensor.base.error_hours", 24)?
            .set_default("sensor.delta.warning_hours", 12)?
            .set_default("sensor.delta.error_hours", 4)?
            .add_source(File::with_name("config/settings").required(false));

        // If env_vars is provided, we use it instead of system environment
        // This is to avoid systems variables pollution across tests
        if let Some(vars) = env_vars {
            for (key, value) in vars {
                builder = builder.set_override(&key, value)?;
            }
        } else {
            // Should be in the format APP_SENSOR__URL or APP_SENSOR__BASE__WARNING_HOURS
            builder = builder.add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );
        }

        for (key, value) in overrides {
            builder = builder.set_override(&key, value)?;
        }

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sensor.url.trim().is_empty() {
            return Err(ConfigError::Message(
                "sensor.url must be set to the base CRL location".to_string(),
            ));
        }

        for (name, limits) in [("base", self.sensor.base), ("delta", self.sensor.delta)] {
            if limits.error_hours > limits.warning_hours {
                return Err(ConfigError::Message(format!(
                    "sensor.{name}.error_hours ({}) must not exceed sensor.{name}.warning_hours ({})",
                    limits.error_hours, limits.warning_hours
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_config_requires_url() {
        let result = Config::load_with_sources(Some(HashMap::new()));
        assert!(matches!(result, Err(ConfigError::Message(_))));
    }

    #[test]
    fn test_defaults_with_url() {
        let env_vars = vars(&[("sensor.url", "http://pki.contoso.example/Contoso.crl")]);

        let config = Config::load_with_sources(Some(env_vars)).expect("Failed to load config");

        assert_eq!(config.sensor.url, "http://pki.contoso.example/Contoso.crl");
        assert_eq!(config.sensor.timeout_secs, 30);
        assert!(!config.sensor.skip_delta);
        assert!(!config.sensor.delta_failure_is_error);
        assert_eq!(
            config.sensor.base,
            Thresholds {
                warning_hours: 48,
                error_hours: 24
            }
        );
        assert_eq!(
            config.sensor.delta,
            Thresholds {
                warning_hours: 12,
                error_hours: 4
            }
        );
    }

    #[test]
    fn test_env_config() {
        let env_vars = vars(&[
            ("sensor.url", "https://pki.contoso.example/root.crl"),
            ("sensor.timeout_secs", "5"),
            ("sensor.skip_delta", "true"),
            ("sensor.base.warning_hours", "72"),
            ("sensor.base.error_hours", "36"),
        ]);

        let config = Config::load_with_sources(Some(env_vars)).expect("Failed to load config");

        assert_eq!(config.sensor.timeout_secs, 5);
        assert!(config.sensor.skip_delta);
        assert_eq!(config.sensor.base.warning_hours, 72);
        assert_eq!(config.sensor.base.error_hours, 36);
        // The other values should use default
        assert_eq!(config.sensor.delta.warning_hours, 12);
    }

    #[test]
    fn test_overrides_win_over_sources() {
        let env_vars = vars(&[
            ("sensor.url", "https://pki.contoso.example/root.crl"),
            ("sensor.delta.error_hours", "2"),
        ]);
        let overrides = vars(&[("sensor.delta.error_hours", "6")]);

        let config = Config::build(Some(env_vars), overrides).expect("Failed to load config");

        assert_eq!(config.sensor.delta.error_hours, 6);
    }

    #[test]
    fn test_error_limit_above_warning_is_rejected() {
        let env_vars = vars(&[
            ("sensor.url", "https://pki.contoso.example/root.crl"),
            ("sensor.delta.error_hours", "24"),
        ]);

        let err = Config::load_with_sources(Some(env_vars)).unwrap_err();
        assert!(err.to_string().contains("sensor.delta.error_hours"));
    }
}
