//! Configuration loaded from `mapio.toml`.
//!
//! [`MapioConfig`] holds every orchestration knob. Values missing from the
//! file fall back to defaults matching the original deployment's budget.
//! The `MAPIO_MAX_CONCURRENCY` environment variable takes precedence over
//! the file.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::MapioError;

/// Top-level configuration, loaded from `mapio.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct MapioConfig {
    /// Maximum simultaneous item invocations.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Per-item deadline in milliseconds.
    #[serde(default = "default_item_timeout_ms")]
    pub item_timeout_ms: u64,

    /// Deadline for the single planning call, in milliseconds.
    #[serde(default = "default_plan_timeout_ms")]
    pub plan_timeout_ms: u64,

    /// Optional job-wide deadline in milliseconds. Unset means no limit.
    #[serde(default)]
    pub job_timeout_ms: Option<u64>,

    /// Keep dispatching new items after the first observed failure.
    #[serde(default)]
    pub continue_on_item_failure: bool,
}

fn default_max_concurrency() -> usize {
    5
}

fn default_item_timeout_ms() -> u64 {
    3000
}

fn default_plan_timeout_ms() -> u64 {
    2000
}

impl Default for MapioConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            item_timeout_ms: default_item_timeout_ms(),
            plan_timeout_ms: default_plan_timeout_ms(),
            job_timeout_ms: None,
            continue_on_item_failure: false,
        }
    }
}

impl MapioConfig {
    /// Load configuration from `mapio.toml` in the current directory,
    /// falling back to defaults if the file does not exist.
    pub fn load() -> Result<Self, MapioError> {
        let path = Path::new("mapio.toml");
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<MapioConfig>(&contents)?
        } else {
            Self::default()
        };

        // The environment variable takes precedence over the file.
        if let Ok(raw) = std::env::var("MAPIO_MAX_CONCURRENCY")
            && let Ok(n) = raw.parse::<usize>()
            && n > 0
        {
            config.max_concurrency = n;
        }

        if config.max_concurrency == 0 {
            return Err(MapioError::Config(
                "max_concurrency must be greater than zero".into(),
            ));
        }

        Ok(config)
    }

    pub fn item_timeout(&self) -> Duration {
        Duration::from_millis(self.item_timeout_ms)
    }

    pub fn plan_timeout(&self) -> Duration {
        Duration::from_millis(self.plan_timeout_ms)
    }

    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = MapioConfig::default();
        assert_eq!(config.max_concurrency, 5);
        assert_eq!(config.item_timeout_ms, 3000);
        assert_eq!(config.plan_timeout_ms, 2000);
        assert_eq!(config.job_timeout_ms, None);
        assert!(!config.continue_on_item_failure);
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            max_concurrency = 8
            job_timeout_ms = 60000
        "#;
        let config: MapioConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.job_timeout_ms, Some(60000));
        assert_eq!(config.item_timeout_ms, 3000);
        assert!(!config.continue_on_item_failure);
    }

    #[test]
    fn duration_helpers_convert_milliseconds() {
        let config = MapioConfig {
            job_timeout_ms: Some(1500),
            ..Default::default()
        };
        assert_eq!(config.item_timeout(), Duration::from_millis(3000));
        assert_eq!(config.plan_timeout(), Duration::from_millis(2000));
        assert_eq!(config.job_timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn load_falls_back_to_defaults() {
        // The test working directory typically has no mapio.toml.
        let config = MapioConfig::load().unwrap();
        assert!(config.max_concurrency > 0);
    }
}
