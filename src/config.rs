//! Configuration loader - YAML manifest + .env secrets

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration loaded from tripboard.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Local schedule document
    #[serde(default = "default_schedule_path")]
    pub schedule: String,
    /// Remote schedule endpoint; takes priority over the local file
    #[serde(default)]
    pub schedule_url: Option<String>,
    /// Tile provider shown in the attribution line
    #[serde(default = "default_provider_name")]
    pub provider_name: String,
    /// Slippy-map tile URL template with {z}/{x}/{y} placeholders
    #[serde(default = "default_provider_url")]
    pub provider_url: String,
    /// Fixed header height used by the scroll-spy anchor
    #[serde(default = "default_header_offset")]
    pub header_offset: f32,
}

fn default_schedule_path() -> String {
    "schedule.json".to_string()
}

fn default_provider_name() -> String {
    "OpenStreetMap".to_string()
}

fn default_provider_url() -> String {
    "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string()
}

fn default_header_offset() -> f32 {
    84.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schedule: default_schedule_path(),
            schedule_url: None,
            provider_name: default_provider_name(),
            provider_url: default_provider_url(),
            header_offset: default_header_offset(),
        }
    }
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

/// Secrets and overrides loaded from .env
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub schedule_url: Option<String>,
    pub log_dir: String,
}

impl Secrets {
    /// Load secrets from .env file
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        Secrets {
            schedule_url: std::env::var("SCHEDULE_URL").ok(),
            log_dir: std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.schedule, "schedule.json");
        assert_eq!(config.provider_name, "OpenStreetMap");
        assert!(config.provider_url.contains("{z}"));
        assert_eq!(config.header_offset, 84.0);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str("schedule: trip/plan.json\n").unwrap();
        assert_eq!(config.schedule, "trip/plan.json");
        assert_eq!(config.provider_name, "OpenStreetMap");
    }
}
