//! Server and gameplay configuration, loaded from `config/server.toml`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::item::Ingredient;

pub const DEFAULT_CONFIG_PATH: &str = "config/server.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerSection,
    pub tuning: Tuning,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    /// Simulation ticks per second
    pub tick_rate: f32,
    pub data_dir: PathBuf,
    pub default_kitchen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 2567,
            tick_rate: 20.0,
            data_dir: PathBuf::from("data"),
            default_kitchen: "classic".to_string(),
        }
    }
}

/// Gameplay constants shared by every kitchen session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Units per second
    pub player_speed: f32,
    pub player_size: f32,
    pub interaction_radius: f32,
    pub processing_tick_ms: u64,
    pub chop_progress_per_tick: f32,
    pub cook_progress_per_tick: f32,
    pub notice_duration_ms: u64,
    /// One entry: the pantry always hands out that ingredient.
    /// Several: a uniform random pick.
    pub pantry_stock: Vec<Ingredient>,
    pub rng_seed: Option<u64>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player_speed: 6.0,
            player_size: 0.6,
            interaction_radius: 0.96,
            processing_tick_ms: 100,
            chop_progress_per_tick: 0.05,
            cook_progress_per_tick: 0.03,
            notice_duration_ms: 2000,
            pantry_stock: vec![Ingredient::Onion],
            rng_seed: None,
        }
    }
}

impl Tuning {
    pub fn processing_tick(&self) -> Duration {
        Duration::from_millis(self.processing_tick_ms)
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.notice_duration_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.player_speed < 0.0 {
            return Err(ConfigError::Invalid("player_speed must not be negative".into()));
        }
        if self.player_size <= 0.0 || self.interaction_radius <= 0.0 {
            return Err(ConfigError::Invalid(
                "player_size and interaction_radius must be positive".into(),
            ));
        }
        if self.processing_tick_ms == 0 {
            return Err(ConfigError::Invalid("processing_tick_ms must be at least 1".into()));
        }
        for (name, delta) in [
            ("chop_progress_per_tick", self.chop_progress_per_tick),
            ("cook_progress_per_tick", self.cook_progress_per_tick),
        ] {
            if !(delta > 0.0 && delta <= 1.0) {
                return Err(ConfigError::Invalid(format!("{} must be in (0, 1]", name)));
            }
        }
        if self.pantry_stock.is_empty() {
            return Err(ConfigError::Invalid("pantry_stock must not be empty".into()));
        }
        Ok(())
    }
}

impl ServerConfig {
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::warn!("Config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Tick period handed to every session on each host tick.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_nanos((1e9 / self.server.tick_rate as f64).round() as u64)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.server.tick_rate > 0.0 && self.server.tick_rate <= 240.0) {
            return Err(ConfigError::Invalid("tick_rate must be in (0, 240]".into()));
        }
        self.tuning.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = ServerConfig::from_toml_str("", Path::new("test.toml")).unwrap();
        assert_eq!(config.server.port, 2567);
        assert_eq!(config.server.default_kitchen, "classic");
        assert_eq!(config.tuning.pantry_stock, vec![Ingredient::Onion]);
        assert_eq!(config.tuning.processing_tick(), Duration::from_millis(100));
        assert_eq!(config.tick_interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_partial_override() {
        let toml_str = r#"
            [server]
            port = 9000

            [tuning]
            cook_progress_per_tick = 0.1
            pantry_stock = ["tomato", "meat"]
            rng_seed = 7
        "#;

        let config = ServerConfig::from_toml_str(toml_str, Path::new("test.toml")).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.tuning.cook_progress_per_tick, 0.1);
        assert_eq!(config.tuning.chop_progress_per_tick, 0.05);
        assert_eq!(
            config.tuning.pantry_stock,
            vec![Ingredient::Tomato, Ingredient::Meat]
        );
        assert_eq!(config.tuning.rng_seed, Some(7));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = ServerConfig::from_toml_str(
            "[tuning]\nchop_progress_per_tick = 0.0\n",
            Path::new("test.toml"),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = ServerConfig::from_toml_str("[tuning]\npantry_stock = []\n", Path::new("test.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = ServerConfig::from_toml_str("[server]\nport = \"x\"\n", Path::new("test.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ServerConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.tick_rate, 20.0);
    }
}
