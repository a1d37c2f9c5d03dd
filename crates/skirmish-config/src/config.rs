//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name inside the config directory.
pub const CONFIG_FILE: &str = "config.ron";

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Session subscription and reconnection settings.
    pub connection: ConnectionConfig,
    /// Hex grid projection and path search settings.
    pub grid: GridConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Session subscription and reconnection backoff.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Game server endpoint.
    pub endpoint: String,
    /// Session to subscribe to. Empty until the player joins one.
    pub session_id: String,
    pub player_id: String,
    /// Delay before the first reconnection attempt, in milliseconds.
    pub initial_delay_ms: u64,
    /// Multiplier applied to the delay after each failed attempt.
    pub backoff_multiplier: f64,
    /// Cap on any single reconnection delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Reconnection attempts before giving up.
    pub max_attempts: u32,
    /// Jitter factor (0.0 - 1.0). 0 keeps the delay sequence exact.
    pub jitter: f64,
}

/// Hex grid settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GridConfig {
    /// Hex size in pixels (centre to corner).
    pub hex_size: f32,
    /// How many hexes beyond the straight-line distance a path may wander.
    pub max_detour: u32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080".to_string(),
            session_id: String::new(),
            player_id: String::new(),
            initial_delay_ms: 1000,
            backoff_multiplier: 2.0,
            max_delay_ms: 30_000,
            max_attempts: 10,
            jitter: 0.0,
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            hex_size: 32.0,
            max_detour: 6,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Platform config directory for Skirmish, e.g. `~/.config/skirmish`.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("skirmish"))
}

// --- Validation ---

impl Config {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let conn = &self.connection;
        if conn.backoff_multiplier.is_nan() || conn.backoff_multiplier < 1.0 {
            return Err(ConfigError::Invalid {
                field: "connection.backoff_multiplier",
                reason: format!("must be at least 1.0, got {}", conn.backoff_multiplier),
            });
        }
        if !(0.0..1.0).contains(&conn.jitter) {
            return Err(ConfigError::Invalid {
                field: "connection.jitter",
                reason: format!("must be in [0.0, 1.0), got {}", conn.jitter),
            });
        }
        if conn.max_delay_ms < conn.initial_delay_ms {
            return Err(ConfigError::Invalid {
                field: "connection.max_delay_ms",
                reason: format!(
                    "{} is below initial_delay_ms ({})",
                    conn.max_delay_ms, conn.initial_delay_ms
                ),
            });
        }
        if self.grid.hex_size.is_nan() || self.grid.hex_size <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "grid.hex_size",
                reason: format!("must be positive, got {}", self.grid.hex_size),
            });
        }
        Ok(())
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::Write {
            path: config_path.clone(),
            source,
        })?;
        log::debug!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// Re-read the file: returns `Some(new_config)` if it changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("initial_delay_ms: 1000"));
        assert!(ron_str.contains("max_attempts: 10"));
        assert!(ron_str.contains("log_level: \"info\""));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(connection: (session_id: \"s-42\"), debug: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.grid, GridConfig::default());
        assert_eq!(config.connection.session_id, "s-42");
        assert_eq!(config.connection.max_delay_ms, 30_000);
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(render_overlay: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_default_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_shrinking_backoff() {
        let mut config = Config::default();
        config.connection.backoff_multiplier = 0.5;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "connection.backoff_multiplier",
                ..
            }
        ));
    }

    #[test]
    fn test_validate_rejects_bad_jitter_and_size() {
        let mut config = Config::default();
        config.connection.jitter = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.grid.hex_size = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.connection.max_delay_ms = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.connection.endpoint = "https://play.example.net".to_string();
        config.connection.player_id = "player-2".to_string();
        config.grid.max_detour = 3;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "(grid: (hex_size: -4.0))").unwrap();
        let err = Config::load_or_create(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.connection.max_attempts = 3;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.unwrap().connection.max_attempts, 3);
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{{not valid}}").unwrap();
        let err = Config::load_or_create(dir.path()).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, dir.path().join(CONFIG_FILE)),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_ron_comments_accepted() {
        let ron_str = "// Skirmish client\n(\n  // nothing overridden\n)";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config, Config::default());
    }
}
