use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub autosave: AutoSaveConfig,
    pub paths: PathsConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Auto-save and restore behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoSaveConfig {
    /// Milliseconds of quiet after the last edit before writing (default: 500)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Days after which saved progress is discarded (default: 7)
    #[serde(default = "default_ttl_days")]
    pub ttl_days: u64,
    /// Prefix for storage keys; the identity is appended as `<prefix>_<id>`
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_ttl_days() -> u64 {
    7
}

fn default_key_prefix() -> String {
    crate::progress::DEFAULT_KEY_PREFIX.to_string()
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            ttl_days: default_ttl_days(),
            key_prefix: default_key_prefix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding saved progress and logs
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,
}

fn default_tick_rate() -> u64 {
    250
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: default_tick_rate(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Interactive sessions write logs under `<state>/logs` instead of stderr
    #[serde(default = "default_log_to_file")]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_to_file() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: default_log_to_file(),
        }
    }
}

impl Config {
    /// Path to the project-local config file
    pub fn local_config_path() -> PathBuf {
        PathBuf::from(".waypoint/config.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so waypoint works without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        let local_config = Self::local_config_path();
        if local_config.exists() {
            builder = builder.add_source(config::File::from(local_config));
        }

        // User config in ~/.config/waypoint/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("waypoint").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables with WAYPOINT_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("WAYPOINT")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config to TOML")
    }

    /// Write the effective settings to `.waypoint/config.toml`
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::local_config_path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, self.to_toml()?)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Get absolute path to state directory
    pub fn state_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.paths.state);
        if path.is_absolute() {
            path
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }

    /// Directory the file store keeps snapshots in
    pub fn progress_path(&self) -> PathBuf {
        self.state_path().join("progress")
    }

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        self.state_path().join("logs")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            autosave: AutoSaveConfig::default(),
            paths: PathsConfig {
                state: ".waypoint".to_string(), // Relative to cwd
            },
            ui: UiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.autosave.debounce_ms, 500);
        assert_eq!(config.autosave.ttl_days, 7);
        assert_eq!(config.autosave.key_prefix, "onboarding_progress");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_paths_derive_from_state_dir() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.state = temp_dir.path().to_string_lossy().to_string();

        assert_eq!(config.state_path(), temp_dir.path());
        assert!(config.progress_path().ends_with("progress"));
        assert!(config.logs_path().starts_with(temp_dir.path()));
    }

    #[test]
    fn test_load_merges_explicit_file_over_defaults() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "[autosave]\ndebounce_ms = 1200\n").unwrap();

        let config = Config::load(Some(file.path().to_str().unwrap())).unwrap();

        assert_eq!(config.autosave.debounce_ms, 1200);
        assert_eq!(config.autosave.ttl_days, 7);
        assert_eq!(config.ui.tick_rate_ms, 250);
    }

    #[test]
    fn test_save_to_writes_loadable_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.autosave.ttl_days = 30;

        config.save_to(&path).unwrap();
        let loaded = Config::load(Some(path.to_str().unwrap())).unwrap();

        assert_eq!(loaded.autosave.ttl_days, 30);
    }

    #[test]
    fn test_toml_round_trips() {
        let config = Config::default();
        let toml_str = config.to_toml().unwrap();
        assert!(toml_str.contains("[autosave]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.autosave.key_prefix, config.autosave.key_prefix);
    }
}
