use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    pub paths: PathsConfig,
    #[serde(default)]
    pub draft: DraftConfig,
    #[serde(default)]
    pub submission: SubmissionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PathsConfig {
    /// Directory holding the key-value store file and session logs
    pub state: String,
}

/// Draft auto-save configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DraftConfig {
    /// Whether edits are auto-saved as a draft at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Quiet period in milliseconds before a burst of edits is written (default: 2000)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    2000 // 2 seconds
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Settings for the built-in stand-in submission backend
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SubmissionConfig {
    /// Simulated round-trip latency in milliseconds (default: 2000)
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
}

fn default_latency_ms() -> u64 {
    2000 // 2 seconds
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether interactive sessions log to a file (false = stderr for debugging)
    #[serde(default = "default_true")]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: default_true(),
        }
    }
}

impl Config {
    /// Path to the project-local config file
    pub fn local_config_path() -> PathBuf {
        PathBuf::from(".listing-wizard/config.toml")
    }

    /// Per-user config file, if the platform has a config directory
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("listing-wizard").join("config.toml"))
    }

    /// Config files that exist, lowest precedence first. An explicit path is
    /// always included so a typo surfaces as a load error.
    fn layered_files(explicit: Option<&str>) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = [Some(Self::local_config_path()), Self::user_config_path()]
            .into_iter()
            .flatten()
            .filter(|path| path.exists())
            .collect();
        files.extend(explicit.map(PathBuf::from));
        files
    }

    /// Built-in defaults, then config files, then `LISTING_WIZARD__*` variables
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let defaults = serde_json::to_string(&Config::default())
            .context("Failed to serialize default config")?;

        let builder = Self::layered_files(config_path).into_iter().fold(
            config::Config::builder()
                .add_source(config::File::from_str(&defaults, config::FileFormat::Json)),
            |builder, path| {
                tracing::debug!(path = %path.display(), "Loading config file");
                builder.add_source(config::File::from(path))
            },
        );

        builder
            .add_source(
                config::Environment::with_prefix("LISTING_WIZARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Write this config to the project-local file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::local_config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents)
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

    /// Path of the key-value store file
    pub fn store_path(&self) -> PathBuf {
        self.state_path().join("store.json")
    }

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        self.state_path().join("logs")
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.draft.debounce_ms)
    }

    pub fn submission_latency(&self) -> Duration {
        Duration::from_millis(self.submission.latency_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig {
                state: ".listing-wizard".to_string(), // Relative to cwd
            },
            draft: DraftConfig::default(),
            submission: SubmissionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
