use crate::error::{ConfigError, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use strum::{Display, EnumString};

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,
    /// Directory holding config and data - computed from home, not serialized
    #[serde(skip)]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub axon: AxonConfig,

    #[serde(default)]
    pub debate: DebateSettings,

    #[serde(default)]
    pub storage: StorageConfig,
}

// ── AXON backend ─────────────────────────────────────────────────

/// How calls reach the backend.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AxonMode {
    /// Live backend with the mock answering any failure.
    #[default]
    Auto,
    /// Mock only; no network access.
    Mock,
    /// Live backend only; failures reach the caller.
    Live,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxonConfig {
    #[serde(default)]
    pub mode: AxonMode,
    /// Backend root, e.g. `http://localhost:8787`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token sent as `Authorization`
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model hint forwarded with chat requests
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_health_ttl_secs")]
    pub health_ttl_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8787".into()
}

fn default_language() -> String {
    "en".into()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_health_ttl_secs() -> u64 {
    15
}

impl Default for AxonConfig {
    fn default() -> Self {
        Self {
            mode: AxonMode::default(),
            base_url: default_base_url(),
            api_key: None,
            model: None,
            language: default_language(),
            timeout_secs: default_timeout_secs(),
            health_ttl_secs: default_health_ttl_secs(),
        }
    }
}

// ── Debate defaults ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateSettings {
    /// Rounds used when `debate new` is given no `--rounds`
    #[serde(default = "default_rounds")]
    pub default_rounds: u32,
    /// Project id sent with every AXON request
    #[serde(default = "default_project_id")]
    pub project_id: String,
}

fn default_rounds() -> u32 {
    3
}

fn default_project_id() -> String {
    "default".into()
}

impl Default for DebateSettings {
    fn default() -> Self {
        Self {
            default_rounds: default_rounds(),
            project_id: default_project_id(),
        }
    }
}

// ── Storage ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite file; defaults to `<data_dir>/debates.db`
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

// ── Loading ──────────────────────────────────────────────────────

impl Config {
    pub fn db_path(&self) -> PathBuf {
        self.storage
            .db_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("debates.db"))
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.axon.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "axon.timeout_secs must be >= 1".into(),
            ));
        }
        if self.debate.default_rounds == 0 {
            return Err(ConfigError::Validation(
                "debate.default_rounds must be >= 1".into(),
            ));
        }
        if self.axon.mode != AxonMode::Mock && url::Url::parse(&self.axon.base_url).is_err() {
            return Err(ConfigError::Validation(format!(
                "axon.base_url is not a valid URL: {}",
                self.axon.base_url
            )));
        }
        Ok(())
    }

    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .ok_or_else(|| ConfigError::Load("could not find home directory".into()))?;
        Self::load_or_init_in(&home.join(".axon"))
    }

    /// Load `config.toml` from `dir`, writing defaults on first run.
    pub fn load_or_init_in(dir: &Path) -> Result<Self> {
        let config_path = dir.join("config.toml");

        if !dir.exists() {
            fs::create_dir_all(dir).map_err(ConfigError::Io)?;
        }

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path).map_err(ConfigError::Io)?;
            let mut config: Config = toml::from_str(&contents).map_err(|e| {
                ConfigError::Load(format!("{}: {e}", config_path.display()))
            })?;
            // Set computed paths that are skipped during serialization
            config.config_path.clone_from(&config_path);
            config.data_dir = dir.to_path_buf();
            config.validate()?;
            Ok(config)
        } else {
            let config = Self {
                config_path,
                data_dir: dir.to_path_buf(),
                ..Self::default()
            };
            config.validate()?;
            config.save()?;
            Ok(config)
        }
    }

    /// Apply environment variable overrides to config
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup; the `VITE_` names are accepted
    /// for deployments that share an env file with the web dashboard.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |primary: &str, alias: &str| {
            lookup(primary)
                .or_else(|| lookup(alias))
                .filter(|value| !value.trim().is_empty())
        };

        // Mode: AXON_MODE or VITE_AXON_MODE
        if let Some(mode) = get("AXON_MODE", "VITE_AXON_MODE") {
            match AxonMode::from_str(mode.trim()) {
                Ok(mode) => self.axon.mode = mode,
                Err(_) => tracing::warn!(value = mode.as_str(), "Ignoring unknown AXON mode"),
            }
        }

        // Base URL: AXON_BASE_URL or VITE_AXON_BASE_URL
        if let Some(base_url) = get("AXON_BASE_URL", "VITE_AXON_BASE_URL") {
            self.axon.base_url = base_url;
        }

        if let Some(key) = get("AXON_API_KEY", "VITE_AXON_API_KEY") {
            self.axon.api_key = Some(key);
        }

        if let Some(model) = get("AXON_MODEL", "VITE_AXON_MODEL") {
            self.axon.model = Some(model);
        }
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Load(format!("failed to serialize config: {e}")))?;
        fs::write(&self.config_path, toml_str).map_err(ConfigError::Io)?;
        Ok(())
    }
}
