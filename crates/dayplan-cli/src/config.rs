//! Configuration file management for dayplan.
//!
//! The file lives at `$XDG_CONFIG_HOME/dayplan/config.toml` (or
//! `~/.config/dayplan/config.toml`). Values resolve as
//! CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use dayplan_core::gateway::gemini::{self, GeminiConfig};
use dayplan_db::config::DbConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub gemini: GeminiSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GeminiSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Prefer `GEMINI_API_KEY`; the file copy is for single-user machines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the dayplan config directory, always in XDG layout.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("dayplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("dayplan")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&config_path())
}

fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    toml::from_str(&contents).context("failed to parse config file")
}

pub fn save_config(config: &ConfigFile) -> Result<()> {
    save_config_to(config, &config_path())
}

/// Write `config` to `path`, creating parent dirs. The file is 0600 on unix
/// since it may hold an API key.
fn save_config_to(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct DayplanConfig {
    pub db_config: DbConfig,
    pub gemini: GeminiConfig,
}

impl DayplanConfig {
    /// Resolve configuration from the default config file location.
    ///
    /// - DB URL: `cli_db_url` > `DAYPLAN_DATABASE_URL` > `database.url` > `DbConfig::DEFAULT_URL`
    /// - Gemini key: `GEMINI_API_KEY` > `gemini.api_key` > none (generator unavailable)
    /// - Gemini model and base URL: `gemini.*` > built-in defaults
    pub fn resolve(cli_db_url: Option<&str>) -> Self {
        Self::resolve_with(cli_db_url, load_config().ok())
    }

    fn resolve_with(cli_db_url: Option<&str>, file_config: Option<ConfigFile>) -> Self {
        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var(DbConfig::ENV_VAR) {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };

        let file_gemini = file_config.map(|c| c.gemini).unwrap_or_default();
        let env_key = std::env::var(gemini::API_KEY_ENV).ok();
        let api_key = env_key
            .or(file_gemini.api_key)
            .filter(|k| !k.trim().is_empty());

        let defaults = GeminiConfig::default();
        let gemini = GeminiConfig {
            api_key,
            model: file_gemini.model.unwrap_or(defaults.model),
            base_url: file_gemini.base_url.unwrap_or(defaults.base_url),
            timeout: defaults.timeout,
        };

        Self {
            db_config: DbConfig::new(db_url),
            gemini,
        }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
