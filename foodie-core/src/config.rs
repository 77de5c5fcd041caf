use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

use crate::{
    chat::julep, error::TourError, pipeline::WeatherFallback, provider::openweather,
};

pub const WEATHER_KEY_ENV: &str = "OPENWEATHER_API_KEY";
pub const AI_KEY_ENV: &str = "JULEP_API_KEY";

/// Weather service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self { api_key: None, base_url: openweather::DEFAULT_BASE_URL.to_string() }
    }
}

/// AI chat service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    /// Upper bound for a single AI request, in seconds.
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: julep::DEFAULT_BASE_URL.to_string(),
            model: julep::DEFAULT_MODEL.to_string(),
            timeout_secs: 60,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// weather_fallback = "degrade"
///
/// [weather]
/// api_key = "..."
///
/// [ai]
/// api_key = "..."
/// model = "gpt-4o"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// What to do when the weather lookup fails. Unset means "depends on mode".
    pub weather_fallback: Option<WeatherFallback>,
    pub weather: WeatherConfig,
    pub ai: AiConfig,
}

/// Both API keys, resolved.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub weather_api_key: String,
    pub ai_api_key: String,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Load from disk, then let `OPENWEATHER_API_KEY` / `JULEP_API_KEY` override the keys.
    pub fn load_with_env() -> Result<Self> {
        let mut cfg = Self::load()?;
        cfg.apply_env_overrides(|name| env::var(name).ok());
        Ok(cfg)
    }

    /// Apply key overrides from a variable lookup. Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(WEATHER_KEY_ENV) {
            self.weather.api_key = Some(key);
        }
        if let Some(key) = non_empty(AI_KEY_ENV) {
            self.ai.api_key = Some(key);
        }
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "foodie-tour", "foodie-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn weather_api_key(&self) -> Option<&str> {
        self.weather.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    pub fn ai_api_key(&self) -> Option<&str> {
        self.ai.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Both keys are mandatory; report every missing one at once.
    pub fn credentials(&self) -> Result<Credentials, TourError> {
        match (self.weather_api_key(), self.ai_api_key()) {
            (Some(weather), Some(ai)) => Ok(Credentials {
                weather_api_key: weather.to_string(),
                ai_api_key: ai.to_string(),
            }),
            (weather, ai) => {
                let missing: Vec<&str> = [(weather, WEATHER_KEY_ENV), (ai, AI_KEY_ENV)]
                    .into_iter()
                    .filter(|(key, _)| key.is_none())
                    .map(|(_, name)| name)
                    .collect();

                Err(TourError::configuration(format!(
                    "missing {}. Set the environment variable(s) or run `foodie configure`.",
                    missing.join(" and ")
                )))
            }
        }
    }
}
