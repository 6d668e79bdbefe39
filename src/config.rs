use serde::Deserialize;
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: 30,
            user_agent: "open-issues".to_string(),
        }
    }
}

/// ~/.config/open-issues/config.toml (Linux) or the platform equivalent
fn config_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("open-issues").join("config.toml"))
}

impl Config {
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Config::default();
        };

        let Ok(content) = std::fs::read_to_string(&path) else {
            return Config::default();
        };

        Self::parse(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "ignoring malformed config");
            Config::default()
        })
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(content)?;
        if config.api_base.trim().is_empty() {
            config.api_base = DEFAULT_API_BASE.to_string();
        }
        if config.timeout_secs == 0 {
            config.timeout_secs = Config::default().timeout_secs;
        }
        Ok(config)
    }
}
