use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub trello: TrelloConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub editor: EditorConfig,
}

#[derive(Debug, Deserialize, Default)]
pub struct TrelloConfig {
    pub api_key: Option<String>,
    pub username: Option<String>,
    pub board: Option<String>,
    pub list: Option<String>,
    pub token: Option<String>,
    pub api_root: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct GitHubConfig {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub token: Option<String>,
    #[serde(default)]
    pub strip_prefixes: Vec<String>,
    pub api_root: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct EditorConfig {
    pub command: Option<String>,
}

pub fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".trello2github")
        .join("config.toml")
}

/// Load the config file. A missing file at the default location is fine;
/// a missing file the operator pointed at explicitly is not.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = config_path();
            if !path.exists() {
                return Ok(AppConfig::default());
            }
            path
        }
    };
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse_config(contents: &str) -> Result<AppConfig> {
    Ok(toml::from_str(contents)?)
}
