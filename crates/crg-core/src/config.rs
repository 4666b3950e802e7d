use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_CHAT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MARKET_ENDPOINT: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_REFRESH_SECS: u64 = 30;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub model: Option<String>,
    pub chat_endpoint: Option<String>,
    pub market_endpoint: Option<String>,
    pub refresh_interval_secs: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    /// API key for the chat gateway - env vars first, then config.
    pub fn api_key(&self) -> Option<String> {
        resolve_api_key([
            std::env::var("GEMINI_API_KEY").ok(),
            std::env::var("API_KEY").ok(),
            self.gemini_api_key.clone(),
        ])
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn chat_endpoint(&self) -> &str {
        self.chat_endpoint.as_deref().unwrap_or(DEFAULT_CHAT_ENDPOINT)
    }

    pub fn market_endpoint(&self) -> &str {
        self.market_endpoint.as_deref().unwrap_or(DEFAULT_MARKET_ENDPOINT)
    }

    pub fn refresh_interval(&self) -> Duration {
        let secs = self.refresh_interval_secs.filter(|s| *s > 0).unwrap_or(DEFAULT_REFRESH_SECS);
        Duration::from_secs(secs)
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("crg"))
    }

    fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }
}

/// First candidate that is set and not blank.
fn resolve_api_key<I>(candidates: I) -> Option<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    candidates
        .into_iter()
        .flatten()
        .map(|k| k.trim().to_string())
        .find(|k| !k.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.market_endpoint(), DEFAULT_MARKET_ENDPOINT);
        assert_eq!(config.refresh_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"model": "gemini-2.0-flash", "refresh_interval_secs": 60}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.model(), "gemini-2.0-flash");
        assert_eq!(loaded.refresh_interval(), Duration::from_secs(60));
        assert_eq!(loaded.chat_endpoint(), DEFAULT_CHAT_ENDPOINT);
    }

    #[test]
    fn test_zero_interval_falls_back() {
        let config = Config {
            refresh_interval_secs: Some(0),
            ..Config::default()
        };
        assert_eq!(config.refresh_interval(), Duration::from_secs(DEFAULT_REFRESH_SECS));
    }

    #[test]
    fn test_blank_keys_are_skipped() {
        let key = |s: &str| Some(s.to_string());
        assert_eq!(resolve_api_key([key(""), key("from-api-key"), None]), key("from-api-key"));
        assert_eq!(resolve_api_key([None, key("  "), key("from-config")]), key("from-config"));
        assert_eq!(resolve_api_key([key("env"), key("other"), key("file")]), key("env"));
    }

    #[test]
    fn test_blank_config_key_is_missing() {
        assert_eq!(resolve_api_key([None, None, Some(String::new())]), None);
        assert_eq!(resolve_api_key([None, None, None]), None);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
