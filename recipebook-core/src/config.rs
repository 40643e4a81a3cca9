//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "apiKey": "...",
//!   "identityUrl": "https://identitytoolkit.googleapis.com/v1",
//!   "recipesUrl": "https://ng-recipe-book-576d9.firebaseio.com/recipes.json"
//! }
//! ```
//! Keys the CLI doesn't manage are preserved on save.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_RECIPES_URL: &str = "https://ng-recipe-book-576d9.firebaseio.com/recipes.json";

/// Environment variable overriding the identity API key
pub const API_KEY_ENV: &str = "RECIPEBOOK_API_KEY";
/// Environment variable overriding the identity base URL (staging, mock servers)
pub const IDENTITY_URL_ENV: &str = "RECIPEBOOK_IDENTITY_URL";
/// Environment variable overriding the recipe document URL
pub const RECIPES_URL_ENV: &str = "RECIPEBOOK_RECIPES_URL";

const SETTINGS_FILE: &str = "settings.json";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    identity_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recipes_url: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Recipe Book configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Identity provider web API key (empty when not configured)
    pub api_key: String,
    /// Identity provider base URL, without trailing slash
    pub identity_url: String,
    /// URL of the JSON document holding all recipes
    pub recipes_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            identity_url: DEFAULT_IDENTITY_URL.to_string(),
            recipes_url: DEFAULT_RECIPES_URL.to_string(),
        }
    }
}

impl Config {
    /// Load config from the data directory
    ///
    /// Values come from, in order of precedence:
    /// 1. Environment variables (`RECIPEBOOK_API_KEY`, `RECIPEBOOK_IDENTITY_URL`, `RECIPEBOOK_RECIPES_URL`)
    /// 2. settings.json
    /// 3. Built-in defaults
    pub fn load(data_dir: &Path) -> Result<Self> {
        // An unreadable file still loads; save refuses to overwrite it
        let raw: SettingsFile = read_settings(data_dir)?
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();
        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let api_key = env(API_KEY_ENV).or(raw.api_key).unwrap_or_default();
        let identity_url = env(IDENTITY_URL_ENV)
            .or(raw.identity_url)
            .unwrap_or_else(|| DEFAULT_IDENTITY_URL.to_string());
        let recipes_url = env(RECIPES_URL_ENV)
            .or(raw.recipes_url)
            .unwrap_or_else(|| DEFAULT_RECIPES_URL.to_string());

        Ok(Self {
            api_key,
            identity_url: identity_url.trim_end_matches('/').to_string(),
            recipes_url,
        })
    }

    /// Save config to the data directory, preserving unmanaged keys
    ///
    /// Fails instead of overwriting a settings.json that isn't valid JSON.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let mut settings: SettingsFile = match read_settings(data_dir)? {
            Some(content) => serde_json::from_str(&content).with_context(|| {
                format!(
                    "{} is not valid settings JSON; fix or remove it before changing settings",
                    data_dir.join(SETTINGS_FILE).display()
                )
            })?,
            None => SettingsFile::default(),
        };

        settings.api_key = Some(self.api_key.clone()).filter(|k| !k.is_empty());
        settings.identity_url = Some(self.identity_url.clone());
        settings.recipes_url = Some(self.recipes_url.clone());

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(data_dir.join(SETTINGS_FILE), content)
            .with_context(|| format!("Failed to write settings to {:?}", data_dir))?;
        Ok(())
    }

    /// Set a value by its settings.json key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "apiKey" => self.api_key = value.to_string(),
            "identityUrl" => self.identity_url = value.trim_end_matches('/').to_string(),
            "recipesUrl" => self.recipes_url = value.to_string(),
            other => anyhow::bail!(
                "Unknown setting '{}'. Expected one of: apiKey, identityUrl, recipesUrl",
                other
            ),
        }
        Ok(())
    }

    /// Whether an API key is available for the identity provider
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Raw settings.json content, if the file exists
fn read_settings(data_dir: &Path) -> Result<Option<String>> {
    let settings_path = data_dir.join(SETTINGS_FILE);
    if !settings_path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&settings_path)
        .with_context(|| format!("Failed to read {:?}", settings_path))?;
    Ok(Some(content))
}
