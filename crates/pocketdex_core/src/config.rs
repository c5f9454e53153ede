use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "https://bulbapedia.bulbagarden.net/w/api.php";
pub const DEFAULT_USER_AGENT: &str = "pocketdex/0.1";
pub const DEFAULT_CATEGORY: &str = "Category:Pokémon Trading Card Game Pocket expansions";
pub const DEFAULT_PAGE_SUFFIX: &str = " (TCG Pocket)";
pub const DEFAULT_BASE_CATALOG_URL: &str =
    "https://raw.githubusercontent.com/PokemonTCG/pokemon-tcg-data/refs/heads/master/sets/en.json";

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct PocketdexConfig {
    #[serde(default)]
    pub wiki: WikiSection,
    #[serde(default)]
    pub import: ImportSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct WikiSection {
    pub api_url: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct ImportSection {
    pub category: Option<String>,
    pub page_suffix: Option<String>,
    pub base_catalog_url: Option<String>,
}

impl PocketdexConfig {
    /// Resolve the wiki API URL: env WIKI_API_URL > config > default.
    pub fn api_url(&self) -> String {
        if let Ok(value) = env::var("WIKI_API_URL") {
            let trimmed = value.trim().to_string();
            if !trimmed.is_empty() {
                return trimmed;
            }
        }
        self.wiki
            .api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Resolve user agent: env WIKI_USER_AGENT > config > default.
    pub fn user_agent(&self) -> String {
        if let Ok(value) = env::var("WIKI_USER_AGENT") {
            let trimmed = value.trim().to_string();
            if !trimmed.is_empty() {
                return trimmed;
            }
        }
        self.wiki
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }

    pub fn category(&self) -> &str {
        self.import.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }

    pub fn page_suffix(&self) -> &str {
        self.import
            .page_suffix
            .as_deref()
            .unwrap_or(DEFAULT_PAGE_SUFFIX)
    }

    pub fn base_catalog_url(&self) -> &str {
        self.import
            .base_catalog_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_CATALOG_URL)
    }
}

/// Load a PocketdexConfig from a TOML file. Returns default if file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<PocketdexConfig> {
    if !config_path.exists() {
        return Ok(PocketdexConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: PocketdexConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

/// Rendered by `init` as a starting point.
pub fn default_config_toml() -> String {
    format!(
        "[wiki]\n\
         # api_url = \"{DEFAULT_API_URL}\"\n\
         # user_agent = \"{DEFAULT_USER_AGENT}\"\n\
         \n\
         [import]\n\
         # category = \"{DEFAULT_CATEGORY}\"\n\
         # page_suffix = \"{DEFAULT_PAGE_SUFFIX}\"\n\
         # base_catalog_url = \"{DEFAULT_BASE_CATALOG_URL}\"\n"
    )
}
