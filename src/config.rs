use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;

use crate::ranking::MASTERPIECE_THRESHOLD;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub version: u32,
    pub database: Database,
    pub http: HttpConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path}"))?;
        toml::from_str(&contents).with_context(|| "Failed to parse config TOML")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct Database {
    pub in_memory: bool,
    pub path: Option<PathBuf>,
}

/// Where album search and track listings come from
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://itunes.apple.com".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct RankingConfig {
    pub masterpiece_threshold: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            masterpiece_threshold: MASTERPIECE_THRESHOLD,
        }
    }
}
