use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("missing required setting: {0}")]
    Missing(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub marketplace: MarketplaceConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketplaceConfig {
    /// GraphQL endpoint of the listings API - env AXIE_API_URL
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Sent as X-API-Key - loaded from env API_KEY
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_sort")]
    pub sort: String,
    #[serde(default)]
    pub page_offset: u32,
    /// Upstream caps a page at 300 items
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainConfig {
    /// JSON-RPC endpoint - env INFURA_URL
    #[serde(default)]
    pub rpc_url: String,
    /// Token contract - env CONTRACT_ADDRESS
    #[serde(default)]
    pub contract_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_api_url() -> String {
    "https://api-gateway.skymavis.com/graphql/axie-marketplace".to_string()
}
fn default_sort() -> String {
    "PriceAsc".to_string()
}
fn default_page_size() -> u32 {
    300
}
fn default_request_timeout() -> u64 {
    30
}
fn default_database_path() -> PathBuf {
    PathBuf::from("axies.db")
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: String::new(),
            sort: default_sort(),
            page_offset: 0,
            page_size: default_page_size(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    /// Load config from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.apply_env();
        Ok(config)
    }

    /// Defaults plus environment variables (no file needed).
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    /// Environment always wins over the file; secrets never need to live in it
    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("AXIE_API_URL") {
            self.marketplace.api_url = url;
        }
        if let Ok(key) = std::env::var("API_KEY") {
            self.marketplace.api_key = key;
        }
        if let Ok(url) = std::env::var("INFURA_URL") {
            self.chain.rpc_url = url;
        }
        if let Ok(address) = std::env::var("CONTRACT_ADDRESS") {
            self.chain.contract_address = address;
        }
        if let Ok(path) = std::env::var("DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(json) = std::env::var("LOG_JSON") {
            self.logging.json = matches!(json.as_str(), "1" | "true" | "TRUE" | "True");
        }
    }

    /// Contract queries need both an RPC endpoint and an address
    pub fn require_chain(&self) -> Result<(&str, &str), ConfigError> {
        if self.chain.rpc_url.is_empty() {
            return Err(ConfigError::Missing("INFURA_URL".to_string()));
        }
        if self.chain.contract_address.is_empty() {
            return Err(ConfigError::Missing("CONTRACT_ADDRESS".to_string()));
        }
        Ok((self.chain.rpc_url.as_str(), self.chain.contract_address.as_str()))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [marketplace]
            page_size = 50

            [server]
            port = 8080
            "#,
        )
        .unwrap();

        assert_eq!(config.marketplace.page_size, 50);
        assert_eq!(config.marketplace.sort, "PriceAsc");
        assert_eq!(config.marketplace.page_offset, 0);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.path, PathBuf::from("axies.db"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_defaults_match_upstream_page() {
        let config = Config::default();
        assert_eq!(config.marketplace.page_size, 300);
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_require_chain_reports_missing_setting() {
        let mut config = Config::default();
        assert!(matches!(config.require_chain(), Err(ConfigError::Missing(name)) if name == "INFURA_URL"));

        config.chain.rpc_url = "http://localhost:8545".to_string();
        assert!(matches!(config.require_chain(), Err(ConfigError::Missing(name)) if name == "CONTRACT_ADDRESS"));

        config.chain.contract_address = "0x0000000000000000000000000000000000000001".to_string();
        assert!(config.require_chain().is_ok());
    }
}
