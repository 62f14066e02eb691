use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ApiError, Result};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Ceiling for request bodies, JSON and form alike.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_body_limit() -> usize {
    50 * 1024 * 1024
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_upload_dir")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_upload_dir(),
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ApiError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = serde_yaml::from_str(&contents)
            .map_err(|e| ApiError::Config(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Reads the config file if it exists, then applies `PORT` and `UPLOAD_DIR`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            Self::from_file(path)?
        } else {
            tracing::info!("No config file at {}, using defaults", path.display());
            Self::default()
        };

        config.with_overrides(std::env::var("PORT").ok(), std::env::var("UPLOAD_DIR").ok())
    }

    pub fn with_overrides(mut self, port: Option<String>, upload_dir: Option<String>) -> Result<Self> {
        if let Some(port) = port {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|e| ApiError::Config(format!("Invalid PORT '{}': {}", port, e)))?;
        }

        if let Some(dir) = upload_dir.filter(|d| !d.is_empty()) {
            self.storage.path = PathBuf::from(dir);
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parsing() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 8080
  body_limit_bytes: 1024

storage:
  path: /tmp/ingest
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.body_limit_bytes, 1024);
        assert_eq!(config.storage.path, PathBuf::from("/tmp/ingest"));
    }

    #[test]
    fn test_config_defaults() {
        let config: Config = serde_yaml::from_str("server:\n  port: 4000\n").unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.body_limit_bytes, 50 * 1024 * 1024);
        assert_eq!(config.storage.path, PathBuf::from("uploads"));
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default()
            .with_overrides(Some("8081".to_string()), Some("/data/in".to_string()))
            .unwrap();
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.storage.path, PathBuf::from("/data/in"));

        assert!(Config::default()
            .with_overrides(Some("not-a-port".to_string()), None)
            .is_err());
    }

    #[test]
    fn test_unreadable_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::from_file(dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(ApiError::Config(_))));
    }
}
