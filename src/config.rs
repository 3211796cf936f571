/// Configuration module for echofinder-embed.
///
/// Handles loading, validating, and providing default configuration values.
/// Every key is optional in the JSON file; missing keys fall back to the
/// documented defaults below.
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Path used when no `--config` argument is given.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

// ── Default value functions ──────────────────────────────────────────

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8001
}

fn default_max_body_bytes() -> usize {
    64 * 1024 * 1024
}

fn default_model_name() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_model_repo() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models/all-MiniLM-L6-v2")
}

fn default_dimensions() -> usize {
    384
}

fn default_max_length() -> usize {
    256
}

fn default_true() -> bool {
    true
}

fn default_threads() -> usize {
    4
}

fn default_similarity_threshold() -> f32 {
    0.70
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub compute: ComputeConfig,

    /// A comparison is a confident match only when its best score is
    /// strictly greater than this value.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest request body accepted, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ModelConfig {
    /// Identifier reported to clients.
    #[serde(default = "default_model_name")]
    pub name: String,

    /// HuggingFace repository the model files are fetched from.
    #[serde(default = "default_model_repo")]
    pub repo: String,

    #[serde(default = "default_model_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Token count inputs are truncated to.
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    #[serde(default = "default_true")]
    pub auto_download: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ComputeConfig {
    /// ONNX Runtime intra-op thread count.
    #[serde(default = "default_threads")]
    pub threads: usize,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            model: ModelConfig::default(),
            compute: ComputeConfig::default(),
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            repo: default_model_repo(),
            dir: default_model_dir(),
            dimensions: default_dimensions(),
            max_length: default_max_length(),
            auto_download: default_true(),
        }
    }
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If the file does not exist, returns a default config and, for the
    /// default path only, writes a template next to the binary's working
    /// directory. Invalid JSON is reported and replaced by defaults.
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!("{} not found, using defaults", config_path.display());
            let cfg = Self::default();

            if config_path == Path::new(DEFAULT_CONFIG_PATH) {
                match cfg.save(config_path) {
                    Ok(()) => info!("Generated config template: {}", config_path.display()),
                    Err(e) => warn!("Failed to generate config template: {e}"),
                }
            }

            return Ok(cfg);
        }

        let data = std::fs::read_to_string(config_path)
            .with_context(|| format!("failed to read config: {}", config_path.display()))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {}: {e}", config_path.display());
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {}", config_path.display());
        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data)
            .with_context(|| format!("failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.model.name.is_empty(), "model.name must not be empty");
        anyhow::ensure!(!self.model.repo.is_empty(), "model.repo must not be empty");
        anyhow::ensure!(
            self.model.dimensions > 0,
            "model.dimensions must be positive"
        );
        anyhow::ensure!(
            self.model.max_length > 0,
            "model.max_length must be positive"
        );
        anyhow::ensure!(
            self.server.max_body_bytes > 0,
            "server.max_body_bytes must be positive"
        );
        anyhow::ensure!(self.compute.threads > 0, "compute.threads must be positive");
        anyhow::ensure!(
            (-1.0..=1.0).contains(&self.similarity_threshold),
            "similarity_threshold must be within [-1, 1], got {}",
            self.similarity_threshold
        );
        Ok(())
    }

    /// Socket address the HTTP server binds to.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .with_context(|| format!("invalid listen address: {addr}"))
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8001);
        assert_eq!(config.server.max_body_bytes, 64 * 1024 * 1024);
        assert_eq!(config.model.name, "all-MiniLM-L6-v2");
        assert_eq!(config.model.repo, "sentence-transformers/all-MiniLM-L6-v2");
        assert_eq!(config.model.dimensions, 384);
        assert_eq!(config.model.max_length, 256);
        assert!(config.model.auto_download);
        assert_eq!(config.compute.threads, 4);
        assert!((config.similarity_threshold - 0.70).abs() < f32::EPSILON);
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"{"server": {"port": 9000}, "similarity_threshold": 0.85}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.server.port, 9000);
        assert!((config.similarity_threshold - 0.85).abs() < 1e-6);
        // Other fields should have defaults
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.model.dimensions, 384);
    }

    #[test]
    fn test_validate_ok() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_threshold() {
        let mut config = Config::default();
        config.similarity_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_dimensions() {
        let mut config = Config::default();
        config.model.dimensions = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_model_name() {
        let mut config = Config::default();
        config.model.name = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_listen_addr() {
        let config = Config::default();
        let addr = config.listen_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:8001");

        let mut bad = Config::default();
        bad.server.host = "not an address".to_string();
        assert!(bad.listen_addr().is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.port, 8001);
        // Templates are only generated for the default path
        assert!(!path.exists());
    }

    #[test]
    fn test_load_invalid_json_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.model.name, "all-MiniLM-L6-v2");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = Config::default();
        config.server.port = 18001;
        config.model.auto_download = false;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.server.port, 18001);
        assert!(!loaded.model.auto_download);
    }
}
