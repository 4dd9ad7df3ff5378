use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming the backend origin the gateway forwards to.
pub const BACKEND_ORIGIN_ENV: &str = "SOC_BACKEND_ORIGIN";

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpstreamConfig {
    /// Backend origin, e.g. "https://backend.example.com".
    /// `SOC_BACKEND_ORIGIN` overrides this at load time. When neither is set
    /// the gateway still starts, but every forwarded request is answered with
    /// a configuration error.
    #[serde(default)]
    pub origin: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            limits: LimitsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

// Default value functions
fn default_port() -> u16 { 8750 }
fn default_host() -> String { "127.0.0.1".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_max_body_bytes() -> usize { 50 * 1024 * 1024 }

/// Get default config file path
/// Uses ~/.config/soc-gateway/config.toml for Unix-like CLI experience
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("soc-gateway")
        .join("config.toml")
}

/// Load config from file, or return defaults if not found.
///
/// Loading order:
/// 1. Specified path (if provided)
/// 2. ./config.toml (if exists)
/// 3. default_config_path() (usually ~/.config/soc-gateway/config.toml)
///
/// After the file is loaded, `SOC_BACKEND_ORIGIN` from the environment
/// overrides `upstream.origin`. The environment is consulted exactly once,
/// here, never per request.
pub fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let mut config = load_config_file(path)?;

    match std::env::var(BACKEND_ORIGIN_ENV) {
        Ok(origin) if !origin.trim().is_empty() => {
            config.upstream.origin = Some(origin);
        }
        _ => {}
    }

    if config.upstream.origin.is_none() {
        tracing::warn!(
            "{} is not set and no upstream.origin configured; forwarded requests will fail",
            BACKEND_ORIGIN_ENV
        );
    }

    Ok(config)
}

fn load_config_file(path: Option<PathBuf>) -> anyhow::Result<Config> {
    if let Some(config_path) = path {
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            tracing::info!("Loaded config from specified path {:?}", config_path);
            return Ok(config);
        } else {
            anyhow::bail!("Specified config file not found: {:?}", config_path);
        }
    }

    // Try current directory config.toml
    let local_config = PathBuf::from("config.toml");
    if local_config.exists() {
        match std::fs::read_to_string(&local_config) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from current directory {:?}", local_config);
                    return Ok(config);
                }
                Err(e) => {
                    tracing::error!("Failed to parse ./config.toml: {}. Falling back to default path.", e);
                }
            },
            Err(e) => {
                tracing::error!("Failed to read ./config.toml: {}. Falling back to default path.", e);
            }
        }
    }

    let default_path = default_config_path();
    if default_path.exists() {
        let content = std::fs::read_to_string(&default_path)?;
        let config: Config = toml::from_str(&content)?;
        tracing::info!("Loaded config from default path {:?}", default_path);
        Ok(config)
    } else {
        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }
}
