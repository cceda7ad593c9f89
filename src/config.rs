//! TOML configuration parsing and validation.
//!
//! Only `[db]` is required. `[server]` and `[upload]` fall back to defaults
//! that match a LAN deployment on port 3000.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// `"*"` allows any origin; anything else is matched exactly.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    #[serde(default = "default_max_json_bytes")]
    pub max_json_bytes: usize,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Requests allowed per client IP in each window. `0` turns limiting off.
    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max: u32,
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,
    #[serde(default = "default_true")]
    pub security_headers: bool,
    #[serde(default = "default_content_security_policy")]
    pub content_security_policy: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origin: default_cors_origin(),
            max_json_bytes: default_max_json_bytes(),
            max_upload_bytes: default_max_upload_bytes(),
            rate_limit_max: default_rate_limit_max(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            security_headers: default_true(),
            content_security_policy: default_content_security_policy(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}
fn default_cors_origin() -> String {
    "*".to_string()
}
fn default_max_json_bytes() -> usize {
    1024 * 1024
}
fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}
fn default_rate_limit_max() -> u32 {
    300
}
fn default_rate_limit_window_secs() -> u64 {
    15 * 60
}
fn default_true() -> bool {
    true
}
fn default_content_security_policy() -> String {
    [
        "default-src 'self'",
        "base-uri 'self'",
        "font-src 'self' https: data:",
        "form-action 'self'",
        "frame-ancestors 'self'",
        "img-src 'self' data:",
        "object-src 'none'",
        "script-src 'self' 'unsafe-inline'",
        "script-src-attr 'unsafe-inline'",
        "style-src 'self' 'unsafe-inline'",
        "connect-src 'self'",
        "upgrade-insecure-requests",
    ]
    .join("; ")
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Uploaded CSV files are written here and removed after import.
    #[serde(default = "default_upload_dir")]
    pub dir: PathBuf,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }
    if config.server.max_json_bytes == 0 {
        anyhow::bail!("server.max_json_bytes must be > 0");
    }
    if config.server.max_upload_bytes == 0 {
        anyhow::bail!("server.max_upload_bytes must be > 0");
    }
    let origin = &config.server.cors_origin;
    if origin != "*" && origin.parse::<axum::http::HeaderValue>().is_err() {
        anyhow::bail!("server.cors_origin is not a valid origin: '{}'", origin);
    }
    if config.server.rate_limit_max > 0 && config.server.rate_limit_window_secs == 0 {
        anyhow::bail!("server.rate_limit_window_secs must be > 0 when rate limiting is on");
    }
    if config
        .server
        .content_security_policy
        .parse::<axum::http::HeaderValue>()
        .is_err()
    {
        anyhow::bail!("server.content_security_policy is not a valid header value");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = toml::from_str("[db]\npath = \"./data/scout.sqlite\"\n").unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:3000");
        assert_eq!(config.server.cors_origin, "*");
        assert_eq!(config.server.max_json_bytes, 1024 * 1024);
        assert_eq!(config.upload.dir, PathBuf::from("./uploads"));
        assert_eq!(config.server.rate_limit_max, 300);
        assert_eq!(config.server.rate_limit_window_secs, 900);
        assert!(config.server.security_headers);
        assert!(config
            .server
            .content_security_policy
            .starts_with("default-src 'self'; "));
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_upload_limit_rejected() {
        let config: Config = toml::from_str(
            "[db]\npath = \"x.sqlite\"\n\n[server]\nmax_upload_bytes = 0\n",
        )
        .unwrap();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("max_upload_bytes"));
    }

    #[test]
    fn test_rate_limit_window_required_when_enabled() {
        let config: Config = toml::from_str(
            "[db]\npath = \"x.sqlite\"\n\n[server]\nrate_limit_window_secs = 0\n",
        )
        .unwrap();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("rate_limit_window_secs"));

        let config: Config = toml::from_str(
            "[db]\npath = \"x.sqlite\"\n\n[server]\nrate_limit_max = 0\nrate_limit_window_secs = 0\n",
        )
        .unwrap();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_cors_origin_must_be_header_safe() {
        let config: Config = toml::from_str(
            "[db]\npath = \"x.sqlite\"\n\n[server]\ncors_origin = \"http://scout.local\\n\"\n",
        )
        .unwrap();
        assert!(validate(&config).is_err());

        let config: Config = toml::from_str(
            "[db]\npath = \"x.sqlite\"\n\n[server]\ncors_origin = \"http://scout.local:3000\"\n",
        )
        .unwrap();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/scout.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/scout.toml"));
    }
}
