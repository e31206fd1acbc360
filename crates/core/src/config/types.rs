use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use crate::download::{default_header_rules, HeaderRule};
use crate::engine::EngineConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub downloads: DownloadsConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    /// Per-site header overrides, first match wins.
    #[serde(default = "default_header_rules")]
    pub header_rules: Vec<HeaderRule>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            downloads: DownloadsConfig::default(),
            engine: EngineConfig::default(),
            header_rules: default_header_rules(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the web page.
    #[serde(default = "default_ui_dir")]
    pub ui_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            ui_dir: default_ui_dir(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

fn default_ui_dir() -> PathBuf {
    PathBuf::from("crates/server/static")
}

/// Download configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadsConfig {
    /// Where finished files are written.
    #[serde(default = "default_download_dir")]
    pub dir: PathBuf,
    /// Delay between status snapshots, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Maximum workers running at once; unset means unbounded.
    #[serde(default)]
    pub max_concurrent: Option<usize>,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            dir: default_download_dir(),
            poll_interval_ms: default_poll_interval_ms(),
            max_concurrent: None,
        }
    }
}

impl DownloadsConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_poll_interval_ms() -> u64 {
    1000
}

/// Sanitized config for API responses (header values hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub downloads: DownloadsConfig,
    pub engine: EngineConfig,
    pub header_rules: Vec<SanitizedHeaderRule>,
}

/// Header rule with header names only
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedHeaderRule {
    pub pattern: String,
    pub headers: Vec<String>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            downloads: config.downloads.clone(),
            engine: config.engine.clone(),
            header_rules: config
                .header_rules
                .iter()
                .map(|rule| SanitizedHeaderRule {
                    pattern: rule.pattern.clone(),
                    headers: rule.headers.keys().cloned().collect(),
                })
                .collect(),
        }
    }
}
