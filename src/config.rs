// src/config.rs
use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::{Context, bail};

use crate::services::relay::DEFAULT_TARGET;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub relay_target: String,
    pub relay_timeout: Duration,
    pub public_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub history_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            relay_target: DEFAULT_TARGET.to_string(),
            relay_timeout: Duration::from_secs(60),
            public_dir: PathBuf::from("public"),
            reports_dir: PathBuf::from("public/reports"),
            history_dir: PathBuf::from("data"),
        }
    }
}

impl AppConfig {
    /// Reads the process environment. Call after `dotenvy::dotenv()`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(addr) = get("REPORT_BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .with_context(|| format!("REPORT_BIND_ADDR is not a socket address: {addr}"))?;
        }
        if let Some(target) = get("RELAY_TARGET_URL") {
            if !target.starts_with("http://") && !target.starts_with("https://") {
                bail!("RELAY_TARGET_URL must be an http(s) URL: {target}");
            }
            config.relay_target = target;
        }
        if let Some(secs) = get("RELAY_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("RELAY_TIMEOUT_SECS is not a number: {secs}"))?;
            if secs == 0 {
                bail!("RELAY_TIMEOUT_SECS must be greater than zero");
            }
            config.relay_timeout = Duration::from_secs(secs);
        }
        if let Some(dir) = get("PUBLIC_DIR") {
            config.public_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("REPORTS_DIR") {
            config.reports_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("HISTORY_DIR") {
            config.history_dir = PathBuf::from(dir);
        }
        Ok(config)
    }
}
