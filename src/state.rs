// src/state.rs
use std::sync::Arc;

use anyhow::Context;

use crate::config::AppConfig;
use crate::services::relay::RequestRelay;
use crate::services::report_history::{FileStore, ReportHistory};

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: AppConfig,
    pub history: ReportHistory,
    pub relay: RequestRelay,
}

impl AppState {
    pub fn new(config: AppConfig, history: ReportHistory) -> anyhow::Result<Self> {
        let relay = RequestRelay::new(config.relay_target.clone(), config.relay_timeout)
            .context("failed to build relay http client")?;
        Ok(Self { config, history, relay })
    }

    /// State backed by the on-disk history store.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let history = ReportHistory::new(Arc::new(FileStore::new(config.history_dir.clone())));
        Self::new(config, history)
    }
}
