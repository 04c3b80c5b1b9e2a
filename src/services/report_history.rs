// src/services/report_history.rs
use std::{
    collections::HashMap,
    fmt::Debug,
    io::ErrorKind,
    path::PathBuf,
    sync::Arc,
};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

use super::report_data::ReportMeta;

pub const REPORTS_KEY: &str = "reports:v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredReport {
    pub id: String,
    pub user_email: String,
    pub seller_name: String,
    pub department: String,
    pub offered_item: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl StoredReport {
    pub fn new(id: impl Into<String>, user_email: impl Into<String>, meta: &ReportMeta, file_name: Option<String>) -> Self {
        Self {
            id: id.into(),
            user_email: user_email.into(),
            seller_name: meta.seller_name.clone().unwrap_or_default(),
            department: meta.department.clone().unwrap_or_default(),
            offered_item: meta.offered_item.clone().unwrap_or_default(),
            created_at: Utc::now().to_rfc3339(),
            file_name,
        }
    }
}

/// Opaque string storage keyed by name.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> std::io::Result<Option<String>>;
    async fn set(&self, key: &str, value: String) -> std::io::Result<()>;
}

/// One JSON file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> std::io::Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    // the target file always holds a complete list
    async fn set(&self, key: &str, value: String) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, value).await?;
        tokio::fs::rename(&staging, &path).await
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> std::io::Result<Option<String>> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> std::io::Result<()> {
        self.inner.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Per-user list of generated reports, newest first. Storage problems are
/// logged and otherwise ignored.
#[derive(Clone)]
pub struct ReportHistory {
    store: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl Debug for ReportHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportHistory").field("key", &REPORTS_KEY).finish()
    }
}

impl ReportHistory {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store, write_lock: Arc::new(Mutex::new(())) }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    async fn read_all(&self) -> Vec<StoredReport> {
        let raw = match self.store.get(REPORTS_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read report history");
                return Vec::new();
            }
        };
        let entries = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => {
                warn!("report history is not a list, ignoring it");
                return Vec::new();
            }
            Err(e) => {
                warn!(error = %e, "report history is not valid JSON, ignoring it");
                return Vec::new();
            }
        };
        entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<StoredReport>(entry) {
                Ok(report) => Some(report),
                Err(e) => {
                    warn!(error = %e, "skipping malformed history entry");
                    None
                }
            })
            .collect()
    }

    pub async fn save(&self, report: StoredReport) {
        let _guard = self.write_lock.lock().await;
        let mut all = self.read_all().await;
        all.insert(0, report);
        let encoded = match serde_json::to_string(&all) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(error = %e, "failed to encode report history");
                return;
            }
        };
        if let Err(e) = self.store.set(REPORTS_KEY, encoded).await {
            warn!(error = %e, "failed to persist report history");
        }
    }

    pub async fn list_by_user(&self, user_email: &str) -> Vec<StoredReport> {
        self.read_all()
            .await
            .into_iter()
            .filter(|r| r.user_email == user_email)
            .collect()
    }

    pub async fn count_by_user(&self, user_email: &str) -> usize {
        self.list_by_user(user_email).await.len()
    }
}
