//! Order Store
//!
//! Confirmed orders are kept in a single pretty-printed JSON array. Every
//! save reads the array, appends one record and replaces the file through a
//! temporary sibling: write, fsync, rename. Writers within the process are
//! serialized by a mutex, so two confirmations never receive the same order
//! number.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

use sdk::errors::EngineError;

/// One persisted order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_number: u64,
    pub details: String,
}

pub struct OrderStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl OrderStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist an order and return its number (prior count + 1)
    pub async fn save_order(&self, details: &str) -> Result<u64, EngineError> {
        let _guard = self.write_lock.lock().await;

        let mut orders = self.read_all().await?;
        let order_number = orders.len() as u64 + 1;
        orders.push(OrderRecord {
            order_number,
            details: details.to_string(),
        });

        self.write_all(&orders).await?;
        info!("Saved order #{} to {}", order_number, self.path.display());
        Ok(order_number)
    }

    /// Every persisted order, oldest first
    pub async fn list(&self) -> Result<Vec<OrderRecord>, EngineError> {
        let _guard = self.write_lock.lock().await;
        self.read_all().await
    }

    pub async fn count(&self) -> Result<usize, EngineError> {
        Ok(self.list().await?.len())
    }

    /// Missing or empty file reads as no orders; anything unparsable is an
    /// error and the file is left untouched.
    async fn read_all(&self) -> Result<Vec<OrderRecord>, EngineError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(EngineError::OrderStore(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            EngineError::OrderStore(format!(
                "Order file {} is corrupt: {}",
                self.path.display(),
                e
            ))
        })
    }

    async fn write_all(&self, orders: &[OrderRecord]) -> Result<(), EngineError> {
        let json = serde_json::to_string_pretty(orders)
            .map_err(|e| EngineError::OrderStore(format!("Failed to serialize orders: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.write_error(e))?;
            }
        }

        let tmp_path = self.temp_path();
        let mut tmp_file = tokio::fs::File::create(&tmp_path)
            .await
            .map_err(|e| self.write_error(e))?;
        tmp_file
            .write_all(json.as_bytes())
            .await
            .map_err(|e| self.write_error(e))?;
        tmp_file.sync_all().await.map_err(|e| self.write_error(e))?;
        drop(tmp_file);

        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| self.write_error(e))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "orders.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_error(&self, e: std::io::Error) -> EngineError {
        EngineError::OrderStore(format!("Failed to write {}: {}", self.path.display(), e))
    }
}
