//! Report files
//!
//! One pretty-printed JSON file per exchange, named after the time it was
//! written. Files are created exclusively so two reports in the same
//! microsecond get distinct names instead of overwriting each other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::info;

use sdk::errors::EngineError;
use sdk::types::ConversationItem;

/// Attempts at finding a free file name before giving up
const MAX_NAME_ATTEMPTS: u32 = 100;

/// Contents of one report file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub timestamp: DateTime<Utc>,
    pub user_message: Option<String>,
    pub image_provided: bool,
    pub image_caption: Option<String>,
    pub ai_response: String,

    /// Conversation without the system prompt
    pub conversation: Vec<ConversationItem>,
}

pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a report and return the path of the new file
    pub async fn save(&self, record: &ReportRecord) -> Result<PathBuf, EngineError> {
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| EngineError::ReportStore(format!("Failed to serialize report: {}", e)))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| self.write_error(&self.dir, e))?;

        let stem = format!("report_{}", record.timestamp.format("%Y-%m-%dT%H-%M-%S%.6f"));

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                format!("{}.json", stem)
            } else {
                format!("{}_{}.json", stem, attempt)
            };
            let path = self.dir.join(name);

            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(self.write_error(&path, e)),
            };

            file.write_all(json.as_bytes())
                .await
                .map_err(|e| self.write_error(&path, e))?;
            file.sync_all().await.map_err(|e| self.write_error(&path, e))?;

            info!("Saved emergency report to {}", path.display());
            return Ok(path);
        }

        Err(EngineError::ReportStore(format!(
            "No free report file name for {} in {}",
            stem,
            self.dir.display()
        )))
    }

    fn write_error(&self, path: &Path, e: std::io::Error) -> EngineError {
        EngineError::ReportStore(format!("Failed to write {}: {}", path.display(), e))
    }
}
