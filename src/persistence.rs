//! Where finished exchanges end up.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::PersistError;
use crate::models::{RequestRecord, ResponseRecord};

/// Best-effort store for request/response pairs.
///
/// Called from the persistence worker, never from a request handler, so a
/// slow or failing sink can't hold up a client.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    async fn save(
        &self,
        request: &RequestRecord,
        response: &ResponseRecord,
    ) -> Result<(), PersistError>;
}

// Writes records to the log only
pub struct LogSink;

#[async_trait]
impl PersistenceSink for LogSink {
    async fn save(
        &self,
        request: &RequestRecord,
        response: &ResponseRecord,
    ) -> Result<(), PersistError> {
        info!(
            client = %request.client,
            method = %request.method,
            path = %request.path,
            status = response.status,
            error = response.error.as_deref(),
            "Exchange recorded"
        );
        Ok(())
    }
}

/// Appends JSON lines to `requests.jsonl` and `responses.jsonl` in one directory.
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub const REQUESTS_FILE: &'static str = "requests.jsonl";
    pub const RESPONSES_FILE: &'static str = "responses.jsonl";

    /// Create the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn append<T: serde::Serialize>(&self, file: &str, record: &T) -> Result<(), PersistError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(file))
            .await?;
        f.write_all(&line).await?;
        f.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl PersistenceSink for FileSink {
    async fn save(
        &self,
        request: &RequestRecord,
        response: &ResponseRecord,
    ) -> Result<(), PersistError> {
        self.append(Self::REQUESTS_FILE, request).await?;
        self.append(Self::RESPONSES_FILE, response).await
    }
}
