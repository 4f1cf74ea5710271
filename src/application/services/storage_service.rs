use async_trait::async_trait;
use tokio::fs::File;

use crate::{application::error::ApplicationError, domain::models::file::StoredFile};

/// A stored file opened for reading.
#[derive(Debug)]
pub struct OpenedFile {
    pub file: StoredFile,
    pub reader: File,
}

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Starts writing a file that becomes visible under `filename` only once
    /// [`UploadSink::commit`] succeeds. Dropping the sink discards the bytes.
    async fn begin_upload(&self, filename: &str) -> Result<Box<dyn UploadSink>, ApplicationError>;
    async fn open(&self, filename: &str) -> Result<OpenedFile, ApplicationError>;
    async fn list(&self) -> Result<Vec<String>, ApplicationError>;
}

#[async_trait]
pub trait UploadSink: Send {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), ApplicationError>;
    fn bytes_written(&self) -> u64;
    async fn commit(self: Box<Self>) -> Result<StoredFile, ApplicationError>;
}
