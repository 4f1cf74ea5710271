use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::{
    fs::{self, File},
    io::{AsyncWriteExt, BufWriter},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    application::{
        error::ApplicationError,
        services::{OpenedFile, StorageService, UploadSink},
    },
    domain::models::file::StoredFile,
    services::StorageError,
};

/// Flat on-disk store. Uploads are staged under a unique name and renamed
/// into place on commit, so readers only ever see complete files.
pub struct LocalStorageService {
    upload_dir: PathBuf,
    staging_dir: PathBuf,
}

impl LocalStorageService {
    /// Creates both directories if needed.
    pub async fn new(
        upload_dir: impl AsRef<Path>,
        staging_dir: impl AsRef<Path>,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(upload_dir.as_ref()).await?;
        fs::create_dir_all(staging_dir.as_ref()).await?;

        let upload_dir = fs::canonicalize(upload_dir.as_ref()).await?;
        let staging_dir = fs::canonicalize(staging_dir.as_ref()).await?;

        if staging_dir == upload_dir {
            warn!(
                "Staging directory equals the upload directory; partial uploads will be listed"
            );
        } else {
            sweep_staging_dir(&staging_dir).await?;
        }

        info!("Upload directory ready at {}", upload_dir.display());

        Ok(Self {
            upload_dir,
            staging_dir,
        })
    }

    async fn resolve(&self, filename: &str) -> Result<PathBuf, StorageError> {
        let candidate = self.upload_dir.join(filename);
        let resolved = fs::canonicalize(&candidate)
            .await
            .map_err(|e| StorageError::for_file(filename, e))?;

        if !resolved.starts_with(&self.upload_dir) {
            warn!(
                "Refusing to serve {} outside the upload directory",
                resolved.display()
            );
            return Err(StorageError::OutsideRoot(filename.to_string()));
        }

        Ok(resolved)
    }
}

/// Removes `.part` files left behind by a previous process.
async fn sweep_staging_dir(staging_dir: &Path) -> Result<(), StorageError> {
    let mut entries = fs::read_dir(staging_dir).await?;
    let mut removed = 0usize;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_part = path.extension().is_some_and(|ext| ext == "part");
        if is_part && entry.file_type().await?.is_file() {
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!("Failed to remove stale upload {}: {}", path.display(), e),
            }
        }
    }

    if removed > 0 {
        info!("Removed {} stale staged uploads", removed);
    }
    Ok(())
}

#[async_trait]
impl StorageService for LocalStorageService {
    async fn begin_upload(&self, filename: &str) -> Result<Box<dyn UploadSink>, ApplicationError> {
        let temp_path = self.staging_dir.join(format!("{}.part", Uuid::new_v4()));
        let file = File::create(&temp_path)
            .await
            .map_err(StorageError::from)?;

        debug!("Staging upload of {} at {}", filename, temp_path.display());

        Ok(Box::new(StagedUpload {
            name: filename.to_string(),
            writer: Some(BufWriter::new(file)),
            temp_path,
            final_path: self.upload_dir.join(filename),
            written: 0,
            committed: false,
        }))
    }

    async fn open(&self, filename: &str) -> Result<OpenedFile, ApplicationError> {
        let path = self.resolve(filename).await?;
        let metadata = fs::metadata(&path)
            .await
            .map_err(|e| StorageError::for_file(filename, e))?;

        if !metadata.is_file() {
            return Err(StorageError::NotFound(filename.to_string()).into());
        }

        let reader = File::open(&path)
            .await
            .map_err(|e| StorageError::for_file(filename, e))?;

        Ok(OpenedFile {
            file: StoredFile::new(filename, metadata.len()),
            reader,
        })
    }

    async fn list(&self) -> Result<Vec<String>, ApplicationError> {
        let mut entries = fs::read_dir(&self.upload_dir)
            .await
            .map_err(StorageError::from)?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(StorageError::from)? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();

        Ok(names)
    }
}

struct StagedUpload {
    name: String,
    writer: Option<BufWriter<File>>,
    temp_path: PathBuf,
    final_path: PathBuf,
    written: u64,
    /// Set only once the rename has succeeded.
    committed: bool,
}

#[async_trait]
impl UploadSink for StagedUpload {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), ApplicationError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or(StorageError::AlreadyCommitted)?;
        writer.write_all(chunk).await.map_err(StorageError::from)?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    fn bytes_written(&self) -> u64 {
        self.written
    }

    async fn commit(mut self: Box<Self>) -> Result<StoredFile, ApplicationError> {
        let writer = self.writer.take().ok_or(StorageError::AlreadyCommitted)?;

        persist(writer, &self.temp_path, &self.final_path).await?;
        self.committed = true;

        info!("Stored {} ({} bytes)", self.name, self.written);

        Ok(StoredFile::new(self.name.clone(), self.written))
    }
}

async fn persist(
    mut writer: BufWriter<File>,
    temp_path: &Path,
    final_path: &Path,
) -> Result<(), StorageError> {
    writer.flush().await?;
    writer.get_mut().sync_all().await?;
    drop(writer);
    fs::rename(temp_path, final_path).await?;
    Ok(())
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        // Reached on commit errors and when the upload or commit future is
        // dropped mid-flight. The unlink runs synchronously on this thread.
        drop(self.writer.take());
        match std::fs::remove_file(&self.temp_path) {
            Ok(()) => debug!("Discarded incomplete upload of {}", self.name),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove staged upload {}: {}",
                self.temp_path.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn storage(root: &Path) -> LocalStorageService {
        LocalStorageService::new(root.join("uploads"), root.join("staging"))
            .await
            .unwrap()
    }

    async fn store(storage: &LocalStorageService, name: &str, content: &[u8]) -> StoredFile {
        let mut sink = storage.begin_upload(name).await.unwrap();
        for chunk in content.chunks(3) {
            sink.write_chunk(chunk).await.unwrap();
        }
        sink.commit().await.unwrap()
    }

    #[tokio::test]
    async fn creates_missing_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");

        LocalStorageService::new(&nested, tmp.path().join("staging"))
            .await
            .unwrap();

        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn committed_upload_is_readable() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = storage(tmp.path()).await;

        let stored = store(&storage, "notes.txt", b"hello relay").await;
        assert_eq!(stored, StoredFile::new("notes.txt", 11));

        let opened = storage.open("notes.txt").await.unwrap();
        assert_eq!(opened.file.size, 11);
        assert_eq!(
            std::fs::read(tmp.path().join("uploads").join("notes.txt")).unwrap(),
            b"hello relay"
        );
    }

    #[tokio::test]
    async fn last_write_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = storage(tmp.path()).await;

        store(&storage, "same.txt", b"first").await;
        store(&storage, "same.txt", b"second version").await;

        let content = std::fs::read(tmp.path().join("uploads").join("same.txt")).unwrap();
        assert_eq!(content, b"second version");
        assert_eq!(storage.list().await.unwrap(), vec!["same.txt"]);
    }

    #[tokio::test]
    async fn dropped_upload_leaves_previous_file_intact() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = storage(tmp.path()).await;
        store(&storage, "keep.txt", b"valid").await;

        let mut sink = storage.begin_upload("keep.txt").await.unwrap();
        sink.write_chunk(b"partial garbage").await.unwrap();
        drop(sink);

        let content = std::fs::read(tmp.path().join("uploads").join("keep.txt")).unwrap();
        assert_eq!(content, b"valid");
        assert_eq!(
            std::fs::read_dir(tmp.path().join("staging")).unwrap().count(),
            0
        );
    }

    #[tokio::test]
    async fn cancelled_commit_discards_staged_file() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = storage(tmp.path()).await;

        let mut sink = storage.begin_upload("large.bin").await.unwrap();
        sink.write_chunk(&vec![7u8; 1024 * 1024]).await.unwrap();

        // A zero timeout polls the commit once and then drops it
        let result =
            tokio::time::timeout(std::time::Duration::ZERO, sink.commit()).await;
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;

        assert_eq!(
            std::fs::read_dir(tmp.path().join("staging")).unwrap().count(),
            0
        );
        // Either the commit finished within its first poll or nothing was stored
        let stored = tmp.path().join("uploads").join("large.bin").exists();
        assert_eq!(stored, matches!(result, Ok(Ok(_))));
    }

    #[tokio::test]
    async fn startup_sweeps_stale_staged_files() {
        let tmp = tempfile::tempdir().unwrap();
        let staging = tmp.path().join("staging");
        std::fs::create_dir_all(&staging).unwrap();
        std::fs::write(staging.join("stale.part"), b"left over").unwrap();
        std::fs::write(staging.join("notes.txt"), b"unrelated").unwrap();

        storage(tmp.path()).await;

        assert!(!staging.join("stale.part").exists());
        assert!(staging.join("notes.txt").exists());
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = storage(tmp.path()).await;

        let err = storage.open("nope.pdf").await.unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound));
    }

    #[tokio::test]
    async fn directories_are_listed_but_not_served() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = storage(tmp.path()).await;
        std::fs::create_dir(tmp.path().join("uploads").join("nested")).unwrap();
        store(&storage, "b.txt", b"b").await;
        store(&storage, "a.txt", b"a").await;

        assert_eq!(
            storage.list().await.unwrap(),
            vec!["a.txt", "b.txt", "nested"]
        );
        assert!(matches!(
            storage.open("nested").await.unwrap_err(),
            ApplicationError::NotFound
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinks_out_of_the_store_are_refused() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = storage(tmp.path()).await;
        let secret = tmp.path().join("secret.txt");
        std::fs::write(&secret, b"secret").unwrap();
        std::os::unix::fs::symlink(&secret, tmp.path().join("uploads").join("link.txt")).unwrap();

        assert!(matches!(
            storage.open("link.txt").await.unwrap_err(),
            ApplicationError::NotFound
        ));
    }

    #[tokio::test]
    async fn unreadable_directory_is_internal_error() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = storage(tmp.path()).await;
        std::fs::remove_dir_all(tmp.path().join("uploads")).unwrap();

        assert!(matches!(
            storage.list().await.unwrap_err(),
            ApplicationError::InternalError(_)
        ));
    }
}
