use thiserror::Error;

use crate::application::error::ApplicationError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Path escapes the upload directory: {0}")]
    OutsideRoot(String),

    #[error("Upload already committed")]
    AlreadyCommitted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for ApplicationError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::NotFound(_) | StorageError::OutsideRoot(_) => ApplicationError::NotFound,
            StorageError::AlreadyCommitted | StorageError::Io(_) => {
                ApplicationError::InternalError(format!("Storage error: {}", error))
            }
        }
    }
}

impl StorageError {
    /// Maps an I/O failure on a named file, turning "no such file" into
    /// [`StorageError::NotFound`].
    pub fn for_file(name: &str, error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound(name.to_string())
        } else {
            StorageError::Io(error)
        }
    }
}
