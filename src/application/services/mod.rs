mod storage_service;

pub use storage_service::{OpenedFile, StorageService, UploadSink};
