/// A file persisted in the upload directory, addressed by its name.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub name: String,
    pub size: u64,
}

impl StoredFile {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }

    /// Absolute-path segment under which the file is downloadable.
    pub fn download_path(&self) -> String {
        download_path(&self.name)
    }
}

pub fn download_path(name: &str) -> String {
    format!("/download/{}", urlencoding::encode(name))
}
