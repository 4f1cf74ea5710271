use crate::domain::models::file::{download_path, StoredFile};

#[derive(Debug)]
pub struct UploadReceipt {
    pub original_name: String,
    pub stored_name: String,
    pub size: u64,
    pub download_url: String,
}

impl UploadReceipt {
    pub fn new(original_name: String, stored: &StoredFile, host: &str) -> Self {
        Self {
            original_name,
            stored_name: stored.name.clone(),
            size: stored.size,
            download_url: absolute_url(host, &stored.download_path()),
        }
    }
}

/// One row of the file listing.
#[derive(Debug)]
pub struct FileEntry {
    pub name: String,
    pub download_path: String,
    pub download_url: String,
}

impl FileEntry {
    pub fn new(name: impl Into<String>, host: &str) -> Self {
        let name = name.into();
        let download_path = download_path(&name);
        Self {
            download_url: absolute_url(host, &download_path),
            download_path,
            name,
        }
    }
}

fn absolute_url(host: &str, path: &str) -> String {
    format!("http://{}{}", host, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_builds_absolute_url() {
        let stored = StoredFile::new("report.pdf", 42);
        let receipt = UploadReceipt::new("../report.pdf".to_string(), &stored, "relay.local:8081");

        assert_eq!(receipt.original_name, "../report.pdf");
        assert_eq!(receipt.stored_name, "report.pdf");
        assert_eq!(
            receipt.download_url,
            "http://relay.local:8081/download/report.pdf"
        );
    }

    #[test]
    fn entry_encodes_name_in_url() {
        let entry = FileEntry::new("a b.txt", "localhost");
        assert_eq!(entry.download_path, "/download/a%20b.txt");
        assert_eq!(entry.download_url, "http://localhost/download/a%20b.txt");
    }
}
