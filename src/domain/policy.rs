use std::collections::HashSet;
use std::path::Path;

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

pub const DEFAULT_ALLOWED_TYPES: &[&str] = &[
    // images
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    // documents
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "text/plain",
    // archives
    "application/zip",
    "application/x-rar-compressed",
    "application/x-7z-compressed",
    "application/gzip",
    "application/vnd.android.package-archive",
    DEFAULT_MIME_TYPE,
];

pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[
    ".zip", ".rar", ".7z", ".gz", ".tar", ".tgz", ".tar.gz", ".pdf", ".doc", ".docx", ".xls",
    ".xlsx", ".ppt", ".pptx", ".txt", ".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".apk",
];

/// Decides which uploads are accepted. A file passes when its declared MIME
/// type OR one of its extensions is in the allowed sets.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionPolicy {
    allowed_types: HashSet<String>,
    allowed_extensions: HashSet<String>,
}

impl AdmissionPolicy {
    pub fn new<T, E>(allowed_types: T, allowed_extensions: E) -> Self
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        Self {
            allowed_types: allowed_types
                .into_iter()
                .map(|t| t.as_ref().trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            allowed_extensions: allowed_extensions
                .into_iter()
                .filter_map(|e| normalize_extension(e.as_ref()))
                .collect(),
        }
    }

    pub fn admits(&self, mime_type: &str, filename: &str) -> bool {
        if self
            .allowed_types
            .contains(&mime_type.trim().to_ascii_lowercase())
        {
            return true;
        }

        // "a.tar.gz" is checked as both ".tar.gz" and ".gz"
        let lower = filename.to_lowercase();
        lower
            .match_indices('.')
            .filter(|(idx, _)| *idx > 0)
            .any(|(idx, _)| self.allowed_extensions.contains(&lower[idx..]))
    }

    pub fn allowed_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.allowed_types.iter().cloned().collect();
        types.sort();
        types
    }

    pub fn allowed_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self.allowed_extensions.iter().cloned().collect();
        extensions.sort();
        extensions
    }
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_TYPES, DEFAULT_ALLOWED_EXTENSIONS)
    }
}

fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    Some(format!(".{}", trimmed.to_lowercase()))
}

/// Content type served for a stored file, chosen by extension only.
pub fn content_type_for(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("apk") => "application/vnd.android.package-archive",
        Some("zip") => "application/zip",
        Some("rar") => "application/x-rar-compressed",
        Some("7z") => "application/x-7z-compressed",
        Some("gz") => "application/gzip",
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("ppt") => "application/vnd.ms-powerpoint",
        Some("pptx") => {
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        }
        Some("txt") => "text/plain",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => DEFAULT_MIME_TYPE,
    }
}
