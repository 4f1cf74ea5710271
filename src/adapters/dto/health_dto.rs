use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(rename = "uploadDir")]
    pub upload_dir: String,
    #[serde(rename = "storedFiles")]
    pub stored_files: Option<usize>,
    #[serde(rename = "maxUploadBytes")]
    pub max_upload_bytes: u64,
    #[serde(rename = "allowedTypes")]
    pub allowed_types: Vec<String>,
    #[serde(rename = "allowedExtensions")]
    pub allowed_extensions: Vec<String>,
}
