use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, Response},
};
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use crate::{
    adapters::{
        dto::file_dto::{FileEntry, UploadReceipt},
        state::AppState,
        views::{self, FileListTemplate, UploadSuccessTemplate},
    },
    application::{error::ApplicationError, services::UploadSink},
    domain::{
        config::relay::RelayConfig,
        filename::{is_plain_filename, sanitize_filename},
        policy::{content_type_for, DEFAULT_MIME_TYPE},
    },
};

const FILE_FIELD: &str = "file";

struct PendingUpload {
    original_name: String,
    sink: Box<dyn UploadSink>,
}

pub struct FileController;

impl FileController {
    /// POST /upload
    /// Accepts exactly one multipart part named `file` and stores it under its
    /// sanitized base name, replacing any previous file of that name.
    pub async fn upload_file(
        State(app_state): State<AppState>,
        headers: HeaderMap,
        multipart: Result<Multipart, MultipartRejection>,
    ) -> Result<Html<String>, ApplicationError> {
        let mut multipart = multipart.map_err(|e| {
            warn!("Rejected non-multipart upload: {}", e);
            ApplicationError::BadRequest("Expected a multipart/form-data request".to_string())
        })?;

        let config = &app_state.config;
        let mut pending: Option<PendingUpload> = None;

        while let Some(mut field) = multipart.next_field().await.map_err(|e| {
            warn!("Invalid multipart data: {}", e);
            ApplicationError::BadRequest("Invalid or interrupted upload".to_string())
        })? {
            if field.name() != Some(FILE_FIELD) {
                continue;
            }

            // The staged file of the first part is discarded when `pending` drops.
            if pending.is_some() {
                return Err(ApplicationError::BadRequest(
                    "Only one file may be uploaded per request".to_string(),
                ));
            }

            let original_name = field
                .file_name()
                .map(str::to_string)
                .ok_or_else(|| {
                    ApplicationError::BadRequest("The 'file' part has no filename".to_string())
                })?;
            let mime_type = field.content_type().unwrap_or(DEFAULT_MIME_TYPE).to_string();

            let stored_name = sanitize_filename(&original_name).map_err(|e| {
                warn!("Unusable filename {:?}: {}", original_name, e);
                ApplicationError::BadRequest(e.to_string())
            })?;

            if !config.policy.admits(&mime_type, &stored_name) {
                return Err(ApplicationError::BadRequest(format!(
                    "File type not allowed: {}",
                    mime_type
                )));
            }

            let mut sink = app_state.storage_service.begin_upload(&stored_name).await?;

            while let Some(chunk) = field.chunk().await.map_err(|e| {
                warn!("Upload of {} interrupted: {}", stored_name, e);
                ApplicationError::BadRequest("Invalid or interrupted upload".to_string())
            })? {
                if sink.bytes_written() + chunk.len() as u64 > config.max_upload_bytes {
                    return Err(ApplicationError::BadRequest(format!(
                        "File too large (maximum is {} bytes)",
                        config.max_upload_bytes
                    )));
                }
                sink.write_chunk(&chunk).await?;
            }

            pending = Some(PendingUpload {
                original_name,
                sink,
            });
        }

        let PendingUpload {
            original_name,
            sink,
        } = pending.ok_or_else(|| {
            ApplicationError::BadRequest("No file provided in the 'file' field".to_string())
        })?;

        let stored = sink.commit().await?;
        let receipt = UploadReceipt::new(original_name, &stored, &request_host(&headers, config));

        info!(
            "Upload of {:?} stored as {} ({} bytes)",
            receipt.original_name, receipt.stored_name, receipt.size
        );

        views::render_page(&UploadSuccessTemplate { receipt: &receipt })
    }

    /// GET /download/{filename}
    pub async fn download_file(
        State(app_state): State<AppState>,
        Path(filename): Path<String>,
    ) -> Result<Response, ApplicationError> {
        if !is_plain_filename(&filename) {
            warn!("Rejected download of unsafe name {:?}", filename);
            return Err(ApplicationError::BadRequest("Invalid filename".to_string()));
        }

        let opened = app_state.storage_service.open(&filename).await.map_err(|e| {
            if matches!(e, ApplicationError::NotFound) {
                info!("Download miss for {}", filename);
            }
            e
        })?;

        let response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type_for(&opened.file.name))
            .header(header::CONTENT_LENGTH, opened.file.size)
            .header(
                header::CONTENT_DISPOSITION,
                content_disposition(&opened.file.name),
            )
            .body(Body::from_stream(ReaderStream::new(opened.reader)))
            .map_err(|e| ApplicationError::InternalError(format!("Invalid response: {}", e)))?;

        Ok(response)
    }

    /// GET /files
    pub async fn list_files(
        State(app_state): State<AppState>,
        headers: HeaderMap,
    ) -> Result<Html<String>, ApplicationError> {
        let names = app_state.storage_service.list().await?;
        let host = request_host(&headers, &app_state.config);

        let entries: Vec<FileEntry> = names
            .into_iter()
            .map(|name| FileEntry::new(name, &host))
            .collect();

        views::render_page(&FileListTemplate { entries: &entries })
    }
}

/// Host used in absolute download links: the request's Host header, or the
/// local listener when the client sent none.
fn request_host(headers: &HeaderMap, config: &RelayConfig) -> String {
    headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("localhost:{}", config.port))
}

fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_has_ascii_fallback_and_utf8_name() {
        assert_eq!(
            content_disposition("report.pdf"),
            "attachment; filename=\"report.pdf\"; filename*=UTF-8''report.pdf"
        );
        assert_eq!(
            content_disposition("报告\".txt"),
            "attachment; filename=\"___.txt\"; filename*=UTF-8''%E6%8A%A5%E5%91%8A%22.txt"
        );
    }

    #[test]
    fn host_falls_back_to_listener_port() {
        let config = RelayConfig::new("uploads");
        let mut headers = HeaderMap::new();
        assert_eq!(request_host(&headers, &config), "localhost:8081");

        headers.insert(header::HOST, "files.example.com".parse().unwrap());
        assert_eq!(request_host(&headers, &config), "files.example.com");
    }
}
