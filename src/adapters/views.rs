use askama::Template;
use axum::response::Html;

use crate::{
    adapters::dto::file_dto::{FileEntry, UploadReceipt},
    application::error::ApplicationError,
};

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate;

#[derive(Template)]
#[template(path = "upload_success.html")]
pub struct UploadSuccessTemplate<'a> {
    pub receipt: &'a UploadReceipt,
}

#[derive(Template)]
#[template(path = "files.html")]
pub struct FileListTemplate<'a> {
    pub entries: &'a [FileEntry],
}

#[derive(Template)]
#[template(path = "message.html")]
pub struct MessageTemplate<'a> {
    pub heading: &'a str,
    pub message: &'a str,
}

pub fn render_page(template: &impl Template) -> Result<Html<String>, ApplicationError> {
    template.render().map(Html).map_err(|e| {
        ApplicationError::InternalError(format!("Template rendering failed: {}", e))
    })
}

/// Undoes askama's HTML escaping so tests can assert on plain text.
#[cfg(test)]
pub fn decode_entities(page: &str) -> String {
    page.replace("&#x2f;", "/")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
