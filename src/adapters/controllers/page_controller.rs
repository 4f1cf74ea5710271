use axum::response::Html;

use crate::{
    adapters::views::{self, HomeTemplate},
    application::error::ApplicationError,
};

pub struct PageController;

impl PageController {
    /// GET /
    pub async fn home() -> Result<Html<String>, ApplicationError> {
        views::render_page(&HomeTemplate)
    }
}
