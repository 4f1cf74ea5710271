#[derive(Debug)]
pub enum ApplicationError {
    NotFound,
    BadRequest(String),
    InternalError(String),
}
