use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rcoach_core::analysis::PromptError;
use rcoach_core::gemini::GeminiError;

/// Failures of the analyze pipeline, as reported to callers.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request was well formed but its content is unusable.
    #[error("{0}")]
    InvalidInput(String),

    /// The request body could not be decoded.
    #[error("{0}")]
    InvalidRequest(String),

    /// The Gemini API failed or returned nothing usable.
    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Upstream(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PromptError> for Error {
    fn from(err: PromptError) -> Self {
        Error::InvalidInput(err.to_string())
    }
}

impl From<GeminiError> for Error {
    fn from(err: GeminiError) -> Self {
        Error::Upstream(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        (self.status(), body).into_response()
    }
}
