use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

pub type AppResult<T> = Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    // required query parameter absent, the player gets a plain-text 400
    #[error("missing parameter: {0}")]
    MissingParameter(String),

    #[error("{0}")]
    BadRequest(String),

    // network failure or non-2xx from the origin before any bytes were relayed
    #[error("upstream fetch failed: {0}")]
    UpstreamFetch(String),

    #[error("internal server error")]
    InternalServerError,

    #[error("{0}")]
    InternalServerErrorWithContext(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingParameter(param) => (
                StatusCode::BAD_REQUEST,
                format!("Required parameter '{}' is missing", param),
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::UpstreamFetch(msg) => (StatusCode::BAD_GATEWAY, msg),
            Self::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            Self::InternalServerErrorWithContext(msg) => {
                error!("internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, message).into_response()
    }
}
