use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::session::{ErrorKind, SessionError};

const LOG_TARGET: &str = "server::error";

/// HTTP projection of a failed request: a status code, the taxonomy kind the
/// failure belongs to, and a human-readable message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            kind: "not_found",
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "validation",
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal",
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        let kind = err.kind();
        let status = match kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Phase | ErrorKind::Capacity | ErrorKind::Exhausted => StatusCode::CONFLICT,
            ErrorKind::Rule => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self {
            status,
            kind: kind.as_str(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(target = LOG_TARGET, message = %self.message, "internal server error");
        }
        let body = Json(json!({ "error": self.kind, "message": self.message }));
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_errors_map_onto_status_codes() {
        let cases = [
            (SessionError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (
                SessionError::InvalidPhase {
                    op: "draw",
                    phase: crate::session::GamePhase::NotStarted,
                },
                StatusCode::CONFLICT,
            ),
            (SessionError::GameFull, StatusCode::CONFLICT),
            (
                SessionError::CardNotInHand { card: "R5".into() },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (SessionError::DrawPileEmpty, StatusCode::CONFLICT),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }
}
