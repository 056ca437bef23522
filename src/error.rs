use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

/// Domain failures raised by the client service and store.
///
/// Every variant maps to exactly one HTTP status at the boundary; handlers
/// return these directly and axum renders the `{success, message}` envelope.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    AlreadyExists(String),
    #[error("{0}")]
    NotFound(String),
    #[error("invalid credentials")]
    InvalidCredential,
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<sqlx::Error> for ClientError {
    fn from(e: sqlx::Error) -> Self {
        Self::Unexpected(e.into())
    }
}

impl IntoResponse for ClientError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::AlreadyExists(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::InvalidCredential => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            Self::Unexpected(e) => {
                // Internal causes are logged, never echoed to the caller.
                error!(error = %e, "unexpected failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        (
            status,
            Json(serde_json::json!({ "success": false, "message": message })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_kind_maps_to_a_fixed_status() {
        let cases = [
            (
                ClientError::Validation("bad input".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ClientError::AlreadyExists("taken".into()),
                StatusCode::CONFLICT,
            ),
            (
                ClientError::NotFound("missing".into()),
                StatusCode::NOT_FOUND,
            ),
            (ClientError::InvalidCredential, StatusCode::UNAUTHORIZED),
            (
                ClientError::Unexpected(anyhow::anyhow!("db down")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn unexpected_does_not_leak_the_cause() {
        let err = ClientError::Unexpected(anyhow::anyhow!("connection refused on 10.0.0.3"));
        assert!(!err.to_string().is_empty());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
