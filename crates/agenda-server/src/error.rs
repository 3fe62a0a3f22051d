use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

use agenda_gate::DenialKind;
use agenda_sdk::SdkError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("caller identity required")]
    Unauthenticated,

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Agenda(#[from] SdkError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated | Self::AuthFailed(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Agenda(e) => match e.denial() {
                Some(DenialKind::NotFound) => StatusCode::NOT_FOUND,
                Some(DenialKind::Forbidden) => StatusCode::FORBIDDEN,
                Some(DenialKind::Expired) => StatusCode::CONFLICT,
                Some(DenialKind::InvalidRange) => StatusCode::UNPROCESSABLE_ENTITY,
                None => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error class sent alongside the message.
    pub fn kind(&self) -> String {
        match self {
            Self::Unauthenticated | Self::AuthFailed(_) => "unauthenticated".into(),
            Self::BadRequest(_) => "bad_request".into(),
            Self::Agenda(e) => e
                .denial()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "internal".into()),
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => "internal".into(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(json!({ "error": self.to_string(), "kind": self.kind() }));
        (status, body).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
