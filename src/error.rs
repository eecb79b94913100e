use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("question or image is required")]
    MissingInput,

    #[error("message is required")]
    MessageRequired,

    #[error("user already exists")]
    UserExists,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("model request failed: {0}")]
    Upstream(String),

    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("account store error: {0}")]
    Store(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::MissingInput
            | GatewayError::MessageRequired
            | GatewayError::UserExists
            | GatewayError::InvalidCredentials => StatusCode::BAD_REQUEST,
            GatewayError::Upstream(_)
            | GatewayError::Transcription(_)
            | GatewayError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the client. Upstream detail stays in the
    /// server log and is never relayed verbatim.
    fn client_message(&self) -> &'static str {
        match self {
            GatewayError::MissingInput => "Question or image is required",
            GatewayError::MessageRequired => "Message is required",
            GatewayError::UserExists => "User already exists",
            GatewayError::InvalidCredentials => "Invalid Credentials",
            GatewayError::Upstream(_) => "Failed to get a response from the AI service",
            GatewayError::Transcription(_) => "Failed to process speech",
            GatewayError::Store(_) => "Server error",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        }
        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}
