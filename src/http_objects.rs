use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, info};

/// Body sent with every 500; the cause is only logged.
pub const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong";

#[derive(Debug)]
pub struct ApiError {
    status_code: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status_code: StatusCode, message: &str) -> Self {
        Self {
            status_code,
            message: message.to_string(),
        }
    }

    /// Logs `e` and hides it from the client.
    pub fn internal_error(e: anyhow::Error) -> Self {
        error!("internal error: {:#}", e);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
    }

    pub fn not_found(message: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // server errors were logged with their cause in `internal_error`
        if !self.status_code.is_server_error() {
            info!("API Error: {} - {}", self.status_code, self.message);
        }
        (self.status_code, self.message).into_response()
    }
}
