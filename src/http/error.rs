use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::domain::order::{ErrorKind, OrderError};

// ============================================================================
// API Error - the only place internal errors become HTTP responses
// ============================================================================
//
// Validation, not-found and conflict errors carry their message to the
// caller. Upstream and persistence faults are reported as a bare 500; the
// detail only goes to the logs.
//
// ============================================================================

const FAULT_MESSAGE: &str = "Check logs";

#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    code: StatusCode,
    status: u16,
    message: String,
}

impl ApiError {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            status: code.as_u16(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, FAULT_MESSAGE)
    }

    #[cfg(test)]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.message)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.code
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.code).json(self)
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err.kind() {
            ErrorKind::Validation => Self::bad_request(err.to_string()),
            ErrorKind::NotFound => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            ErrorKind::Conflict => Self::new(StatusCode::CONFLICT, err.to_string()),
            ErrorKind::Upstream | ErrorKind::Persistence => Self::internal(),
        }
    }
}
