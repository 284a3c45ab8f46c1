// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from [`ShopdeskError`] to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use shopdesk_core::{ErrorCategory, ShopdeskError};

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Offending input field for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

/// Handler error wrapper so `?` works on inbox results.
#[derive(Debug)]
pub struct ApiError(pub ShopdeskError);

impl From<ShopdeskError> for ApiError {
    fn from(err: ShopdeskError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ShopdeskError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            ShopdeskError::NotFound { .. } => StatusCode::NOT_FOUND,
            ShopdeskError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ShopdeskError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ShopdeskError::Broadcast { .. }
            | ShopdeskError::Storage { .. }
            | ShopdeskError::Config(_)
            | ShopdeskError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.0.category() == ErrorCategory::Client {
            tracing::debug!(status = status.as_u16(), error = %self.0, "request rejected");
        } else {
            tracing::error!(status = status.as_u16(), error = %self.0, "request failed");
        }
        // Internal details stay in the log.
        let error = match self.0.category() {
            ErrorCategory::Client => self.0.to_string(),
            _ => "internal error".to_string(),
        };
        let field = match &self.0 {
            ShopdeskError::Validation { field, .. } => Some(*field),
            _ => None,
        };
        (status, Json(ErrorResponse { error, field })).into_response()
    }
}
