// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Shopdesk inbox.

use thiserror::Error;

/// The primary error type used across all Shopdesk adapter traits and core operations.
#[derive(Debug, Error)]
pub enum ShopdeskError {
    /// No resolved identity, or the identity lacks permission for the target.
    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// Referenced record does not exist or does not belong to the caller.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Malformed input, with the offending field.
    #[error("validation failed on `{field}`: {message}")]
    Validation { field: &'static str, message: String },

    /// Publish to the transport failed after the record was durably saved.
    #[error("broadcast to {channel} failed: {message}")]
    Broadcast { channel: String, message: String },

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification used by callers to decide how to surface an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The request itself was bad; retrying it unchanged will not help.
    Client,
    /// Something failed on our side; nothing was (partially) committed.
    Server,
    /// The write succeeded but real-time delivery may be delayed.
    Degraded,
}

impl ShopdeskError {
    /// Shorthand for a [`ShopdeskError::Unauthorized`].
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`ShopdeskError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for a [`ShopdeskError::Validation`].
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Wraps any error as a storage failure.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage {
            source: source.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized { .. } | Self::NotFound { .. } | Self::Validation { .. } => {
                ErrorCategory::Client
            }
            Self::Broadcast { .. } => ErrorCategory::Degraded,
            Self::Storage { .. }
            | Self::Config(_)
            | Self::Timeout { .. }
            | Self::Internal(_) => ErrorCategory::Server,
        }
    }
}
