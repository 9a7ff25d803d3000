// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Helpline chat client.

use thiserror::Error;

/// The primary error type used across all Helpline adapter traits and store operations.
#[derive(Debug, Error)]
pub enum HelplineError {
    /// Configuration errors (invalid TOML, bad URL, missing values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Input rejected before any network activity (blank message, bad id).
    #[error("validation error: {0}")]
    Validation(String),

    /// The backend rejected the bearer token (HTTP 401), or no token is held.
    #[error("unauthorized: {detail}")]
    Unauthorized { detail: String },

    /// The backend answered with a non-success status and an error envelope.
    #[error("api error ({status}): {detail}")]
    Api {
        status: u16,
        detail: String,
        code: Option<String>,
        request_id: Option<String>,
    },

    /// HTTP-level failure (connection refused, TLS, body read).
    #[error("http error: {message}")]
    Http {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Streaming connection failure (handshake, read, unexpected close).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A payload could not be decoded into the expected shape.
    #[error("decode error: {message}")]
    Decode {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Durable token storage failed.
    #[error("storage error: {message}")]
    Storage {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HelplineError {
    /// Returns true when the failure means the held credential is no longer valid.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, HelplineError::Unauthorized { .. })
    }
}
