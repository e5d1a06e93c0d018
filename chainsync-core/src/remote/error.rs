// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Remote error types.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Failures reported by a [`JournalClient`](super::JournalClient).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Connection, timeout or server-side hiccup; retry on the next sync.
    #[error("Transient network failure: {0}")]
    Transient(String),

    #[error("Service unavailable (retry after {retry_after:?})")]
    ServiceUnavailable { retry_after: Option<Duration> },

    #[error("Unauthorized: credentials rejected")]
    Unauthorized,

    #[error("User account is inactive")]
    UserInactive,

    /// The journal tail moved since the `last` uid the push was based on.
    #[error("Conflict: journal was modified concurrently")]
    Conflict,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(u16),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Error body returned by the server alongside 4xx statuses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// Server code marking a disabled account.
const USER_INACTIVE_CODE: &str = "user_inactive";

impl RemoteError {
    /// Maps a non-success HTTP status to an error.
    ///
    /// `retry_after` is the raw `Retry-After` header (delay in seconds), and
    /// `body` the response body, which may carry a JSON error code.
    pub fn from_status(status: u16, retry_after: Option<&str>, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

        match status {
            401 => RemoteError::Unauthorized,
            403 if parsed.code.as_deref() == Some(USER_INACTIVE_CODE) => RemoteError::UserInactive,
            404 => RemoteError::NotFound(parsed.detail.unwrap_or_else(|| "resource".to_string())),
            409 | 412 => RemoteError::Conflict,
            503 => RemoteError::ServiceUnavailable {
                retry_after: retry_after
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(Duration::from_secs),
            },
            500..=599 => RemoteError::Transient(format!("server error {}", status)),
            _ => RemoteError::Http(status),
        }
    }

    /// True when retrying later may succeed without user action.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RemoteError::Transient(_) | RemoteError::ServiceUnavailable { .. } | RemoteError::Conflict
        )
    }
}
