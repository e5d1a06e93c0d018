// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync error taxonomy.

use std::time::Duration;

use thiserror::Error;

use crate::adapters::AdapterError;
use crate::chain::ChainError;
use crate::crypto::CryptoError;
use crate::remote::RemoteError;
use crate::resource::StoreError;
use crate::storage::StorageError;

/// Every way a sync can fail.
///
/// Hosts match on this exhaustively, usually through [`SyncError::recovery`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Network error: {0}")]
    TransientNetwork(String),

    #[error("Service unavailable (retry after {retry_after:?})")]
    ServiceUnavailable { retry_after: Option<Duration> },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("User account is inactive")]
    UserInactive,

    /// The journal was tampered with, reordered or corrupted.
    #[error("Integrity check failed for entry {uid}: {reason}")]
    Integrity { uid: String, reason: String },

    #[error("Journal version {version} is newer than supported version {max}")]
    VersionTooNew { version: u8, max: u8 },

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Local storage error: {0}")]
    LocalStorage(String),

    /// The journal kept moving while pushing and retries ran out.
    #[error("Journal changed concurrently")]
    Conflict,

    #[error("Malformed data: {0}")]
    Malformed(String),

    /// The server refused the request with a status no retry will change.
    #[error("Request rejected with HTTP status {0}")]
    Rejected(u16),

    #[error("Journal not found: {0}")]
    JournalNotFound(String),

    #[error("Sync cancelled")]
    Cancelled,
}

/// What the host should do about a failed sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Try again on the next scheduled sync.
    RetryLater,
    /// Wait at least this long before the next attempt.
    RetryAfter(Duration),
    /// Credentials were rejected; ask the user to log in again.
    Reauthenticate,
    AccountInactive,
    /// The server can no longer be trusted for this journal; ask the user
    /// before resetting local state.
    ResetTrust,
    UpgradeClient,
    /// The collection list is stale; refresh it.
    RefreshCollections,
    /// Unexpected data; report it.
    ReportError,
}

impl SyncError {
    pub fn recovery(&self) -> Recovery {
        match self {
            SyncError::TransientNetwork(_) | SyncError::Conflict | SyncError::Cancelled => {
                Recovery::RetryLater
            }
            SyncError::ServiceUnavailable { retry_after } => match retry_after {
                Some(delay) => Recovery::RetryAfter(*delay),
                None => Recovery::RetryLater,
            },
            SyncError::Unauthorized => Recovery::Reauthenticate,
            SyncError::UserInactive => Recovery::AccountInactive,
            SyncError::Integrity { .. } | SyncError::Crypto(_) => Recovery::ResetTrust,
            SyncError::VersionTooNew { .. } => Recovery::UpgradeClient,
            SyncError::LocalStorage(_) | SyncError::Malformed(_) | SyncError::Rejected(_) => {
                Recovery::ReportError
            }
            SyncError::JournalNotFound(_) => Recovery::RefreshCollections,
        }
    }

    /// True for failures that a plain retry can fix.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.recovery(),
            Recovery::RetryLater | Recovery::RetryAfter(_)
        )
    }
}

impl From<RemoteError> for SyncError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Transient(msg) => SyncError::TransientNetwork(msg),
            RemoteError::ServiceUnavailable { retry_after } => {
                SyncError::ServiceUnavailable { retry_after }
            }
            RemoteError::Unauthorized => SyncError::Unauthorized,
            RemoteError::UserInactive => SyncError::UserInactive,
            RemoteError::Conflict => SyncError::Conflict,
            RemoteError::NotFound(what) => SyncError::JournalNotFound(what),
            RemoteError::Http(status) => SyncError::Rejected(status),
            RemoteError::Malformed(msg) => SyncError::Malformed(msg),
        }
    }
}

impl From<CryptoError> for SyncError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::VersionTooNew { version, max } => SyncError::VersionTooNew { version, max },
            other => SyncError::Crypto(other.to_string()),
        }
    }
}

impl From<ChainError> for SyncError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::Integrity { uid, reason } => SyncError::Integrity { uid, reason },
            ChainError::Crypto(e) => e.into(),
        }
    }
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        SyncError::LocalStorage(err.to_string())
    }
}

impl From<StorageError> for SyncError {
    fn from(err: StorageError) -> Self {
        SyncError::LocalStorage(err.to_string())
    }
}

impl From<AdapterError> for SyncError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::Store(e) => e.into(),
            other => SyncError::Malformed(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Malformed(err.to_string())
    }
}
