// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Journal, entry payload and user key types.

pub mod journal;
pub mod sync_entry;
pub mod user_info;

pub use journal::{journal_crypto, CollectionInfo, CollectionType, Journal, DEFAULT_COLOR};
pub use sync_entry::{SyncAction, SyncEntry};
pub use user_info::UserInfo;

/// A user holding a wrapped copy of a journal key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user: String,
    /// Journal key wrapped under the member's public key.
    pub key: Vec<u8>,
}
