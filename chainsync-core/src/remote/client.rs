// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Journal Client Trait
//!
//! Protocol contract between the engine and the journal server.
//!
//! # Synchronous Interface
//!
//! Like the rest of the core, this trait is blocking. Hosts that run an async
//! runtime call the engine from a blocking task.

use super::error::RemoteError;
use crate::chain::Entry;
use crate::model::{Member, UserInfo};

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// A journal as stored on the server: metadata still sealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteJournal {
    pub uid: String,
    pub version: u8,
    pub owner: String,
    /// Sealed collection metadata: `hmac || iv || ciphertext`.
    pub content: Vec<u8>,
    pub read_only: bool,
    /// Journal key wrapped for the requesting user, for shared journals.
    pub key: Option<Vec<u8>>,
}

/// Journal server operations consumed by the engine.
pub trait JournalClient {
    /// Lists every journal visible to the account, owned or shared.
    fn list_journals(&self) -> RemoteResult<Vec<RemoteJournal>>;

    fn create_journal(&self, journal: &RemoteJournal) -> RemoteResult<()>;

    fn update_journal(&self, journal: &RemoteJournal) -> RemoteResult<()>;

    fn delete_journal(&self, journal_uid: &str) -> RemoteResult<()>;

    /// Returns up to `limit` entries strictly after `last`, oldest first.
    ///
    /// `last = None` starts at the beginning. A batch shorter than `limit`
    /// means there is nothing more to fetch.
    fn list_entries(
        &self,
        journal_uid: &str,
        last: Option<&str>,
        limit: usize,
    ) -> RemoteResult<Vec<Entry>>;

    /// Appends `entries` iff the journal tail is still `last`.
    ///
    /// Fails with [`RemoteError::Conflict`] otherwise, without appending.
    fn push_entries(
        &self,
        journal_uid: &str,
        entries: &[Entry],
        last: Option<&str>,
    ) -> RemoteResult<()>;

    fn list_members(&self, journal_uid: &str) -> RemoteResult<Vec<Member>>;

    fn add_member(&self, journal_uid: &str, member: &Member) -> RemoteResult<()>;

    fn remove_member(&self, journal_uid: &str, user: &str) -> RemoteResult<()>;

    /// Fetches published key material for `owner`, if any.
    fn get_user_info(&self, owner: &str) -> RemoteResult<Option<UserInfo>>;

    fn put_user_info(&self, info: &UserInfo) -> RemoteResult<()>;
}
