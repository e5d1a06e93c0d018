// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Local Resource Store
//!
//! The engine never touches a platform address book or calendar directly.
//! Everything it reads or writes goes through [`LocalResourceStore`], one
//! store per synchronized collection. The store also owns the collection's
//! sync cursor, so that advancing it and clearing the flags of pushed
//! resources can happen in one local transaction ([`LocalResourceStore::commit_push`]).

mod memory;

pub use memory::MemoryResourceStore;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque handle of a resource inside its store.
pub type LocalId = u64;

/// Store error types.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<crate::storage::StorageError> for StoreError {
    fn from(err: crate::storage::StorageError) -> Self {
        match err {
            crate::storage::StorageError::NotFound(what) => StoreError::NotFound(what),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// A contact, event or task as the local store holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalResource {
    pub local_id: LocalId,
    /// Stable identifier shared with the journal. Assigned lazily before the
    /// first upload.
    pub uid: Option<String>,
    /// Serialized record (vCard or iCalendar text).
    pub content: Vec<u8>,
    /// Modified locally since the last successful sync.
    pub dirty: bool,
    /// Deleted locally; takes precedence over `dirty`.
    pub deleted: bool,
    /// Uid of the journal entry this resource was last synced with. `None`
    /// means the resource has never been uploaded.
    pub remote_marker: Option<String>,
}

impl LocalResource {
    /// True once the resource has been seen by the journal.
    pub fn is_synced(&self) -> bool {
        self.remote_marker.is_some()
    }
}

/// Outcome of a successful push, committed atomically by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushCommit {
    /// Uid of the last pushed entry; the new cursor.
    pub cursor: String,
    /// Resources whose dirty flag is cleared, with the uid of the entry that
    /// carried them (their new remote marker).
    pub cleared: Vec<(LocalId, String)>,
    /// Deleted resources whose deletion reached the journal and can be purged.
    pub purged: Vec<LocalId>,
}

/// A push sent to the server whose local commit has not happened yet.
///
/// Saved before the entries leave the device. If the server took them but
/// the commit never ran, the next fetch meets them again and applies
/// `commit` instead of treating them as another device's changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InFlightPush {
    /// Uids of the pushed entries, in chain order.
    pub entry_uids: Vec<String>,
    pub commit: PushCommit,
    /// Content digest of every pushed change, by resource.
    pub digests: Vec<(LocalId, String)>,
}

impl InFlightPush {
    pub fn contains(&self, entry_uid: &str) -> bool {
        self.entry_uids.iter().any(|uid| uid == entry_uid)
    }

    pub fn is_last(&self, entry_uid: &str) -> bool {
        self.entry_uids.last().map(String::as_str) == Some(entry_uid)
    }

    pub fn digest_of(&self, local_id: LocalId) -> Option<&str> {
        self.digests
            .iter()
            .find(|(id, _)| *id == local_id)
            .map(|(_, digest)| digest.as_str())
    }
}

/// Access to one collection's local resources and its sync cursor.
pub trait LocalResourceStore {
    /// Resources deleted locally and not yet purged.
    fn list_deleted(&self) -> Result<Vec<LocalResource>, StoreError>;

    /// Resources modified locally, excluding deleted ones.
    fn list_dirty(&self) -> Result<Vec<LocalResource>, StoreError>;

    fn get_by_uid(&self, uid: &str) -> Result<Option<LocalResource>, StoreError>;

    /// Returns the resource uid, generating and storing one if it has none.
    fn assign_uid_if_missing(&mut self, local_id: LocalId) -> Result<String, StoreError>;

    /// Marks a resource as in sync with entry `remote_marker`.
    fn clear_dirty(&mut self, local_id: LocalId, remote_marker: &str) -> Result<(), StoreError>;

    /// Removes a resource for good.
    fn delete(&mut self, local_id: LocalId) -> Result<(), StoreError>;

    /// Serialized form of a resource as it is put into a journal entry.
    fn serialize(&self, resource: &LocalResource) -> Result<Vec<u8>, StoreError> {
        Ok(resource.content.clone())
    }

    /// Creates or replaces the resource `uid` with content received from the
    /// journal. The resource ends up clean with `remote_marker` as marker.
    fn save_remote(
        &mut self,
        uid: &str,
        content: &[u8],
        remote_marker: &str,
    ) -> Result<(), StoreError>;

    /// Uid of the last journal entry applied or pushed.
    fn cursor(&self) -> Result<Option<String>, StoreError>;

    fn set_cursor(&mut self, uid: &str) -> Result<(), StoreError>;

    /// Applies a push result in a single local transaction: the cursor moves,
    /// pushed resources are cleared and pushed deletions purged, or nothing
    /// changes at all.
    fn commit_push(&mut self, commit: &PushCommit) -> Result<(), StoreError>;

    /// Records the members of a contact group. Stores without group support
    /// ignore this.
    fn set_group_members(
        &mut self,
        _group_uid: &str,
        _member_uids: &[String],
    ) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Generates a fresh resource uid.
pub fn generate_uid() -> String {
    uuid::Uuid::new_v4().to_string()
}
