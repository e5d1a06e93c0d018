// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Resource Adapters
//!
//! The sync engine is generic over the kind of collection it synchronizes.
//! A [`ResourceAdapter`] turns the text carried by a journal entry into a
//! [`Record`], applies it to the local store, and turns local resources back
//! into entry content.
//!
//! - `contacts`: vCard records, contact groups
//! - `calendar`: iCalendar records holding a VEVENT (events) or VTODO (tasks)

mod calendar;
mod contacts;
pub mod text;

pub use calendar::{CalendarAdapter, ICalendar};
pub use contacts::{ContactsAdapter, VCard};

use thiserror::Error;
use tracing::debug;

use crate::model::{CollectionType, SyncAction};
use crate::resource::{LocalResourceStore, StoreError};

/// Adapter error types.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Record has no UID")]
    MissingUid,

    #[error("Expected {expected} record, got {found}")]
    WrongKind {
        expected: &'static str,
        found: String,
    },

    #[error("Local store error: {0}")]
    Store(#[from] StoreError),
}

/// A decoded entry payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Contact(VCard),
    Calendar(ICalendar),
}

impl Record {
    pub fn uid(&self) -> Option<String> {
        match self {
            Record::Contact(card) => card.uid(),
            Record::Calendar(cal) => cal.uid(),
        }
    }

    pub fn set_uid(&mut self, uid: &str) {
        match self {
            Record::Contact(card) => card.set_uid(uid),
            Record::Calendar(cal) => cal.set_uid(uid),
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            Record::Contact(card) => card.to_text(),
            Record::Calendar(cal) => cal.to_text(),
        }
    }
}

/// What applying a remote record did to the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Created,
    Updated,
    Deleted,
    /// Left alone: the local copy has unsynced changes, or a deletion
    /// targeted a resource that does not exist.
    Skipped,
}

/// Collection-specific behavior plugged into the sync engine.
pub trait ResourceAdapter {
    fn kind(&self) -> CollectionType;

    /// Parses entry content.
    fn decode(&self, content: &str) -> Result<Record, AdapterError>;

    fn encode(&self, record: &Record) -> Result<String, AdapterError> {
        Ok(record.to_text())
    }

    /// Entry content for a local resource: the stored text with its UID
    /// forced to `uid`.
    fn outgoing(&self, uid: &str, content: &[u8]) -> Result<String, AdapterError> {
        let text = std::str::from_utf8(content)
            .map_err(|e| AdapterError::Parse(format!("resource is not UTF-8: {}", e)))?;
        let mut record = self.decode(text)?;
        if record.uid().as_deref() != Some(uid) {
            record.set_uid(uid);
        }
        self.encode(&record)
    }

    /// Applies one remote change to the store.
    fn apply(
        &mut self,
        store: &mut dyn LocalResourceStore,
        action: SyncAction,
        record: &Record,
        entry_uid: &str,
    ) -> Result<Applied, AdapterError> {
        let content = self.encode(record)?;
        apply_record(store, action, record, &content, entry_uid)
    }

    /// Runs once after all remote entries of a sync have been applied.
    fn post_process(&mut self, _store: &mut dyn LocalResourceStore) -> Result<(), AdapterError> {
        Ok(())
    }
}

/// Store update shared by every adapter.
///
/// Additions and changes are upserts; deletions of absent resources are
/// no-ops. Resources with unsynced local edits are not overwritten: the local
/// version is pushed on top of the remote one later in the same sync.
pub fn apply_record(
    store: &mut dyn LocalResourceStore,
    action: SyncAction,
    record: &Record,
    content: &str,
    entry_uid: &str,
) -> Result<Applied, AdapterError> {
    let uid = record.uid().ok_or(AdapterError::MissingUid)?;
    let existing = store.get_by_uid(&uid)?;

    match (action, existing) {
        (SyncAction::Delete, None) => Ok(Applied::Skipped),
        (SyncAction::Delete, Some(local)) if local.dirty && !local.deleted => {
            debug!(uid = %uid, "remote delete ignored, local copy modified");
            Ok(Applied::Skipped)
        }
        (SyncAction::Delete, Some(local)) => {
            store.delete(local.local_id)?;
            Ok(Applied::Deleted)
        }
        (_, Some(local)) if local.dirty || local.deleted => {
            debug!(uid = %uid, "remote change ignored, local copy modified");
            Ok(Applied::Skipped)
        }
        (_, existing) => {
            store.save_remote(&uid, content.as_bytes(), entry_uid)?;
            Ok(match existing {
                Some(_) => Applied::Updated,
                None => Applied::Created,
            })
        }
    }
}

/// Returns the adapter for a collection type.
pub fn adapter_for(kind: CollectionType) -> Box<dyn ResourceAdapter> {
    match kind {
        CollectionType::Contacts => Box::new(ContactsAdapter::new()),
        CollectionType::Calendar | CollectionType::Tasks => Box::new(CalendarAdapter::new(kind)),
    }
}
