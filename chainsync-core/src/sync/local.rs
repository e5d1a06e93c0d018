// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Local change collection.
//!
//! Turns the store's dirty and deleted flags into the ordered list of changes
//! to push. Deletions of resources the journal never saw are purged right
//! away, without touching the network.

use ring::digest;
use tracing::debug;

use super::cancel::CancellationToken;
use super::error::SyncError;
use crate::adapters::ResourceAdapter;
use crate::model::SyncAction;
use crate::resource::{LocalId, LocalResourceStore};

/// One local change waiting to be pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChange {
    /// Store handle of the resource the change came from.
    pub local_id: LocalId,
    pub uid: String,
    pub action: SyncAction,
    /// Entry content (serialized record).
    pub content: String,
}

impl PendingChange {
    pub fn is_deletion(&self) -> bool {
        self.action == SyncAction::Delete
    }

    /// Hex SHA-256 of the action and content, to recognise the same change
    /// in a later run.
    pub fn digest(&self) -> String {
        let mut ctx = digest::Context::new(&digest::SHA256);
        ctx.update(self.action.to_string().as_bytes());
        ctx.update(b"\n");
        ctx.update(self.content.as_bytes());
        hex::encode(ctx.finish().as_ref())
    }
}

/// Result of collecting local changes.
#[derive(Debug, Default)]
pub struct LocalChanges {
    /// Deletions first, then additions and changes, each group by uid.
    pub pending: Vec<PendingChange>,
    /// Never-uploaded resources deleted without a network round trip.
    pub purged: usize,
}

/// `ADD` for resources the journal has never seen, `CHANGE` otherwise.
pub fn infer_action(has_remote_marker: bool) -> SyncAction {
    if has_remote_marker {
        SyncAction::Change
    } else {
        SyncAction::Add
    }
}

pub fn collect_local_changes(
    store: &mut dyn LocalResourceStore,
    adapter: &dyn ResourceAdapter,
    cancel: &CancellationToken,
) -> Result<LocalChanges, SyncError> {
    let mut changes = LocalChanges::default();
    let mut deletions = Vec::new();

    for resource in store.list_deleted()? {
        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        match (&resource.uid, resource.is_synced()) {
            (Some(uid), true) => {
                let content = store.serialize(&resource)?;
                deletions.push(PendingChange {
                    local_id: resource.local_id,
                    uid: uid.clone(),
                    action: SyncAction::Delete,
                    content: adapter.outgoing(uid, &content)?,
                });
            }
            _ => {
                debug!(local_id = resource.local_id, "purging never-uploaded deletion");
                store.delete(resource.local_id)?;
                changes.purged += 1;
            }
        }
    }

    let mut updates = Vec::new();
    for resource in store.list_dirty()? {
        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        let uid = store.assign_uid_if_missing(resource.local_id)?;
        let content = store.serialize(&resource)?;
        updates.push(PendingChange {
            local_id: resource.local_id,
            action: infer_action(resource.is_synced()),
            content: adapter.outgoing(&uid, &content)?,
            uid,
        });
    }

    deletions.sort_by(|a, b| a.uid.cmp(&b.uid));
    updates.sort_by(|a, b| a.uid.cmp(&b.uid));
    changes.pending = deletions;
    changes.pending.extend(updates);
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_action() {
        assert_eq!(infer_action(false), SyncAction::Add);
        assert_eq!(infer_action(true), SyncAction::Change);
    }

    #[test]
    fn test_digest_follows_action_and_content() {
        let change = PendingChange {
            local_id: 1,
            uid: "c1".to_string(),
            action: SyncAction::Add,
            content: "BEGIN:VCARD".to_string(),
        };
        let edited = PendingChange {
            content: "BEGIN:VCARD\r\nFN:Carol".to_string(),
            ..change.clone()
        };
        let deleted = PendingChange {
            action: SyncAction::Delete,
            ..change.clone()
        };

        assert_eq!(change.digest(), change.clone().digest());
        assert_eq!(change.digest().len(), 64);
        assert_ne!(change.digest(), edited.digest());
        assert_ne!(change.digest(), deleted.digest());
    }
}
