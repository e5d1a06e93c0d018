// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-memory resource store.

use std::collections::{BTreeMap, HashMap};

use super::{generate_uid, LocalId, LocalResource, LocalResourceStore, PushCommit, StoreError};

/// [`LocalResourceStore`] kept entirely in memory.
///
/// Besides the trait, it exposes the editing operations a host address book
/// or calendar would perform, so tests can stage local changes.
#[derive(Debug, Default)]
pub struct MemoryResourceStore {
    resources: BTreeMap<LocalId, LocalResource>,
    next_id: LocalId,
    cursor: Option<String>,
    groups: HashMap<String, Vec<String>>,
    fail_commit: bool,
}

impl MemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> LocalId {
        self.next_id += 1;
        self.next_id
    }

    fn get_mut(&mut self, local_id: LocalId) -> Result<&mut LocalResource, StoreError> {
        self.resources
            .get_mut(&local_id)
            .ok_or_else(|| StoreError::NotFound(format!("local id {}", local_id)))
    }

    /// Adds a resource created locally. It has no uid and is dirty.
    pub fn create_local(&mut self, content: &[u8]) -> LocalId {
        let local_id = self.allocate_id();
        self.resources.insert(
            local_id,
            LocalResource {
                local_id,
                uid: None,
                content: content.to_vec(),
                dirty: true,
                deleted: false,
                remote_marker: None,
            },
        );
        local_id
    }

    /// Adds a resource created locally with a known uid.
    pub fn create_local_with_uid(&mut self, uid: &str, content: &[u8]) -> LocalId {
        let local_id = self.create_local(content);
        if let Some(resource) = self.resources.get_mut(&local_id) {
            resource.uid = Some(uid.to_string());
        }
        local_id
    }

    /// Edits a resource locally and marks it dirty.
    pub fn update_local(&mut self, local_id: LocalId, content: &[u8]) -> Result<(), StoreError> {
        let resource = self.get_mut(local_id)?;
        resource.content = content.to_vec();
        resource.dirty = true;
        Ok(())
    }

    /// Flags a resource as deleted by the user.
    pub fn delete_local(&mut self, local_id: LocalId) -> Result<(), StoreError> {
        self.get_mut(local_id)?.deleted = true;
        Ok(())
    }

    pub fn get(&self, local_id: LocalId) -> Option<&LocalResource> {
        self.resources.get(&local_id)
    }

    /// All resources that are not flagged deleted.
    pub fn live(&self) -> Vec<&LocalResource> {
        self.resources.values().filter(|r| !r.deleted).collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn group_members(&self, group_uid: &str) -> Option<&[String]> {
        self.groups.get(group_uid).map(Vec::as_slice)
    }

    /// Makes the next [`commit_push`](LocalResourceStore::commit_push) fail
    /// without changing anything.
    pub fn fail_next_commit(&mut self) {
        self.fail_commit = true;
    }
}

impl LocalResourceStore for MemoryResourceStore {
    fn list_deleted(&self) -> Result<Vec<LocalResource>, StoreError> {
        Ok(self
            .resources
            .values()
            .filter(|r| r.deleted)
            .cloned()
            .collect())
    }

    fn list_dirty(&self) -> Result<Vec<LocalResource>, StoreError> {
        Ok(self
            .resources
            .values()
            .filter(|r| r.dirty && !r.deleted)
            .cloned()
            .collect())
    }

    fn get_by_uid(&self, uid: &str) -> Result<Option<LocalResource>, StoreError> {
        Ok(self
            .resources
            .values()
            .find(|r| r.uid.as_deref() == Some(uid))
            .cloned())
    }

    fn assign_uid_if_missing(&mut self, local_id: LocalId) -> Result<String, StoreError> {
        let resource = self.get_mut(local_id)?;
        Ok(resource.uid.get_or_insert_with(generate_uid).clone())
    }

    fn clear_dirty(&mut self, local_id: LocalId, remote_marker: &str) -> Result<(), StoreError> {
        let resource = self.get_mut(local_id)?;
        resource.dirty = false;
        resource.remote_marker = Some(remote_marker.to_string());
        Ok(())
    }

    fn delete(&mut self, local_id: LocalId) -> Result<(), StoreError> {
        self.resources.remove(&local_id);
        Ok(())
    }

    fn save_remote(
        &mut self,
        uid: &str,
        content: &[u8],
        remote_marker: &str,
    ) -> Result<(), StoreError> {
        let existing = self
            .resources
            .values_mut()
            .find(|r| r.uid.as_deref() == Some(uid));

        match existing {
            Some(resource) => {
                resource.content = content.to_vec();
                resource.dirty = false;
                resource.deleted = false;
                resource.remote_marker = Some(remote_marker.to_string());
            }
            None => {
                let local_id = self.allocate_id();
                self.resources.insert(
                    local_id,
                    LocalResource {
                        local_id,
                        uid: Some(uid.to_string()),
                        content: content.to_vec(),
                        dirty: false,
                        deleted: false,
                        remote_marker: Some(remote_marker.to_string()),
                    },
                );
            }
        }
        Ok(())
    }

    fn cursor(&self) -> Result<Option<String>, StoreError> {
        Ok(self.cursor.clone())
    }

    fn set_cursor(&mut self, uid: &str) -> Result<(), StoreError> {
        self.cursor = Some(uid.to_string());
        Ok(())
    }

    fn commit_push(&mut self, commit: &PushCommit) -> Result<(), StoreError> {
        if std::mem::take(&mut self.fail_commit) {
            return Err(StoreError::Backend("injected commit failure".to_string()));
        }

        // Validate first so a bad id leaves the store untouched.
        for (local_id, _) in &commit.cleared {
            if !self.resources.contains_key(local_id) {
                return Err(StoreError::NotFound(format!("local id {}", local_id)));
            }
        }

        for (local_id, marker) in &commit.cleared {
            if let Some(resource) = self.resources.get_mut(local_id) {
                resource.dirty = false;
                resource.remote_marker = Some(marker.clone());
            }
        }
        for local_id in &commit.purged {
            self.resources.remove(local_id);
        }
        self.cursor = Some(commit.cursor.clone());
        Ok(())
    }

    fn set_group_members(
        &mut self,
        group_uid: &str,
        member_uids: &[String],
    ) -> Result<(), StoreError> {
        self.groups
            .insert(group_uid.to_string(), member_uids.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deleted_is_not_listed_as_dirty() {
        let mut store = MemoryResourceStore::new();
        let id = store.create_local(b"a");
        store.delete_local(id).unwrap();

        assert!(store.list_dirty().unwrap().is_empty());
        assert_eq!(store.list_deleted().unwrap().len(), 1);
    }

    #[test]
    fn test_assign_uid_is_stable() {
        let mut store = MemoryResourceStore::new();
        let id = store.create_local(b"a");
        let first = store.assign_uid_if_missing(id).unwrap();
        let second = store.assign_uid_if_missing(id).unwrap();
        assert_eq!(first, second);
        assert!(store.get_by_uid(&first).unwrap().is_some());
    }

    #[test]
    fn test_failed_commit_changes_nothing() {
        let mut store = MemoryResourceStore::new();
        let id = store.create_local(b"a");
        store.fail_next_commit();

        let commit = PushCommit {
            cursor: "abc".into(),
            cleared: vec![(id, "abc".into())],
            purged: vec![],
        };
        assert!(store.commit_push(&commit).is_err());
        assert!(store.get(id).unwrap().dirty);
        assert_eq!(store.cursor().unwrap(), None);

        store.commit_push(&commit).unwrap();
        assert!(!store.get(id).unwrap().dirty);
        assert_eq!(store.cursor().unwrap().as_deref(), Some("abc"));
    }
}
