// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Collection Management
//!
//! Keeps the local list of journals in step with the server, and handles
//! creating, renaming, deleting and sharing collections. Sharing wraps the
//! journal key under the member's published public key; the member's client
//! picks the journal up on its next [`CollectionManager::refresh`].

use std::collections::HashSet;

use ring::digest;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::account::AccountCredentials;
use crate::chain::{open_metadata, seal_metadata, ChainError};
use crate::crypto::{AsymmetricKeyPair, CryptoError, CryptoManager, CURRENT_VERSION};
use crate::model::{journal_crypto, CollectionInfo, Journal, Member, UserInfo};
use crate::remote::{JournalClient, RemoteError, RemoteJournal};
use crate::storage::{Storage, StorageError};
use crate::sync::SyncError;

/// Collection management errors.
#[derive(Error, Debug)]
pub enum CollectionError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("User {0} has not published a public key")]
    NoPublicKey(String),

    #[error("Only the owner can do this with journal {0}")]
    NotOwner(String),

    #[error("No key pair configured for this account")]
    NoKeyPair,
}

impl From<RemoteError> for CollectionError {
    fn from(err: RemoteError) -> Self {
        CollectionError::Sync(err.into())
    }
}

impl From<StorageError> for CollectionError {
    fn from(err: StorageError) -> Self {
        CollectionError::Sync(err.into())
    }
}

impl From<ChainError> for CollectionError {
    fn from(err: ChainError) -> Self {
        CollectionError::Sync(err.into())
    }
}

impl From<CryptoError> for CollectionError {
    fn from(err: CryptoError) -> Self {
        CollectionError::Sync(err.into())
    }
}

impl From<serde_json::Error> for CollectionError {
    fn from(err: serde_json::Error) -> Self {
        CollectionError::Sync(err.into())
    }
}

/// Counts from [`CollectionManager::refresh`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshSummary {
    pub added: usize,
    pub updated: usize,
    /// Journals no longer listed by the server, now soft-deleted.
    pub removed: usize,
    /// Listed journals that could not be opened, e.g. written by a newer
    /// client or with tampered metadata. Their local records are untouched.
    pub failed: Vec<(String, SyncError)>,
}

/// Generates a new journal uid: hex SHA-256 of a random UUID.
fn generate_journal_uid() -> String {
    let seed = uuid::Uuid::new_v4();
    hex::encode(digest::digest(&digest::SHA256, seed.as_bytes()).as_ref())
}

pub struct CollectionManager<'a> {
    storage: &'a Storage,
    client: &'a dyn JournalClient,
    credentials: &'a dyn AccountCredentials,
}

impl<'a> CollectionManager<'a> {
    pub fn new(
        storage: &'a Storage,
        client: &'a dyn JournalClient,
        credentials: &'a dyn AccountCredentials,
    ) -> Self {
        CollectionManager {
            storage,
            client,
            credentials,
        }
    }

    /// Reconciles local journal records with the server's list.
    ///
    /// New journals are stored selected for sync, existing ones keep their
    /// local selection, and journals the server no longer lists are
    /// soft-deleted. A journal that fails to open is reported in
    /// [`RefreshSummary::failed`] and does not stop the others.
    pub fn refresh(&self) -> Result<RefreshSummary, CollectionError> {
        let remote = self.client.list_journals()?;
        let mut summary = RefreshSummary::default();
        let mut seen = HashSet::new();

        for remote_journal in remote {
            let uid = remote_journal.uid.clone();
            seen.insert(uid.clone());
            let existing = self.storage.load_journal(&uid)?;
            let mut journal = match self.open_remote(remote_journal) {
                Ok(journal) => journal,
                Err(CollectionError::Sync(error)) => {
                    warn!(journal = %uid, error = %error, "journal could not be opened");
                    summary.failed.push((uid, error));
                    continue;
                }
                Err(e) => return Err(e),
            };

            match existing {
                Some(local) => {
                    journal.selected = local.selected;
                    if journal != local {
                        summary.updated += 1;
                    }
                }
                None => summary.added += 1,
            }
            self.storage.save_journal(&journal)?;
        }

        for local in self.storage.list_journals(false)? {
            if !seen.contains(&local.uid) {
                debug!(journal = %local.uid, "journal no longer on server");
                self.storage.mark_journal_deleted(&local.uid)?;
                summary.removed += 1;
            }
        }

        info!(
            added = summary.added,
            updated = summary.updated,
            removed = summary.removed,
            failed = summary.failed.len(),
            "collections refreshed"
        );
        Ok(summary)
    }

    /// Stores one journal as the server lists it, e.g. one just shared with
    /// this account, keeping the local selection if it is already known.
    pub fn accept(&self, remote: RemoteJournal) -> Result<Journal, CollectionError> {
        let existing = self.storage.load_journal(&remote.uid)?;
        let mut journal = self.open_remote(remote)?;
        if let Some(local) = existing {
            journal.selected = local.selected;
        }
        self.storage.save_journal(&journal)?;
        Ok(journal)
    }

    /// Decodes a listed journal into a local record, verifying its metadata.
    fn open_remote(&self, remote: RemoteJournal) -> Result<Journal, CollectionError> {
        let crypto = journal_crypto(
            &remote.uid,
            remote.version,
            remote.key.as_deref(),
            self.credentials,
        )?;
        let plaintext = open_metadata(&crypto, &remote.uid, &remote.content)?;
        let info: CollectionInfo = serde_json::from_slice(&plaintext)?;

        Ok(Journal {
            uid: remote.uid,
            version: remote.version,
            owner: remote.owner,
            info,
            read_only: remote.read_only,
            selected: true,
            deleted: false,
            encrypted_key: remote.key,
        })
    }

    fn seal(&self, journal: &Journal, crypto: &CryptoManager) -> Result<RemoteJournal, CollectionError> {
        let info = serde_json::to_vec(&journal.info)?;
        Ok(RemoteJournal {
            uid: journal.uid.clone(),
            version: journal.version,
            owner: journal.owner.clone(),
            content: seal_metadata(crypto, &journal.uid, &info)?,
            read_only: journal.read_only,
            key: None,
        })
    }

    fn load_owned(&self, journal_uid: &str) -> Result<Journal, CollectionError> {
        let journal = self
            .storage
            .load_journal(journal_uid)?
            .ok_or_else(|| SyncError::JournalNotFound(journal_uid.to_string()))?;
        if journal.owner != self.credentials.username() || journal.is_shared() {
            return Err(CollectionError::NotOwner(journal_uid.to_string()));
        }
        Ok(journal)
    }

    /// Creates a new collection owned by this account.
    pub fn create(&self, info: CollectionInfo) -> Result<Journal, CollectionError> {
        let uid = generate_journal_uid();
        let journal = Journal::new(&uid, CURRENT_VERSION, self.credentials.username(), info);
        let crypto = journal.crypto(self.credentials)?;

        self.client.create_journal(&self.seal(&journal, &crypto)?)?;
        self.storage.save_journal(&journal)?;
        info!(journal = %uid, kind = journal.info.col_type.as_str(), "collection created");
        Ok(journal)
    }

    /// Replaces the metadata of an owned collection.
    pub fn update(&self, journal_uid: &str, info: CollectionInfo) -> Result<Journal, CollectionError> {
        let mut journal = self.load_owned(journal_uid)?;
        journal.info = info;
        let crypto = journal.crypto(self.credentials)?;

        self.client.update_journal(&self.seal(&journal, &crypto)?)?;
        self.storage.save_journal(&journal)?;
        Ok(journal)
    }

    /// Deletes an owned collection on the server and drops all local data.
    pub fn delete(&self, journal_uid: &str) -> Result<(), CollectionError> {
        self.load_owned(journal_uid)?;
        self.client.delete_journal(journal_uid)?;
        self.storage.purge_journal(journal_uid)?;
        info!(journal = %journal_uid, "collection deleted");
        Ok(())
    }

    pub fn set_selected(&self, journal_uid: &str, selected: bool) -> Result<(), CollectionError> {
        self.storage.set_journal_selected(journal_uid, selected)?;
        Ok(())
    }

    /// Journals known locally, excluding soft-deleted ones.
    pub fn list(&self) -> Result<Vec<Journal>, CollectionError> {
        Ok(self.storage.list_journals(false)?)
    }

    /// Publishes this account's key pair so others can share with it.
    pub fn publish_user_info(&self, key_pair: &AsymmetricKeyPair) -> Result<UserInfo, CollectionError> {
        let info = UserInfo::create(
            self.credentials.username(),
            self.credentials.account_key(),
            key_pair,
        )?;
        self.client.put_user_info(&info)?;
        Ok(info)
    }

    /// Recovers this account's key pair from the server, if published.
    pub fn fetch_key_pair(&self) -> Result<Option<AsymmetricKeyPair>, CollectionError> {
        match self.client.get_user_info(self.credentials.username())? {
            Some(info) => Ok(Some(info.key_pair(self.credentials.account_key())?)),
            None => Ok(None),
        }
    }

    /// Shares an owned collection with `user`.
    ///
    /// Returns the fingerprint of the key the journal key was wrapped for, to
    /// be compared with the one the member sees.
    pub fn share(&self, journal_uid: &str, user: &str) -> Result<String, CollectionError> {
        let journal = self.load_owned(journal_uid)?;
        let info = self
            .client
            .get_user_info(user)?
            .ok_or_else(|| CollectionError::NoPublicKey(user.to_string()))?;
        let public_key = info.public_key()?;

        let crypto = journal.crypto(self.credentials)?;
        let member = Member {
            user: user.to_string(),
            key: crypto.wrap_for(&public_key)?,
        };
        self.client.add_member(journal_uid, &member)?;

        info!(journal = %journal_uid, member = %user, "collection shared");
        Ok(public_key.fingerprint())
    }

    pub fn unshare(&self, journal_uid: &str, user: &str) -> Result<(), CollectionError> {
        self.load_owned(journal_uid)?;
        self.client.remove_member(journal_uid, user)?;
        Ok(())
    }

    pub fn members(&self, journal_uid: &str) -> Result<Vec<Member>, CollectionError> {
        Ok(self.client.list_members(journal_uid)?)
    }

    /// Fingerprint of this account's own public key.
    pub fn own_fingerprint(&self) -> Result<String, CollectionError> {
        match self.credentials.key_pair() {
            Some(key_pair) => Ok(key_pair.public_key().fingerprint()),
            None => {
                warn!("fingerprint requested without a key pair");
                Err(CollectionError::NoKeyPair)
            }
        }
    }
}
