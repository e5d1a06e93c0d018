// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Journal Hash Chain
//!
//! Every entry is named by the HMAC of its own encrypted content and the uid
//! of its predecessor:
//!
//! `uid = hex(HMAC(hmac_key, version, content || previous_uid))`
//!
//! `previous_uid` is the UTF-8 hex string of the predecessor (empty for the
//! first entry). Changing an entry's content or moving it to another position
//! changes the uid it must carry, so a tampered entry fails verification the
//! moment it is read.

pub mod journal;

use thiserror::Error;

use crate::crypto::{CryptoError, CryptoManager};

pub use journal::{open_metadata, seal_metadata, METADATA_HMAC_SIZE};

/// Chain error types.
#[derive(Error, Debug)]
pub enum ChainError {
    /// The stored uid does not match the content and position of the entry.
    #[error("Integrity check failed for {uid}: {reason}")]
    Integrity { uid: String, reason: String },

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

/// One encrypted, chain-linked journal entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    uid: String,
    content: Vec<u8>,
}

impl Entry {
    /// Wraps an entry as received from the server or the local cache.
    ///
    /// Nothing is checked here; use [`ChainCodec::verify`] before trusting it.
    pub fn new(uid: impl Into<String>, content: Vec<u8>) -> Self {
        Entry {
            uid: uid.into(),
            content,
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Encrypted content: `iv || ciphertext`.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn into_parts(self) -> (String, Vec<u8>) {
        (self.uid, self.content)
    }
}

/// Builds and verifies entries of one journal.
pub struct ChainCodec<'a> {
    crypto: &'a CryptoManager,
}

impl<'a> ChainCodec<'a> {
    pub fn new(crypto: &'a CryptoManager) -> Self {
        ChainCodec { crypto }
    }

    fn chain_message(content: &[u8], previous_uid: Option<&str>) -> Vec<u8> {
        let previous = previous_uid.unwrap_or_default().as_bytes();
        let mut message = Vec::with_capacity(content.len() + previous.len());
        message.extend_from_slice(content);
        message.extend_from_slice(previous);
        message
    }

    /// Computes the uid an entry with `content` must carry after `previous_uid`.
    pub fn compute_uid(&self, content: &[u8], previous_uid: Option<&str>) -> String {
        hex::encode(self.crypto.hmac(&Self::chain_message(content, previous_uid)))
    }

    /// Encrypts `plaintext` and links it after `previous_uid`.
    pub fn build(&self, previous_uid: Option<&str>, plaintext: &[u8]) -> Result<Entry, ChainError> {
        let content = self.crypto.encrypt(plaintext)?;
        let uid = self.compute_uid(&content, previous_uid);
        Ok(Entry { uid, content })
    }

    /// Checks that `entry` is the legitimate successor of `previous_uid`.
    ///
    /// Only lower-case hex uids are accepted: the uid string itself is the
    /// chain input of the next entry.
    pub fn verify(&self, entry: &Entry, previous_uid: Option<&str>) -> Result<(), ChainError> {
        let canonical = entry
            .uid
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        let tag = hex::decode(&entry.uid)
            .ok()
            .filter(|_| canonical)
            .ok_or_else(|| ChainError::Integrity {
                uid: entry.uid.clone(),
                reason: "uid is not a lower-case hex digest".to_string(),
            })?;

        self.crypto
            .verify_hmac(&Self::chain_message(&entry.content, previous_uid), &tag)
            .map_err(|_| ChainError::Integrity {
                uid: entry.uid.clone(),
                reason: match previous_uid {
                    Some(prev) => format!("does not chain from {}", prev),
                    None => "does not start the chain".to_string(),
                },
            })
    }

    /// Verifies `entry` and returns its decrypted content.
    pub fn open(&self, entry: &Entry, previous_uid: Option<&str>) -> Result<Vec<u8>, ChainError> {
        self.verify(entry, previous_uid)?;
        Ok(self.crypto.decrypt(&entry.content)?)
    }

    /// Verifies a contiguous run of entries starting after `start`.
    ///
    /// Returns the uid of the last entry, or `start` when `entries` is empty.
    pub fn verify_chain(
        &self,
        entries: &[Entry],
        start: Option<&str>,
    ) -> Result<Option<String>, ChainError> {
        let mut previous = start.map(str::to_string);
        for entry in entries {
            self.verify(entry, previous.as_deref())?;
            previous = Some(entry.uid.clone());
        }
        Ok(previous)
    }
}
