// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Journal and collection metadata types.

use serde::{Deserialize, Serialize};

use crate::account::AccountCredentials;
use crate::crypto::{CryptoError, CryptoManager};

/// Default collection color (ARGB), used when none is set.
pub const DEFAULT_COLOR: i32 = -0x743cb6;

/// Kind of personal data a collection holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionType {
    #[serde(rename = "ADDRESS_BOOK")]
    Contacts,
    #[serde(rename = "CALENDAR")]
    Calendar,
    #[serde(rename = "TASKS")]
    Tasks,
}

impl CollectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionType::Contacts => "ADDRESS_BOOK",
            CollectionType::Calendar => "CALENDAR",
            CollectionType::Tasks => "TASKS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ADDRESS_BOOK" => Some(CollectionType::Contacts),
            "CALENDAR" => Some(CollectionType::Calendar),
            "TASKS" => Some(CollectionType::Tasks),
            _ => None,
        }
    }
}

/// Decrypted collection metadata carried inside a journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionInfo {
    #[serde(rename = "type")]
    pub col_type: CollectionType,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<i32>,
}

impl CollectionInfo {
    pub fn new(col_type: CollectionType, display_name: &str) -> Self {
        CollectionInfo {
            col_type,
            display_name: display_name.to_string(),
            description: None,
            color: None,
        }
    }

    pub fn color_or_default(&self) -> i32 {
        self.color.unwrap_or(DEFAULT_COLOR)
    }
}

/// One remote collection's change log, as known locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journal {
    pub uid: String,
    /// Encryption format version.
    pub version: u8,
    pub owner: String,
    pub info: CollectionInfo,
    pub read_only: bool,
    /// Whether the user selected this collection for sync.
    pub selected: bool,
    /// Soft-deleted: the server no longer lists the collection.
    pub deleted: bool,
    /// Journal key wrapped for this user, present when the journal was shared to us.
    pub encrypted_key: Option<Vec<u8>>,
}

impl Journal {
    /// Creates a journal record for a collection owned by `owner`.
    pub fn new(uid: &str, version: u8, owner: &str, info: CollectionInfo) -> Self {
        Journal {
            uid: uid.to_string(),
            version,
            owner: owner.to_string(),
            info,
            read_only: false,
            selected: true,
            deleted: false,
            encrypted_key: None,
        }
    }

    /// True when the journal key reached us through sharing.
    pub fn is_shared(&self) -> bool {
        self.encrypted_key.is_some()
    }

    /// Builds the crypto context for this journal.
    pub fn crypto(&self, credentials: &dyn AccountCredentials) -> Result<CryptoManager, CryptoError> {
        journal_crypto(
            &self.uid,
            self.version,
            self.encrypted_key.as_deref(),
            credentials,
        )
    }
}

/// Crypto context of journal `uid`.
///
/// Owned journals derive their key from the account key salted with the
/// journal uid; shared journals unwrap `encrypted_key` with the account key pair.
pub fn journal_crypto(
    uid: &str,
    version: u8,
    encrypted_key: Option<&[u8]>,
    credentials: &dyn AccountCredentials,
) -> Result<CryptoManager, CryptoError> {
    match encrypted_key {
        Some(wrapped) => {
            let key_pair = credentials.key_pair().ok_or_else(|| {
                CryptoError::Asymmetric(format!(
                    "journal {} is shared but no key pair is available",
                    uid
                ))
            })?;
            CryptoManager::from_wrapped_key(version, key_pair, wrapped)
        }
        None => CryptoManager::new(version, credentials.account_key(), uid),
    }
}
