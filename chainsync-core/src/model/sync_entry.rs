// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Decrypted journal entry payload.

use serde::{Deserialize, Serialize};

/// What an entry does to the resource it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SyncAction {
    Add,
    Change,
    Delete,
}

impl std::fmt::Display for SyncAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyncAction::Add => "ADD",
            SyncAction::Change => "CHANGE",
            SyncAction::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// Action plus the serialized resource (vCard, iCalendar, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEntry {
    pub action: SyncAction,
    pub content: String,
}

impl SyncEntry {
    pub fn new(action: SyncAction, content: impl Into<String>) -> Self {
        SyncEntry {
            action,
            content: content.into(),
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_json(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}
