// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! JSON wire envelopes.
//!
//! Binary payloads travel base64 encoded (standard alphabet, padded):
//! entries carry `iv || ciphertext`, journals `hmac || iv || ciphertext`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::client::RemoteJournal;
use super::error::RemoteError;
use crate::chain::Entry;
use crate::model::{Member, UserInfo};

fn decode_b64(field: &str, value: &str) -> Result<Vec<u8>, RemoteError> {
    STANDARD
        .decode(value)
        .map_err(|e| RemoteError::Malformed(format!("{}: {}", field, e)))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalJson {
    pub uid: String,
    pub version: u8,
    #[serde(default)]
    pub owner: String,
    pub content: String,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl From<&RemoteJournal> for JournalJson {
    fn from(journal: &RemoteJournal) -> Self {
        JournalJson {
            uid: journal.uid.clone(),
            version: journal.version,
            owner: journal.owner.clone(),
            content: STANDARD.encode(&journal.content),
            read_only: journal.read_only,
            key: journal.key.as_ref().map(|k| STANDARD.encode(k)),
        }
    }
}

impl TryFrom<JournalJson> for RemoteJournal {
    type Error = RemoteError;

    fn try_from(json: JournalJson) -> Result<Self, Self::Error> {
        Ok(RemoteJournal {
            content: decode_b64("journal.content", &json.content)?,
            key: json
                .key
                .as_deref()
                .map(|k| decode_b64("journal.key", k))
                .transpose()?,
            uid: json.uid,
            version: json.version,
            owner: json.owner,
            read_only: json.read_only,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryJson {
    pub uid: String,
    pub content: String,
}

impl From<&Entry> for EntryJson {
    fn from(entry: &Entry) -> Self {
        EntryJson {
            uid: entry.uid().to_string(),
            content: STANDARD.encode(entry.content()),
        }
    }
}

impl TryFrom<EntryJson> for Entry {
    type Error = RemoteError;

    fn try_from(json: EntryJson) -> Result<Self, Self::Error> {
        let content = decode_b64("entry.content", &json.content)?;
        Ok(Entry::new(json.uid, content))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberJson {
    pub user: String,
    pub key: String,
}

impl From<&Member> for MemberJson {
    fn from(member: &Member) -> Self {
        MemberJson {
            user: member.user.clone(),
            key: STANDARD.encode(&member.key),
        }
    }
}

impl TryFrom<MemberJson> for Member {
    type Error = RemoteError;

    fn try_from(json: MemberJson) -> Result<Self, Self::Error> {
        Ok(Member {
            key: decode_b64("member.key", &json.key)?,
            user: json.user,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfoJson {
    pub owner: String,
    pub version: u8,
    pub pubkey: String,
    pub content: String,
}

impl From<&UserInfo> for UserInfoJson {
    fn from(info: &UserInfo) -> Self {
        UserInfoJson {
            owner: info.owner.clone(),
            version: info.version,
            pubkey: STANDARD.encode(&info.public_key),
            content: STANDARD.encode(&info.content),
        }
    }
}

impl TryFrom<UserInfoJson> for UserInfo {
    type Error = RemoteError;

    fn try_from(json: UserInfoJson) -> Result<Self, Self::Error> {
        Ok(UserInfo {
            public_key: decode_b64("userInfo.pubkey", &json.pubkey)?,
            content: decode_b64("userInfo.content", &json.content)?,
            owner: json.owner,
            version: json.version,
        })
    }
}

/// Decodes a list of entries, failing on the first malformed one.
pub fn entries_from_json(items: Vec<EntryJson>) -> Result<Vec<Entry>, RemoteError> {
    items.into_iter().map(Entry::try_from).collect()
}
