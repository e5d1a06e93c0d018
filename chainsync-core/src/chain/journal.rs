// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Journal metadata sealing.
//!
//! Collection metadata uses the same HMAC primitive as entries but is anchored
//! to the journal's own uid and stores the tag explicitly:
//! `hmac (32 bytes) || iv || ciphertext`.

use super::ChainError;
use crate::crypto::CryptoManager;

/// Size of the HMAC prefix on sealed metadata.
pub const METADATA_HMAC_SIZE: usize = 32;

fn metadata_message(content: &[u8], journal_uid: &str) -> Vec<u8> {
    let mut message = Vec::with_capacity(content.len() + journal_uid.len());
    message.extend_from_slice(content);
    message.extend_from_slice(journal_uid.as_bytes());
    message
}

/// Encrypts collection metadata for `journal_uid`.
pub fn seal_metadata(
    crypto: &CryptoManager,
    journal_uid: &str,
    plaintext: &[u8],
) -> Result<Vec<u8>, ChainError> {
    let content = crypto.encrypt(plaintext)?;
    let tag = crypto.hmac(&metadata_message(&content, journal_uid));

    let mut sealed = Vec::with_capacity(METADATA_HMAC_SIZE + content.len());
    sealed.extend_from_slice(&tag);
    sealed.extend_from_slice(&content);
    Ok(sealed)
}

/// Verifies and decrypts sealed collection metadata.
pub fn open_metadata(
    crypto: &CryptoManager,
    journal_uid: &str,
    sealed: &[u8],
) -> Result<Vec<u8>, ChainError> {
    if sealed.len() < METADATA_HMAC_SIZE {
        return Err(ChainError::Integrity {
            uid: journal_uid.to_string(),
            reason: "metadata shorter than its HMAC".to_string(),
        });
    }

    let (tag, content) = sealed.split_at(METADATA_HMAC_SIZE);
    crypto
        .verify_hmac(&metadata_message(content, journal_uid), tag)
        .map_err(|_| ChainError::Integrity {
            uid: journal_uid.to_string(),
            reason: "metadata HMAC mismatch".to_string(),
        })?;

    Ok(crypto.decrypt(content)?)
}
