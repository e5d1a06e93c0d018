// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Journal Key Derivation and HMAC
//!
//! The journal key is derived from the account key material and the journal
//! uid (the salt). It is never used directly: it is split into a cipher
//! sub-key and an authentication sub-key.
//!
//! - version 1: `derived = password`
//! - version 2+: `derived = HMAC-SHA256(key = salt, msg = password)`
//! - `cipher_key = HMAC-SHA256(key = derived, msg = "aes")`
//! - `hmac_key = HMAC-SHA256(key = derived, msg = "hmac")`

use ring::hmac;
use zeroize::Zeroizing;

use super::cipher::SymmetricKey;
use super::error::CryptoError;

/// Version written by this client.
pub const CURRENT_VERSION: u8 = 2;
/// Oldest version this client can read.
pub const MIN_VERSION: u8 = 1;

/// Sub-key label for the AES key.
const CIPHER_KEY_LABEL: &[u8] = b"aes";
/// Sub-key label for the HMAC key.
const HMAC_KEY_LABEL: &[u8] = b"hmac";

/// Checks that `version` can be handled by this client.
pub fn check_version(version: u8) -> Result<(), CryptoError> {
    if version > CURRENT_VERSION {
        return Err(CryptoError::VersionTooNew {
            version,
            max: CURRENT_VERSION,
        });
    }
    if version < MIN_VERSION {
        return Err(CryptoError::UnsupportedVersion(version));
    }
    Ok(())
}

/// HMAC-SHA256 of `data` under `key`.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key);
    let tag = hmac::sign(&key, data);
    let mut out = [0u8; 32];
    out.copy_from_slice(tag.as_ref());
    out
}

/// Derives the journal key for `version` from account key material and a salt.
pub fn derive_key(
    version: u8,
    password: &[u8],
    salt: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    check_version(version)?;

    if version == 1 {
        return Ok(Zeroizing::new(password.to_vec()));
    }

    Ok(Zeroizing::new(hmac_sha256(salt, password).to_vec()))
}

/// Splits a derived key into `(cipher_key, hmac_key)`.
pub fn split_key(derived: &[u8]) -> (SymmetricKey, SymmetricKey) {
    let cipher_key = SymmetricKey::from_bytes(hmac_sha256(derived, CIPHER_KEY_LABEL));
    let hmac_key = SymmetricKey::from_bytes(hmac_sha256(derived, HMAC_KEY_LABEL));
    (cipher_key, hmac_key)
}

/// Builds the message authenticated for `version`.
///
/// From version 2 on, the version byte is bound into the tag so an entry
/// cannot be replayed under a different format version.
fn versioned_message(version: u8, data: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(data.len() + 1);
    message.extend_from_slice(data);
    if version >= 2 {
        message.push(version);
    }
    message
}

/// Computes the versioned HMAC of `data`.
pub fn hmac(key: &SymmetricKey, version: u8, data: &[u8]) -> [u8; 32] {
    hmac_sha256(key.as_bytes(), &versioned_message(version, data))
}

/// Verifies a versioned HMAC tag in constant time.
pub fn verify_hmac(
    key: &SymmetricKey,
    version: u8,
    data: &[u8],
    tag: &[u8],
) -> Result<(), CryptoError> {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key.as_bytes());
    hmac::verify(&key, &versioned_message(version, data), tag)
        .map_err(|_| CryptoError::HmacMismatch)
}

// INLINE_TEST_REQUIRED: Tests private versioned_message helper
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_one_message_is_unchanged() {
        assert_eq!(versioned_message(1, b"abc"), b"abc".to_vec());
    }

    #[test]
    fn test_version_two_appends_version_byte() {
        assert_eq!(versioned_message(2, b"abc"), vec![b'a', b'b', b'c', 2]);
    }

    #[test]
    fn test_hmac_sha256_rfc4231_case_2() {
        let tag = hmac_sha256(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            hex::encode(tag),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }
}
