// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Per-journal crypto context.

use zeroize::Zeroizing;

use super::asymmetric::{AsymmetricKeyPair, PublicKey};
use super::cipher::{self, SymmetricKey};
use super::error::CryptoError;
use super::kdf;

/// Holds the sub-keys for one journal at one format version.
///
/// Built either from account key material (owned journals) or from a key
/// that was wrapped for this user by the journal owner (shared journals).
pub struct CryptoManager {
    version: u8,
    derived: Zeroizing<Vec<u8>>,
    cipher_key: SymmetricKey,
    hmac_key: SymmetricKey,
}

impl std::fmt::Debug for CryptoManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoManager")
            .field("version", &self.version)
            .field("keys", &"[REDACTED]")
            .finish()
    }
}

impl CryptoManager {
    /// Derives the journal key from account key material, salted with the journal uid.
    pub fn new(version: u8, account_key: &[u8], salt: &str) -> Result<Self, CryptoError> {
        let derived = kdf::derive_key(version, account_key, salt.as_bytes())?;
        Ok(Self::from_derived(version, derived))
    }

    /// Uses an already-derived journal key, e.g. one received through sharing.
    pub fn from_raw_key(version: u8, derived: Vec<u8>) -> Result<Self, CryptoError> {
        kdf::check_version(version)?;
        Ok(Self::from_derived(version, Zeroizing::new(derived)))
    }

    /// Unwraps a journal key shared with `key_pair` and builds the context.
    pub fn from_wrapped_key(
        version: u8,
        key_pair: &AsymmetricKeyPair,
        wrapped: &[u8],
    ) -> Result<Self, CryptoError> {
        let derived = key_pair.unwrap_key(wrapped)?;
        Self::from_raw_key(version, derived.to_vec())
    }

    fn from_derived(version: u8, derived: Zeroizing<Vec<u8>>) -> Self {
        let (cipher_key, hmac_key) = kdf::split_key(&derived);
        CryptoManager {
            version,
            derived,
            cipher_key,
            hmac_key,
        }
    }

    /// Format version this context encrypts and authenticates for.
    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        cipher::encrypt(&self.cipher_key, plaintext)
    }

    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        cipher::decrypt(&self.cipher_key, data)
    }

    pub fn hmac(&self, data: &[u8]) -> [u8; 32] {
        kdf::hmac(&self.hmac_key, self.version, data)
    }

    pub fn verify_hmac(&self, data: &[u8], tag: &[u8]) -> Result<(), CryptoError> {
        kdf::verify_hmac(&self.hmac_key, self.version, data, tag)
    }

    /// Wraps the journal key for another member.
    pub fn wrap_for(&self, recipient: &PublicKey) -> Result<Vec<u8>, CryptoError> {
        recipient.wrap_key(&self.derived)
    }
}
