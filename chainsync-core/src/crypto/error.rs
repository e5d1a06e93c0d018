// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Crypto error types.

use thiserror::Error;

/// Errors raised by the crypto layer.
///
/// Every variant is fatal for the data it was raised on: callers must abort
/// processing rather than fall back to a guess.
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed: invalid padding or wrong key")]
    DecryptionFailed,

    #[error("Ciphertext too short or not block aligned ({0} bytes)")]
    InvalidCiphertext(usize),

    #[error("HMAC verification failed")]
    HmacMismatch,

    #[error("Invalid key length: {0} bytes")]
    InvalidKeyLength(usize),

    #[error("Unsupported encryption version {0}")]
    UnsupportedVersion(u8),

    #[error("Encryption version {version} is newer than the highest supported ({max}), upgrade required")]
    VersionTooNew { version: u8, max: u8 },

    #[error("System random number generator failed")]
    Rng,

    #[error("Asymmetric key error: {0}")]
    Asymmetric(String),

    #[error("Key derivation failed: {0}")]
    Derivation(String),
}
