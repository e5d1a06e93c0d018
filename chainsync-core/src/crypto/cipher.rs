// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Symmetric Encryption (AES-256-CBC)
//!
//! Journal payloads are encrypted with AES-256 in CBC mode and PKCS#7
//! padding. Integrity is provided separately by the HMAC chain, so the
//! cipher itself is unauthenticated.
//!
//! Ciphertext format: `iv (16 bytes) || ciphertext`

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroize;

use super::error::CryptoError;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// IV size for AES-CBC (one block).
pub const IV_SIZE: usize = 16;
/// AES block size.
pub const BLOCK_SIZE: usize = 16;
/// Key size for AES-256 and HMAC-SHA256 sub-keys.
pub const KEY_SIZE: usize = 32;

/// 256-bit symmetric key.
///
/// Used both as the AES cipher key and as the HMAC authentication key.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Don't expose key bytes in debug output
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl SymmetricKey {
    /// Generates a new random symmetric key.
    pub fn generate() -> Result<Self, CryptoError> {
        let rng = SystemRandom::new();
        let mut bytes = [0u8; KEY_SIZE];
        rng.fill(&mut bytes).map_err(|_| CryptoError::Rng)?;
        Ok(SymmetricKey { bytes })
    }

    /// Creates a key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        SymmetricKey { bytes }
    }

    /// Creates a key from a slice, which must be exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength(bytes.len()))?;
        Ok(SymmetricKey { bytes })
    }

    /// Returns a reference to the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

/// Encrypts data with AES-256-CBC under a fresh random IV.
///
/// Output format: `iv (16 bytes) || ciphertext`
pub fn encrypt(key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let rng = SystemRandom::new();
    let mut iv = [0u8; IV_SIZE];
    rng.fill(&mut iv).map_err(|_| CryptoError::Rng)?;

    encrypt_with_iv(key, &iv, plaintext)
}

/// Encrypts with a caller-supplied IV.
///
/// Only exposed for deterministic test vectors. Reusing an IV under the same
/// key leaks plaintext prefixes; production code goes through [`encrypt`].
pub fn encrypt_with_iv(
    key: &SymmetricKey,
    iv: &[u8; IV_SIZE],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256CbcEnc::new_from_slices(key.as_bytes(), iv)
        .map_err(|_| CryptoError::EncryptionFailed)?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut output = Vec::with_capacity(IV_SIZE + ciphertext.len());
    output.extend_from_slice(iv);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Decrypts `iv || ciphertext` produced by [`encrypt`].
///
/// Fails with [`CryptoError::DecryptionFailed`] when the padding is invalid,
/// which is also what a wrong key almost always produces.
pub fn decrypt(key: &SymmetricKey, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if data.len() < IV_SIZE + BLOCK_SIZE || (data.len() - IV_SIZE) % BLOCK_SIZE != 0 {
        return Err(CryptoError::InvalidCiphertext(data.len()));
    }

    let (iv, ciphertext) = data.split_at(IV_SIZE);
    let cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), iv)
        .map_err(|_| CryptoError::DecryptionFailed)?;

    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::DecryptionFailed)
}
