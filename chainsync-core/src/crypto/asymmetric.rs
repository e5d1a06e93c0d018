// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Asymmetric Key Wrapping (RSA-OAEP)
//!
//! Sharing a journal hands every member the same journal key, wrapped under
//! that member's RSA public key with OAEP(SHA-256). Public keys travel as
//! DER-encoded SubjectPublicKeyInfo, private keys as PKCS#8 DER.

use rand::rngs::OsRng;
use ring::digest;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::error::CryptoError;

/// RSA modulus size for new key pairs.
pub const RSA_KEY_BITS: usize = 3072;

/// Bytes of the digest consumed per fingerprint group.
const FINGERPRINT_CHUNK_BYTES: usize = 5;
/// Number of 5-digit groups in a fingerprint.
const FINGERPRINT_GROUPS: usize = 6;
/// Groups rendered per line.
const FINGERPRINT_GROUPS_PER_LINE: usize = 3;

/// An RSA public key together with its canonical DER encoding.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    der: Vec<u8>,
    key: RsaPublicKey,
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicKey")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

impl PublicKey {
    /// Parses a DER-encoded SubjectPublicKeyInfo.
    pub fn from_der(der: &[u8]) -> Result<Self, CryptoError> {
        let key = RsaPublicKey::from_public_key_der(der)
            .map_err(|e| CryptoError::Asymmetric(e.to_string()))?;
        Ok(PublicKey {
            der: der.to_vec(),
            key,
        })
    }

    fn from_key(key: RsaPublicKey) -> Result<Self, CryptoError> {
        let der = key
            .to_public_key_der()
            .map_err(|e| CryptoError::Asymmetric(e.to_string()))?;
        Ok(PublicKey {
            der: der.as_bytes().to_vec(),
            key,
        })
    }

    /// Returns the DER encoding.
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    /// Encrypts a raw symmetric key for the holder of this public key.
    pub fn wrap_key(&self, raw_key: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.key
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), raw_key)
            .map_err(|e| CryptoError::Asymmetric(e.to_string()))
    }

    /// Human-verifiable fingerprint of this key.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.der)
    }
}

/// An RSA key pair owned by the current user.
pub struct AsymmetricKeyPair {
    private: RsaPrivateKey,
    public: PublicKey,
}

impl std::fmt::Debug for AsymmetricKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsymmetricKeyPair")
            .field("private", &"[REDACTED]")
            .field("public", &self.public)
            .finish()
    }
}

impl AsymmetricKeyPair {
    /// Generates a new 3072-bit key pair.
    pub fn generate() -> Result<Self, CryptoError> {
        Self::generate_with_bits(RSA_KEY_BITS)
    }

    /// Generates a key pair with a custom modulus size.
    ///
    /// Smaller sizes only exist to keep tests fast.
    pub fn generate_with_bits(bits: usize) -> Result<Self, CryptoError> {
        let private = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| CryptoError::Asymmetric(e.to_string()))?;
        let public = PublicKey::from_key(private.to_public_key())?;
        Ok(AsymmetricKeyPair { private, public })
    }

    /// Restores a key pair from a PKCS#8 DER private key.
    pub fn from_private_der(der: &[u8]) -> Result<Self, CryptoError> {
        let private = RsaPrivateKey::from_pkcs8_der(der)
            .map_err(|e| CryptoError::Asymmetric(e.to_string()))?;
        let public = PublicKey::from_key(private.to_public_key())?;
        Ok(AsymmetricKeyPair { private, public })
    }

    /// Serializes the private key as PKCS#8 DER.
    pub fn private_der(&self) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        let doc = self
            .private
            .to_pkcs8_der()
            .map_err(|e| CryptoError::Asymmetric(e.to_string()))?;
        Ok(Zeroizing::new(doc.as_bytes().to_vec()))
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Decrypts a key that was wrapped for this key pair.
    pub fn unwrap_key(&self, wrapped: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        self.private
            .decrypt(Oaep::new::<Sha256>(), wrapped)
            .map(Zeroizing::new)
            .map_err(|e| CryptoError::Asymmetric(e.to_string()))
    }
}

/// Renders the SHA-256 of `public_key_der` as grouped 5-digit decimals.
///
/// Each group is a 5-byte big-endian slice of the digest reduced mod 100000,
/// so two users can compare keys by reading digits aloud.
pub fn fingerprint(public_key_der: &[u8]) -> String {
    let hash = digest::digest(&digest::SHA256, public_key_der);
    let bytes = hash.as_ref();

    let groups: Vec<String> = bytes
        .chunks(FINGERPRINT_CHUNK_BYTES)
        .take(FINGERPRINT_GROUPS)
        .map(|chunk| {
            let value = chunk.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
            format!("{:05}", value % 100_000)
        })
        .collect();

    groups
        .chunks(FINGERPRINT_GROUPS_PER_LINE)
        .map(|line| line.join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}
