// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Published per-user key material.

use zeroize::Zeroizing;

use crate::chain::{open_metadata, seal_metadata, ChainError};
use crate::crypto::{AsymmetricKeyPair, CryptoManager, PublicKey, CURRENT_VERSION};

/// Salt for the crypto context protecting the private key.
const USER_INFO_SALT: &str = "userInfo";

/// A user's public key plus their private key sealed under their account key.
///
/// The public half is what other members wrap journal keys for; the sealed
/// private half lets each of the user's devices recover the key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub owner: String,
    pub version: u8,
    pub public_key: Vec<u8>,
    /// `hmac || iv || ciphertext` of the PKCS#8 private key.
    pub content: Vec<u8>,
}

impl UserInfo {
    /// Seals `key_pair` for publication under `owner`.
    pub fn create(
        owner: &str,
        account_key: &[u8],
        key_pair: &AsymmetricKeyPair,
    ) -> Result<Self, ChainError> {
        let crypto = CryptoManager::new(CURRENT_VERSION, account_key, USER_INFO_SALT)?;
        let private_der = key_pair.private_der()?;
        let content = seal_metadata(&crypto, owner, &private_der)?;

        Ok(UserInfo {
            owner: owner.to_string(),
            version: CURRENT_VERSION,
            public_key: key_pair.public_key().as_der().to_vec(),
            content,
        })
    }

    /// Recovers the key pair with the owner's account key.
    pub fn key_pair(&self, account_key: &[u8]) -> Result<AsymmetricKeyPair, ChainError> {
        let crypto = CryptoManager::new(self.version, account_key, USER_INFO_SALT)?;
        let private_der = Zeroizing::new(open_metadata(&crypto, &self.owner, &self.content)?);
        Ok(AsymmetricKeyPair::from_private_der(&private_der)?)
    }

    pub fn public_key(&self) -> Result<PublicKey, ChainError> {
        Ok(PublicKey::from_der(&self.public_key)?)
    }
}
