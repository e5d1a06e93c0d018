// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Account credential provider.
//!
//! The engine only needs the account key material, the optional key pair for
//! shared journals and the remote endpoint. Where these are stored is up to
//! the host.

use zeroize::Zeroizing;

use crate::crypto::{derive_account_key, AsymmetricKeyPair, CryptoError};

/// Supplies per-account key material to the engine.
pub trait AccountCredentials {
    fn username(&self) -> &str;

    /// Key material every owned journal key is derived from.
    fn account_key(&self) -> &[u8];

    /// Key pair used to unwrap journal keys shared with this account.
    fn key_pair(&self) -> Option<&AsymmetricKeyPair>;

    /// Base URL of the journal server.
    fn remote_url(&self) -> &str;
}

/// Credentials held in memory for the lifetime of a sync.
pub struct StaticCredentials {
    username: String,
    account_key: Zeroizing<Vec<u8>>,
    key_pair: Option<AsymmetricKeyPair>,
    remote_url: String,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("username", &self.username)
            .field("account_key", &"[REDACTED]")
            .field("has_key_pair", &self.key_pair.is_some())
            .field("remote_url", &self.remote_url)
            .finish()
    }
}

impl StaticCredentials {
    /// Uses already-derived account key material.
    pub fn new(username: &str, account_key: Vec<u8>, remote_url: &str) -> Self {
        StaticCredentials {
            username: username.to_string(),
            account_key: Zeroizing::new(account_key),
            key_pair: None,
            remote_url: remote_url.to_string(),
        }
    }

    /// Stretches a login password into account key material.
    pub fn from_password(
        username: &str,
        password: &str,
        remote_url: &str,
    ) -> Result<Self, CryptoError> {
        let account_key = derive_account_key(username, password.as_bytes())?;
        Ok(StaticCredentials {
            username: username.to_string(),
            account_key,
            key_pair: None,
            remote_url: remote_url.to_string(),
        })
    }

    pub fn with_key_pair(mut self, key_pair: AsymmetricKeyPair) -> Self {
        self.key_pair = Some(key_pair);
        self
    }
}

impl AccountCredentials for StaticCredentials {
    fn username(&self) -> &str {
        &self.username
    }

    fn account_key(&self) -> &[u8] {
        &self.account_key
    }

    fn key_pair(&self) -> Option<&AsymmetricKeyPair> {
        self.key_pair.as_ref()
    }

    fn remote_url(&self) -> &str {
        &self.remote_url
    }
}
