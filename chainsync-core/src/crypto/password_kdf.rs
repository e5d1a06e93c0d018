// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Account Key Stretching
//!
//! Turns the user's login password into the account key material that every
//! journal key is derived from. Argon2id parameters: m=64MB, t=3, p=4
//! (OWASP recommended).

use ring::digest;
use zeroize::Zeroizing;

use super::error::CryptoError;

/// Argon2id memory cost in KiB (64 MB).
const ARGON2_M_COST: u32 = 65536;
/// Argon2id time cost (iterations).
const ARGON2_T_COST: u32 = 3;
/// Argon2id parallelism.
const ARGON2_P_COST: u32 = 4;
/// Length of the account key.
const ACCOUNT_KEY_LEN: usize = 32;

/// Domain separator mixed into the per-user salt.
const SALT_CONTEXT: &[u8] = b"chainsync-account-key:";

/// Derives the 32-byte account key for `username` from `password`.
///
/// The salt is `SHA-256(context || username)`, so the same credentials always
/// reproduce the same key on every device.
pub fn derive_account_key(
    username: &str,
    password: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let mut salt_input = Vec::with_capacity(SALT_CONTEXT.len() + username.len());
    salt_input.extend_from_slice(SALT_CONTEXT);
    salt_input.extend_from_slice(username.as_bytes());
    let salt = digest::digest(&digest::SHA256, &salt_input);

    let params = argon2::Params::new(
        ARGON2_M_COST,
        ARGON2_T_COST,
        ARGON2_P_COST,
        Some(ACCOUNT_KEY_LEN),
    )
    .map_err(|e| CryptoError::Derivation(e.to_string()))?;

    let argon2 = argon2::Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut key = Zeroizing::new(vec![0u8; ACCOUNT_KEY_LEN]);
    argon2
        .hash_password_into(password, salt.as_ref(), &mut key)
        .map_err(|e| CryptoError::Derivation(e.to_string()))?;

    Ok(key)
}
