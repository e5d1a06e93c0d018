// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod asymmetric;
pub mod cipher;
pub mod error;
pub mod kdf;
pub mod manager;
pub mod password_kdf;

pub use asymmetric::{fingerprint, AsymmetricKeyPair, PublicKey, RSA_KEY_BITS};
pub use cipher::{decrypt, encrypt, SymmetricKey};
pub use error::CryptoError;
pub use kdf::{check_version, derive_key, hmac, verify_hmac, CURRENT_VERSION, MIN_VERSION};
pub use manager::CryptoManager;
pub use password_kdf::derive_account_key;
