// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Property-Based Tests
//!
//! Uses proptest to verify properties that should hold for all inputs,
//! not just specific test cases.

mod common;

use proptest::prelude::*;

use chainsync_core::adapters::text::{escape_text, unescape_text};
use chainsync_core::adapters::{ICalendar, VCard};
use chainsync_core::chain::{open_metadata, seal_metadata};
use chainsync_core::crypto::{decrypt, encrypt, SymmetricKey};
use chainsync_core::{ChainCodec, CollectionType, CryptoManager, SyncEntry};
use common::strategies::*;

fn manager(version: u8, key: [u8; 32]) -> CryptoManager {
    CryptoManager::new(version, &key, "journal-uid").unwrap()
}

// ============================================================
// Encryption Properties
// ============================================================

proptest! {
    /// Property: decrypt(encrypt(x)) == x for any plaintext
    #[test]
    fn prop_cipher_roundtrip(key in bytes32_strategy(), data in byte_vec_strategy(0, 512)) {
        let key = SymmetricKey::from_bytes(key);
        let sealed = encrypt(&key, &data).unwrap();

        prop_assert_eq!(sealed.len() % 16, 0);
        prop_assert!(sealed.len() > data.len());
        prop_assert_eq!(decrypt(&key, &sealed).unwrap(), data);
    }

    /// Property: a different key never yields the original plaintext
    #[test]
    fn prop_cipher_wrong_key(
        a in bytes32_strategy(),
        b in bytes32_strategy(),
        data in byte_vec_strategy(1, 128)
    ) {
        prop_assume!(a != b);
        let sealed = encrypt(&SymmetricKey::from_bytes(a), &data).unwrap();
        match decrypt(&SymmetricKey::from_bytes(b), &sealed) {
            Ok(plain) => prop_assert_ne!(plain, data),
            Err(_) => {}
        }
    }

    /// Property: the HMAC depends on the format version
    #[test]
    fn prop_hmac_bound_to_version(key in bytes32_strategy(), data in byte_vec_strategy(0, 64)) {
        let v1 = CryptoManager::from_raw_key(1, key.to_vec()).unwrap();
        let v2 = CryptoManager::from_raw_key(2, key.to_vec()).unwrap();
        prop_assert_ne!(v1.hmac(&data), v2.hmac(&data));
        prop_assert!(v2.verify_hmac(&data, &v2.hmac(&data)).is_ok());
        prop_assert!(v2.verify_hmac(&data, &v1.hmac(&data)).is_err());
    }
}

// ============================================================
// Chain Properties
// ============================================================

proptest! {
    /// Property: every chain built in order verifies, and each entry opens
    /// to the entry it was built from
    #[test]
    fn prop_chain_integrity(
        version in version_strategy(),
        key in bytes32_strategy(),
        actions in prop::collection::vec(sync_action_strategy(), 1..8),
        text in record_text_strategy()
    ) {
        let crypto = manager(version, key);
        let codec = ChainCodec::new(&crypto);

        let mut previous: Option<String> = None;
        let mut chain = Vec::new();
        let mut expected = Vec::new();
        for (i, action) in actions.into_iter().enumerate() {
            let sync_entry = SyncEntry::new(action, format!("{}-{}", text, i));
            let entry = codec.build(previous.as_deref(), &sync_entry.to_json().unwrap()).unwrap();
            prop_assert_eq!(entry.uid().len(), 64);
            previous = Some(entry.uid().to_string());
            chain.push(entry);
            expected.push(sync_entry);
        }

        let tail = codec.verify_chain(&chain, None).unwrap();
        prop_assert_eq!(tail, previous);

        let mut previous: Option<&str> = None;
        for (entry, sync_entry) in chain.iter().zip(expected) {
            let plain = codec.open(entry, previous).unwrap();
            prop_assert_eq!(SyncEntry::from_json(&plain).unwrap(), sync_entry);
            previous = Some(entry.uid());
        }
    }

    /// Property: an entry verified against any other predecessor fails
    #[test]
    fn prop_chain_bound_to_predecessor(
        key in bytes32_strategy(),
        data in byte_vec_strategy(1, 128),
        wrong in entry_uid_strategy()
    ) {
        let crypto = manager(2, key);
        let codec = ChainCodec::new(&crypto);
        let first = codec.build(None, b"first").unwrap();
        prop_assume!(wrong != first.uid());

        let second = codec.build(Some(first.uid()), &data).unwrap();
        prop_assert!(codec.verify(&second, Some(first.uid())).is_ok());
        prop_assert!(codec.verify(&second, Some(wrong.as_str())).is_err());
        prop_assert!(codec.verify(&second, None).is_err());
    }

    /// Property: sealed metadata opens only under its own journal uid
    #[test]
    fn prop_metadata_roundtrip(
        key in bytes32_strategy(),
        uid in entry_uid_strategy(),
        other in entry_uid_strategy(),
        data in byte_vec_strategy(0, 256)
    ) {
        prop_assume!(uid != other);
        let crypto = manager(2, key);

        let sealed = seal_metadata(&crypto, &uid, &data).unwrap();
        prop_assert_eq!(open_metadata(&crypto, &uid, &sealed).unwrap(), data);
        prop_assert!(open_metadata(&crypto, &other, &sealed).is_err());
    }
}

// ============================================================
// Record Text Properties
// ============================================================

proptest! {
    /// Property: unescape(escape(x)) == x
    #[test]
    fn prop_text_escape_roundtrip(text in record_text_strategy()) {
        let escaped = escape_text(&text);
        prop_assert!(!escaped.contains('\n'));
        prop_assert_eq!(unescape_text(&escaped), text);
    }

    /// Property: names survive a vCard write and parse, however they fold
    #[test]
    fn prop_vcard_roundtrip(uid in resource_uid_strategy(), name in record_text_strategy()) {
        let text = VCard::new(&uid, &name).to_text();
        prop_assert!(text.lines().all(|line| line.trim_end_matches('\r').len() <= 75));

        let card = VCard::parse(&text).unwrap();
        prop_assert_eq!(card.uid(), Some(uid));
        prop_assert_eq!(card.formatted_name(), Some(name));
    }

    /// Property: event summaries survive an iCalendar write and parse
    #[test]
    fn prop_icalendar_roundtrip(uid in resource_uid_strategy(), summary in display_name_strategy()) {
        let text = ICalendar::new(CollectionType::Calendar, &uid, &summary).to_text();
        let cal = ICalendar::parse(CollectionType::Calendar, &text).unwrap();

        prop_assert_eq!(cal.uid(), Some(uid));
        prop_assert_eq!(cal.summary(), Some(summary));
    }
}
