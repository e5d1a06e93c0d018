// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sharing Workflow Integration Tests
//!
//! Publishing key pairs, sharing a collection with another account and
//! syncing it from both sides.

use chainsync_core::*;

use crate::common::fixtures::{credentials, credentials_with_key_pair, vcard, Device};

fn publish(device: &Device<'_>) {
    let key_pair = device.credentials.key_pair().unwrap();
    device.collections().publish_user_info(key_pair).unwrap();
}

/// Test: alice shares her contacts with bob, both read and write them.
#[test]
fn test_share_and_sync_both_ways() {
    let server = MemoryJournalServer::new();
    let alice = Device::new(&server, credentials_with_key_pair("alice"));
    let bob = Device::new(&server, credentials_with_key_pair("bob"));
    publish(&bob);

    let journal = alice.create_collection(CollectionType::Contacts, "Family");
    let mut alice_store = MemoryResourceStore::new();
    alice_store.create_local_with_uid("c1", &vcard("c1", "Grandma"));
    assert!(alice.sync_manager().sync(&journal.uid, &mut alice_store).is_success());

    // Alice compares the fingerprint with the one bob reads off his device
    let fingerprint = alice.collections().share(&journal.uid, "bob").unwrap();
    assert_eq!(fingerprint, bob.collections().own_fingerprint().unwrap());

    let members = alice.collections().members(&journal.uid).unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user, "bob");

    // Bob picks it up
    let view = server.shared_view(&journal.uid, "bob").unwrap();
    let accepted = bob.collections().accept(view).unwrap();
    assert!(accepted.is_shared());
    assert_eq!(accepted.owner, "alice");
    assert_eq!(accepted.info.display_name, "Family");

    let mut bob_store = MemoryResourceStore::new();
    let outcome = bob.sync_manager().sync(&journal.uid, &mut bob_store);
    let SyncOutcome::Completed(stats) = outcome else {
        panic!("bob's sync did not complete: {:?}", outcome);
    };
    assert_eq!(stats.added, 1);
    assert!(bob_store.get_by_uid("c1").unwrap().is_some());

    // Bob adds a contact, alice receives it
    bob_store.create_local_with_uid("c2", &vcard("c2", "Grandpa"));
    assert!(bob.sync_manager().sync(&journal.uid, &mut bob_store).is_success());

    let outcome = alice.sync_manager().sync(&journal.uid, &mut alice_store);
    let SyncOutcome::Completed(stats) = outcome else {
        panic!("alice's sync did not complete: {:?}", outcome);
    };
    assert_eq!(stats.added, 1);
    assert!(alice_store.get_by_uid("c2").unwrap().is_some());
}

#[test]
fn test_unshare_removes_member_view() {
    let server = MemoryJournalServer::new();
    let alice = Device::new(&server, credentials_with_key_pair("alice"));
    let bob = Device::new(&server, credentials_with_key_pair("bob"));
    publish(&bob);

    let journal = alice.create_collection(CollectionType::Calendar, "Holidays");
    alice.collections().share(&journal.uid, "bob").unwrap();
    assert!(server.shared_view(&journal.uid, "bob").is_some());

    alice.collections().unshare(&journal.uid, "bob").unwrap();
    assert!(server.shared_view(&journal.uid, "bob").is_none());
    assert!(alice.collections().members(&journal.uid).unwrap().is_empty());
}

#[test]
fn test_share_requires_published_key() {
    let server = MemoryJournalServer::new();
    let alice = Device::new(&server, credentials_with_key_pair("alice"));
    let journal = alice.create_collection(CollectionType::Contacts, "Family");

    let err = alice.collections().share(&journal.uid, "carol").unwrap_err();
    assert!(matches!(err, CollectionError::NoPublicKey(ref user) if user == "carol"));
}

#[test]
fn test_member_cannot_reshare() {
    let server = MemoryJournalServer::new();
    let alice = Device::new(&server, credentials_with_key_pair("alice"));
    let bob = Device::new(&server, credentials_with_key_pair("bob"));
    publish(&bob);

    let journal = alice.create_collection(CollectionType::Contacts, "Family");
    alice.collections().share(&journal.uid, "bob").unwrap();
    let view = server.shared_view(&journal.uid, "bob").unwrap();
    bob.collections().accept(view).unwrap();

    let err = bob.collections().share(&journal.uid, "bob").unwrap_err();
    assert!(matches!(err, CollectionError::NotOwner(_)));
    assert!(matches!(
        bob.collections().delete(&journal.uid),
        Err(CollectionError::NotOwner(_))
    ));
}

#[test]
fn test_shared_journal_needs_key_pair() {
    let server = MemoryJournalServer::new();
    let alice = Device::new(&server, credentials_with_key_pair("alice"));
    let bob = Device::new(&server, credentials_with_key_pair("bob"));
    publish(&bob);

    let journal = alice.create_collection(CollectionType::Contacts, "Family");
    alice.collections().share(&journal.uid, "bob").unwrap();
    let view = server.shared_view(&journal.uid, "bob").unwrap();

    // A device of bob's without the key pair cannot open it
    let bare = Device::new(&server, credentials("bob"));
    let err = bare.collections().accept(view).unwrap_err();
    assert!(matches!(err, CollectionError::Sync(SyncError::Crypto(_))));
}

#[test]
fn test_own_fingerprint_without_key_pair() {
    let server = MemoryJournalServer::new();
    let device = Device::new(&server, credentials("alice"));
    assert!(matches!(
        device.collections().own_fingerprint(),
        Err(CollectionError::NoKeyPair)
    ));
}

/// Test: a second device recovers the key pair published by the first.
#[test]
fn test_key_pair_recovered_on_new_device() {
    let server = MemoryJournalServer::new();
    let laptop = Device::new(&server, credentials_with_key_pair("alice"));
    let phone = Device::new(&server, credentials("alice"));
    assert!(phone.collections().fetch_key_pair().unwrap().is_none());

    publish(&laptop);

    let recovered = phone.collections().fetch_key_pair().unwrap().unwrap();
    assert_eq!(
        recovered.public_key().as_der(),
        laptop.credentials.key_pair().unwrap().public_key().as_der()
    );

    // Someone else's account key cannot open it
    let info = server.get_user_info("alice").unwrap().unwrap();
    assert!(info.key_pair(b"bob-account-key-material").is_err());
}
