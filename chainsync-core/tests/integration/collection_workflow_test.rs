// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Collection Workflow Integration Tests
//!
//! Creating, renaming, deleting and refreshing collections across devices.

use chainsync_core::*;

use crate::common::fixtures::{credentials, vcard, Device};

#[test]
fn test_create_and_refresh_on_second_device() {
    let server = MemoryJournalServer::new();
    let laptop = Device::new(&server, credentials("alice"));
    let mut info = CollectionInfo::new(CollectionType::Calendar, "Work");
    info.description = Some("Meetings".to_string());
    info.color = Some(0x2266aa);
    let journal = laptop.collections().create(info.clone()).unwrap();

    assert_eq!(journal.uid.len(), 64);
    assert_eq!(journal.owner, "alice");
    assert_eq!(server.list_journals().unwrap().len(), 1);

    let phone = Device::new(&server, credentials("alice"));
    let summary = phone.collections().refresh().unwrap();
    assert_eq!(
        summary,
        RefreshSummary {
            added: 1,
            updated: 0,
            removed: 0,
            failed: vec![],
        }
    );

    let listed = phone.collections().list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].info, info);
    assert!(listed[0].selected);
}

#[test]
fn test_metadata_is_encrypted_on_server() {
    let server = MemoryJournalServer::new();
    let laptop = Device::new(&server, credentials("alice"));
    laptop.create_collection(CollectionType::Contacts, "Very Private Friends");

    let remote = &server.list_journals().unwrap()[0];
    let needle = b"Very Private";
    assert!(!remote.content.windows(needle.len()).any(|w| w == needle));
}

#[test]
fn test_rename_propagates() {
    let server = MemoryJournalServer::new();
    let laptop = Device::new(&server, credentials("alice"));
    let journal = laptop.create_collection(CollectionType::Contacts, "Friends");

    let phone = Device::new(&server, credentials("alice"));
    phone.collections().refresh().unwrap();

    laptop
        .collections()
        .update(&journal.uid, CollectionInfo::new(CollectionType::Contacts, "Best Friends"))
        .unwrap();

    let summary = phone.collections().refresh().unwrap();
    assert_eq!(summary.updated, 1);
    let renamed = phone.storage.load_journal(&journal.uid).unwrap().unwrap();
    assert_eq!(renamed.info.display_name, "Best Friends");

    // Nothing changed since
    assert_eq!(phone.collections().refresh().unwrap().updated, 0);
}

#[test]
fn test_refresh_keeps_local_selection() {
    let server = MemoryJournalServer::new();
    let laptop = Device::new(&server, credentials("alice"));
    let journal = laptop.create_collection(CollectionType::Tasks, "Errands");

    let phone = Device::new(&server, credentials("alice"));
    phone.collections().refresh().unwrap();
    phone.collections().set_selected(&journal.uid, false).unwrap();
    phone.collections().refresh().unwrap();

    assert!(!phone.storage.load_journal(&journal.uid).unwrap().unwrap().selected);
}

#[test]
fn test_delete_soft_deletes_on_other_devices() {
    let server = MemoryJournalServer::new();
    let laptop = Device::new(&server, credentials("alice"));
    let journal = laptop.create_collection(CollectionType::Contacts, "Friends");

    let mut store = MemoryResourceStore::new();
    store.create_local_with_uid("c1", &vcard("c1", "Carol"));
    assert!(laptop.sync_manager().sync(&journal.uid, &mut store).is_success());

    let phone = Device::new(&server, credentials("alice"));
    phone.collections().refresh().unwrap();

    laptop.collections().delete(&journal.uid).unwrap();
    assert!(server.list_journals().unwrap().is_empty());
    assert!(laptop.storage.load_journal(&journal.uid).unwrap().is_none());
    assert_eq!(laptop.storage.count_entries(&journal.uid).unwrap(), 0);

    let summary = phone.collections().refresh().unwrap();
    assert_eq!(summary.removed, 1);
    assert!(phone.collections().list().unwrap().is_empty());
    assert_eq!(phone.storage.list_journals(true).unwrap().len(), 1);

    let outcome = phone
        .sync_manager()
        .sync(&journal.uid, &mut MemoryResourceStore::new());
    assert_eq!(outcome, SyncOutcome::Skipped(SkipReason::JournalDeleted));
}

#[test]
fn test_tampered_metadata_rejected_on_refresh() {
    let server = MemoryJournalServer::new();
    let laptop = Device::new(&server, credentials("alice"));
    laptop.create_collection(CollectionType::Contacts, "Friends");

    let mut remote = server.list_journals().unwrap().remove(0);
    let last = remote.content.len() - 1;
    remote.content[last] ^= 0x01;
    server.update_journal(&remote).unwrap();

    let phone = Device::new(&server, credentials("alice"));
    let summary = phone.collections().refresh().unwrap();
    assert_eq!(summary.added, 0);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, remote.uid);
    assert!(matches!(summary.failed[0].1, SyncError::Integrity { .. }));
    assert!(phone.storage.load_journal(&remote.uid).unwrap().is_none());
}

#[test]
fn test_other_account_cannot_read_metadata() {
    let server = MemoryJournalServer::new();
    let alice = Device::new(&server, credentials("alice"));
    alice.create_collection(CollectionType::Contacts, "Friends");

    let mallory = Device::new(&server, credentials("mallory"));
    let summary = mallory.collections().refresh().unwrap();
    assert_eq!(summary.failed.len(), 1);
    assert!(mallory.collections().list().unwrap().is_empty());
}

/// A journal written by a newer client is reported, and the rest of the
/// list is still stored and reconciled.
#[test]
fn test_refresh_continues_past_unreadable_journal() {
    let server = MemoryJournalServer::new();
    let laptop = Device::new(&server, credentials("alice"));
    let kept = laptop.create_collection(CollectionType::Contacts, "Friends");
    let dropped = laptop.create_collection(CollectionType::Calendar, "Old plans");

    let phone = Device::new(&server, credentials("alice"));
    assert_eq!(phone.collections().refresh().unwrap().added, 2);
    laptop.collections().delete(&dropped.uid).unwrap();

    // Listed before every hex uid
    let newer_uid = "0".repeat(64);
    server
        .create_journal(&RemoteJournal {
            uid: newer_uid.clone(),
            version: crypto::CURRENT_VERSION + 1,
            owner: "alice".to_string(),
            content: vec![0u8; 80],
            read_only: false,
            key: None,
        })
        .unwrap();
    let another = laptop.create_collection(CollectionType::Tasks, "Errands");

    let summary = phone.collections().refresh().unwrap();

    assert_eq!(summary.added, 1);
    assert_eq!(summary.removed, 1);
    assert_eq!(summary.failed.len(), 1);
    let (uid, error) = &summary.failed[0];
    assert_eq!(uid, &newer_uid);
    assert!(matches!(error, SyncError::VersionTooNew { .. }));
    assert_eq!(error.recovery(), Recovery::UpgradeClient);

    assert!(phone.storage.load_journal(&another.uid).unwrap().is_some());
    assert!(phone.storage.load_journal(&kept.uid).unwrap().is_some());
    assert!(phone.storage.load_journal(&dropped.uid).unwrap().unwrap().deleted);
    assert!(phone.storage.load_journal(&newer_uid).unwrap().is_none());
}

#[test]
fn test_refresh_surfaces_server_errors() {
    let server = MemoryJournalServer::new();
    let device = Device::new(&server, credentials("alice"));
    server.inject_failure(RemoteError::UserInactive);

    let err = device.collections().refresh().unwrap_err();
    let CollectionError::Sync(sync) = err else {
        panic!("unexpected error {:?}", err);
    };
    assert_eq!(sync, SyncError::UserInactive);
    assert_eq!(sync.recovery(), Recovery::AccountInactive);
}
