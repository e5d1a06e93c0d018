// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync Workflow Integration Tests
//!
//! Two devices of one account converging through the journal server.

use chainsync_core::adapters::{ICalendar, VCard};
use chainsync_core::*;

use crate::common::fixtures::{credentials, event, task, vcard, Device};

fn completed(outcome: SyncOutcome) -> SyncStats {
    match outcome {
        SyncOutcome::Completed(stats) => stats,
        other => panic!("sync did not complete: {:?}", other),
    }
}

fn name_of(resource: &LocalResource) -> Option<String> {
    VCard::parse(std::str::from_utf8(&resource.content).unwrap())
        .unwrap()
        .formatted_name()
}

/// Test: contacts created on one device show up on the other, and so do
/// their later edits and deletions.
#[test]
fn test_two_devices_converge() {
    let server = MemoryJournalServer::new();
    let laptop = Device::new(&server, credentials("alice"));
    let journal = laptop.create_collection(CollectionType::Contacts, "Friends");

    let mut laptop_store = MemoryResourceStore::new();
    let carol = laptop_store.create_local_with_uid("c1", &vcard("c1", "Carol"));
    let dave = laptop_store.create_local_with_uid("c2", &vcard("c2", "Dave"));
    laptop_store.create_local_with_uid("c3", &vcard("c3", "Erin"));
    completed(laptop.sync_manager().sync(&journal.uid, &mut laptop_store));

    // Phone logs in to the same account
    let phone = Device::new(&server, credentials("alice"));
    let refreshed = phone.collections().refresh().unwrap();
    assert_eq!(refreshed.added, 1);

    let mut phone_store = MemoryResourceStore::new();
    let stats = completed(phone.sync_manager().sync(&journal.uid, &mut phone_store));
    assert_eq!(stats.fetched, 3);
    assert_eq!(stats.added, 3);
    assert_eq!(
        name_of(&phone_store.get_by_uid("c1").unwrap().unwrap()).as_deref(),
        Some("Carol")
    );

    // Laptop edits one contact and deletes another
    laptop_store.update_local(carol, &vcard("c1", "Caroline")).unwrap();
    laptop_store.delete_local(dave).unwrap();
    let stats = completed(laptop.sync_manager().sync(&journal.uid, &mut laptop_store));
    assert_eq!(stats.pushed, 2);

    let stats = completed(phone.sync_manager().sync(&journal.uid, &mut phone_store));
    assert_eq!(stats.changed, 1);
    assert_eq!(stats.deleted, 1);
    assert_eq!(
        name_of(&phone_store.get_by_uid("c1").unwrap().unwrap()).as_deref(),
        Some("Caroline")
    );
    assert!(phone_store.get_by_uid("c2").unwrap().is_none());
    assert_eq!(phone_store.live().len(), 2);

    // Both caches hold the same verified chain
    assert_eq!(
        laptop.storage.list_entries(&journal.uid).unwrap(),
        phone.storage.list_entries(&journal.uid).unwrap()
    );
}

/// Test: when both devices edit the same contact, the device syncing second
/// keeps its version and the other one adopts it.
#[test]
fn test_concurrent_edits_local_wins() {
    let server = MemoryJournalServer::new();
    let laptop = Device::new(&server, credentials("alice"));
    let journal = laptop.create_collection(CollectionType::Contacts, "Friends");

    let mut laptop_store = MemoryResourceStore::new();
    let on_laptop = laptop_store.create_local_with_uid("c1", &vcard("c1", "Carol"));
    completed(laptop.sync_manager().sync(&journal.uid, &mut laptop_store));

    let phone = Device::new(&server, credentials("alice"));
    phone.collections().refresh().unwrap();
    let mut phone_store = MemoryResourceStore::new();
    completed(phone.sync_manager().sync(&journal.uid, &mut phone_store));

    // Both edit offline
    laptop_store
        .update_local(on_laptop, &vcard("c1", "Carol (laptop)"))
        .unwrap();
    let on_phone = phone_store.get_by_uid("c1").unwrap().unwrap().local_id;
    phone_store
        .update_local(on_phone, &vcard("c1", "Carol (phone)"))
        .unwrap();

    completed(laptop.sync_manager().sync(&journal.uid, &mut laptop_store));

    let stats = completed(phone.sync_manager().sync(&journal.uid, &mut phone_store));
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.pushed, 1);
    assert_eq!(
        name_of(phone_store.get(on_phone).unwrap()).as_deref(),
        Some("Carol (phone)")
    );

    let stats = completed(laptop.sync_manager().sync(&journal.uid, &mut laptop_store));
    assert_eq!(stats.changed, 1);
    assert_eq!(
        name_of(laptop_store.get(on_laptop).unwrap()).as_deref(),
        Some("Carol (phone)")
    );
}

/// Test: a repeated sync with nothing new does not change anything.
#[test]
fn test_second_sync_is_noop() {
    let server = MemoryJournalServer::new();
    let device = Device::new(&server, credentials("alice"));
    let journal = device.create_collection(CollectionType::Contacts, "Friends");

    let mut store = MemoryResourceStore::new();
    store.create_local_with_uid("c1", &vcard("c1", "Carol"));
    completed(device.sync_manager().sync(&journal.uid, &mut store));

    let pushes = server.push_count();
    let stats = completed(device.sync_manager().sync(&journal.uid, &mut store));
    assert!(!stats.has_changes());
    assert_eq!(stats.fetched, 0);
    assert_eq!(server.push_count(), pushes);
}

/// Test: calendars and task lists sync through the SQLite store.
#[test]
fn test_calendar_and_tasks_with_sqlite_store() {
    let server = MemoryJournalServer::new();
    let laptop = Device::new(&server, credentials("alice"));
    let calendar = laptop.create_collection(CollectionType::Calendar, "Work");
    let tasks = laptop.create_collection(CollectionType::Tasks, "Errands");

    {
        let mut store = laptop.storage.resource_store(&calendar.uid);
        store.create_local(Some("ev1"), &event("ev1", "Standup")).unwrap();
        completed(laptop.sync_manager().sync(&calendar.uid, &mut store));

        let mut store = laptop.storage.resource_store(&tasks.uid);
        store.create_local(Some("t1"), &task("t1", "Buy milk")).unwrap();
        completed(laptop.sync_manager().sync(&tasks.uid, &mut store));
    }

    let phone = Device::new(&server, credentials("alice"));
    assert_eq!(phone.collections().refresh().unwrap().added, 2);

    let mut store = phone.storage.resource_store(&calendar.uid);
    let stats = completed(phone.sync_manager().sync(&calendar.uid, &mut store));
    assert_eq!(stats.added, 1);
    let ev = store.get_by_uid("ev1").unwrap().unwrap();
    let parsed = ICalendar::parse(
        CollectionType::Calendar,
        std::str::from_utf8(&ev.content).unwrap(),
    )
    .unwrap();
    assert_eq!(parsed.summary().as_deref(), Some("Standup"));
    assert_eq!(ev.remote_marker, store.cursor().unwrap());

    let mut store = phone.storage.resource_store(&tasks.uid);
    let stats = completed(phone.sync_manager().sync(&tasks.uid, &mut store));
    assert_eq!(stats.added, 1);
    assert!(store.get_by_uid("t1").unwrap().is_some());
    assert!(store.get_by_uid("ev1").unwrap().is_none());
}

/// Test: contact groups pushed from one device resolve their members on the other.
#[test]
fn test_contact_groups_sync() {
    let server = MemoryJournalServer::new();
    let laptop = Device::new(&server, credentials("alice"));
    let journal = laptop.create_collection(CollectionType::Contacts, "Friends");

    let mut laptop_store = MemoryResourceStore::new();
    let group = VCard::group("g1", "Climbing", &["c1", "c2"]).to_text();
    laptop_store.create_local_with_uid("c1", &vcard("c1", "Carol"));
    laptop_store.create_local_with_uid("c2", &vcard("c2", "Dave"));
    laptop_store.create_local_with_uid("g1", group.as_bytes());
    completed(laptop.sync_manager().sync(&journal.uid, &mut laptop_store));

    let phone = Device::new(&server, credentials("alice"));
    phone.collections().refresh().unwrap();
    let mut store = phone.storage.resource_store(&journal.uid);
    completed(phone.sync_manager().sync(&journal.uid, &mut store));

    assert_eq!(
        store.group_members("g1").unwrap(),
        vec!["c1".to_string(), "c2".to_string()]
    );
}

/// Test: a journal on the v1 format still syncs between devices.
#[test]
fn test_version_one_journal_syncs() {
    let server = MemoryJournalServer::new();
    let laptop = Device::new(&server, credentials("alice"));
    let mut journal = laptop.create_collection(CollectionType::Contacts, "Legacy");
    journal.version = 1;
    laptop.storage.save_journal(&journal).unwrap();

    let mut laptop_store = MemoryResourceStore::new();
    laptop_store.create_local_with_uid("c1", &vcard("c1", "Carol"));
    completed(laptop.sync_manager().sync(&journal.uid, &mut laptop_store));

    // Same key material read as v2 must reject them.
    let v2 = CryptoManager::from_raw_key(2, laptop.credentials.account_key().to_vec()).unwrap();
    assert!(ChainCodec::new(&v2)
        .verify_chain(&server.entries(&journal.uid), None)
        .is_err());

    let phone = Device::new(&server, credentials("alice"));
    phone.storage.save_journal(&journal).unwrap();
    let mut phone_store = MemoryResourceStore::new();
    let stats = completed(phone.sync_manager().sync(&journal.uid, &mut phone_store));
    assert_eq!(stats.added, 1);
}
