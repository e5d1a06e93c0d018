// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Test Fixtures
//!
//! Accounts, storages and records wired against an in-memory journal server.

use chainsync_core::adapters::{ICalendar, VCard};
use chainsync_core::{
    AsymmetricKeyPair, CollectionInfo, CollectionManager, CollectionType, Journal,
    MemoryJournalServer, StaticCredentials, Storage, SymmetricKey, SyncConfig, SyncManager,
};

/// Small modulus so key generation does not dominate test time.
pub const TEST_RSA_BITS: usize = 1024;

pub const TEST_SERVER_URL: &str = "https://journal.example.test/";

pub fn test_storage() -> Storage {
    Storage::in_memory(SymmetricKey::generate().unwrap()).unwrap()
}

/// Credentials with deterministic account key material for `username`.
pub fn credentials(username: &str) -> StaticCredentials {
    StaticCredentials::new(
        username,
        format!("{}-account-key-material", username).into_bytes(),
        TEST_SERVER_URL,
    )
}

pub fn credentials_with_key_pair(username: &str) -> StaticCredentials {
    let key_pair = AsymmetricKeyPair::generate_with_bits(TEST_RSA_BITS).unwrap();
    credentials(username).with_key_pair(key_pair)
}

pub fn vcard(uid: &str, name: &str) -> Vec<u8> {
    VCard::new(uid, name).to_text().into_bytes()
}

pub fn event(uid: &str, summary: &str) -> Vec<u8> {
    ICalendar::new(CollectionType::Calendar, uid, summary)
        .to_text()
        .into_bytes()
}

pub fn task(uid: &str, summary: &str) -> Vec<u8> {
    ICalendar::new(CollectionType::Tasks, uid, summary)
        .to_text()
        .into_bytes()
}

/// One device of one account: its own database, talking to the shared server.
pub struct Device<'a> {
    pub server: &'a MemoryJournalServer,
    pub credentials: StaticCredentials,
    pub storage: Storage,
}

impl<'a> Device<'a> {
    pub fn new(server: &'a MemoryJournalServer, credentials: StaticCredentials) -> Self {
        Device {
            server,
            credentials,
            storage: test_storage(),
        }
    }

    pub fn collections(&self) -> CollectionManager<'_> {
        CollectionManager::new(&self.storage, self.server, &self.credentials)
    }

    pub fn sync_manager(&self) -> SyncManager<'_> {
        self.sync_manager_with(SyncConfig::default())
    }

    pub fn sync_manager_with(&self, config: SyncConfig) -> SyncManager<'_> {
        SyncManager::new(&self.storage, self.server, &self.credentials, config)
    }

    pub fn create_collection(&self, kind: CollectionType, name: &str) -> Journal {
        self.collections()
            .create(CollectionInfo::new(kind, name))
            .unwrap()
    }
}
