// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Chainsync Core Library
//!
//! End-to-end encrypted sync of contacts, calendars and task lists through
//! append-only journals. The server only ever sees ciphertext; every entry is
//! chained to its predecessor by an HMAC uid, so reordering or tampering is
//! detected on the client.
//!
//! HMAC, hashing and randomness come from the audited `ring` crate.

pub mod account;
pub mod adapters;
pub mod chain;
pub mod collections;
pub mod crypto;
pub mod model;
pub mod remote;
pub mod resource;
pub mod storage;
pub mod sync;

pub use account::{AccountCredentials, StaticCredentials};
pub use adapters::{adapter_for, AdapterError, Applied, CalendarAdapter, ContactsAdapter, ResourceAdapter};
pub use chain::{ChainCodec, ChainError, Entry};
pub use collections::{CollectionError, CollectionManager, RefreshSummary};
pub use crypto::{AsymmetricKeyPair, CryptoError, CryptoManager, PublicKey, SymmetricKey};
pub use model::{CollectionInfo, CollectionType, Journal, Member, SyncAction, SyncEntry, UserInfo};
#[cfg(feature = "http-client")]
pub use remote::HttpJournalClient;
pub use remote::{ClientConfig, JournalClient, MemoryJournalServer, RemoteError, RemoteJournal};
pub use resource::{LocalResource, LocalResourceStore, MemoryResourceStore, StoreError};
pub use storage::{SqliteResourceStore, Storage, StorageError};
pub use sync::{
    CancellationToken, Recovery, SkipReason, SyncConfig, SyncError, SyncEvent, SyncManager,
    SyncOutcome, SyncPhase, SyncStats,
};
