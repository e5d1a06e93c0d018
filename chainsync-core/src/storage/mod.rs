// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Persistent Storage Module
//!
//! SQLite storage for collections, the verified journal entry cache, pushes
//! awaiting their local commit, and the local resources of each collection.
//! Resource content is encrypted at rest with the storage key; journal
//! entries are stored as received (they are already encrypted under the
//! journal key).

mod entries;
mod error;
mod journals;
pub mod migration;
mod pushes;
mod resources;

pub use error::StorageError;
pub use resources::SqliteResourceStore;

use rusqlite::Connection;
use std::path::Path;

use crate::crypto::SymmetricKey;

/// SQLite-based storage implementation.
pub struct Storage {
    conn: Connection,
    /// Key for resource content at rest.
    pub(crate) encryption_key: SymmetricKey,
}

impl Storage {
    /// Opens or creates a storage database at the given path.
    pub fn open<P: AsRef<Path>>(
        path: P,
        encryption_key: SymmetricKey,
    ) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, encryption_key)
    }

    /// Creates an in-memory storage (for testing).
    pub fn in_memory(encryption_key: SymmetricKey) -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, encryption_key)
    }

    fn with_connection(conn: Connection, encryption_key: SymmetricKey) -> Result<Self, StorageError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let storage = Storage {
            conn,
            encryption_key,
        };
        storage.run_migrations()?;
        Ok(storage)
    }

    fn run_migrations(&self) -> Result<(), StorageError> {
        let migrations = migration::all_migrations();
        migration::MigrationRunner::run(&self.conn, &self.encryption_key, &migrations)
    }

    /// Returns the current schema version.
    pub fn schema_version(&self) -> Result<u32, StorageError> {
        migration::MigrationRunner::current_version(&self.conn)
    }

    /// Resource store for one collection, backed by this database.
    pub fn resource_store(&self, journal_uid: &str) -> SqliteResourceStore<'_> {
        SqliteResourceStore::new(self, journal_uid)
    }
}

/// Seconds since the UNIX epoch, 0 if the clock is before it.
pub(crate) fn now_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
