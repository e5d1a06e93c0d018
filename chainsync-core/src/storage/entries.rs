// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Journal entry cache.
//!
//! Entries are cached in journal order after they have been verified. Every
//! sync replays the cached chain before trusting its cursor.

use rusqlite::params;

use super::{Storage, StorageError};
use crate::chain::Entry;

impl Storage {
    /// Appends a verified entry to the cache of `journal_uid`.
    ///
    /// Caching the same uid twice is a no-op.
    pub fn append_entry(&self, journal_uid: &str, entry: &Entry) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO entries (journal_uid, seq, uid, content)
             VALUES (?1,
                     (SELECT COALESCE(MAX(seq), 0) + 1 FROM entries WHERE journal_uid = ?1),
                     ?2, ?3)",
            params![journal_uid, entry.uid(), entry.content()],
        )?;
        Ok(())
    }

    /// Cached entries of a journal, oldest first.
    pub fn list_entries(&self, journal_uid: &str) -> Result<Vec<Entry>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT uid, content FROM entries WHERE journal_uid = ?1 ORDER BY seq",
        )?;
        let rows = stmt.query_map(params![journal_uid], |row| {
            Ok(Entry::new(row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn count_entries(&self, journal_uid: &str) -> Result<usize, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE journal_uid = ?1",
            params![journal_uid],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
