// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Journal (collection) storage operations.

use rusqlite::{params, Row};

use super::{Storage, StorageError};
use crate::model::{CollectionInfo, Journal};

const JOURNAL_COLUMNS: &str =
    "uid, version, owner, info_json, read_only, selected, deleted, encrypted_key";

/// Internal struct for database row data.
struct JournalRow {
    uid: String,
    version: u8,
    owner: String,
    info_json: String,
    read_only: bool,
    selected: bool,
    deleted: bool,
    encrypted_key: Option<Vec<u8>>,
}

impl JournalRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(JournalRow {
            uid: row.get(0)?,
            version: row.get(1)?,
            owner: row.get(2)?,
            info_json: row.get(3)?,
            read_only: row.get(4)?,
            selected: row.get(5)?,
            deleted: row.get(6)?,
            encrypted_key: row.get(7)?,
        })
    }

    fn into_journal(self) -> Result<Journal, StorageError> {
        let info: CollectionInfo = serde_json::from_str(&self.info_json)?;
        Ok(Journal {
            uid: self.uid,
            version: self.version,
            owner: self.owner,
            info,
            read_only: self.read_only,
            selected: self.selected,
            deleted: self.deleted,
            encrypted_key: self.encrypted_key,
        })
    }
}

impl Storage {
    // === Journal Operations ===

    /// Inserts or replaces a journal record.
    pub fn save_journal(&self, journal: &Journal) -> Result<(), StorageError> {
        let info_json = serde_json::to_string(&journal.info)?;
        self.conn.execute(
            "INSERT INTO journals
             (uid, version, owner, info_json, read_only, selected, deleted, encrypted_key)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(uid) DO UPDATE SET
                version = excluded.version,
                owner = excluded.owner,
                info_json = excluded.info_json,
                read_only = excluded.read_only,
                selected = excluded.selected,
                deleted = excluded.deleted,
                encrypted_key = excluded.encrypted_key",
            params![
                journal.uid,
                journal.version,
                journal.owner,
                info_json,
                journal.read_only,
                journal.selected,
                journal.deleted,
                journal.encrypted_key,
            ],
        )?;
        Ok(())
    }

    /// Loads a journal by uid.
    pub fn load_journal(&self, uid: &str) -> Result<Option<Journal>, StorageError> {
        let sql = format!("SELECT {} FROM journals WHERE uid = ?1", JOURNAL_COLUMNS);
        let result = self.conn.query_row(&sql, params![uid], JournalRow::from_row);

        match result {
            Ok(row) => Ok(Some(row.into_journal()?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::Database(e)),
        }
    }

    /// Lists journals, optionally including soft-deleted ones.
    pub fn list_journals(&self, include_deleted: bool) -> Result<Vec<Journal>, StorageError> {
        let sql = format!(
            "SELECT {} FROM journals WHERE deleted = 0 OR ?1 ORDER BY uid",
            JOURNAL_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![include_deleted], JournalRow::from_row)?;

        let mut journals = Vec::new();
        for row in rows {
            journals.push(row?.into_journal()?);
        }
        Ok(journals)
    }

    /// Soft-deletes a journal. Its resources and cache stay until purged.
    pub fn mark_journal_deleted(&self, uid: &str) -> Result<(), StorageError> {
        let updated = self
            .conn
            .execute("UPDATE journals SET deleted = 1 WHERE uid = ?1", params![uid])?;
        if updated == 0 {
            return Err(StorageError::NotFound(format!("journal {}", uid)));
        }
        Ok(())
    }

    pub fn set_journal_selected(&self, uid: &str, selected: bool) -> Result<(), StorageError> {
        let updated = self.conn.execute(
            "UPDATE journals SET selected = ?1 WHERE uid = ?2",
            params![selected, uid],
        )?;
        if updated == 0 {
            return Err(StorageError::NotFound(format!("journal {}", uid)));
        }
        Ok(())
    }

    /// Removes a journal together with its cache, resources and cursor.
    pub fn purge_journal(&self, uid: &str) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM entries WHERE journal_uid = ?1", params![uid])?;
        tx.execute("DELETE FROM resources WHERE journal_uid = ?1", params![uid])?;
        tx.execute("DELETE FROM sync_cursors WHERE journal_uid = ?1", params![uid])?;
        tx.execute("DELETE FROM group_members WHERE journal_uid = ?1", params![uid])?;
        tx.execute("DELETE FROM in_flight_pushes WHERE journal_uid = ?1", params![uid])?;
        tx.execute("DELETE FROM journals WHERE uid = ?1", params![uid])?;
        tx.commit()?;
        Ok(())
    }
}
