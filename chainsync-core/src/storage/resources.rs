// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! SQLite-backed local resource store.

use rusqlite::{params, OptionalExtension, Row};

use super::{now_secs, Storage, StorageError};
use crate::crypto::{decrypt, encrypt};
use crate::resource::{
    generate_uid, LocalId, LocalResource, LocalResourceStore, PushCommit, StoreError,
};

const RESOURCE_COLUMNS: &str = "local_id, uid, content_encrypted, dirty, deleted, remote_marker";

struct ResourceRow {
    local_id: i64,
    uid: Option<String>,
    content_encrypted: Vec<u8>,
    dirty: bool,
    deleted: bool,
    remote_marker: Option<String>,
}

impl ResourceRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(ResourceRow {
            local_id: row.get(0)?,
            uid: row.get(1)?,
            content_encrypted: row.get(2)?,
            dirty: row.get(3)?,
            deleted: row.get(4)?,
            remote_marker: row.get(5)?,
        })
    }
}

/// [`LocalResourceStore`] for one collection inside a [`Storage`] database.
///
/// Every write is a single statement or a single transaction, so a crash
/// leaves each resource and the cursor in a state the next sync can resume
/// from.
pub struct SqliteResourceStore<'a> {
    storage: &'a Storage,
    journal_uid: String,
}

impl<'a> SqliteResourceStore<'a> {
    pub fn new(storage: &'a Storage, journal_uid: &str) -> Self {
        SqliteResourceStore {
            storage,
            journal_uid: journal_uid.to_string(),
        }
    }

    fn to_resource(&self, row: ResourceRow) -> Result<LocalResource, StorageError> {
        let content = decrypt(&self.storage.encryption_key, &row.content_encrypted)?;
        Ok(LocalResource {
            local_id: row.local_id as LocalId,
            uid: row.uid,
            content,
            dirty: row.dirty,
            deleted: row.deleted,
            remote_marker: row.remote_marker,
        })
    }

    fn query(&self, filter: &str) -> Result<Vec<LocalResource>, StorageError> {
        let sql = format!(
            "SELECT {} FROM resources WHERE journal_uid = ?1 AND {} ORDER BY local_id",
            RESOURCE_COLUMNS, filter
        );
        let mut stmt = self.storage.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![self.journal_uid], ResourceRow::from_row)?;

        let mut resources = Vec::new();
        for row in rows {
            resources.push(self.to_resource(row?)?);
        }
        Ok(resources)
    }

    fn not_found(local_id: LocalId) -> StorageError {
        StorageError::NotFound(format!("local id {}", local_id))
    }

    /// Inserts a resource created by the local user. It starts dirty and
    /// without uid unless one is given.
    pub fn create_local(&self, uid: Option<&str>, content: &[u8]) -> Result<LocalId, StorageError> {
        let content_encrypted = encrypt(&self.storage.encryption_key, content)?;
        self.storage.conn.execute(
            "INSERT INTO resources (journal_uid, uid, content_encrypted, dirty, deleted)
             VALUES (?1, ?2, ?3, 1, 0)",
            params![self.journal_uid, uid, content_encrypted],
        )?;
        Ok(self.storage.conn.last_insert_rowid() as LocalId)
    }

    /// Replaces the content of a resource and marks it dirty.
    pub fn update_local(&self, local_id: LocalId, content: &[u8]) -> Result<(), StorageError> {
        let content_encrypted = encrypt(&self.storage.encryption_key, content)?;
        let updated = self.storage.conn.execute(
            "UPDATE resources SET content_encrypted = ?1, dirty = 1
             WHERE local_id = ?2 AND journal_uid = ?3",
            params![content_encrypted, local_id as i64, self.journal_uid],
        )?;
        if updated == 0 {
            return Err(Self::not_found(local_id));
        }
        Ok(())
    }

    /// Flags a resource as deleted by the local user.
    pub fn delete_local(&self, local_id: LocalId) -> Result<(), StorageError> {
        let updated = self.storage.conn.execute(
            "UPDATE resources SET deleted = 1 WHERE local_id = ?1 AND journal_uid = ?2",
            params![local_id as i64, self.journal_uid],
        )?;
        if updated == 0 {
            return Err(Self::not_found(local_id));
        }
        Ok(())
    }

    /// Resources not flagged deleted.
    pub fn list_live(&self) -> Result<Vec<LocalResource>, StorageError> {
        self.query("deleted = 0")
    }

    /// Member uids recorded for a contact group.
    pub fn group_members(&self, group_uid: &str) -> Result<Vec<String>, StorageError> {
        let mut stmt = self.storage.conn.prepare(
            "SELECT member_uid FROM group_members
             WHERE journal_uid = ?1 AND group_uid = ?2 ORDER BY member_uid",
        )?;
        let rows = stmt.query_map(params![self.journal_uid, group_uid], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<String>, _>>()?)
    }
}

impl LocalResourceStore for SqliteResourceStore<'_> {
    fn list_deleted(&self) -> Result<Vec<LocalResource>, StoreError> {
        Ok(self.query("deleted = 1")?)
    }

    fn list_dirty(&self) -> Result<Vec<LocalResource>, StoreError> {
        Ok(self.query("dirty = 1 AND deleted = 0")?)
    }

    fn get_by_uid(&self, uid: &str) -> Result<Option<LocalResource>, StoreError> {
        let sql = format!(
            "SELECT {} FROM resources WHERE journal_uid = ?1 AND uid = ?2",
            RESOURCE_COLUMNS
        );
        let row = self
            .storage
            .conn
            .query_row(&sql, params![self.journal_uid, uid], ResourceRow::from_row)
            .optional()
            .map_err(StorageError::from)?;

        match row {
            Some(row) => Ok(Some(self.to_resource(row)?)),
            None => Ok(None),
        }
    }

    fn assign_uid_if_missing(&mut self, local_id: LocalId) -> Result<String, StoreError> {
        let existing: Option<Option<String>> = self
            .storage
            .conn
            .query_row(
                "SELECT uid FROM resources WHERE local_id = ?1 AND journal_uid = ?2",
                params![local_id as i64, self.journal_uid],
                |row| row.get(0),
            )
            .optional()
            .map_err(StorageError::from)?;

        match existing {
            None => Err(Self::not_found(local_id).into()),
            Some(Some(uid)) => Ok(uid),
            Some(None) => {
                let uid = generate_uid();
                self.storage
                    .conn
                    .execute(
                        "UPDATE resources SET uid = ?1 WHERE local_id = ?2",
                        params![uid, local_id as i64],
                    )
                    .map_err(StorageError::from)?;
                Ok(uid)
            }
        }
    }

    fn clear_dirty(&mut self, local_id: LocalId, remote_marker: &str) -> Result<(), StoreError> {
        let updated = self
            .storage
            .conn
            .execute(
                "UPDATE resources SET dirty = 0, remote_marker = ?1
                 WHERE local_id = ?2 AND journal_uid = ?3",
                params![remote_marker, local_id as i64, self.journal_uid],
            )
            .map_err(StorageError::from)?;
        if updated == 0 {
            return Err(Self::not_found(local_id).into());
        }
        Ok(())
    }

    fn delete(&mut self, local_id: LocalId) -> Result<(), StoreError> {
        self.storage
            .conn
            .execute(
                "DELETE FROM resources WHERE local_id = ?1 AND journal_uid = ?2",
                params![local_id as i64, self.journal_uid],
            )
            .map_err(StorageError::from)?;
        Ok(())
    }

    fn save_remote(
        &mut self,
        uid: &str,
        content: &[u8],
        remote_marker: &str,
    ) -> Result<(), StoreError> {
        let content_encrypted = encrypt(&self.storage.encryption_key, content)
            .map_err(StorageError::from)?;
        self.storage
            .conn
            .execute(
                "INSERT INTO resources
                 (journal_uid, uid, content_encrypted, dirty, deleted, remote_marker)
                 VALUES (?1, ?2, ?3, 0, 0, ?4)
                 ON CONFLICT(journal_uid, uid) DO UPDATE SET
                    content_encrypted = excluded.content_encrypted,
                    dirty = 0,
                    deleted = 0,
                    remote_marker = excluded.remote_marker",
                params![self.journal_uid, uid, content_encrypted, remote_marker],
            )
            .map_err(StorageError::from)?;
        Ok(())
    }

    fn cursor(&self) -> Result<Option<String>, StoreError> {
        let cursor = self
            .storage
            .conn
            .query_row(
                "SELECT last_uid FROM sync_cursors WHERE journal_uid = ?1",
                params![self.journal_uid],
                |row| row.get(0),
            )
            .optional()
            .map_err(StorageError::from)?;
        Ok(cursor)
    }

    fn set_cursor(&mut self, uid: &str) -> Result<(), StoreError> {
        write_cursor(&self.storage.conn, &self.journal_uid, uid).map_err(StorageError::from)?;
        Ok(())
    }

    fn commit_push(&mut self, commit: &PushCommit) -> Result<(), StoreError> {
        let tx = self
            .storage
            .conn
            .unchecked_transaction()
            .map_err(StorageError::from)?;

        for (local_id, marker) in &commit.cleared {
            let updated = tx
                .execute(
                    "UPDATE resources SET dirty = 0, remote_marker = ?1
                     WHERE local_id = ?2 AND journal_uid = ?3",
                    params![marker, *local_id as i64, self.journal_uid],
                )
                .map_err(StorageError::from)?;
            if updated == 0 {
                // Dropping the transaction rolls back the whole commit.
                return Err(Self::not_found(*local_id).into());
            }
        }
        for local_id in &commit.purged {
            tx.execute(
                "DELETE FROM resources WHERE local_id = ?1 AND journal_uid = ?2",
                params![*local_id as i64, self.journal_uid],
            )
            .map_err(StorageError::from)?;
        }
        write_cursor(&tx, &self.journal_uid, &commit.cursor).map_err(StorageError::from)?;

        tx.commit().map_err(StorageError::from)?;
        Ok(())
    }

    fn set_group_members(
        &mut self,
        group_uid: &str,
        member_uids: &[String],
    ) -> Result<(), StoreError> {
        let tx = self
            .storage
            .conn
            .unchecked_transaction()
            .map_err(StorageError::from)?;
        tx.execute(
            "DELETE FROM group_members WHERE journal_uid = ?1 AND group_uid = ?2",
            params![self.journal_uid, group_uid],
        )
        .map_err(StorageError::from)?;
        for member in member_uids {
            tx.execute(
                "INSERT OR IGNORE INTO group_members (journal_uid, group_uid, member_uid)
                 VALUES (?1, ?2, ?3)",
                params![self.journal_uid, group_uid, member],
            )
            .map_err(StorageError::from)?;
        }
        tx.commit().map_err(StorageError::from)?;
        Ok(())
    }
}

fn write_cursor(conn: &rusqlite::Connection, journal_uid: &str, uid: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO sync_cursors (journal_uid, last_uid, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(journal_uid) DO UPDATE SET
            last_uid = excluded.last_uid,
            updated_at = excluded.updated_at",
        params![journal_uid, uid, now_secs()],
    )?;
    Ok(())
}
