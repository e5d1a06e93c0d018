// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-flight push records, at most one per journal.

use rusqlite::params;

use super::{now_secs, Storage, StorageError};
use crate::resource::InFlightPush;

impl Storage {
    /// Records a push about to be sent, replacing any earlier record.
    pub fn save_in_flight_push(
        &self,
        journal_uid: &str,
        push: &InFlightPush,
    ) -> Result<(), StorageError> {
        let push_json = serde_json::to_string(push)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO in_flight_pushes (journal_uid, push_json, created_at)
             VALUES (?1, ?2, ?3)",
            params![journal_uid, push_json, now_secs()],
        )?;
        Ok(())
    }

    pub fn load_in_flight_push(
        &self,
        journal_uid: &str,
    ) -> Result<Option<InFlightPush>, StorageError> {
        let result = self.conn.query_row(
            "SELECT push_json FROM in_flight_pushes WHERE journal_uid = ?1",
            params![journal_uid],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::Database(e)),
        }
    }

    pub fn clear_in_flight_push(&self, journal_uid: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "DELETE FROM in_flight_pushes WHERE journal_uid = ?1",
            params![journal_uid],
        )?;
        Ok(())
    }
}
