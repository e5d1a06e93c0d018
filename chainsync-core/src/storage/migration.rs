// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Database Schema Migrations
//!
//! Each migration has a version number, a name, and either SQL or a Rust
//! callback. Applied versions are tracked in `schema_version`; pending
//! migrations run in order inside one transaction, so a failing step leaves
//! the database at its previous version.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::crypto::SymmetricKey;

use super::StorageError;

/// A single schema migration step.
pub struct Migration {
    /// Monotonically increasing version number (starting at 1).
    pub version: u32,
    pub name: &'static str,
    pub action: MigrationAction,
}

/// The action a migration performs.
pub enum MigrationAction {
    Sql(&'static str),
    /// Data migration that needs the at-rest encryption key.
    Callback(fn(&Connection, &SymmetricKey) -> Result<(), StorageError>),
}

pub struct MigrationRunner;

impl MigrationRunner {
    /// Applies every migration newer than the current schema version.
    pub fn run(
        conn: &Connection,
        key: &SymmetricKey,
        migrations: &[Migration],
    ) -> Result<(), StorageError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            );",
        )?;

        let current = Self::current_version(conn)?;
        let pending: Vec<&Migration> = migrations.iter().filter(|m| m.version > current).collect();
        if pending.is_empty() {
            return Ok(());
        }

        if let Some(pair) = pending.windows(2).find(|w| w[0].version >= w[1].version) {
            return Err(StorageError::Migration(format!(
                "Migrations are not in order: v{} before v{}",
                pair[0].version, pair[1].version
            )));
        }

        // Dropped without commit on any early return, which rolls back.
        let tx = conn.unchecked_transaction()?;

        for migration in &pending {
            debug!(version = migration.version, name = migration.name, "applying migration");
            let result = match &migration.action {
                MigrationAction::Sql(sql) => tx.execute_batch(sql).map_err(StorageError::from),
                MigrationAction::Callback(cb) => cb(&tx, key),
            };
            result.map_err(|e| {
                StorageError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e
                ))
            })?;

            tx.execute(
                "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![migration.version, super::now_secs()],
            )?;
        }

        tx.commit()?;
        info!(
            from = current,
            to = pending.last().map(|m| m.version).unwrap_or(current),
            "database schema migrated"
        );
        Ok(())
    }

    /// Returns the current schema version, or 0 if no migrations have been applied.
    pub fn current_version(conn: &Connection) -> Result<u32, StorageError> {
        let table_exists: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )?;
        if !table_exists {
            return Ok(0);
        }

        let version: Option<u32> =
            conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })?;
        Ok(version.unwrap_or(0))
    }
}

/// Returns all registered migrations in version order.
///
/// New migrations are appended to the end of this list.
pub fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            name: "journals_and_entry_cache",
            action: MigrationAction::Sql(MIGRATION_V1_JOURNALS),
        },
        Migration {
            version: 2,
            name: "local_resources_and_cursors",
            action: MigrationAction::Sql(MIGRATION_V2_RESOURCES),
        },
        Migration {
            version: 3,
            name: "contact_group_members",
            action: MigrationAction::Sql(MIGRATION_V3_GROUP_MEMBERS),
        },
        Migration {
            version: 4,
            name: "in_flight_pushes",
            action: MigrationAction::Sql(MIGRATION_V4_IN_FLIGHT_PUSHES),
        },
    ]
}

/// Migration v1: collections and the verified entry cache.
const MIGRATION_V1_JOURNALS: &str = "
    CREATE TABLE IF NOT EXISTS journals (
        uid TEXT PRIMARY KEY,
        version INTEGER NOT NULL,
        owner TEXT NOT NULL,
        info_json TEXT NOT NULL,
        read_only INTEGER NOT NULL DEFAULT 0,
        selected INTEGER NOT NULL DEFAULT 1,
        deleted INTEGER NOT NULL DEFAULT 0,
        encrypted_key BLOB
    );

    CREATE TABLE IF NOT EXISTS entries (
        journal_uid TEXT NOT NULL REFERENCES journals(uid) ON DELETE CASCADE,
        seq INTEGER NOT NULL,
        uid TEXT NOT NULL,
        content BLOB NOT NULL,
        PRIMARY KEY (journal_uid, seq),
        UNIQUE (journal_uid, uid)
    );
";

/// Migration v2: local resources and per-collection sync cursors.
const MIGRATION_V2_RESOURCES: &str = "
    CREATE TABLE IF NOT EXISTS resources (
        local_id INTEGER PRIMARY KEY AUTOINCREMENT,
        journal_uid TEXT NOT NULL,
        uid TEXT,
        content_encrypted BLOB NOT NULL,
        dirty INTEGER NOT NULL DEFAULT 0,
        deleted INTEGER NOT NULL DEFAULT 0,
        remote_marker TEXT,
        UNIQUE (journal_uid, uid)
    );

    CREATE INDEX IF NOT EXISTS idx_resources_flags
        ON resources(journal_uid, dirty, deleted);

    CREATE TABLE IF NOT EXISTS sync_cursors (
        journal_uid TEXT PRIMARY KEY,
        last_uid TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    );
";

/// Migration v3: contact group membership resolved after a sync.
const MIGRATION_V3_GROUP_MEMBERS: &str = "
    CREATE TABLE IF NOT EXISTS group_members (
        journal_uid TEXT NOT NULL,
        group_uid TEXT NOT NULL,
        member_uid TEXT NOT NULL,
        PRIMARY KEY (journal_uid, group_uid, member_uid)
    );
";

/// Migration v4: pushes sent but not yet committed locally.
const MIGRATION_V4_IN_FLIGHT_PUSHES: &str = "
    CREATE TABLE IF NOT EXISTS in_flight_pushes (
        journal_uid TEXT PRIMARY KEY,
        push_json TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );
";
