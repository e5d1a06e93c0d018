// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync configuration.

/// Entries fetched per `list_entries` call.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Entries sent per `push_entries` call.
pub const DEFAULT_PUSH_BATCH_SIZE: usize = 30;

/// Sync configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Master switch; when off every sync is skipped.
    pub sync_enabled: bool,

    /// Entries requested per fetch page.
    pub page_size: usize,

    /// Entries pushed per batch.
    pub push_batch_size: usize,

    /// How often a push rejected for a moved journal tail is retried
    /// (after fetching the new entries) before giving up.
    pub max_conflict_retries: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            sync_enabled: true,
            page_size: DEFAULT_PAGE_SIZE,
            push_batch_size: DEFAULT_PUSH_BATCH_SIZE,
            max_conflict_retries: 3,
        }
    }
}

impl SyncConfig {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_push_batch_size(mut self, batch_size: usize) -> Self {
        self.push_batch_size = batch_size.max(1);
        self
    }

    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    /// Disables syncing altogether.
    pub fn disabled(mut self) -> Self {
        self.sync_enabled = false;
        self
    }
}

/// Decides whether the network may be used right now (metered connection,
/// data saver, airplane mode and so on are the host's business).
pub trait NetworkPolicy: Send + Sync {
    fn is_sync_allowed(&self) -> bool;
}

/// Policy that never blocks a sync.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysAllowed;

impl NetworkPolicy for AlwaysAllowed {
    fn is_sync_allowed(&self) -> bool {
        true
    }
}

impl<F> NetworkPolicy for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_sync_allowed(&self) -> bool {
        self()
    }
}
