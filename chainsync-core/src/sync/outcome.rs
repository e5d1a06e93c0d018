// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync results.

use std::fmt;

use super::error::SyncError;

/// Phases of one sync run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Prepare,
    PrepareLocal,
    Fetch,
    Push,
    PostProcess,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncPhase::Prepare => "prepare",
            SyncPhase::PrepareLocal => "prepare-local",
            SyncPhase::Fetch => "fetch",
            SyncPhase::Push => "push",
            SyncPhase::PostProcess => "post-process",
        };
        f.write_str(s)
    }
}

/// Counters for one sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Remote entries verified and applied (or skipped).
    pub fetched: usize,
    /// Resources created locally from remote entries.
    pub added: usize,
    /// Resources updated locally from remote entries.
    pub changed: usize,
    /// Resources deleted locally because of remote entries.
    pub deleted: usize,
    /// Remote entries not applied because the local copy had unsynced edits.
    pub skipped: usize,
    /// Local changes pushed as entries.
    pub pushed: usize,
    /// Local deletions of never-uploaded resources, dropped without network.
    pub purged: usize,
    /// Pushes retried after the journal moved underneath us.
    pub conflicts: usize,
}

impl SyncStats {
    /// True when the run changed anything locally or remotely.
    pub fn has_changes(&self) -> bool {
        self.added + self.changed + self.deleted + self.pushed + self.purged > 0
    }
}

/// Why a sync did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    SyncDisabled,
    NetworkNotAllowed,
    NotSelected,
    JournalDeleted,
}

/// Final result of a sync, reported once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed(SyncStats),
    Skipped(SkipReason),
    /// Stopped by the cancellation token; work done so far is kept.
    Cancelled(SyncStats),
    /// Stopped by an error; work committed before it is kept.
    Failed { error: SyncError, stats: SyncStats },
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Completed(_))
    }

    pub fn stats(&self) -> Option<&SyncStats> {
        match self {
            SyncOutcome::Completed(stats)
            | SyncOutcome::Cancelled(stats)
            | SyncOutcome::Failed { stats, .. } => Some(stats),
            SyncOutcome::Skipped(_) => None,
        }
    }

    pub fn error(&self) -> Option<&SyncError> {
        match self {
            SyncOutcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}
