// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync Engine Module
//!
//! Reconciles local collections with their encrypted remote journals.
//! Handles pagination, cursor persistence, push conflicts and cancellation.

mod cancel;
mod config;
mod error;
mod events;
mod local;
mod manager;
mod outcome;

pub use cancel::CancellationToken;
pub use config::{
    AlwaysAllowed, NetworkPolicy, SyncConfig, DEFAULT_PAGE_SIZE, DEFAULT_PUSH_BATCH_SIZE,
};
pub use error::{Recovery, SyncError};
pub use events::{CallbackHandler, EventDispatcher, EventHandler, SyncEvent};
pub use local::{collect_local_changes, infer_action, LocalChanges, PendingChange};
pub use manager::SyncManager;
pub use outcome::{SkipReason, SyncOutcome, SyncPhase, SyncStats};
