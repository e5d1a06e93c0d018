// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Event System
//!
//! Callbacks for sync progress and results.

use std::sync::Arc;

use super::outcome::{SyncOutcome, SyncPhase};

/// Events emitted while syncing a journal.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// A sync entered a new phase.
    PhaseChanged {
        journal_uid: String,
        phase: SyncPhase,
    },

    /// A remote entry was applied and the cursor moved past it.
    EntryApplied { journal_uid: String, uid: String },

    /// A batch of local changes reached the journal.
    EntriesPushed { journal_uid: String, count: usize },

    /// A sync finished. Sent exactly once per run.
    Finished {
        journal_uid: String,
        outcome: SyncOutcome,
    },
}

/// Event handler trait.
///
/// Implement this trait to receive sync events.
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: SyncEvent);
}

/// Simple callback-based event handler.
pub struct CallbackHandler<F>
where
    F: Fn(SyncEvent) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackHandler<F>
where
    F: Fn(SyncEvent) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        CallbackHandler { callback }
    }
}

impl<F> EventHandler for CallbackHandler<F>
where
    F: Fn(SyncEvent) + Send + Sync,
{
    fn on_event(&self, event: SyncEvent) {
        (self.callback)(event);
    }
}

/// Event dispatcher for managing multiple handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Dispatches an event to all handlers.
    pub fn dispatch(&self, event: SyncEvent) {
        for handler in &self.handlers {
            handler.on_event(event.clone());
        }
    }
}
