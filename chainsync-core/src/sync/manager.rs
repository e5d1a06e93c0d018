// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync Manager
//!
//! Reconciles one collection's local store with its remote journal:
//!
//! 1. **Prepare**: preconditions, journal key, cursor
//! 2. **PrepareLocal**: purge never-uploaded deletions, queue local changes
//! 3. **Fetch**: page through new entries, verify the chain, apply each one
//! 4. **Push**: chain local changes onto the tail and append them in batches
//! 5. **PostProcess**: adapter finalization
//!
//! The cursor moves after every applied entry and after every pushed batch,
//! so a sync that fails or is cancelled resumes where it stopped. A push is
//! recorded before it is sent; if the server took it but the local commit
//! never ran, the next Fetch recognises the entries and commits them instead
//! of pushing the same changes again.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::cancel::CancellationToken;
use super::config::{AlwaysAllowed, NetworkPolicy, SyncConfig};
use super::error::SyncError;
use super::events::{EventDispatcher, SyncEvent};
use super::local::{collect_local_changes, PendingChange};
use super::outcome::{SkipReason, SyncOutcome, SyncPhase, SyncStats};
use crate::account::AccountCredentials;
use crate::adapters::{adapter_for, Applied, ResourceAdapter};
use crate::chain::{ChainCodec, ChainError, Entry};
use crate::crypto::CryptoManager;
use crate::model::{Journal, SyncEntry};
use crate::remote::{JournalClient, RemoteError};
use crate::resource::{InFlightPush, LocalId, LocalResourceStore, PushCommit};
use crate::storage::Storage;

/// Per-run state established by the Prepare phase.
struct JournalState {
    journal: Journal,
    crypto: CryptoManager,
    cursor: Option<String>,
    /// Push of an earlier run still waiting for its local commit.
    in_flight: Option<InFlightPush>,
    /// Resources whose pending change was committed by recovering `in_flight`.
    recovered: HashSet<LocalId>,
}

enum Prepared {
    Ready(JournalState),
    Skip(SkipReason),
}

/// Runs syncs for the journals of one account.
///
/// One manager may sync several journals, one after the other. Running two
/// syncs of the same journal at the same time is not supported.
pub struct SyncManager<'a> {
    storage: &'a Storage,
    client: &'a dyn JournalClient,
    credentials: &'a dyn AccountCredentials,
    config: SyncConfig,
    network: Box<dyn NetworkPolicy>,
    events: Arc<EventDispatcher>,
    cancel: CancellationToken,
}

impl<'a> SyncManager<'a> {
    pub fn new(
        storage: &'a Storage,
        client: &'a dyn JournalClient,
        credentials: &'a dyn AccountCredentials,
        config: SyncConfig,
    ) -> Self {
        SyncManager {
            storage,
            client,
            credentials,
            config,
            network: Box::new(AlwaysAllowed),
            events: Arc::new(EventDispatcher::new()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_events(mut self, events: Arc<EventDispatcher>) -> Self {
        self.events = events;
        self
    }

    pub fn with_network_policy(mut self, policy: impl NetworkPolicy + 'static) -> Self {
        self.network = Box::new(policy);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels the running sync when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Syncs a journal with the adapter matching its collection type.
    pub fn sync(&self, journal_uid: &str, store: &mut dyn LocalResourceStore) -> SyncOutcome {
        if let Some(reason) = self.skip_reason() {
            return self.finish(journal_uid, SyncOutcome::Skipped(reason));
        }

        let mut adapter = match self.storage.load_journal(journal_uid) {
            Ok(Some(journal)) => adapter_for(journal.info.col_type),
            Ok(None) => {
                let error = SyncError::JournalNotFound(journal_uid.to_string());
                return self.finish(journal_uid, self.failed(journal_uid, error, SyncStats::default()));
            }
            Err(e) => {
                return self.finish(journal_uid, self.failed(journal_uid, e.into(), SyncStats::default()));
            }
        };

        self.sync_with_adapter(journal_uid, store, adapter.as_mut())
    }

    /// Syncs a journal with a caller-provided adapter.
    pub fn sync_with_adapter(
        &self,
        journal_uid: &str,
        store: &mut dyn LocalResourceStore,
        adapter: &mut dyn ResourceAdapter,
    ) -> SyncOutcome {
        let mut stats = SyncStats::default();

        let outcome = match self.run(journal_uid, store, adapter, &mut stats) {
            Ok(None) => SyncOutcome::Completed(stats),
            Ok(Some(reason)) => SyncOutcome::Skipped(reason),
            Err(SyncError::Cancelled) => {
                info!(journal = %journal_uid, "sync cancelled");
                SyncOutcome::Cancelled(stats)
            }
            Err(e) => self.failed(journal_uid, e, stats),
        };

        self.finish(journal_uid, outcome)
    }

    fn failed(&self, journal_uid: &str, error: SyncError, stats: SyncStats) -> SyncOutcome {
        warn!(journal = %journal_uid, error = %error, "sync failed");
        SyncOutcome::Failed { error, stats }
    }

    fn finish(&self, journal_uid: &str, outcome: SyncOutcome) -> SyncOutcome {
        if let SyncOutcome::Completed(stats) = &outcome {
            info!(
                journal = %journal_uid,
                fetched = stats.fetched,
                pushed = stats.pushed,
                purged = stats.purged,
                "sync completed"
            );
        }
        self.events.dispatch(SyncEvent::Finished {
            journal_uid: journal_uid.to_string(),
            outcome: outcome.clone(),
        });
        outcome
    }

    fn skip_reason(&self) -> Option<SkipReason> {
        if !self.config.sync_enabled {
            Some(SkipReason::SyncDisabled)
        } else if !self.network.is_sync_allowed() {
            Some(SkipReason::NetworkNotAllowed)
        } else {
            None
        }
    }

    fn enter(&self, journal_uid: &str, phase: SyncPhase) -> Result<(), SyncError> {
        self.checkpoint()?;
        debug!(journal = %journal_uid, phase = %phase, "entering phase");
        self.events.dispatch(SyncEvent::PhaseChanged {
            journal_uid: journal_uid.to_string(),
            phase,
        });
        Ok(())
    }

    fn checkpoint(&self) -> Result<(), SyncError> {
        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        Ok(())
    }

    /// Runs all phases. `Ok(Some(_))` means a precondition skipped the sync.
    fn run(
        &self,
        journal_uid: &str,
        store: &mut dyn LocalResourceStore,
        adapter: &mut dyn ResourceAdapter,
        stats: &mut SyncStats,
    ) -> Result<Option<SkipReason>, SyncError> {
        self.enter(journal_uid, SyncPhase::Prepare)?;
        let mut state = match self.prepare(journal_uid, store)? {
            Prepared::Ready(state) => state,
            Prepared::Skip(reason) => {
                info!(journal = %journal_uid, reason = ?reason, "sync skipped");
                return Ok(Some(reason));
            }
        };

        self.enter(journal_uid, SyncPhase::PrepareLocal)?;
        let local = collect_local_changes(store, adapter, &self.cancel)?;
        stats.purged += local.purged;
        debug!(
            journal = %journal_uid,
            pending = local.pending.len(),
            purged = local.purged,
            "local changes collected"
        );

        self.enter(journal_uid, SyncPhase::Fetch)?;
        self.fetch_and_apply(&mut state, store, adapter, &local.pending, stats)?;
        let pending: Vec<PendingChange> = local
            .pending
            .into_iter()
            .filter(|change| !state.recovered.contains(&change.local_id))
            .collect();

        self.enter(journal_uid, SyncPhase::Push)?;
        self.push(&mut state, store, adapter, &pending, stats)?;

        self.enter(journal_uid, SyncPhase::PostProcess)?;
        adapter.post_process(store)?;

        Ok(None)
    }

    fn prepare(
        &self,
        journal_uid: &str,
        store: &mut dyn LocalResourceStore,
    ) -> Result<Prepared, SyncError> {
        if let Some(reason) = self.skip_reason() {
            return Ok(Prepared::Skip(reason));
        }

        let journal = self
            .storage
            .load_journal(journal_uid)?
            .ok_or_else(|| SyncError::JournalNotFound(journal_uid.to_string()))?;
        if journal.deleted {
            return Ok(Prepared::Skip(SkipReason::JournalDeleted));
        }
        if !journal.selected {
            return Ok(Prepared::Skip(SkipReason::NotSelected));
        }

        let crypto = journal.crypto(self.credentials)?;
        let cursor = store.cursor()?;
        self.check_entry_cache(&journal, &crypto, cursor.as_deref())?;
        let in_flight = self.storage.load_in_flight_push(journal_uid)?;
        debug!(
            journal = %journal_uid,
            cursor = ?cursor,
            version = journal.version,
            in_flight = in_flight.is_some(),
            "prepared"
        );

        Ok(Prepared::Ready(JournalState {
            journal,
            crypto,
            cursor,
            in_flight,
            recovered: HashSet::new(),
        }))
    }

    /// Replays the cached chain. A cache that no longer verifies means the
    /// local database was altered, and nothing synced on top of it is safe.
    fn check_entry_cache(
        &self,
        journal: &Journal,
        crypto: &CryptoManager,
        cursor: Option<&str>,
    ) -> Result<(), SyncError> {
        let cached = self.storage.list_entries(&journal.uid)?;
        let tail = ChainCodec::new(crypto)
            .verify_chain(&cached, None)
            .inspect_err(|e| {
                if let ChainError::Integrity { uid, reason } = e {
                    error!(journal = %journal.uid, uid = %uid, reason = %reason, "entry cache integrity violation");
                }
            })?;

        if let Some(cursor) = cursor {
            if !cached.iter().any(|entry| entry.uid() == cursor) {
                warn!(
                    journal = %journal.uid,
                    cursor = %cursor,
                    cached_tail = ?tail,
                    "cursor is not on the cached chain"
                );
            }
        }
        Ok(())
    }

    /// Applies remote entries after the cursor, page by page.
    ///
    /// `pending` are the local changes collected for this run; they decide
    /// which part of an earlier in-flight push can still be committed.
    fn fetch_and_apply(
        &self,
        state: &mut JournalState,
        store: &mut dyn LocalResourceStore,
        adapter: &mut dyn ResourceAdapter,
        pending: &[PendingChange],
        stats: &mut SyncStats,
    ) -> Result<(), SyncError> {
        let page_size = self.config.page_size.max(1);

        loop {
            self.checkpoint()?;
            let page = self.client.list_entries(
                &state.journal.uid,
                state.cursor.as_deref(),
                page_size,
            )?;
            debug!(journal = %state.journal.uid, count = page.len(), "fetched page");

            for entry in &page {
                self.checkpoint()?;
                if !self.recover_pushed_entry(state, store, entry, pending, stats)? {
                    self.apply_entry(state, store, adapter, entry, stats)?;
                }
            }

            if page.len() < page_size {
                break;
            }
        }

        if let Some(in_flight) = state.in_flight.take() {
            debug!(
                journal = %state.journal.uid,
                entries = in_flight.entry_uids.len(),
                "earlier push never reached the journal"
            );
            self.storage.clear_in_flight_push(&state.journal.uid)?;
        }
        Ok(())
    }

    /// Takes over an entry this device pushed in an earlier run whose local
    /// commit did not happen. Returns false if `entry` is not one of them.
    fn recover_pushed_entry(
        &self,
        state: &mut JournalState,
        store: &mut dyn LocalResourceStore,
        entry: &Entry,
        pending: &[PendingChange],
        stats: &mut SyncStats,
    ) -> Result<bool, SyncError> {
        let Some(in_flight) = state.in_flight.clone() else {
            return Ok(false);
        };
        if !in_flight.contains(entry.uid()) {
            // Another entry holds the position, so the push was never accepted.
            debug!(journal = %state.journal.uid, "earlier push was not accepted");
            self.storage.clear_in_flight_push(&state.journal.uid)?;
            state.in_flight = None;
            return Ok(false);
        }

        ChainCodec::new(&state.crypto)
            .verify(entry, state.cursor.as_deref())
            .inspect_err(|e| {
                if let ChainError::Integrity { uid, reason } = e {
                    error!(journal = %state.journal.uid, uid = %uid, reason = %reason, "journal integrity violation");
                }
            })?;
        self.storage.append_entry(&state.journal.uid, entry)?;
        state.cursor = Some(entry.uid().to_string());
        stats.fetched += 1;

        if in_flight.is_last(entry.uid()) {
            let commit = recoverable_commit(&in_flight, pending);
            store.commit_push(&commit)?;
            self.storage.clear_in_flight_push(&state.journal.uid)?;
            state.in_flight = None;

            let committed: Vec<LocalId> = commit
                .cleared
                .iter()
                .map(|(local_id, _)| *local_id)
                .chain(commit.purged.iter().copied())
                .collect();
            info!(
                journal = %state.journal.uid,
                entries = in_flight.entry_uids.len(),
                committed = committed.len(),
                "committed push from an earlier run"
            );
            state.recovered.extend(committed);
        }
        Ok(true)
    }

    fn apply_entry(
        &self,
        state: &mut JournalState,
        store: &mut dyn LocalResourceStore,
        adapter: &mut dyn ResourceAdapter,
        entry: &Entry,
        stats: &mut SyncStats,
    ) -> Result<(), SyncError> {
        let codec = ChainCodec::new(&state.crypto);
        let plaintext = codec
            .open(entry, state.cursor.as_deref())
            .inspect_err(|e| {
                if let ChainError::Integrity { uid, reason } = e {
                    error!(journal = %state.journal.uid, uid = %uid, reason = %reason, "journal integrity violation");
                }
            })?;

        let sync_entry = SyncEntry::from_json(&plaintext)?;
        let record = adapter.decode(&sync_entry.content)?;
        let applied = adapter.apply(store, sync_entry.action, &record, entry.uid())?;
        debug!(uid = %entry.uid(), action = %sync_entry.action, applied = ?applied, "applied entry");

        match applied {
            Applied::Created => stats.added += 1,
            Applied::Updated => stats.changed += 1,
            Applied::Deleted => stats.deleted += 1,
            Applied::Skipped => stats.skipped += 1,
        }
        stats.fetched += 1;

        self.storage.append_entry(&state.journal.uid, entry)?;
        store.set_cursor(entry.uid())?;
        state.cursor = Some(entry.uid().to_string());
        self.events.dispatch(SyncEvent::EntryApplied {
            journal_uid: state.journal.uid.clone(),
            uid: entry.uid().to_string(),
        });
        Ok(())
    }

    /// Pushes local changes in batches on top of the current cursor.
    fn push(
        &self,
        state: &mut JournalState,
        store: &mut dyn LocalResourceStore,
        adapter: &mut dyn ResourceAdapter,
        pending: &[PendingChange],
        stats: &mut SyncStats,
    ) -> Result<(), SyncError> {
        if pending.is_empty() {
            return Ok(());
        }
        if state.journal.read_only {
            warn!(
                journal = %state.journal.uid,
                pending = pending.len(),
                "journal is read-only, local changes not pushed"
            );
            return Ok(());
        }

        let batch_size = self.config.push_batch_size.max(1);
        let mut remaining = pending;
        let mut conflicts = 0;

        while !remaining.is_empty() {
            self.checkpoint()?;
            let batch = &remaining[..remaining.len().min(batch_size)];
            let (entries, in_flight) =
                build_batch(&state.crypto, state.cursor.as_deref(), batch)?;
            self.storage
                .save_in_flight_push(&state.journal.uid, &in_flight)?;

            let pushed = self.client.push_entries(
                &state.journal.uid,
                &entries,
                state.cursor.as_deref(),
            );
            match pushed {
                Ok(()) => {
                    for entry in &entries {
                        self.storage.append_entry(&state.journal.uid, entry)?;
                    }
                    store.commit_push(&in_flight.commit)?;
                    self.storage.clear_in_flight_push(&state.journal.uid)?;
                    state.cursor = Some(in_flight.commit.cursor);
                    stats.pushed += batch.len();
                    remaining = &remaining[batch.len()..];

                    debug!(journal = %state.journal.uid, count = batch.len(), "pushed batch");
                    self.events.dispatch(SyncEvent::EntriesPushed {
                        journal_uid: state.journal.uid.clone(),
                        count: batch.len(),
                    });
                }
                Err(RemoteError::Conflict) if conflicts < self.config.max_conflict_retries => {
                    self.storage.clear_in_flight_push(&state.journal.uid)?;
                    conflicts += 1;
                    stats.conflicts += 1;
                    warn!(
                        journal = %state.journal.uid,
                        attempt = conflicts,
                        "journal moved while pushing, fetching before retry"
                    );
                    self.fetch_and_apply(state, store, adapter, remaining, stats)?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }
}

/// Chains a batch of local changes after `cursor`.
///
/// Each entry is paired with the resource it came from, so that exactly those
/// resources are cleared (or purged, for deletions) once the push succeeds.
fn build_batch(
    crypto: &CryptoManager,
    cursor: Option<&str>,
    batch: &[PendingChange],
) -> Result<(Vec<Entry>, InFlightPush), SyncError> {
    let codec = ChainCodec::new(crypto);
    let mut entries = Vec::with_capacity(batch.len());
    let mut commit = PushCommit::default();
    let mut digests = Vec::with_capacity(batch.len());
    let mut previous = cursor.map(str::to_string);

    for change in batch {
        digests.push((change.local_id, change.digest()));
        let payload = SyncEntry::new(change.action, change.content.as_str()).to_json()?;
        let entry = codec.build(previous.as_deref(), &payload)?;

        if change.is_deletion() {
            commit.purged.push(change.local_id);
        } else {
            commit
                .cleared
                .push((change.local_id, entry.uid().to_string()));
        }
        previous = Some(entry.uid().to_string());
        entries.push(entry);
    }

    commit.cursor = previous.unwrap_or_default();
    let in_flight = InFlightPush {
        entry_uids: entries.iter().map(|e| e.uid().to_string()).collect(),
        commit,
        digests,
    };
    Ok((entries, in_flight))
}

/// The part of an earlier push's commit that still matches local state.
///
/// Resources edited or removed since keep their pending change and go out
/// again as a new entry.
fn recoverable_commit(in_flight: &InFlightPush, pending: &[PendingChange]) -> PushCommit {
    let unchanged = |local_id: LocalId| {
        pending.iter().any(|change| {
            change.local_id == local_id
                && in_flight.digest_of(local_id) == Some(change.digest().as_str())
        })
    };

    PushCommit {
        cursor: in_flight.commit.cursor.clone(),
        cleared: in_flight
            .commit
            .cleared
            .iter()
            .filter(|(local_id, _)| unchanged(*local_id))
            .cloned()
            .collect(),
        purged: in_flight
            .commit
            .purged
            .iter()
            .copied()
            .filter(|local_id| unchanged(*local_id))
            .collect(),
    }
}
