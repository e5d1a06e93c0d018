// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-Memory Journal Server
//!
//! A [`JournalClient`] backed by process memory, enforcing the same
//! append-only and optimistic-concurrency rules as the real server. Used by
//! tests and by hosts that want to exercise the engine offline.
//!
//! Faults can be queued with [`MemoryJournalServer::inject_failure`], and
//! stored entries can be rewritten with [`MemoryJournalServer::tamper_entry`]
//! to simulate a malicious server.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use super::client::{JournalClient, RemoteJournal, RemoteResult};
use super::error::RemoteError;
use crate::chain::Entry;
use crate::model::{Member, UserInfo};

#[derive(Default)]
struct ServerState {
    journals: BTreeMap<String, RemoteJournal>,
    entries: HashMap<String, Vec<Entry>>,
    members: HashMap<String, Vec<Member>>,
    user_infos: HashMap<String, UserInfo>,
    shared: HashMap<String, RemoteJournal>,
    failures: VecDeque<RemoteError>,
    calls: usize,
    pushes: usize,
}

/// In-process journal server.
#[derive(Default)]
pub struct MemoryJournalServer {
    state: Mutex<ServerState>,
}

impl MemoryJournalServer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        // A poisoned lock only means a test panicked mid-call; the data is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Starts a call: counts it and pops a queued failure, if any.
    fn begin(&self) -> RemoteResult<MutexGuard<'_, ServerState>> {
        let mut state = self.lock();
        state.calls += 1;
        match state.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }

    /// Makes the next call fail with `err`. Failures queue in order.
    pub fn inject_failure(&self, err: RemoteError) {
        self.lock().failures.push_back(err);
    }

    /// Total number of client calls served (including failed ones).
    pub fn call_count(&self) -> usize {
        self.lock().calls
    }

    /// Number of successful pushes.
    pub fn push_count(&self) -> usize {
        self.lock().pushes
    }

    /// Returns a copy of the stored entries of a journal.
    pub fn entries(&self, journal_uid: &str) -> Vec<Entry> {
        self.lock()
            .entries
            .get(journal_uid)
            .cloned()
            .unwrap_or_default()
    }

    /// Replaces the content of the entry at `index`, keeping its uid.
    ///
    /// Returns false when there is no such entry.
    pub fn tamper_entry(&self, journal_uid: &str, index: usize, content: Vec<u8>) -> bool {
        let mut state = self.lock();
        let Some(entry) = state
            .entries
            .get_mut(journal_uid)
            .and_then(|entries| entries.get_mut(index))
        else {
            return false;
        };
        *entry = Entry::new(entry.uid().to_string(), content);
        true
    }

    /// Swaps two stored entries, simulating a server that reorders history.
    pub fn swap_entries(&self, journal_uid: &str, a: usize, b: usize) -> bool {
        let mut state = self.lock();
        match state.entries.get_mut(journal_uid) {
            Some(entries) if a < entries.len() && b < entries.len() => {
                entries.swap(a, b);
                true
            }
            _ => false,
        }
    }

    fn tail_of(state: &ServerState, journal_uid: &str) -> Option<String> {
        state
            .entries
            .get(journal_uid)
            .and_then(|entries| entries.last())
            .map(|e| e.uid().to_string())
    }
}

impl JournalClient for MemoryJournalServer {
    fn list_journals(&self) -> RemoteResult<Vec<RemoteJournal>> {
        let state = self.begin()?;
        Ok(state.journals.values().cloned().collect())
    }

    fn create_journal(&self, journal: &RemoteJournal) -> RemoteResult<()> {
        let mut state = self.begin()?;
        if state.journals.contains_key(&journal.uid) {
            return Err(RemoteError::Conflict);
        }
        state.journals.insert(journal.uid.clone(), journal.clone());
        state.entries.insert(journal.uid.clone(), Vec::new());
        Ok(())
    }

    fn update_journal(&self, journal: &RemoteJournal) -> RemoteResult<()> {
        let mut state = self.begin()?;
        match state.journals.get_mut(&journal.uid) {
            Some(existing) => {
                *existing = journal.clone();
                Ok(())
            }
            None => Err(RemoteError::NotFound(journal.uid.clone())),
        }
    }

    fn delete_journal(&self, journal_uid: &str) -> RemoteResult<()> {
        let mut state = self.begin()?;
        if state.journals.remove(journal_uid).is_none() {
            return Err(RemoteError::NotFound(journal_uid.to_string()));
        }
        state.entries.remove(journal_uid);
        state.members.remove(journal_uid);
        Ok(())
    }

    fn list_entries(
        &self,
        journal_uid: &str,
        last: Option<&str>,
        limit: usize,
    ) -> RemoteResult<Vec<Entry>> {
        let state = self.begin()?;
        let entries = state
            .entries
            .get(journal_uid)
            .ok_or_else(|| RemoteError::NotFound(journal_uid.to_string()))?;

        let start = match last {
            None => 0,
            Some(uid) => {
                entries
                    .iter()
                    .position(|e| e.uid() == uid)
                    .ok_or_else(|| RemoteError::NotFound(format!("entry {}", uid)))?
                    + 1
            }
        };

        Ok(entries.iter().skip(start).take(limit).cloned().collect())
    }

    fn push_entries(
        &self,
        journal_uid: &str,
        entries: &[Entry],
        last: Option<&str>,
    ) -> RemoteResult<()> {
        let mut state = self.begin()?;
        if !state.journals.contains_key(journal_uid) {
            return Err(RemoteError::NotFound(journal_uid.to_string()));
        }
        if Self::tail_of(&state, journal_uid).as_deref() != last {
            return Err(RemoteError::Conflict);
        }

        state
            .entries
            .entry(journal_uid.to_string())
            .or_default()
            .extend(entries.iter().cloned());
        state.pushes += 1;
        Ok(())
    }

    fn list_members(&self, journal_uid: &str) -> RemoteResult<Vec<Member>> {
        let state = self.begin()?;
        Ok(state.members.get(journal_uid).cloned().unwrap_or_default())
    }

    fn add_member(&self, journal_uid: &str, member: &Member) -> RemoteResult<()> {
        let mut state = self.begin()?;
        let journal = state
            .journals
            .get(journal_uid)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(journal_uid.to_string()))?;

        let members = state.members.entry(journal_uid.to_string()).or_default();
        members.retain(|m| m.user != member.user);
        members.push(member.clone());

        // Shared copy as the member will list it: same journal, their wrapped key.
        let shared_uid = shared_journal_key(journal_uid, &member.user);
        let shared = RemoteJournal {
            key: Some(member.key.clone()),
            ..journal
        };
        state.shared.insert(shared_uid, shared);
        Ok(())
    }

    fn remove_member(&self, journal_uid: &str, user: &str) -> RemoteResult<()> {
        let mut state = self.begin()?;
        let members = state
            .members
            .get_mut(journal_uid)
            .ok_or_else(|| RemoteError::NotFound(journal_uid.to_string()))?;
        let before = members.len();
        members.retain(|m| m.user != user);
        if members.len() == before {
            return Err(RemoteError::NotFound(format!("member {}", user)));
        }
        state.shared.remove(&shared_journal_key(journal_uid, user));
        Ok(())
    }

    fn get_user_info(&self, owner: &str) -> RemoteResult<Option<UserInfo>> {
        let state = self.begin()?;
        Ok(state.user_infos.get(owner).cloned())
    }

    fn put_user_info(&self, info: &UserInfo) -> RemoteResult<()> {
        let mut state = self.begin()?;
        state.user_infos.insert(info.owner.clone(), info.clone());
        Ok(())
    }
}

/// Key under which a member's view of a shared journal is stored.
///
/// The single in-memory server plays every account, so shared views are kept
/// apart from the owner's journals and only surface through
/// [`MemoryJournalServer::shared_view`].
fn shared_journal_key(journal_uid: &str, user: &str) -> String {
    format!("shared:{}:{}", user, journal_uid)
}

impl MemoryJournalServer {
    /// Returns the journal as `user` would see it after being added as a member.
    pub fn shared_view(&self, journal_uid: &str, user: &str) -> Option<RemoteJournal> {
        self.lock()
            .shared
            .get(&shared_journal_key(journal_uid, user))
            .cloned()
    }
}
