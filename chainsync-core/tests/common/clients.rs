// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Scripted Journal Client
//!
//! Wraps the in-memory server to fail a given fetch, race another device
//! into the journal right before a push, reject every push, or drop the
//! response of a push the server accepted.

use std::cell::{Cell, RefCell};

use chainsync_core::chain::{ChainCodec, Entry};
use chainsync_core::model::{Member, UserInfo};
use chainsync_core::remote::RemoteResult;
use chainsync_core::{
    CryptoManager, JournalClient, MemoryJournalServer, RemoteError, RemoteJournal, SyncAction,
    SyncEntry,
};

type Race<'a> = Box<dyn FnOnce() + 'a>;

pub struct ScriptedClient<'a> {
    inner: &'a MemoryJournalServer,
    fetches: Cell<usize>,
    pushes: Cell<usize>,
    fail_fetch_at: Option<usize>,
    before_push: RefCell<Option<Race<'a>>>,
    always_conflict: bool,
    lose_push_response: Cell<bool>,
}

impl<'a> ScriptedClient<'a> {
    pub fn new(inner: &'a MemoryJournalServer) -> Self {
        ScriptedClient {
            inner,
            fetches: Cell::new(0),
            pushes: Cell::new(0),
            fail_fetch_at: None,
            before_push: RefCell::new(None),
            always_conflict: false,
            lose_push_response: Cell::new(false),
        }
    }

    /// The `n`-th `list_entries` call (1-based) fails with a transient error.
    pub fn fail_fetch_at(mut self, n: usize) -> Self {
        self.fail_fetch_at = Some(n);
        self
    }

    /// Runs `race` once, just before the first push reaches the server.
    pub fn before_first_push(self, race: impl FnOnce() + 'a) -> Self {
        *self.before_push.borrow_mut() = Some(Box::new(race));
        self
    }

    pub fn always_conflict(mut self) -> Self {
        self.always_conflict = true;
        self
    }

    /// The next push reaches the server, but the client sees a transient
    /// error instead of the acknowledgement.
    pub fn lose_next_push_response(self) -> Self {
        self.lose_push_response.set(true);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }

    pub fn push_attempts(&self) -> usize {
        self.pushes.get()
    }
}

impl JournalClient for ScriptedClient<'_> {
    fn list_journals(&self) -> RemoteResult<Vec<RemoteJournal>> {
        self.inner.list_journals()
    }

    fn create_journal(&self, journal: &RemoteJournal) -> RemoteResult<()> {
        self.inner.create_journal(journal)
    }

    fn update_journal(&self, journal: &RemoteJournal) -> RemoteResult<()> {
        self.inner.update_journal(journal)
    }

    fn delete_journal(&self, journal_uid: &str) -> RemoteResult<()> {
        self.inner.delete_journal(journal_uid)
    }

    fn list_entries(
        &self,
        journal_uid: &str,
        last: Option<&str>,
        limit: usize,
    ) -> RemoteResult<Vec<Entry>> {
        let call = self.fetches.get() + 1;
        self.fetches.set(call);
        if self.fail_fetch_at == Some(call) {
            return Err(RemoteError::Transient("connection reset".to_string()));
        }
        self.inner.list_entries(journal_uid, last, limit)
    }

    fn push_entries(
        &self,
        journal_uid: &str,
        entries: &[Entry],
        last: Option<&str>,
    ) -> RemoteResult<()> {
        self.pushes.set(self.pushes.get() + 1);
        if self.always_conflict {
            return Err(RemoteError::Conflict);
        }
        let race = self.before_push.borrow_mut().take();
        if let Some(race) = race {
            race();
        }
        self.inner.push_entries(journal_uid, entries, last)?;
        if self.lose_push_response.replace(false) {
            return Err(RemoteError::Transient("connection reset".to_string()));
        }
        Ok(())
    }

    fn list_members(&self, journal_uid: &str) -> RemoteResult<Vec<Member>> {
        self.inner.list_members(journal_uid)
    }

    fn add_member(&self, journal_uid: &str, member: &Member) -> RemoteResult<()> {
        self.inner.add_member(journal_uid, member)
    }

    fn remove_member(&self, journal_uid: &str, user: &str) -> RemoteResult<()> {
        self.inner.remove_member(journal_uid, user)
    }

    fn get_user_info(&self, owner: &str) -> RemoteResult<Option<UserInfo>> {
        self.inner.get_user_info(owner)
    }

    fn put_user_info(&self, info: &UserInfo) -> RemoteResult<()> {
        self.inner.put_user_info(info)
    }
}

/// Appends one change to the journal the way another device would.
pub fn push_remote_change(
    server: &MemoryJournalServer,
    journal_uid: &str,
    crypto: &CryptoManager,
    action: SyncAction,
    content: &[u8],
) -> Entry {
    let tail = server.entries(journal_uid).last().map(|e| e.uid().to_string());
    let payload = SyncEntry::new(action, String::from_utf8_lossy(content).into_owned())
        .to_json()
        .unwrap();
    let entry = ChainCodec::new(crypto)
        .build(tail.as_deref(), &payload)
        .unwrap();
    server
        .push_entries(journal_uid, std::slice::from_ref(&entry), tail.as_deref())
        .unwrap();
    entry
}

/// Decrypts every entry of a journal, verifying the chain on the way.
pub fn journal_contents(
    server: &MemoryJournalServer,
    journal_uid: &str,
    crypto: &CryptoManager,
) -> Vec<SyncEntry> {
    let codec = ChainCodec::new(crypto);
    let mut previous: Option<String> = None;
    server
        .entries(journal_uid)
        .iter()
        .map(|entry| {
            let plaintext = codec.open(entry, previous.as_deref()).unwrap();
            previous = Some(entry.uid().to_string());
            SyncEntry::from_json(&plaintext).unwrap()
        })
        .collect()
}
