// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! HTTP journal client.
//!
//! Blocking REST client for the journal server:
//!
//! - `GET/POST /api/v1/journals/`, `PUT/DELETE /api/v1/journals/{uid}/`
//! - `GET/POST /api/v1/journals/{uid}/entries/?last={uid}&limit={n}`
//! - `GET/POST /api/v1/journals/{uid}/members/`, `DELETE .../members/{user}/`
//! - `GET /api/v1/user/{owner}/`, `POST /api/v1/user/`

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{AUTHORIZATION, RETRY_AFTER};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::client::{JournalClient, RemoteJournal, RemoteResult};
use super::config::ClientConfig;
use super::error::RemoteError;
use super::wire::{entries_from_json, EntryJson, JournalJson, MemberJson, UserInfoJson};
use crate::chain::Entry;
use crate::model::{Member, UserInfo};

const API_PREFIX: &str = "api/v1";

/// [`JournalClient`] speaking JSON over HTTPS.
pub struct HttpJournalClient {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpJournalClient {
    /// Create a new client from config.
    pub fn new(config: &ClientConfig) -> Result<Self, RemoteError> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone());

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| RemoteError::Transient(format!("invalid proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| RemoteError::Transient(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_PREFIX, path)
    }

    fn journal_url(&self, journal_uid: &str, tail: &str) -> String {
        self.url(&format!("journals/{}/{}", journal_uid, tail))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.header(AUTHORIZATION, format!("Token {}", token)),
            None => request,
        }
    }

    /// Sends a request and maps transport failures and error statuses.
    fn send(&self, request: RequestBuilder) -> RemoteResult<Response> {
        let response = self
            .authorized(request)
            .send()
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().unwrap_or_default();
        debug!(status = status.as_u16(), "journal server returned error");

        Err(RemoteError::from_status(
            status.as_u16(),
            retry_after.as_deref(),
            &body,
        ))
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> RemoteResult<T> {
        let response = self.send(self.client.get(url))?;
        response
            .json()
            .map_err(|e| RemoteError::Malformed(e.to_string()))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> RemoteError {
    if err.is_decode() {
        RemoteError::Malformed(err.to_string())
    } else {
        RemoteError::Transient(err.to_string())
    }
}

impl JournalClient for HttpJournalClient {
    fn list_journals(&self) -> RemoteResult<Vec<RemoteJournal>> {
        let items: Vec<JournalJson> = self.get_json(&self.url("journals/"))?;
        items.into_iter().map(RemoteJournal::try_from).collect()
    }

    fn create_journal(&self, journal: &RemoteJournal) -> RemoteResult<()> {
        let body = JournalJson::from(journal);
        self.send(self.client.post(self.url("journals/")).json(&body))?;
        Ok(())
    }

    fn update_journal(&self, journal: &RemoteJournal) -> RemoteResult<()> {
        let body = JournalJson::from(journal);
        self.send(self.client.put(self.journal_url(&journal.uid, "")).json(&body))?;
        Ok(())
    }

    fn delete_journal(&self, journal_uid: &str) -> RemoteResult<()> {
        self.send(self.client.delete(self.journal_url(journal_uid, "")))?;
        Ok(())
    }

    fn list_entries(
        &self,
        journal_uid: &str,
        last: Option<&str>,
        limit: usize,
    ) -> RemoteResult<Vec<Entry>> {
        let mut request = self
            .client
            .get(self.journal_url(journal_uid, "entries/"))
            .query(&[("limit", limit.to_string())]);
        if let Some(last) = last {
            request = request.query(&[("last", last)]);
        }

        let response = self.send(request)?;
        let items: Vec<EntryJson> = response
            .json()
            .map_err(|e| RemoteError::Malformed(e.to_string()))?;
        entries_from_json(items)
    }

    fn push_entries(
        &self,
        journal_uid: &str,
        entries: &[Entry],
        last: Option<&str>,
    ) -> RemoteResult<()> {
        let body: Vec<EntryJson> = entries.iter().map(EntryJson::from).collect();
        let mut request = self
            .client
            .post(self.journal_url(journal_uid, "entries/"))
            .json(&body);
        if let Some(last) = last {
            request = request.query(&[("last", last)]);
        }

        self.send(request)?;
        Ok(())
    }

    fn list_members(&self, journal_uid: &str) -> RemoteResult<Vec<Member>> {
        let items: Vec<MemberJson> = self.get_json(&self.journal_url(journal_uid, "members/"))?;
        items.into_iter().map(Member::try_from).collect()
    }

    fn add_member(&self, journal_uid: &str, member: &Member) -> RemoteResult<()> {
        let body = MemberJson::from(member);
        self.send(
            self.client
                .post(self.journal_url(journal_uid, "members/"))
                .json(&body),
        )?;
        Ok(())
    }

    fn remove_member(&self, journal_uid: &str, user: &str) -> RemoteResult<()> {
        let url = self.journal_url(journal_uid, &format!("members/{}/", user));
        self.send(self.client.delete(url))?;
        Ok(())
    }

    fn get_user_info(&self, owner: &str) -> RemoteResult<Option<UserInfo>> {
        match self.get_json::<UserInfoJson>(&self.url(&format!("user/{}/", owner))) {
            Ok(json) => Ok(Some(UserInfo::try_from(json)?)),
            Err(RemoteError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn put_user_info(&self, info: &UserInfo) -> RemoteResult<()> {
        let body = UserInfoJson::from(info);
        self.send(self.client.post(self.url("user/")).json(&body))?;
        Ok(())
    }
}
