// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Remote Journal Layer
//!
//! The network layer consists of:
//! - **JournalClient trait**: blocking protocol contract used by the engine
//! - **Wire types**: JSON envelopes with base64 payloads
//! - **HttpJournalClient**: REST implementation (`http-client` feature)
//! - **MemoryJournalServer**: in-process server for tests and offline use
//!
//! # Example
//!
//! ```ignore
//! use chainsync_core::remote::{ClientConfig, HttpJournalClient, JournalClient};
//!
//! let config = ClientConfig::new("https://journal.example.com").with_token(&token);
//! let client = HttpJournalClient::new(&config)?;
//! let journals = client.list_journals()?;
//! ```

pub mod client;
pub mod config;
pub mod error;
#[cfg(feature = "http-client")]
pub mod http;
pub mod mock;
pub mod wire;

pub use client::{JournalClient, RemoteJournal, RemoteResult};
pub use config::ClientConfig;
pub use error::RemoteError;
#[cfg(feature = "http-client")]
pub use http::HttpJournalClient;
pub use mock::MemoryJournalServer;
