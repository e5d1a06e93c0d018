// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration for the journal server client

use std::time::Duration;

/// Connection settings for [`HttpJournalClient`](super::HttpJournalClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "https://journal.example.com")
    pub base_url: String,

    /// Token sent as `Authorization: Token <token>`
    pub auth_token: Option<String>,

    /// HTTP timeout per request
    pub timeout: Duration,

    pub user_agent: String,

    /// Proxy URL (for Tor support)
    pub proxy_url: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth_token: None,
            timeout: Duration::from_secs(30),
            user_agent: format!(
                "Chainsync/{}",
                option_env!("CARGO_PKG_VERSION").unwrap_or("0.1.0")
            ),
            proxy_url: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Default::default()
        }
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure with Tor proxy
    ///
    /// Uses the default Tor SOCKS5 proxy at 127.0.0.1:9050 and
    /// increases the timeout to 60 seconds to account for Tor latency.
    pub fn with_tor(mut self) -> Self {
        self.proxy_url = Some("socks5://127.0.0.1:9050".to_string());
        self.timeout = Duration::from_secs(60);
        self
    }

    /// Configure with custom proxy
    pub fn with_proxy(mut self, proxy_url: String) -> Self {
        self.proxy_url = Some(proxy_url);
        self
    }
}
