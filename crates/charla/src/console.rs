// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Console transport: a local stand-in for a real messaging platform.
//!
//! One connected "account" whose inbound messages come from the REPL and
//! whose outbound sends are printed to stdout. Connecting always succeeds
//! with an immediate resumed-credentials `Ready`, so the session fast-paths
//! straight to `connected`.

use std::collections::HashMap;

use async_trait::async_trait;
use colored::Colorize;
use tokio::sync::{mpsc, Mutex, Notify};

use charla_core::types::InboundMessage;
use charla_core::{CharlaError, Transport, TransportEvent};

pub struct ConsoleTransport {
    links: Mutex<HashMap<String, mpsc::Sender<TransportEvent>>>,
    replied: Notify,
}

impl ConsoleTransport {
    pub fn new() -> Self {
        Self {
            links: Mutex::new(HashMap::new()),
            replied: Notify::new(),
        }
    }

    /// Feeds one REPL line into the link as an inbound message.
    pub async fn deliver(&self, tenant_key: &str, from: &str, body: &str) -> bool {
        let sender = self.links.lock().await.get(tenant_key).cloned();
        match sender {
            Some(tx) => tx
                .send(TransportEvent::Message(InboundMessage {
                    from: from.to_string(),
                    body: body.to_string(),
                    timestamp: chrono::Utc::now(),
                }))
                .await
                .is_ok(),
            None => false,
        }
    }

    /// Resolves once the next outbound send has been printed. Used by the
    /// REPL to keep prompt and reply from interleaving.
    pub async fn replied(&self) {
        self.replied.notified().await;
    }
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn connect(
        &self,
        tenant_key: &str,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<(), CharlaError> {
        self.links
            .lock()
            .await
            .insert(tenant_key.to_string(), events.clone());
        events
            .send(TransportEvent::Ready {
                phone_number: "console".to_string(),
            })
            .await
            .map_err(|_| CharlaError::Transport {
                message: "console event channel closed during connect".to_string(),
                source: None,
            })
    }

    async fn send(&self, _tenant_key: &str, to: &str, body: &str) -> Result<bool, CharlaError> {
        println!("{} {body}", format!("bot -> {to}:").green().bold());
        self.replied.notify_one();
        Ok(true)
    }

    async fn disconnect(&self, tenant_key: &str) -> Result<(), CharlaError> {
        self.links.lock().await.remove(tenant_key);
        Ok(())
    }
}
