// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock transport for deterministic testing.
//!
//! `MockTransport` implements `Transport` with scripted connect events,
//! injectable inbound messages, and captured outbound sends for assertion
//! in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use charla_core::traits::{Transport, TransportEvent};
use charla_core::CharlaError;

/// An outbound send captured by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub tenant_key: String,
    pub to: String,
    pub body: String,
}

/// A mock messaging transport for testing.
///
/// Behavior knobs:
/// - `script_connect()`: events auto-emitted right after `connect()` for a
///   given key (e.g. `Qr` then `Ready` to walk the full pairing flow)
/// - `emit()`: push further events into a live link at any point
/// - `set_send_ok(false)`: make `send()` report refusal without erroring
/// - `set_fail_connect(true)`: make `connect()` fail outright
pub struct MockTransport {
    links: Mutex<HashMap<String, mpsc::Sender<TransportEvent>>>,
    sent: Mutex<Vec<SentMessage>>,
    scripts: Mutex<HashMap<String, Vec<TransportEvent>>>,
    send_ok: Mutex<bool>,
    fail_connect: Mutex<bool>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            links: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            scripts: Mutex::new(HashMap::new()),
            send_ok: Mutex::new(true),
            fail_connect: Mutex::new(false),
        }
    }

    /// Queue events to emit immediately after `connect()` for `tenant_key`.
    pub async fn script_connect(&self, tenant_key: &str, events: Vec<TransportEvent>) {
        self.scripts
            .lock()
            .await
            .insert(tenant_key.to_string(), events);
    }

    /// Emit an event into a live link. Returns `false` when the link is
    /// gone (never connected, disconnected, or its pump dropped).
    pub async fn emit(&self, tenant_key: &str, event: TransportEvent) -> bool {
        let sender = self.links.lock().await.get(tenant_key).cloned();
        match sender {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }

    /// All sends captured so far.
    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Whether a link is currently held for `tenant_key`.
    pub async fn is_connected(&self, tenant_key: &str) -> bool {
        self.links.lock().await.contains_key(tenant_key)
    }

    pub async fn set_send_ok(&self, ok: bool) {
        *self.send_ok.lock().await = ok;
    }

    pub async fn set_fail_connect(&self, fail: bool) {
        *self.fail_connect.lock().await = fail;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(
        &self,
        tenant_key: &str,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<(), CharlaError> {
        if *self.fail_connect.lock().await {
            return Err(CharlaError::Transport {
                message: format!("mock connect refused for {tenant_key}"),
                source: None,
            });
        }

        self.links
            .lock()
            .await
            .insert(tenant_key.to_string(), events.clone());

        let scripted = self.scripts.lock().await.remove(tenant_key);
        if let Some(script) = scripted {
            for event in script {
                if events.send(event).await.is_err() {
                    break;
                }
            }
        }
        Ok(())
    }

    async fn send(&self, tenant_key: &str, to: &str, body: &str) -> Result<bool, CharlaError> {
        self.sent.lock().await.push(SentMessage {
            tenant_key: tenant_key.to_string(),
            to: to.to_string(),
            body: body.to_string(),
        });
        Ok(*self.send_ok.lock().await)
    }

    async fn disconnect(&self, tenant_key: &str) -> Result<(), CharlaError> {
        self.links.lock().await.remove(tenant_key);
        Ok(())
    }
}
