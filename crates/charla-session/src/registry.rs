// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session registry: one live session per tenant key.
//!
//! The registry owns the transport collaborator. For each initialized key it
//! spawns an event pump task that applies transport events to the session
//! FSM and re-emits them, messages included, on a shared channel consumed by
//! the routing pipeline. Registry map operations are atomic per key; a fresh
//! `initialize_session` always destroys any live predecessor first.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use charla_core::types::InboundMessage;
use charla_core::{CharlaError, OutboundSender, Transport, TransportEvent};

use crate::session::{Session, SessionState, SessionStatus};

/// Buffer of each per-session transport event channel.
const TRANSPORT_EVENT_BUFFER: usize = 64;

/// Session lifecycle and message events, re-emitted per tenant key.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Qr { tenant_key: String, payload: String },
    Authenticated { tenant_key: String },
    Ready { tenant_key: String },
    AuthFailure { tenant_key: String, reason: String },
    Disconnected { tenant_key: String, reason: String },
    Message {
        tenant_key: String,
        message: InboundMessage,
    },
}

struct SessionEntry {
    session: Session,
    cancel: CancellationToken,
    /// Monotonic initialize counter; distinguishes an entry from any
    /// predecessor or successor under the same key.
    epoch: u64,
}

/// In-process registry of per-tenant sessions.
pub struct SessionRegistry {
    sessions: DashMap<String, SessionEntry>,
    transport: Arc<dyn Transport>,
    events_tx: mpsc::Sender<SessionEvent>,
    epoch: AtomicU64,
}

impl SessionRegistry {
    /// Creates the registry and the shared event stream consumed by the
    /// pipeline driver.
    pub fn new(
        transport: Arc<dyn Transport>,
        event_buffer: usize,
    ) -> (Arc<Self>, mpsc::Receiver<SessionEvent>) {
        let (events_tx, events_rx) = mpsc::channel(event_buffer);
        (
            Arc::new(Self {
                sessions: DashMap::new(),
                transport,
                events_tx,
                epoch: AtomicU64::new(0),
            }),
            events_rx,
        )
    }

    /// Initializes a session for a tenant key, destroying any live one first.
    ///
    /// Returns the current status immediately; connection progress arrives
    /// as [`SessionEvent`]s.
    pub async fn initialize_session(
        self: &Arc<Self>,
        tenant_key: &str,
    ) -> Result<SessionStatus, CharlaError> {
        let cancel = CancellationToken::new();
        let session = Session::new(tenant_key);
        let status = session.status();
        let epoch = self.epoch.fetch_add(1, Ordering::Relaxed) + 1;
        let entry = SessionEntry {
            session,
            cancel: cancel.clone(),
            epoch,
        };

        // Replace under the entry lock: concurrent initializes for the same
        // key cannot interleave between teardown and insert.
        let displaced = match self.sessions.entry(tenant_key.to_string()) {
            Entry::Occupied(mut occupied) => Some(occupied.insert(entry)),
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                None
            }
        };
        if let Some(old) = displaced {
            old.cancel.cancel();
            if let Err(e) = self.transport.disconnect(tenant_key).await {
                warn!(tenant_key, error = %e, "transport disconnect failed");
            }
            info!(tenant_key, "previous session destroyed");
        }

        let (tx, rx) = mpsc::channel(TRANSPORT_EVENT_BUFFER);
        if let Err(e) = self.transport.connect(tenant_key, tx).await {
            // Remove only the entry this call created; a newer initialize
            // may already own the key.
            self.sessions
                .remove_if(tenant_key, |_, entry| entry.epoch == epoch);
            return Err(CharlaError::Session {
                tenant_key: tenant_key.to_string(),
                message: format!("transport connect failed: {e}"),
            });
        }

        info!(tenant_key, "session initializing");
        let registry = Arc::clone(self);
        let key = tenant_key.to_string();
        tokio::spawn(async move {
            registry.pump(key, epoch, rx, cancel).await;
        });

        Ok(status)
    }

    /// Current status for a key. Never fails; unknown keys are
    /// `uninitialized`.
    pub fn get_status(&self, tenant_key: &str) -> SessionStatus {
        self.sessions
            .get(tenant_key)
            .map(|entry| entry.session.status())
            .unwrap_or_else(SessionStatus::uninitialized)
    }

    /// Sends through a connected session. Returns `false`, never an error,
    /// when the session is absent, not connected, or the platform refuses.
    pub async fn send_message(&self, tenant_key: &str, to: &str, body: &str) -> bool {
        let connected = self
            .sessions
            .get(tenant_key)
            .map(|entry| entry.session.state == SessionState::Connected)
            .unwrap_or(false);
        if !connected {
            debug!(tenant_key, "send refused: session not connected");
            return false;
        }

        match self.transport.send(tenant_key, to, body).await {
            Ok(delivered) => {
                if delivered {
                    if let Some(mut entry) = self.sessions.get_mut(tenant_key) {
                        entry.session.last_activity = chrono::Utc::now();
                    }
                }
                delivered
            }
            Err(e) => {
                warn!(tenant_key, error = %e, "transport send failed");
                false
            }
        }
    }

    /// Destroys a session: cancels its pump, releases transport resources.
    /// Idempotent; safe mid-initialize and for unknown keys.
    pub async fn destroy_session(&self, tenant_key: &str) {
        if let Some((_, entry)) = self.sessions.remove(tenant_key) {
            entry.cancel.cancel();
            if let Err(e) = self.transport.disconnect(tenant_key).await {
                warn!(tenant_key, error = %e, "transport disconnect failed");
            }
            info!(tenant_key, "session destroyed");
        }
    }

    /// Keys of sessions stuck before `connected` longer than `idle_timeout`.
    pub fn stale_keys(&self, idle_timeout: std::time::Duration) -> Vec<String> {
        let Ok(cutoff) = chrono::Duration::from_std(idle_timeout) else {
            return Vec::new();
        };
        let now = chrono::Utc::now();
        self.sessions
            .iter()
            .filter(|entry| {
                entry.session.is_pending() && now - entry.session.created_at > cutoff
            })
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Number of tracked sessions (any state).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    async fn pump(
        self: Arc<Self>,
        tenant_key: String,
        epoch: u64,
        mut rx: mpsc::Receiver<TransportEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(tenant_key = tenant_key.as_str(), "session pump cancelled");
                    break;
                }
                event = rx.recv() => match event {
                    Some(event) => event,
                    None => {
                        debug!(
                            tenant_key = tenant_key.as_str(),
                            "transport event channel closed"
                        );
                        break;
                    }
                },
            };

            let terminal = matches!(
                event,
                TransportEvent::AuthFailure { .. } | TransportEvent::Disconnected { .. }
            );

            // Apply under the map guard, then release it before awaiting.
            {
                let Some(mut entry) = self.sessions.get_mut(&tenant_key) else {
                    break; // destroyed concurrently
                };
                if entry.epoch != epoch {
                    break; // a newer initialize owns this key
                }
                entry.session.apply(&event);
            }

            let session_event = match event {
                TransportEvent::Qr { payload } => SessionEvent::Qr {
                    tenant_key: tenant_key.clone(),
                    payload,
                },
                TransportEvent::Authenticated => SessionEvent::Authenticated {
                    tenant_key: tenant_key.clone(),
                },
                TransportEvent::Ready { .. } => SessionEvent::Ready {
                    tenant_key: tenant_key.clone(),
                },
                TransportEvent::AuthFailure { reason } => SessionEvent::AuthFailure {
                    tenant_key: tenant_key.clone(),
                    reason,
                },
                TransportEvent::Disconnected { reason } => SessionEvent::Disconnected {
                    tenant_key: tenant_key.clone(),
                    reason,
                },
                TransportEvent::Message(message) => SessionEvent::Message {
                    tenant_key: tenant_key.clone(),
                    message,
                },
            };

            if self.events_tx.send(session_event).await.is_err() {
                debug!(
                    tenant_key = tenant_key.as_str(),
                    "event stream consumer gone, stopping pump"
                );
                break;
            }

            if terminal {
                // The entry stays so get_status reports the terminal state
                // until the next initialize.
                break;
            }
        }
    }
}

#[async_trait]
impl OutboundSender for SessionRegistry {
    async fn send_message(&self, tenant_key: &str, to: &str, body: &str) -> bool {
        SessionRegistry::send_message(self, tenant_key, to, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charla_test_utils::MockTransport;
    use chrono::Utc;

    fn message(body: &str) -> TransportEvent {
        TransportEvent::Message(InboundMessage {
            from: "+200".into(),
            body: body.into(),
            timestamp: Utc::now(),
        })
    }

    async fn ready_transport(key: &str) -> Arc<MockTransport> {
        let transport = Arc::new(MockTransport::new());
        transport
            .script_connect(
                key,
                vec![TransportEvent::Ready {
                    phone_number: "+1555".into(),
                }],
            )
            .await;
        transport
    }

    #[tokio::test]
    async fn unknown_key_reports_uninitialized() {
        let transport = Arc::new(MockTransport::new());
        let (registry, _rx) = SessionRegistry::new(transport, 16);
        assert_eq!(
            registry.get_status("nobody").state,
            SessionState::Uninitialized
        );
    }

    #[tokio::test]
    async fn qr_flow_emits_events_and_updates_status() {
        let transport = Arc::new(MockTransport::new());
        transport
            .script_connect(
                "acct",
                vec![
                    TransportEvent::Qr {
                        payload: "qr-blob".into(),
                    },
                    TransportEvent::Authenticated,
                    TransportEvent::Ready {
                        phone_number: "+1555".into(),
                    },
                ],
            )
            .await;
        let (registry, mut rx) = SessionRegistry::new(transport, 16);

        let status = registry.initialize_session("acct").await.unwrap();
        assert_eq!(status.state, SessionState::Initializing);

        assert!(matches!(
            rx.recv().await,
            Some(SessionEvent::Qr { ref payload, .. }) if payload == "qr-blob"
        ));
        assert!(matches!(
            rx.recv().await,
            Some(SessionEvent::Authenticated { .. })
        ));
        assert!(matches!(rx.recv().await, Some(SessionEvent::Ready { .. })));

        let status = registry.get_status("acct");
        assert_eq!(status.state, SessionState::Connected);
        assert_eq!(status.phone_number.as_deref(), Some("+1555"));
        assert!(status.qr_payload.is_none());
    }

    #[tokio::test]
    async fn send_refused_until_connected() {
        let transport = Arc::new(MockTransport::new());
        let (registry, _rx) = SessionRegistry::new(Arc::clone(&transport) as Arc<_>, 16);

        // No session at all.
        assert!(!registry.send_message("acct", "+200", "hi").await);

        registry.initialize_session("acct").await.unwrap();
        // Still initializing: refused without error.
        assert!(!registry.send_message("acct", "+200", "hi").await);
        assert_eq!(transport.sent_count().await, 0);
    }

    #[tokio::test]
    async fn send_flows_once_connected() {
        let transport = ready_transport("acct").await;
        let (registry, mut rx) = SessionRegistry::new(Arc::clone(&transport) as Arc<_>, 16);
        registry.initialize_session("acct").await.unwrap();
        assert!(matches!(rx.recv().await, Some(SessionEvent::Ready { .. })));

        assert!(registry.send_message("acct", "+200", "hola").await);
        let sent = transport.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "+200");
        assert_eq!(sent[0].body, "hola");
    }

    #[tokio::test]
    async fn inbound_messages_are_forwarded_in_order() {
        let transport = ready_transport("acct").await;
        let (registry, mut rx) = SessionRegistry::new(Arc::clone(&transport) as Arc<_>, 16);
        registry.initialize_session("acct").await.unwrap();
        assert!(matches!(rx.recv().await, Some(SessionEvent::Ready { .. })));

        assert!(transport.emit("acct", message("first")).await);
        assert!(transport.emit("acct", message("second")).await);

        match rx.recv().await {
            Some(SessionEvent::Message { message, .. }) => assert_eq!(message.body, "first"),
            other => panic!("expected message, got {other:?}"),
        }
        match rx.recv().await {
            Some(SessionEvent::Message { message, .. }) => assert_eq!(message.body, "second"),
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reinitialize_destroys_previous_session() {
        let transport = ready_transport("acct").await;
        let (registry, mut rx) = SessionRegistry::new(Arc::clone(&transport) as Arc<_>, 16);
        registry.initialize_session("acct").await.unwrap();
        assert!(matches!(rx.recv().await, Some(SessionEvent::Ready { .. })));

        // Second initialize: old link torn down, exactly one session tracked.
        transport
            .script_connect(
                "acct",
                vec![TransportEvent::Qr {
                    payload: "qr-2".into(),
                }],
            )
            .await;
        registry.initialize_session("acct").await.unwrap();
        assert_eq!(registry.len(), 1);
        assert!(matches!(
            rx.recv().await,
            Some(SessionEvent::Qr { ref payload, .. }) if payload == "qr-2"
        ));
        assert_eq!(registry.get_status("acct").state, SessionState::QrPending);
    }

    #[tokio::test]
    async fn destroy_is_idempotent_and_safe_mid_initialize() {
        let transport = Arc::new(MockTransport::new());
        let (registry, _rx) = SessionRegistry::new(Arc::clone(&transport) as Arc<_>, 16);

        registry.destroy_session("never-existed").await;

        registry.initialize_session("acct").await.unwrap();
        assert_eq!(registry.get_status("acct").state, SessionState::Initializing);
        registry.destroy_session("acct").await;
        registry.destroy_session("acct").await;
        assert_eq!(
            registry.get_status("acct").state,
            SessionState::Uninitialized
        );
        assert!(!transport.is_connected("acct").await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reinitializes_keep_one_live_session() {
        let transport = Arc::new(MockTransport::new());
        let (registry, mut rx) = SessionRegistry::new(Arc::clone(&transport) as Arc<_>, 256);

        for _ in 0..20 {
            let a = tokio::spawn({
                let registry = Arc::clone(&registry);
                async move { registry.initialize_session("acct").await }
            });
            let b = tokio::spawn({
                let registry = Arc::clone(&registry);
                async move { registry.initialize_session("acct").await }
            });
            a.await.unwrap().unwrap();
            b.await.unwrap().unwrap();
            assert_eq!(registry.len(), 1);
        }

        // A final clean initialize must still work, and only its session
        // receives the scripted events.
        transport
            .script_connect(
                "acct",
                vec![TransportEvent::Ready {
                    phone_number: "+1555".into(),
                }],
            )
            .await;
        registry.initialize_session("acct").await.unwrap();
        assert!(matches!(rx.recv().await, Some(SessionEvent::Ready { .. })));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_status("acct").state, SessionState::Connected);
    }

    #[tokio::test]
    async fn failed_connect_leaves_no_entry() {
        let transport = Arc::new(MockTransport::new());
        transport.set_fail_connect(true).await;
        let (registry, _rx) = SessionRegistry::new(Arc::clone(&transport) as Arc<_>, 16);

        assert!(registry.initialize_session("acct").await.is_err());
        assert!(registry.is_empty());
        assert_eq!(
            registry.get_status("acct").state,
            SessionState::Uninitialized
        );
    }

    #[tokio::test]
    async fn auth_failure_isolates_tenants() {
        let transport = Arc::new(MockTransport::new());
        transport
            .script_connect(
                "bad",
                vec![TransportEvent::AuthFailure {
                    reason: "expired credentials".into(),
                }],
            )
            .await;
        transport
            .script_connect(
                "good",
                vec![TransportEvent::Ready {
                    phone_number: "+1555".into(),
                }],
            )
            .await;
        let (registry, mut rx) = SessionRegistry::new(Arc::clone(&transport) as Arc<_>, 16);

        registry.initialize_session("bad").await.unwrap();
        registry.initialize_session("good").await.unwrap();

        let mut saw_failure = false;
        let mut saw_ready = false;
        for _ in 0..2 {
            match rx.recv().await {
                Some(SessionEvent::AuthFailure {
                    tenant_key, reason, ..
                }) => {
                    assert_eq!(tenant_key, "bad");
                    assert_eq!(reason, "expired credentials");
                    saw_failure = true;
                }
                Some(SessionEvent::Ready { tenant_key }) => {
                    assert_eq!(tenant_key, "good");
                    saw_ready = true;
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert!(saw_failure && saw_ready);
        assert_eq!(registry.get_status("bad").state, SessionState::Error);
        assert_eq!(registry.get_status("good").state, SessionState::Connected);
    }

    #[tokio::test]
    async fn stale_keys_only_cover_pending_sessions() {
        let transport = ready_transport("connected").await;
        let (registry, mut rx) = SessionRegistry::new(Arc::clone(&transport) as Arc<_>, 16);
        registry.initialize_session("connected").await.unwrap();
        assert!(matches!(rx.recv().await, Some(SessionEvent::Ready { .. })));
        registry.initialize_session("stuck").await.unwrap();

        // Zero timeout: anything pending is stale immediately.
        let stale = registry.stale_keys(std::time::Duration::from_secs(0));
        assert_eq!(stale, vec!["stuck".to_string()]);
    }
}
