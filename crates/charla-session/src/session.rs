// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-tenant connection FSM.
//!
//! Each session walks: `initializing -> {qr_pending | connected}` (connected
//! directly only on a resumed-credential fast path), then
//! `qr_pending -> authenticating -> connected`. Transport auth failure moves
//! any live state to `error`; `disconnected` and `error` are terminal until a
//! fresh initialize.

use chrono::{DateTime, Utc};
use tracing::debug;

use charla_core::TransportEvent;

/// States in the session FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session exists for the key.
    Uninitialized,
    /// Connect requested; waiting for the transport's first signal.
    Initializing,
    /// Pairing payload issued; waiting for a scan.
    QrPending,
    /// Credentials accepted; link finalizing.
    Authenticating,
    /// Link live; sends are accepted.
    Connected,
    /// Link dropped. Terminal.
    Disconnected,
    /// Transport auth failure. Terminal.
    Error,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Uninitialized => write!(f, "uninitialized"),
            SessionState::Initializing => write!(f, "initializing"),
            SessionState::QrPending => write!(f, "qr_pending"),
            SessionState::Authenticating => write!(f, "authenticating"),
            SessionState::Connected => write!(f, "connected"),
            SessionState::Disconnected => write!(f, "disconnected"),
            SessionState::Error => write!(f, "error"),
        }
    }
}

/// Point-in-time view of a session, safe to hand to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub state: SessionState,
    pub qr_payload: Option<String>,
    pub phone_number: Option<String>,
}

impl SessionStatus {
    /// Status reported for keys with no session.
    pub fn uninitialized() -> Self {
        Self {
            state: SessionState::Uninitialized,
            qr_payload: None,
            phone_number: None,
        }
    }
}

/// Live connection state for one tenant key.
#[derive(Debug, Clone)]
pub struct Session {
    pub tenant_key: String,
    pub state: SessionState,
    pub qr_payload: Option<String>,
    pub phone_number: Option<String>,
    pub connected_at: Option<DateTime<Utc>>,
    pub last_activity: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(tenant_key: &str) -> Self {
        let now = Utc::now();
        Self {
            tenant_key: tenant_key.to_string(),
            state: SessionState::Initializing,
            qr_payload: None,
            phone_number: None,
            connected_at: None,
            last_activity: now,
            created_at: now,
        }
    }

    /// Applies a transport event to the FSM.
    ///
    /// Out-of-order events (e.g. `Ready` while `qr_pending` without an
    /// `Authenticated` first) are ignored with a debug log rather than
    /// corrupting the state machine.
    pub fn apply(&mut self, event: &TransportEvent) {
        self.last_activity = Utc::now();
        match event {
            TransportEvent::Qr { payload } => match self.state {
                SessionState::Initializing | SessionState::QrPending => {
                    self.state = SessionState::QrPending;
                    self.qr_payload = Some(payload.clone());
                }
                _ => self.ignore("qr"),
            },
            TransportEvent::Authenticated => match self.state {
                SessionState::QrPending | SessionState::Initializing => {
                    self.state = SessionState::Authenticating;
                    self.qr_payload = None;
                }
                _ => self.ignore("authenticated"),
            },
            TransportEvent::Ready { phone_number } => match self.state {
                // Resumed credentials connect straight from initializing.
                SessionState::Authenticating | SessionState::Initializing => {
                    self.state = SessionState::Connected;
                    self.qr_payload = None;
                    self.phone_number = Some(phone_number.clone());
                    self.connected_at = Some(Utc::now());
                }
                _ => self.ignore("ready"),
            },
            TransportEvent::AuthFailure { reason } => {
                debug!(
                    tenant_key = self.tenant_key.as_str(),
                    reason = reason.as_str(),
                    "session entering error state"
                );
                self.state = SessionState::Error;
                self.qr_payload = None;
            }
            TransportEvent::Disconnected { reason } => {
                // A drop before anything was established is a failed
                // connect, not a clean disconnect.
                if self.state == SessionState::Initializing {
                    debug!(
                        tenant_key = self.tenant_key.as_str(),
                        reason = reason.as_str(),
                        "connect dropped before first signal"
                    );
                    self.state = SessionState::Error;
                } else {
                    self.state = SessionState::Disconnected;
                }
                self.qr_payload = None;
            }
            TransportEvent::Message(_) => {}
        }
    }

    /// True while the session is waiting to connect; these are swept after
    /// the idle timeout.
    pub fn is_pending(&self) -> bool {
        matches!(
            self.state,
            SessionState::Initializing | SessionState::QrPending
        )
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.state,
            qr_payload: self.qr_payload.clone(),
            phone_number: self.phone_number.clone(),
        }
    }

    fn ignore(&self, event: &str) {
        debug!(
            tenant_key = self.tenant_key.as_str(),
            state = %self.state,
            event,
            "ignoring out-of-order transport event"
        );
    }
}
