// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport collaborator trait for messaging account links.
//!
//! A transport owns the wire protocol of a messaging platform. Charla never
//! touches the wire: it asks the transport to connect a tenant's account and
//! receives lifecycle and message events on a channel. The session manager is
//! the only component that talks to this trait.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::CharlaError;
use crate::types::InboundMessage;

/// Events emitted by a transport for one tenant account link.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Pairing payload to display; the link is waiting for a scan.
    Qr { payload: String },
    /// Credentials accepted; the link is finalizing.
    Authenticated,
    /// The link is live and can send.
    Ready { phone_number: String },
    /// Credential validation failed. Terminal for this link.
    AuthFailure { reason: String },
    /// The link dropped. Terminal until a fresh connect.
    Disconnected { reason: String },
    /// An inbound message arrived.
    Message(InboundMessage),
}

/// Bidirectional link to an external messaging platform.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establishes the link for a tenant account.
    ///
    /// Returns once the connect attempt is underway; lifecycle progress
    /// (QR, authenticated, ready, failures) arrives on `events`. Either a
    /// QR payload or a direct [`TransportEvent::Ready`] (resumed credentials)
    /// follows asynchronously.
    async fn connect(
        &self,
        tenant_key: &str,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<(), CharlaError>;

    /// Sends a message through an established link.
    ///
    /// Returns `Ok(false)` when the platform refused delivery without a
    /// protocol error.
    async fn send(&self, tenant_key: &str, to: &str, body: &str) -> Result<bool, CharlaError>;

    /// Tears down the link and releases platform resources.
    ///
    /// Must be safe to call for a key that was never connected.
    async fn disconnect(&self, tenant_key: &str) -> Result<(), CharlaError>;
}

/// Outbound send primitive exposed to the routing pipeline.
///
/// Implemented by the session registry so the pipeline can reply without
/// depending on session internals. Returns `false` (never an error) when the
/// session is not connected.
#[async_trait]
pub trait OutboundSender: Send + Sync {
    async fn send_message(&self, tenant_key: &str, to: &str, body: &str) -> bool;
}
