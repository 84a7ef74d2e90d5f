// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.

pub mod storage;
pub mod transport;

pub use storage::Storage;
pub use transport::{OutboundSender, Transport, TransportEvent};
