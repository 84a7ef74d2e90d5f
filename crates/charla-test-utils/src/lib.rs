// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Charla integration tests.
//!
//! Deterministic collaborator doubles: a scriptable [`MockTransport`] and an
//! in-memory [`MemoryStorage`] with failure injection.

pub mod memory_storage;
pub mod mock_transport;

pub use memory_storage::{product, tenant, LeadState, MemoryStorage};
pub use mock_transport::{MockTransport, SentMessage};
