// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lifecycle for Charla: the per-tenant connection FSM, the session
//! registry that owns transport links, and the stale-session sweeper.

pub mod registry;
pub mod session;
pub mod sweep;

pub use registry::{SessionEvent, SessionRegistry};
pub use session::{Session, SessionState, SessionStatus};
pub use sweep::spawn_sweeper;
