// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Appointment slot allocation and conflict engine for Charla.
//!
//! Pure candidate generation, scoring, and overlap detection live in
//! [`slots`] and [`conflicts`]; [`engine`] binds them to the storage
//! collaborator with an optimistic recheck before every booking write.
//! [`reminders`] emits reminder timestamps for an external scheduler.

pub mod conflicts;
pub mod engine;
pub mod reminders;
pub mod slots;

pub use engine::{BookingOutcome, ConflictReport, SlotEngine};
pub use reminders::compute_reminder_offsets;
pub use slots::{find_optimal_slot, generate_slots, score_slot, SlotOutcome, SlotRequest};
