// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reminder descriptor generation.
//!
//! Emits the timestamps at which an appointment reminder should fire.
//! Delivery is delegated to an external scheduler; this module only decides
//! the offsets: {7d, 3d, 1d} before when the appointment is more than a week
//! out, {1d} when 2-7 days out, and always a 2-hour-before reminder.

use chrono::{DateTime, Duration, Utc};

/// Reminder timestamps for one appointment, ascending, all in the future
/// relative to `now`.
pub fn compute_reminder_offsets(
    appointment_time: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    let lead = appointment_time - now;

    let mut offsets: Vec<DateTime<Utc>> = Vec::new();
    if lead > Duration::days(7) {
        offsets.push(appointment_time - Duration::days(7));
        offsets.push(appointment_time - Duration::days(3));
        offsets.push(appointment_time - Duration::days(1));
    } else if lead >= Duration::days(2) {
        offsets.push(appointment_time - Duration::days(1));
    }
    offsets.push(appointment_time - Duration::hours(2));

    offsets.retain(|t| *t > now);
    offsets.sort();
    offsets
}
