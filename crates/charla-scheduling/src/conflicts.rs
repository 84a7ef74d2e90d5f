// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interval overlap detection and ranked alternative generation.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use charla_core::types::{Appointment, AppointmentSlot, AppointmentStatus};

use crate::slots::score_slot;

/// Bonus applied to alternatives falling on the same weekday as the
/// originally preferred date.
const SAME_WEEKDAY_BONUS: i32 = 10;

/// Returns `true` iff the candidate interval overlaps the appointment.
///
/// Overlap rule: `new_start < existing_end && new_end > existing_start`.
/// Cancelled appointments never conflict.
pub fn overlaps(
    new_start: NaiveDateTime,
    new_duration_minutes: u32,
    existing: &Appointment,
) -> bool {
    if existing.status == AppointmentStatus::Cancelled {
        return false;
    }
    let new_end = new_start + Duration::minutes(i64::from(new_duration_minutes));
    new_start < existing.end() && new_end > existing.scheduled_at
}

/// All appointments conflicting with a candidate interval.
pub fn find_conflicts<'a>(
    new_start: NaiveDateTime,
    new_duration_minutes: u32,
    existing: &'a [Appointment],
) -> Vec<&'a Appointment> {
    existing
        .iter()
        .filter(|a| overlaps(new_start, new_duration_minutes, a))
        .collect()
}

/// Ranks the available candidates as alternatives to a rejected request.
///
/// Re-scores every available candidate, biasing toward the preferred date's
/// weekday when one was given, and ordering ties by absolute hour distance
/// from the preferred time (then chronologically). Returns at most `limit`.
pub fn ranked_alternatives(
    candidates: &[AppointmentSlot],
    preferred_date: Option<NaiveDate>,
    preferred_time: Option<NaiveTime>,
    today: NaiveDate,
    limit: usize,
) -> Vec<AppointmentSlot> {
    let mut ranked: Vec<(i32, i64, AppointmentSlot)> = candidates
        .iter()
        .filter(|s| s.available)
        .map(|s| {
            let mut score = score_slot(s, preferred_date, preferred_time, today);
            if let Some(pref) = preferred_date {
                if s.date != pref && s.date.weekday() == pref.weekday() {
                    score += SAME_WEEKDAY_BONUS;
                }
            }
            let hour_distance = preferred_time
                .map(|t| (i64::from(s.time.hour()) - i64::from(t.hour())).abs())
                .unwrap_or(0);
            let mut slot = s.clone();
            slot.score = score;
            (score, hour_distance, slot)
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then(a.1.cmp(&b.1))
            .then(a.2.start().cmp(&b.2.start()))
    });

    ranked.into_iter().take(limit).map(|(_, _, s)| s).collect()
}
