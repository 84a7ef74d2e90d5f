// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Candidate slot generation and desirability scoring.
//!
//! Candidates cover the next `horizon_days` calendar days, Monday through
//! Friday, at hourly start times within business hours. Scoring rewards
//! matching the requested date/time, business-hour placement, and nearness
//! to today; the lunch window is penalized.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Timelike, Weekday};

use charla_config::SchedulingConfig;
use charla_core::types::{Appointment, AppointmentSlot};

use crate::conflicts::{find_conflicts, ranked_alternatives};

/// A request for an appointment slot.
#[derive(Debug, Clone, Default)]
pub struct SlotRequest {
    pub tenant_id: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub preferred_date: Option<NaiveDate>,
    pub preferred_time: Option<NaiveTime>,
    /// Falls back to `scheduling.default_duration_minutes` when absent.
    pub duration_minutes: Option<u32>,
}

/// Outcome of slot selection. Never an error: no availability is a
/// structured result with a human-readable reason.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotOutcome {
    Found(AppointmentSlot),
    Unavailable {
        reason: String,
        alternatives: Vec<AppointmentSlot>,
    },
}

/// Generates candidate slots over the scheduling horizon.
///
/// Weekends are skipped. A slot is unavailable when it overlaps any existing
/// appointment. `existing` may span multiple dates; each slot is checked
/// against the whole list.
pub fn generate_slots(
    cfg: &SchedulingConfig,
    today: NaiveDate,
    duration_minutes: u32,
    existing: &[Appointment],
) -> Vec<AppointmentSlot> {
    let mut slots = Vec::new();
    for offset in 0..cfg.horizon_days {
        let date = today + Duration::days(i64::from(offset));
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }
        for hour in cfg.day_start_hour..cfg.day_end_hour {
            let Some(time) = NaiveTime::from_hms_opt(hour, 0, 0) else {
                continue;
            };
            let start = date.and_time(time);
            let available = find_conflicts(start, duration_minutes, existing).is_empty();
            slots.push(AppointmentSlot {
                date,
                time,
                duration_minutes,
                available,
                score: 0,
            });
        }
    }
    slots
}

/// Scores one candidate against a request.
///
/// +50 requested date, +50 requested time, +20 business hour, -10 lunch
/// window [12,14), +15 within three days of today.
pub fn score_slot(
    slot: &AppointmentSlot,
    preferred_date: Option<NaiveDate>,
    preferred_time: Option<NaiveTime>,
    today: NaiveDate,
) -> i32 {
    let mut score = 0;
    if preferred_date == Some(slot.date) {
        score += 50;
    }
    if preferred_time == Some(slot.time) {
        score += 50;
    }
    let hour = slot.time.hour();
    if (9..=17).contains(&hour) {
        score += 20;
    }
    if (12..14).contains(&hour) {
        score -= 10;
    }
    if (slot.date - today).num_days().abs() <= 3 {
        score += 15;
    }
    score
}

/// Picks the best available slot for a request, or explains why none fits.
///
/// When a preferred date is given, only that date's candidates qualify;
/// other days are offered as ranked alternatives on failure. Ties on score
/// break toward the earliest start.
pub fn find_optimal_slot(
    cfg: &SchedulingConfig,
    today: NaiveDate,
    existing: &[Appointment],
    request: &SlotRequest,
) -> SlotOutcome {
    let duration = request
        .duration_minutes
        .unwrap_or(cfg.default_duration_minutes);
    let candidates = generate_slots(cfg, today, duration, existing);

    let eligible = candidates.iter().filter(|s| {
        s.available
            && s.duration_minutes >= duration
            && request.preferred_date.is_none_or(|d| s.date == d)
    });

    let mut best: Option<AppointmentSlot> = None;
    for slot in eligible {
        let score = score_slot(slot, request.preferred_date, request.preferred_time, today);
        let replace = match &best {
            None => true,
            Some(current) => {
                score > current.score
                    || (score == current.score && slot.start() < current.start())
            }
        };
        if replace {
            let mut chosen = slot.clone();
            chosen.score = score;
            best = Some(chosen);
        }
    }

    match best {
        Some(slot) => SlotOutcome::Found(slot),
        None => {
            let reason = match request.preferred_date {
                Some(date) => format!("no available slot on {date} for {duration} minutes"),
                None => format!(
                    "no available slot in the next {} days for {duration} minutes",
                    cfg.horizon_days
                ),
            };
            let alternatives = ranked_alternatives(
                &candidates,
                request.preferred_date,
                request.preferred_time,
                today,
                cfg.max_alternatives,
            );
            SlotOutcome::Unavailable {
                reason,
                alternatives,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charla_core::types::AppointmentStatus;

    // 2026-03-02 is a Monday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn cfg() -> SchedulingConfig {
        SchedulingConfig::default()
    }

    fn appt(date: NaiveDate, hour: u32, duration: u32) -> Appointment {
        Appointment {
            id: format!("a-{date}-{hour}"),
            tenant_id: "t1".into(),
            contact_name: "Ana".into(),
            contact_phone: "+100".into(),
            scheduled_at: date.and_hms_opt(hour, 0, 0).unwrap(),
            duration_minutes: duration,
            status: AppointmentStatus::Scheduled,
        }
    }

    #[test]
    fn generates_weekday_business_hours_only() {
        let slots = generate_slots(&cfg(), monday(), 60, &[]);
        // 14 calendar days from a Monday cover 10 weekdays of 9 slots each.
        assert_eq!(slots.len(), 90);
        assert!(slots
            .iter()
            .all(|s| !matches!(s.date.weekday(), Weekday::Sat | Weekday::Sun)));
        assert!(slots
            .iter()
            .all(|s| (9..18).contains(&s.time.hour())));
    }

    #[test]
    fn booked_slot_is_unavailable() {
        let existing = vec![appt(monday(), 10, 60)];
        let slots = generate_slots(&cfg(), monday(), 60, &existing);
        let ten = slots
            .iter()
            .find(|s| s.date == monday() && s.time.hour() == 10)
            .unwrap();
        assert!(!ten.available);
        let eleven = slots
            .iter()
            .find(|s| s.date == monday() && s.time.hour() == 11)
            .unwrap();
        assert!(eleven.available);
    }

    #[test]
    fn lunch_window_costs_exactly_ten() {
        let mk = |hour: u32| AppointmentSlot {
            date: monday(),
            time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            duration_minutes: 60,
            available: true,
            score: 0,
        };
        let at_11 = score_slot(&mk(11), None, None, monday());
        let at_12 = score_slot(&mk(12), None, None, monday());
        let at_13 = score_slot(&mk(13), None, None, monday());
        let at_14 = score_slot(&mk(14), None, None, monday());
        assert_eq!(at_11 - at_12, 10);
        assert_eq!(at_11 - at_13, 10);
        assert_eq!(at_11, at_14, "14:00 is outside the lunch window");
    }

    #[test]
    fn preferred_date_match_scores_seventy_or_more() {
        let today = monday();
        let preferred = today + Duration::days(2); // Wednesday
        let slot = AppointmentSlot {
            date: preferred,
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            duration_minutes: 60,
            available: true,
            score: 0,
        };
        // 50 (date) + 20 (business hours) + 15 (within 3 days) = 85.
        let score = score_slot(&slot, Some(preferred), None, today);
        assert!(score >= 70, "got {score}");
    }

    #[test]
    fn preferred_free_slot_wins() {
        let today = monday();
        let preferred = today + Duration::days(2);
        let request = SlotRequest {
            tenant_id: "t1".into(),
            preferred_date: Some(preferred),
            preferred_time: Some(NaiveTime::from_hms_opt(10, 0, 0).unwrap()),
            ..Default::default()
        };
        match find_optimal_slot(&cfg(), today, &[], &request) {
            SlotOutcome::Found(slot) => {
                assert_eq!(slot.date, preferred);
                assert_eq!(slot.time.hour(), 10);
                assert!(slot.score >= 70);
            }
            SlotOutcome::Unavailable { reason, .. } => panic!("expected a slot: {reason}"),
        }
    }

    #[test]
    fn fully_booked_preferred_day_fails_with_alternatives() {
        let today = monday();
        let existing: Vec<Appointment> =
            (9..18).map(|h| appt(today, h, 60)).collect();
        let request = SlotRequest {
            tenant_id: "t1".into(),
            preferred_date: Some(today),
            ..Default::default()
        };
        match find_optimal_slot(&cfg(), today, &existing, &request) {
            SlotOutcome::Unavailable {
                reason,
                alternatives,
            } => {
                assert!(!reason.is_empty());
                assert!(alternatives.len() <= 5);
                assert!(!alternatives.is_empty());
                assert!(
                    alternatives.iter().all(|s| s.date != today),
                    "alternatives must come from other days"
                );
            }
            SlotOutcome::Found(slot) => panic!("unexpected slot {slot:?}"),
        }
    }

    #[test]
    fn equal_scores_break_toward_earliest() {
        let today = monday();
        let request = SlotRequest {
            tenant_id: "t1".into(),
            ..Default::default()
        };
        // No preferences: every slot in the first three days scores the
        // same except the lunch window, so 09:00 today must win.
        match find_optimal_slot(&cfg(), today, &[], &request) {
            SlotOutcome::Found(slot) => {
                assert_eq!(slot.date, today);
                assert_eq!(slot.time.hour(), 9);
            }
            SlotOutcome::Unavailable { reason, .. } => panic!("expected a slot: {reason}"),
        }
    }

    #[test]
    fn weekend_preferred_date_has_no_candidates() {
        let today = monday();
        let saturday = today + Duration::days(5);
        let request = SlotRequest {
            tenant_id: "t1".into(),
            preferred_date: Some(saturday),
            ..Default::default()
        };
        match find_optimal_slot(&cfg(), today, &[], &request) {
            SlotOutcome::Unavailable { alternatives, .. } => {
                assert!(!alternatives.is_empty());
            }
            SlotOutcome::Found(slot) => panic!("unexpected slot {slot:?}"),
        }
    }
}
