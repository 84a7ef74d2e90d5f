// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage-backed slot engine.
//!
//! Wraps the pure slot functions with appointment reads and the booking
//! write. Concurrent booking requests for the same tenant/date can race the
//! initial scan, so the conflict check re-runs against a fresh read
//! immediately before the appointment write commits.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use tracing::{info, warn};

use charla_config::SchedulingConfig;
use charla_core::types::{Appointment, AppointmentSlot, NewAppointment};
use charla_core::{CharlaError, Storage};

use crate::conflicts::{find_conflicts, ranked_alternatives};
use crate::slots::{find_optimal_slot, generate_slots, SlotOutcome, SlotRequest};

/// Result of a conflict probe for an explicit candidate interval.
#[derive(Debug, Clone)]
pub struct ConflictReport {
    pub conflicts: Vec<Appointment>,
    /// Ranked replacement suggestions; empty when there is no conflict.
    pub alternatives: Vec<AppointmentSlot>,
}

impl ConflictReport {
    pub fn has_conflict(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Outcome of a booking attempt.
#[derive(Debug, Clone)]
pub enum BookingOutcome {
    Booked(Appointment),
    Unavailable {
        reason: String,
        alternatives: Vec<AppointmentSlot>,
    },
}

/// Appointment slot allocation against the storage collaborator.
pub struct SlotEngine {
    storage: Arc<dyn Storage>,
    cfg: SchedulingConfig,
}

impl SlotEngine {
    pub fn new(storage: Arc<dyn Storage>, cfg: SchedulingConfig) -> Self {
        Self { storage, cfg }
    }

    /// Reads a tenant's appointments across the scheduling horizon.
    ///
    /// A failed read degrades to "no conflicts known" for that date with a
    /// warning, rather than blocking slot suggestions.
    async fn load_horizon(&self, tenant_id: &str, today: NaiveDate) -> Vec<Appointment> {
        let mut existing = Vec::new();
        for offset in 0..self.cfg.horizon_days {
            let date = today + Duration::days(i64::from(offset));
            match self.storage.get_appointments(tenant_id, date).await {
                Ok(mut appts) => existing.append(&mut appts),
                Err(e) => {
                    warn!(
                        tenant_id,
                        %date,
                        error = %e,
                        "appointment read failed, assuming no conflicts for date"
                    );
                }
            }
        }
        existing
    }

    /// Finds the best available slot for a request.
    pub async fn find_optimal_slot(&self, request: &SlotRequest) -> SlotOutcome {
        let today = Utc::now().date_naive();
        let existing = self.load_horizon(&request.tenant_id, today).await;
        find_optimal_slot(&self.cfg, today, &existing, request)
    }

    /// Checks an explicit candidate interval against a tenant's booked
    /// appointments and, on conflict, suggests ranked alternatives.
    pub async fn detect_conflicts(
        &self,
        tenant_id: &str,
        candidate_start: NaiveDateTime,
        duration_minutes: u32,
    ) -> ConflictReport {
        let date = candidate_start.date();
        let same_day = match self.storage.get_appointments(tenant_id, date).await {
            Ok(appts) => appts,
            Err(e) => {
                warn!(
                    tenant_id,
                    %date,
                    error = %e,
                    "appointment read failed, assuming no conflicts"
                );
                Vec::new()
            }
        };

        let conflicts: Vec<Appointment> =
            find_conflicts(candidate_start, duration_minutes, &same_day)
                .into_iter()
                .cloned()
                .collect();

        let alternatives = if conflicts.is_empty() {
            Vec::new()
        } else {
            let today = Utc::now().date_naive();
            let existing = self.load_horizon(tenant_id, today).await;
            let candidates = generate_slots(&self.cfg, today, duration_minutes, &existing);
            ranked_alternatives(
                &candidates,
                Some(date),
                Some(candidate_start.time()),
                today,
                self.cfg.max_alternatives,
            )
        };

        ConflictReport {
            conflicts,
            alternatives,
        }
    }

    /// Books the best slot for a request.
    ///
    /// The scan-then-create window is not otherwise protected, so the
    /// conflict check is re-executed against a fresh read immediately before
    /// the write. Write failures surface to the caller.
    pub async fn book(&self, request: &SlotRequest) -> Result<BookingOutcome, CharlaError> {
        let slot = match self.find_optimal_slot(request).await {
            SlotOutcome::Found(slot) => slot,
            SlotOutcome::Unavailable {
                reason,
                alternatives,
            } => {
                return Ok(BookingOutcome::Unavailable {
                    reason,
                    alternatives,
                })
            }
        };

        // Optimistic recheck against the latest same-day state.
        let recheck = self
            .detect_conflicts(&request.tenant_id, slot.start(), slot.duration_minutes)
            .await;
        if recheck.has_conflict() {
            info!(
                tenant_id = request.tenant_id.as_str(),
                start = %slot.start(),
                "slot taken between scan and commit"
            );
            return Ok(BookingOutcome::Unavailable {
                reason: format!("slot {} was just taken", slot.start()),
                alternatives: recheck.alternatives,
            });
        }

        let appointment = self
            .storage
            .create_appointment(NewAppointment {
                tenant_id: request.tenant_id.clone(),
                contact_name: request.contact_name.clone(),
                contact_phone: request.contact_phone.clone(),
                scheduled_at: slot.start(),
                duration_minutes: slot.duration_minutes,
            })
            .await?;

        info!(
            tenant_id = request.tenant_id.as_str(),
            appointment_id = appointment.id.as_str(),
            scheduled_at = %appointment.scheduled_at,
            "appointment booked"
        );
        Ok(BookingOutcome::Booked(appointment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{Datelike, NaiveTime, Timelike, Weekday};
    use tokio::sync::Mutex;

    use charla_core::types::{
        AppointmentStatus, ConversationEntry, LeadStage, Product, TenantConfig,
    };
    use charla_test_utils::MemoryStorage;

    fn cfg() -> SchedulingConfig {
        SchedulingConfig::default()
    }

    /// Next weekday strictly after today; keeps the preferred date inside
    /// business days regardless of when the test runs.
    fn next_weekday() -> NaiveDate {
        let mut date = Utc::now().date_naive() + Duration::days(1);
        while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            date += Duration::days(1);
        }
        date
    }

    fn request(date: NaiveDate, hour: u32) -> SlotRequest {
        SlotRequest {
            tenant_id: "t1".into(),
            contact_name: "Ana".into(),
            contact_phone: "+100".into(),
            preferred_date: Some(date),
            preferred_time: NaiveTime::from_hms_opt(hour, 0, 0),
            duration_minutes: None,
        }
    }

    fn rival(date: NaiveDate, hour: u32) -> Appointment {
        Appointment {
            id: "rival".into(),
            tenant_id: "t1".into(),
            contact_name: "Luis".into(),
            contact_phone: "+200".into(),
            scheduled_at: date.and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap()),
            duration_minutes: 60,
            status: AppointmentStatus::Scheduled,
        }
    }

    /// Delegates to `MemoryStorage` and, once `trip_after` appointment reads
    /// have completed, commits a staged appointment into the store. Lands a
    /// rival booking between the slot scan and the pre-write recheck.
    struct TrippingStorage {
        inner: Arc<MemoryStorage>,
        reads: AtomicUsize,
        trip_after: usize,
        staged: Mutex<Option<Appointment>>,
    }

    #[async_trait]
    impl Storage for TrippingStorage {
        async fn get_tenants_for_account(
            &self,
            account_id: &str,
        ) -> Result<Vec<TenantConfig>, CharlaError> {
            self.inner.get_tenants_for_account(account_id).await
        }

        async fn get_tenant_config(
            &self,
            tenant_id: &str,
        ) -> Result<Option<TenantConfig>, CharlaError> {
            self.inner.get_tenant_config(tenant_id).await
        }

        async fn get_product(&self, id: &str) -> Result<Option<Product>, CharlaError> {
            self.inner.get_product(id).await
        }

        async fn get_products(&self, tenant_id: &str) -> Result<Vec<Product>, CharlaError> {
            self.inner.get_products(tenant_id).await
        }

        async fn get_recent_messages(
            &self,
            tenant_id: &str,
            contact: &str,
            window_minutes: u32,
        ) -> Result<Vec<ConversationEntry>, CharlaError> {
            self.inner
                .get_recent_messages(tenant_id, contact, window_minutes)
                .await
        }

        async fn get_appointments(
            &self,
            tenant_id: &str,
            date: NaiveDate,
        ) -> Result<Vec<Appointment>, CharlaError> {
            let result = self.inner.get_appointments(tenant_id, date).await;
            if self.reads.fetch_add(1, Ordering::SeqCst) + 1 == self.trip_after {
                if let Some(appointment) = self.staged.lock().await.take() {
                    self.inner.add_appointment(appointment).await;
                }
            }
            result
        }

        async fn create_appointment(
            &self,
            data: NewAppointment,
        ) -> Result<Appointment, CharlaError> {
            self.inner.create_appointment(data).await
        }

        async fn log_conversation(&self, entry: ConversationEntry) -> Result<(), CharlaError> {
            self.inner.log_conversation(entry).await
        }

        async fn update_lead_stage(
            &self,
            tenant_id: &str,
            contact: &str,
            stage: LeadStage,
            estimated_value: Option<f64>,
        ) -> Result<(), CharlaError> {
            self.inner
                .update_lead_stage(tenant_id, contact, stage, estimated_value)
                .await
        }
    }

    #[tokio::test]
    async fn successive_bookings_never_overlap() {
        let storage = Arc::new(MemoryStorage::new());
        let engine = SlotEngine::new(Arc::clone(&storage) as Arc<dyn Storage>, cfg());
        let date = next_weekday();

        let first = engine.book(&request(date, 10)).await.unwrap();
        let second = engine.book(&request(date, 10)).await.unwrap();

        let (a, b) = match (first, second) {
            (BookingOutcome::Booked(a), BookingOutcome::Booked(b)) => (a, b),
            other => panic!("expected two bookings, got {other:?}"),
        };
        assert_eq!(a.scheduled_at.time().hour(), 10);
        assert_ne!(a.scheduled_at, b.scheduled_at);
        assert!(
            a.end() <= b.scheduled_at || b.end() <= a.scheduled_at,
            "bookings overlap: {a:?} vs {b:?}"
        );
        assert_eq!(storage.appointments().await.len(), 2);
    }

    #[tokio::test]
    async fn commit_recheck_catches_interleaved_booking() {
        let inner = Arc::new(MemoryStorage::new());
        let scheduling = cfg();
        let date = next_weekday();
        // The rival appointment lands right after the initial horizon scan
        // finishes, taking the exact slot the scan selected.
        let storage = Arc::new(TrippingStorage {
            inner: Arc::clone(&inner),
            reads: AtomicUsize::new(0),
            trip_after: scheduling.horizon_days as usize,
            staged: Mutex::new(Some(rival(date, 10))),
        });
        let engine = SlotEngine::new(storage as Arc<dyn Storage>, scheduling);

        match engine.book(&request(date, 10)).await.unwrap() {
            BookingOutcome::Unavailable {
                reason,
                alternatives,
            } => {
                assert!(reason.contains("just taken"), "got {reason}");
                assert!(alternatives
                    .iter()
                    .all(|s| !(s.date == date && s.time.hour() == 10)));
            }
            BookingOutcome::Booked(a) => panic!("recheck missed the rival booking: {a:?}"),
        }
        let stored = inner.appointments().await;
        assert_eq!(stored.len(), 1, "only the rival booking may exist");
        assert_eq!(stored[0].id, "rival");
    }

    #[tokio::test]
    async fn booking_write_failure_surfaces() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_fail_appointment_writes(true).await;
        let engine = SlotEngine::new(Arc::clone(&storage) as Arc<dyn Storage>, cfg());

        assert!(engine.book(&request(next_weekday(), 10)).await.is_err());
        assert!(storage.appointments().await.is_empty());
    }

    #[tokio::test]
    async fn detect_conflicts_reports_overlap_with_alternatives() {
        let storage = Arc::new(MemoryStorage::new());
        let date = next_weekday();
        storage.add_appointment(rival(date, 10)).await;
        let engine = SlotEngine::new(Arc::clone(&storage) as Arc<dyn Storage>, cfg());

        let candidate = date.and_time(NaiveTime::from_hms_opt(10, 30, 0).unwrap());
        let report = engine.detect_conflicts("t1", candidate, 60).await;
        assert!(report.has_conflict());
        assert_eq!(report.conflicts[0].id, "rival");
        assert!(!report.alternatives.is_empty());
        assert!(report.alternatives.iter().all(|s| s.available));

        let clear = date.and_time(NaiveTime::from_hms_opt(15, 0, 0).unwrap());
        let report = engine.detect_conflicts("t1", clear, 60).await;
        assert!(!report.has_conflict());
        assert!(report.alternatives.is_empty());
    }

    #[tokio::test]
    async fn read_failure_degrades_to_open_calendar() {
        let storage = Arc::new(MemoryStorage::new());
        let date = next_weekday();
        storage.add_appointment(rival(date, 10)).await;
        storage.set_fail_reads(true).await;
        let engine = SlotEngine::new(Arc::clone(&storage) as Arc<dyn Storage>, cfg());

        // Failed reads degrade to an open calendar; the blocked slot still
        // comes back as a suggestion rather than an error.
        match engine.find_optimal_slot(&request(date, 10)).await {
            SlotOutcome::Found(slot) => {
                assert_eq!(slot.date, date);
                assert_eq!(slot.time.hour(), 10);
            }
            SlotOutcome::Unavailable { reason, .. } => panic!("expected a slot: {reason}"),
        }
    }
}
