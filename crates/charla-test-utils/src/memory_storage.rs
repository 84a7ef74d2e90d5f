// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory storage collaborator for deterministic testing.
//!
//! `MemoryStorage` implements `Storage` over plain vectors and maps, with
//! failure-injection switches for exercising degraded-read and failed-write
//! paths.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use tokio::sync::Mutex;

use charla_core::traits::Storage;
use charla_core::types::{
    Appointment, AppointmentStatus, ConversationEntry, LeadStage, NewAppointment, Product,
    TenantConfig,
};
use charla_core::CharlaError;

fn induced(what: &str) -> CharlaError {
    CharlaError::storage(std::io::Error::other(format!("induced {what} failure")))
}

/// Recorded lead state for assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadState {
    pub stage: LeadStage,
    pub estimated_value: Option<f64>,
}

/// An in-memory `Storage` implementation.
pub struct MemoryStorage {
    tenants: Mutex<HashMap<String, Vec<TenantConfig>>>,
    products: Mutex<HashMap<String, Vec<Product>>>,
    conversations: Mutex<Vec<ConversationEntry>>,
    appointments: Mutex<Vec<Appointment>>,
    leads: Mutex<HashMap<(String, String), LeadState>>,
    fail_reads: Mutex<bool>,
    fail_appointment_writes: Mutex<bool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            tenants: Mutex::new(HashMap::new()),
            products: Mutex::new(HashMap::new()),
            conversations: Mutex::new(Vec::new()),
            appointments: Mutex::new(Vec::new()),
            leads: Mutex::new(HashMap::new()),
            fail_reads: Mutex::new(false),
            fail_appointment_writes: Mutex::new(false),
        }
    }

    /// Attach a tenant to a messaging account. Insertion order is the
    /// creation order seen by the matcher.
    pub async fn add_tenant(&self, account_id: &str, tenant: TenantConfig) {
        self.tenants
            .lock()
            .await
            .entry(account_id.to_string())
            .or_default()
            .push(tenant);
    }

    pub async fn add_product(&self, tenant_id: &str, product: Product) {
        self.products
            .lock()
            .await
            .entry(tenant_id.to_string())
            .or_default()
            .push(product);
    }

    pub async fn add_appointment(&self, appointment: Appointment) {
        self.appointments.lock().await.push(appointment);
    }

    pub async fn logged_entries(&self) -> Vec<ConversationEntry> {
        self.conversations.lock().await.clone()
    }

    pub async fn appointments(&self) -> Vec<Appointment> {
        self.appointments.lock().await.clone()
    }

    pub async fn lead_state(&self, tenant_id: &str, contact: &str) -> Option<LeadState> {
        self.leads
            .lock()
            .await
            .get(&(tenant_id.to_string(), contact.to_string()))
            .cloned()
    }

    /// Make all read methods fail until reset.
    pub async fn set_fail_reads(&self, fail: bool) {
        *self.fail_reads.lock().await = fail;
    }

    /// Make `create_appointment` fail until reset.
    pub async fn set_fail_appointment_writes(&self, fail: bool) {
        *self.fail_appointment_writes.lock().await = fail;
    }

    async fn check_reads(&self, what: &str) -> Result<(), CharlaError> {
        if *self.fail_reads.lock().await {
            return Err(induced(what));
        }
        Ok(())
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_tenants_for_account(
        &self,
        account_id: &str,
    ) -> Result<Vec<TenantConfig>, CharlaError> {
        self.check_reads("tenant read").await?;
        Ok(self
            .tenants
            .lock()
            .await
            .get(account_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_tenant_config(
        &self,
        tenant_id: &str,
    ) -> Result<Option<TenantConfig>, CharlaError> {
        self.check_reads("tenant read").await?;
        Ok(self
            .tenants
            .lock()
            .await
            .values()
            .flatten()
            .find(|t| t.id == tenant_id)
            .cloned())
    }

    async fn get_product(&self, id: &str) -> Result<Option<Product>, CharlaError> {
        self.check_reads("product read").await?;
        Ok(self
            .products
            .lock()
            .await
            .values()
            .flatten()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn get_products(&self, tenant_id: &str) -> Result<Vec<Product>, CharlaError> {
        self.check_reads("product read").await?;
        Ok(self
            .products
            .lock()
            .await
            .get(tenant_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_recent_messages(
        &self,
        tenant_id: &str,
        contact: &str,
        window_minutes: u32,
    ) -> Result<Vec<ConversationEntry>, CharlaError> {
        self.check_reads("conversation read").await?;
        let cutoff = Utc::now() - Duration::minutes(i64::from(window_minutes));
        Ok(self
            .conversations
            .lock()
            .await
            .iter()
            .filter(|e| {
                e.tenant_id == tenant_id
                    && e.contact_phone == contact
                    && e.timestamp >= cutoff
            })
            .cloned()
            .collect())
    }

    async fn get_appointments(
        &self,
        tenant_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, CharlaError> {
        self.check_reads("appointment read").await?;
        Ok(self
            .appointments
            .lock()
            .await
            .iter()
            .filter(|a| a.tenant_id == tenant_id && a.scheduled_at.date() == date)
            .cloned()
            .collect())
    }

    async fn create_appointment(
        &self,
        data: NewAppointment,
    ) -> Result<Appointment, CharlaError> {
        if *self.fail_appointment_writes.lock().await {
            return Err(induced("appointment write"));
        }
        let appointment = Appointment {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: data.tenant_id,
            contact_name: data.contact_name,
            contact_phone: data.contact_phone,
            scheduled_at: data.scheduled_at,
            duration_minutes: data.duration_minutes,
            status: AppointmentStatus::Scheduled,
        };
        self.appointments.lock().await.push(appointment.clone());
        Ok(appointment)
    }

    async fn log_conversation(&self, entry: ConversationEntry) -> Result<(), CharlaError> {
        self.conversations.lock().await.push(entry);
        Ok(())
    }

    async fn update_lead_stage(
        &self,
        tenant_id: &str,
        contact: &str,
        stage: LeadStage,
        estimated_value: Option<f64>,
    ) -> Result<(), CharlaError> {
        self.leads.lock().await.insert(
            (tenant_id.to_string(), contact.to_string()),
            LeadState {
                stage,
                estimated_value,
            },
        );
        Ok(())
    }
}

/// Builds a minimal tenant config for tests.
pub fn tenant(id: &str, keywords: &[&str]) -> TenantConfig {
    TenantConfig {
        id: id.to_string(),
        owner_id: format!("owner-{id}"),
        trigger_keywords: keywords.iter().map(|k| k.to_string()).collect(),
        linked_product_id: None,
        objective: charla_core::types::BotObjective::Sales,
        personality: "casual".to_string(),
        instructions: String::new(),
    }
}

/// Builds a minimal product for tests.
pub fn product(id: &str, name: &str, category: &str, tags: &[&str]) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{name} description"),
        price: 25.0,
        category: category.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}
