// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage collaborator trait for tenant configuration, conversation history,
//! appointments, and lead state.
//!
//! Charla carries no persistence engine of its own; everything stateful
//! beyond live sessions goes through this trait.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::CharlaError;
use crate::types::{
    Appointment, ConversationEntry, LeadStage, NewAppointment, Product, TenantConfig,
};

/// Persistence backend exposed to the routing pipeline and slot engine.
#[async_trait]
pub trait Storage: Send + Sync {
    /// All tenant bots attached to one messaging account, in creation order.
    ///
    /// Creation order is load-bearing: the matcher breaks ties by it.
    async fn get_tenants_for_account(
        &self,
        account_id: &str,
    ) -> Result<Vec<TenantConfig>, CharlaError>;

    /// A single tenant config by id.
    async fn get_tenant_config(
        &self,
        tenant_id: &str,
    ) -> Result<Option<TenantConfig>, CharlaError>;

    /// A single product by id.
    async fn get_product(&self, id: &str) -> Result<Option<Product>, CharlaError>;

    /// A tenant's catalog, in creation order.
    async fn get_products(&self, tenant_id: &str) -> Result<Vec<Product>, CharlaError>;

    /// Conversation entries for a (tenant, contact) pair within the last
    /// `window_minutes`, oldest first.
    async fn get_recent_messages(
        &self,
        tenant_id: &str,
        contact: &str,
        window_minutes: u32,
    ) -> Result<Vec<ConversationEntry>, CharlaError>;

    /// Appointments for one tenant on one date.
    async fn get_appointments(
        &self,
        tenant_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, CharlaError>;

    /// Persists a new appointment and returns it with its assigned id.
    async fn create_appointment(
        &self,
        data: NewAppointment,
    ) -> Result<Appointment, CharlaError>;

    /// Appends a conversation entry.
    async fn log_conversation(&self, entry: ConversationEntry) -> Result<(), CharlaError>;

    /// Applies an externally issued lead stage command. No ordering is
    /// enforced between stages.
    async fn update_lead_stage(
        &self,
        tenant_id: &str,
        contact: &str,
        stage: LeadStage,
        estimated_value: Option<f64>,
    ) -> Result<(), CharlaError>;
}
