// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Charla workspace.
//!
//! Tenant and product records are owned by the external CRUD layer and are
//! read-only to the engine. Classification results and appointment slots are
//! ephemeral; appointments, conversation entries, and lead records are owned
//! by the storage collaborator.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// An inbound message delivered by the transport collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Sender identity (contact phone for messaging transports).
    pub from: String,
    /// Message text.
    pub body: String,
    /// Delivery timestamp.
    pub timestamp: DateTime<Utc>,
}

/// What a tenant bot is configured to drive toward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BotObjective {
    Sales,
    Appointments,
    Support,
}

/// Configuration of one tenant bot. Read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantConfig {
    pub id: String,
    pub owner_id: String,
    /// Substrings that open or match this tenant. Empty means an open bot
    /// that responds to any first contact.
    pub trigger_keywords: Vec<String>,
    /// Product this bot is pinned to, if any.
    pub linked_product_id: Option<String>,
    pub objective: BotObjective,
    /// Free-text tone description, e.g. "casual" or "formal".
    pub personality: String,
    /// Free-text behavioral instructions from the owner.
    pub instructions: String,
}

/// A catalog product. Read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub tags: Vec<String>,
}

/// Message intent categories. Order of detection is fixed in the classifier;
/// `General` is the defined default, never an absent value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Pricing,
    Purchase,
    Availability,
    Information,
    Appointment,
    Support,
    Comparison,
    Shipping,
    Warranty,
    Discount,
    General,
}

/// Discrete sentiment label derived from the normalized sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

/// Message urgency tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

/// Result of classifying a single message. Ephemeral, produced per message.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub intent: Intent,
    /// Normalized sentiment score in `[-1, 1]`; 0 when no lexicon fires.
    pub sentiment: f32,
    pub sentiment_label: SentimentLabel,
    pub urgency: Urgency,
}

/// AIDA funnel position of a (tenant, contact) conversation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FunnelStage {
    Attention,
    Interest,
    Desire,
    Action,
    Retention,
}

impl FunnelStage {
    /// Numeric funnel-progress value for reporting.
    pub fn progress(self) -> u8 {
        match self {
            FunnelStage::Attention => 20,
            FunnelStage::Interest => 40,
            FunnelStage::Desire => 70,
            FunnelStage::Action => 90,
            FunnelStage::Retention => 100,
        }
    }
}

/// A candidate appointment time with availability and desirability score.
/// Generated on demand, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentSlot {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_minutes: u32,
    pub available: bool,
    pub score: i32,
}

impl AppointmentSlot {
    /// Slot start as a combined date-time.
    pub fn start(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// Slot end (`start + duration`).
    pub fn end(&self) -> NaiveDateTime {
        self.start() + chrono::Duration::minutes(i64::from(self.duration_minutes))
    }
}

/// Lifecycle status of a booked appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Cancelled,
    Completed,
}

/// A booked appointment. Owned by storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub tenant_id: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub scheduled_at: NaiveDateTime,
    pub duration_minutes: u32,
    pub status: AppointmentStatus,
}

impl Appointment {
    /// Appointment end (`scheduled_at + duration`).
    pub fn end(&self) -> NaiveDateTime {
        self.scheduled_at + chrono::Duration::minutes(i64::from(self.duration_minutes))
    }
}

/// Creation payload for [`Appointment`]; storage assigns the id and initial status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub tenant_id: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub scheduled_at: NaiveDateTime,
    pub duration_minutes: u32,
}

/// CRM classification of a contact's sales progress.
///
/// Ordered so callers can enforce monotonic progression if they choose to;
/// the engine itself does not.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadStage {
    NewContact,
    Engaged,
    Qualified,
    ProposalSent,
    SaleClosed,
    Lost,
}

/// CRM lead state for a (tenant, contact) pair. Owned by storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub tenant_id: String,
    pub contact_phone: String,
    pub stage: LeadStage,
    pub estimated_value: f64,
    pub priority: u8,
}

/// Direction of a logged conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// One logged conversation message with its classification snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub tenant_id: String,
    pub contact_phone: String,
    pub direction: Direction,
    pub content: String,
    pub intent: Intent,
    pub sentiment: f32,
    pub timestamp: DateTime<Utc>,
}
