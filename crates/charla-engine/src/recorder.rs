// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation and lead recording.
//!
//! Logging is best-effort: a storage failure warns and never aborts message
//! delivery. Lead stage changes are explicit external commands, not derived
//! from the funnel. Aggregations are read-side helpers outside the hot path.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use charla_core::types::{
    ClassificationResult, ConversationEntry, Direction, LeadRecord, LeadStage,
};
use charla_core::{CharlaError, Storage};

/// Records conversation entries and applies lead stage commands.
pub struct LeadRecorder {
    storage: Arc<dyn Storage>,
}

impl LeadRecorder {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Logs one direction of an exchange. Best-effort.
    pub async fn log(
        &self,
        tenant_id: &str,
        contact: &str,
        direction: Direction,
        content: &str,
        result: &ClassificationResult,
        timestamp: DateTime<Utc>,
    ) {
        let entry = ConversationEntry {
            tenant_id: tenant_id.to_string(),
            contact_phone: contact.to_string(),
            direction,
            content: content.to_string(),
            intent: result.intent,
            sentiment: result.sentiment,
            timestamp,
        };
        if let Err(e) = self.storage.log_conversation(entry).await {
            warn!(
                tenant_id,
                contact,
                %direction,
                error = %e,
                "conversation log write failed, continuing"
            );
        }
    }

    /// Applies an externally issued lead stage command. No monotonicity is
    /// enforced; ordering is the caller's concern.
    pub async fn set_lead_stage(
        &self,
        tenant_id: &str,
        contact: &str,
        stage: LeadStage,
        estimated_value: Option<f64>,
    ) -> Result<(), CharlaError> {
        self.storage
            .update_lead_stage(tenant_id, contact, stage, estimated_value)
            .await
    }
}

/// Lead counts per stage.
pub fn stage_counts(leads: &[LeadRecord]) -> HashMap<LeadStage, usize> {
    let mut counts = HashMap::new();
    for lead in leads {
        *counts.entry(lead.stage).or_insert(0) += 1;
    }
    counts
}

/// Share of distinct contacts at `qualified` or beyond (excluding `lost`).
pub fn conversion_rate(leads: &[LeadRecord]) -> f64 {
    let contacts: HashSet<(&str, &str)> = leads
        .iter()
        .map(|l| (l.tenant_id.as_str(), l.contact_phone.as_str()))
        .collect();
    if contacts.is_empty() {
        return 0.0;
    }
    let converted = leads
        .iter()
        .filter(|l| {
            matches!(
                l.stage,
                LeadStage::Qualified | LeadStage::ProposalSent | LeadStage::SaleClosed
            )
        })
        .count();
    converted as f64 / contacts.len() as f64
}
