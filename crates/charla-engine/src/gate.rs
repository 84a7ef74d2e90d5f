// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Activation gate: decides whether a tenant bot answers a contact at all.
//!
//! A sliding window per (tenant, contact) marks a conversation as live;
//! inside it the contact is exempt from keyword gating. Outside it, an open
//! bot (empty trigger keyword set) answers anyone, and a keyworded bot only
//! answers messages its matcher scores above zero.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

use charla_core::types::TenantConfig;

use crate::matcher;

/// Why the gate let a message through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Unexpired conversation window; refreshed.
    WindowActive,
    /// Tenant has no trigger keywords; answers any first contact.
    OpenBot,
    /// Matcher scored the message above zero against the tenant's keywords.
    KeywordMatch,
    /// None of the above; the message is silently dropped.
    Drop,
}

impl GateDecision {
    pub fn should_respond(self) -> bool {
        self != GateDecision::Drop
    }
}

/// Sliding activation windows keyed by (tenant, contact).
pub struct ActivationGate {
    windows: DashMap<(String, String), DateTime<Utc>>,
    window: Duration,
}

impl ActivationGate {
    pub fn new(window_minutes: u32) -> Self {
        Self {
            windows: DashMap::new(),
            window: Duration::minutes(i64::from(window_minutes)),
        }
    }

    /// Evaluates the gate for one inbound message, creating or refreshing the
    /// window on any positive decision.
    pub fn evaluate(
        &self,
        tenant: &TenantConfig,
        contact: &str,
        message: &str,
        now: DateTime<Utc>,
    ) -> GateDecision {
        let decision = if self.window_open(&tenant.id, contact, now) {
            GateDecision::WindowActive
        } else if tenant.trigger_keywords.iter().all(|k| k.trim().is_empty()) {
            GateDecision::OpenBot
        } else if matcher::score(tenant, message) > 0 {
            GateDecision::KeywordMatch
        } else {
            GateDecision::Drop
        };

        if decision.should_respond() {
            self.refresh(&tenant.id, contact, now);
        } else {
            debug!(
                tenant_id = tenant.id.as_str(),
                contact,
                "activation gate dropped message"
            );
        }
        decision
    }

    /// Whether (tenant, contact) currently holds an unexpired window.
    pub fn window_open(&self, tenant_id: &str, contact: &str, now: DateTime<Utc>) -> bool {
        let key = (tenant_id.to_string(), contact.to_string());
        // The read guard must drop before the expired-entry removal.
        let expired = match self.windows.get(&key) {
            Some(expires) if *expires > now => return true,
            Some(_) => true,
            None => false,
        };
        if expired {
            self.windows.remove(&key);
        }
        false
    }

    /// Creates or extends the window; called on every inbound decision and on
    /// every outbound send.
    pub fn refresh(&self, tenant_id: &str, contact: &str, now: DateTime<Utc>) {
        self.windows.insert(
            (tenant_id.to_string(), contact.to_string()),
            now + self.window,
        );
    }
}
