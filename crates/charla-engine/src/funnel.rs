// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AIDA funnel tracker.
//!
//! Maps each message to a funnel stage from purchase/benefit/price keyword
//! cues, carrying the previous stage forward when nothing fires. `Retention`
//! is set externally once a sale closes, never derived here.

use dashmap::DashMap;

use charla_core::types::FunnelStage;

// Priority order: action cues beat desire cues beat interest cues.
const ACTION_CUES: &[&str] = &[
    "comprar",
    "lo llevo",
    "lo compro",
    "proceder",
    "confirmo",
    "quiero uno",
    "quiero una",
];
const DESIRE_CUES: &[&str] = &[
    "mejor",
    "beneficio",
    "ventaja",
    "comparar",
    "diferencia",
    "recomiend",
    "me conviene",
    "vale la pena",
];
const INTEREST_CUES: &[&str] = &[
    "precio",
    "cuanto",
    "cuánto",
    "costo",
    "detalle",
    "caracter",
    "informaci",
    "como funciona",
    "cómo funciona",
];

/// Pure stage rule.
///
/// First or second message is always `Attention`; afterwards keyword cues
/// decide, falling back to the previous stage and then to `Interest`.
pub fn stage_for(
    message: &str,
    history_len: usize,
    previous: Option<FunnelStage>,
) -> FunnelStage {
    if history_len <= 1 {
        return FunnelStage::Attention;
    }
    let message = message.to_lowercase();
    if ACTION_CUES.iter().any(|cue| message.contains(cue)) {
        FunnelStage::Action
    } else if DESIRE_CUES.iter().any(|cue| message.contains(cue)) {
        FunnelStage::Desire
    } else if INTEREST_CUES.iter().any(|cue| message.contains(cue)) {
        FunnelStage::Interest
    } else {
        previous.unwrap_or(FunnelStage::Interest)
    }
}

/// Per-(tenant, contact) funnel position memory.
#[derive(Default)]
pub struct FunnelTracker {
    stages: DashMap<(String, String), FunnelStage>,
}

impl FunnelTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances a conversation's stage for one message and records it.
    pub fn advance(
        &self,
        tenant_id: &str,
        contact: &str,
        message: &str,
        history_len: usize,
    ) -> FunnelStage {
        let key = (tenant_id.to_string(), contact.to_string());
        let previous = self.stages.get(&key).map(|s| *s);
        let stage = stage_for(message, history_len, previous);
        self.stages.insert(key, stage);
        stage
    }

    /// Marks a conversation retained after an externally reported sale close.
    pub fn mark_retention(&self, tenant_id: &str, contact: &str) {
        self.stages.insert(
            (tenant_id.to_string(), contact.to_string()),
            FunnelStage::Retention,
        );
    }

    pub fn current(&self, tenant_id: &str, contact: &str) -> Option<FunnelStage> {
        self.stages
            .get(&(tenant_id.to_string(), contact.to_string()))
            .map(|s| *s)
    }
}
