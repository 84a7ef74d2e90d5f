// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing pipeline: the per-message orchestration path.
//!
//! tenant selection → activation gate → product detection → classification →
//! funnel stage → response policy (slot engine on appointment intent) → send
//! → conversation logging.
//!
//! Internal failures never reach the contact: a lookup miss or storage error
//! is logged and the reply is simply absent. Per tenant, messages arrive in
//! order on the shared session event stream; the single consumer loop
//! preserves that order.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use charla_config::{CharlaConfig, EngineConfig};
use charla_core::types::{Direction, InboundMessage, Intent, Product};
use charla_core::{OutboundSender, Storage};
use charla_scheduling::{SlotEngine, SlotOutcome, SlotRequest};
use charla_session::SessionEvent;

use crate::classifier::{Classifier, RuleClassifier};
use crate::funnel::FunnelTracker;
use crate::gate::ActivationGate;
use crate::matcher;
use crate::policy::ResponsePolicy;
use crate::recorder::LeadRecorder;

/// Why a message produced no reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Tenant list read failed.
    StorageUnavailable,
    /// The account has no tenants configured.
    NoTenants,
    /// No tenant matched and no fallback applied.
    NoTenantMatch,
    /// The activation gate dropped the message.
    Gated,
    /// The transport refused the outbound send.
    SendFailed,
}

/// Result of routing one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    Replied { tenant_id: String, reply: String },
    Dropped(DropReason),
}

/// The engine's entry point, wired once at startup.
pub struct RoutingPipeline {
    storage: Arc<dyn Storage>,
    sender: Arc<dyn OutboundSender>,
    classifier: Arc<dyn Classifier>,
    gate: ActivationGate,
    funnel: FunnelTracker,
    policy: ResponsePolicy,
    recorder: LeadRecorder,
    slots: SlotEngine,
    engine_cfg: EngineConfig,
}

impl RoutingPipeline {
    pub fn new(
        storage: Arc<dyn Storage>,
        sender: Arc<dyn OutboundSender>,
        cfg: &CharlaConfig,
    ) -> Self {
        Self {
            gate: ActivationGate::new(cfg.engine.activation_window_minutes),
            funnel: FunnelTracker::new(),
            policy: ResponsePolicy::new(),
            recorder: LeadRecorder::new(Arc::clone(&storage)),
            slots: SlotEngine::new(Arc::clone(&storage), cfg.scheduling.clone()),
            classifier: Arc::new(RuleClassifier),
            engine_cfg: cfg.engine.clone(),
            storage,
            sender,
        }
    }

    /// Swaps the rule classifier for another implementation.
    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Routes one inbound message for a messaging account.
    pub async fn route(&self, account_id: &str, inbound: &InboundMessage) -> RouteOutcome {
        let contact = inbound.from.as_str();
        let now = inbound.timestamp;

        let tenants = match self.storage.get_tenants_for_account(account_id).await {
            Ok(tenants) => tenants,
            Err(e) => {
                warn!(account_id, error = %e, "tenant list read failed, dropping message");
                return RouteOutcome::Dropped(DropReason::StorageUnavailable);
            }
        };
        if tenants.is_empty() {
            debug!(account_id, "no tenants configured for account");
            return RouteOutcome::Dropped(DropReason::NoTenants);
        }

        // Keyword score first; mid-conversation contacts fall back to the
        // tenant holding their activation window, then to an open bot.
        let tenant = match matcher::best_match(&tenants, &inbound.body) {
            Some((tenant, score)) => {
                debug!(tenant_id = tenant.id.as_str(), score, "tenant matched by score");
                tenant
            }
            None => {
                let fallback = tenants
                    .iter()
                    .find(|t| self.gate.window_open(&t.id, contact, now))
                    .or_else(|| {
                        tenants
                            .iter()
                            .find(|t| t.trigger_keywords.iter().all(|k| k.trim().is_empty()))
                    });
                match fallback {
                    Some(tenant) => tenant,
                    None => {
                        debug!(account_id, contact, "no tenant match, dropping message");
                        return RouteOutcome::Dropped(DropReason::NoTenantMatch);
                    }
                }
            }
        };

        let classification = self.classifier.classify(&inbound.body);

        let decision = self.gate.evaluate(tenant, contact, &inbound.body, now);
        if !decision.should_respond() {
            // The inbound record is still kept; only the reply is withheld.
            self.recorder
                .log(
                    &tenant.id,
                    contact,
                    Direction::Inbound,
                    &inbound.body,
                    &classification,
                    now,
                )
                .await;
            return RouteOutcome::Dropped(DropReason::Gated);
        }

        let product = self.resolve_product(tenant, &inbound.body).await;

        let history_len = match self
            .storage
            .get_recent_messages(&tenant.id, contact, self.engine_cfg.funnel_history_minutes)
            .await
        {
            Ok(entries) => entries.len(),
            Err(e) => {
                warn!(
                    tenant_id = tenant.id.as_str(),
                    error = %e,
                    "history read failed, treating conversation as new"
                );
                0
            }
        };
        let stage = self
            .funnel
            .advance(&tenant.id, contact, &inbound.body, history_len);

        let slot_outcome = if classification.intent == Intent::Appointment {
            Some(self.suggest_slot(tenant, contact).await)
        } else {
            None
        };

        let reply = self.policy.compose(
            tenant,
            product.as_ref(),
            &classification,
            stage,
            slot_outcome.as_ref(),
        );

        self.recorder
            .log(
                &tenant.id,
                contact,
                Direction::Inbound,
                &inbound.body,
                &classification,
                now,
            )
            .await;

        if !self.sender.send_message(account_id, contact, &reply).await {
            warn!(
                tenant_id = tenant.id.as_str(),
                contact, "outbound send refused, reply dropped"
            );
            return RouteOutcome::Dropped(DropReason::SendFailed);
        }
        self.gate.refresh(&tenant.id, contact, now);
        self.recorder
            .log(
                &tenant.id,
                contact,
                Direction::Outbound,
                &reply,
                &classification,
                now,
            )
            .await;

        info!(
            tenant_id = tenant.id.as_str(),
            contact,
            intent = %classification.intent,
            stage = %stage,
            "message routed"
        );
        RouteOutcome::Replied {
            tenant_id: tenant.id.clone(),
            reply,
        }
    }

    /// Catalog match first, pinned product second.
    async fn resolve_product(
        &self,
        tenant: &charla_core::types::TenantConfig,
        body: &str,
    ) -> Option<Product> {
        let products = match self.storage.get_products(&tenant.id).await {
            Ok(products) => products,
            Err(e) => {
                warn!(tenant_id = tenant.id.as_str(), error = %e, "product read failed");
                Vec::new()
            }
        };
        if let Some((product, score)) = matcher::best_match(&products, body) {
            debug!(
                product_id = product.id.as_str(),
                score, "product matched by score"
            );
            return Some(product.clone());
        }

        let linked = tenant.linked_product_id.as_deref()?;
        match self.storage.get_product(linked).await {
            Ok(Some(product)) => Some(product),
            Ok(None) => {
                let e = charla_core::CharlaError::ConfigMissing {
                    what: format!("linked product {linked} for tenant {}", tenant.id),
                };
                warn!(error = %e, "composing without product");
                None
            }
            Err(e) => {
                warn!(tenant_id = tenant.id.as_str(), error = %e, "linked product read failed");
                None
            }
        }
    }

    async fn suggest_slot(
        &self,
        tenant: &charla_core::types::TenantConfig,
        contact: &str,
    ) -> SlotOutcome {
        self.slots
            .find_optimal_slot(&SlotRequest {
                tenant_id: tenant.id.clone(),
                contact_name: contact.to_string(),
                contact_phone: contact.to_string(),
                ..SlotRequest::default()
            })
            .await
    }

    /// Applies an external lead stage command and, on sale close, marks the
    /// conversation retained.
    pub async fn set_lead_stage(
        &self,
        tenant_id: &str,
        contact: &str,
        stage: charla_core::types::LeadStage,
        estimated_value: Option<f64>,
    ) -> Result<(), charla_core::CharlaError> {
        self.recorder
            .set_lead_stage(tenant_id, contact, stage, estimated_value)
            .await?;
        if stage == charla_core::types::LeadStage::SaleClosed {
            self.funnel.mark_retention(tenant_id, contact);
        }
        Ok(())
    }
}

/// Drives the pipeline from the session event stream until it closes.
///
/// Lifecycle events are logged; message events are routed. The account id of
/// a message is its session's tenant key.
pub async fn run(pipeline: Arc<RoutingPipeline>, mut events: mpsc::Receiver<SessionEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Message {
                tenant_key,
                message,
            } => {
                let outcome = pipeline.route(&tenant_key, &message).await;
                debug!(
                    tenant_key = tenant_key.as_str(),
                    ?outcome,
                    "routed inbound message"
                );
            }
            SessionEvent::Qr { tenant_key, .. } => {
                info!(tenant_key = tenant_key.as_str(), "pairing code issued");
            }
            SessionEvent::Authenticated { tenant_key } => {
                info!(tenant_key = tenant_key.as_str(), "session authenticated");
            }
            SessionEvent::Ready { tenant_key } => {
                info!(tenant_key = tenant_key.as_str(), "session connected");
            }
            SessionEvent::AuthFailure { tenant_key, reason } => {
                warn!(
                    tenant_key = tenant_key.as_str(),
                    reason = reason.as_str(),
                    "session auth failure"
                );
            }
            SessionEvent::Disconnected { tenant_key, reason } => {
                info!(
                    tenant_key = tenant_key.as_str(),
                    reason = reason.as_str(),
                    "session disconnected"
                );
            }
        }
    }
    info!("session event stream closed, pipeline driver exiting");
}
