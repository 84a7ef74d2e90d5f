// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Charla's conversational routing engine.
//!
//! Pure leaf components (classifier, matcher, funnel tracker, response
//! policy) composed by the [`pipeline::RoutingPipeline`], which orchestrates
//! one inbound message end to end: tenant and product matching, the
//! activation gate, classification, funnel tracking, reply composition (with
//! slot suggestions for appointment intents), sending, and conversation
//! recording.

pub mod classifier;
pub mod funnel;
pub mod gate;
pub mod matcher;
pub mod pipeline;
pub mod policy;
pub mod recorder;

pub use classifier::{classify, Classifier, RuleClassifier};
pub use funnel::FunnelTracker;
pub use gate::{ActivationGate, GateDecision};
pub use matcher::{best_match, score, Matchable};
pub use pipeline::{run, DropReason, RouteOutcome, RoutingPipeline};
pub use policy::ResponsePolicy;
pub use recorder::{conversion_rate, stage_counts, LeadRecorder};
