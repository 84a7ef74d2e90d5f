// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Charla routing engine.
//!
//! Layered TOML configuration (defaults < system < user < local < env) with
//! typed models and strict unknown-key rejection.

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{AgentConfig, CharlaConfig, EngineConfig, SchedulingConfig, SessionConfig};
