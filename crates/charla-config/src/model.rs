// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Charla routing engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Charla configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CharlaConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Session lifecycle settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Routing engine settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Appointment slot engine settings.
    #[serde(default)]
    pub scheduling: SchedulingConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent process.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "charla".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Session lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Sessions stuck in `initializing`/`qr_pending` longer than this are
    /// destroyed by the background sweep.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Interval between sweep passes.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Bound of the shared session event channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            event_buffer: default_event_buffer(),
        }
    }
}

fn default_idle_timeout_secs() -> u64 {
    300
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_event_buffer() -> usize {
    512
}

/// Routing engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Sliding activation window: a contact inside it is mid-conversation
    /// and exempt from keyword gating.
    #[serde(default = "default_activation_window_minutes")]
    pub activation_window_minutes: u32,

    /// How far back conversation history is read for funnel tracking.
    #[serde(default = "default_funnel_history_minutes")]
    pub funnel_history_minutes: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            activation_window_minutes: default_activation_window_minutes(),
            funnel_history_minutes: default_funnel_history_minutes(),
        }
    }
}

fn default_activation_window_minutes() -> u32 {
    30
}

fn default_funnel_history_minutes() -> u32 {
    1440
}

/// Appointment slot engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulingConfig {
    /// Calendar days ahead to generate candidate slots for.
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,

    /// First bookable hour of a business day (inclusive).
    #[serde(default = "default_day_start_hour")]
    pub day_start_hour: u32,

    /// Hour the business day ends (exclusive for slot starts).
    #[serde(default = "default_day_end_hour")]
    pub day_end_hour: u32,

    /// Default appointment duration when the request does not specify one.
    #[serde(default = "default_duration_minutes")]
    pub default_duration_minutes: u32,

    /// Maximum number of ranked alternatives returned on conflict or
    /// no-availability outcomes.
    #[serde(default = "default_max_alternatives")]
    pub max_alternatives: usize,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            horizon_days: default_horizon_days(),
            day_start_hour: default_day_start_hour(),
            day_end_hour: default_day_end_hour(),
            default_duration_minutes: default_duration_minutes(),
            max_alternatives: default_max_alternatives(),
        }
    }
}

fn default_horizon_days() -> u32 {
    14
}

fn default_day_start_hour() -> u32 {
    9
}

fn default_day_end_hour() -> u32 {
    18
}

fn default_duration_minutes() -> u32 {
    60
}

fn default_max_alternatives() -> usize {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = CharlaConfig::default();
        assert_eq!(cfg.agent.name, "charla");
        assert_eq!(cfg.agent.log_level, "info");
        assert_eq!(cfg.session.idle_timeout_secs, 300);
        assert_eq!(cfg.session.sweep_interval_secs, 60);
        assert_eq!(cfg.engine.activation_window_minutes, 30);
        assert_eq!(cfg.scheduling.horizon_days, 14);
        assert_eq!(cfg.scheduling.day_start_hour, 9);
        assert_eq!(cfg.scheduling.day_end_hour, 18);
        assert_eq!(cfg.scheduling.default_duration_minutes, 60);
        assert_eq!(cfg.scheduling.max_alternatives, 5);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let cfg = CharlaConfig::default();
        let s = toml::to_string(&cfg).expect("serialize");
        let back: CharlaConfig = toml::from_str(&s).expect("deserialize");
        assert_eq!(back.scheduling.day_end_hour, cfg.scheduling.day_end_hour);
    }
}
