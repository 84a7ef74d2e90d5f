// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Charla conversational routing engine.
//!
//! This crate provides the error taxonomy, shared domain types, and the
//! collaborator traits (transport, storage) implemented outside the engine.
//! It contains no business logic.

pub mod error;
pub mod traits;
pub mod types;

pub use error::CharlaError;
pub use traits::{OutboundSender, Storage, Transport, TransportEvent};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charla_error_has_all_variants() {
        let _config = CharlaError::Config("test".into());
        let _session = CharlaError::Session {
            tenant_key: "t".into(),
            message: "test".into(),
        };
        let _missing = CharlaError::ConfigMissing { what: "tenant".into() };
        let _storage = CharlaError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _transport = CharlaError::Transport {
            message: "test".into(),
            source: None,
        };
        let _internal = CharlaError::Internal("test".into());
    }

    #[test]
    fn error_display_includes_context() {
        let e = CharlaError::Session {
            tenant_key: "acct-9".into(),
            message: "connect cancelled".into(),
        };
        let s = e.to_string();
        assert!(s.contains("acct-9"));
        assert!(s.contains("connect cancelled"));
    }
}
