// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Charla routing engine.

use thiserror::Error;

/// The primary error type used across Charla collaborator traits and core operations.
#[derive(Debug, Error)]
pub enum CharlaError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Session lifecycle errors (connect failure, teardown failure).
    ///
    /// Transport auth failures are reported through session events, not this
    /// variant; `send_message` never raises it.
    #[error("session error for {tenant_key}: {message}")]
    Session { tenant_key: String, message: String },

    /// A tenant or product lookup came back empty where one was required.
    ///
    /// The pipeline logs this and skips responding; the contact never sees it.
    #[error("missing configuration: {what}")]
    ConfigMissing { what: String },

    /// Storage collaborator errors (read or write failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Transport collaborator errors (connection failure, send failure).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CharlaError {
    /// Wraps an arbitrary error as a storage failure.
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CharlaError::Storage {
            source: Box::new(source),
        }
    }
}
