// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background sweep of sessions stuck before `connected`.
//!
//! A QR that is never scanned leaves a session pending forever and its
//! transport resources held. The sweeper destroys sessions that stay in
//! `initializing` or `qr_pending` past the configured idle timeout.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use charla_config::SessionConfig;

use crate::registry::SessionRegistry;

/// Spawns the periodic stale-session sweeper. Runs until `cancel` fires.
pub fn spawn_sweeper(
    registry: Arc<SessionRegistry>,
    cfg: &SessionConfig,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let idle_timeout = Duration::from_secs(cfg.idle_timeout_secs);
    let sweep_interval = Duration::from_secs(cfg.sweep_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // First tick fires immediately; swallow it so a fresh start does not
        // sweep sessions created moments ago with a zero-ish elapsed time.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("session sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    sweep_once(&registry, idle_timeout).await;
                }
            }
        }
    })
}

async fn sweep_once(registry: &Arc<SessionRegistry>, idle_timeout: Duration) {
    let stale = registry.stale_keys(idle_timeout);
    for tenant_key in stale {
        info!(
            tenant_key = tenant_key.as_str(),
            timeout_secs = idle_timeout.as_secs(),
            "destroying stale pending session"
        );
        registry.destroy_session(&tenant_key).await;
    }
}
