// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `charla serve` command implementation.
//!
//! Wires the console transport through the full stack — session registry,
//! sweeper, and routing pipeline — over an in-memory storage seeded with a
//! demo tenant, then runs a readline loop acting as one contact messaging
//! the account.

use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio_util::sync::CancellationToken;
use tracing::info;

use charla_config::CharlaConfig;
use charla_core::types::{BotObjective, Product, TenantConfig};
use charla_core::{CharlaError, OutboundSender, Storage};
use charla_engine::RoutingPipeline;
use charla_session::{spawn_sweeper, SessionRegistry};
use charla_test_utils::MemoryStorage;

use crate::console::ConsoleTransport;

const ACCOUNT: &str = "demo";
const CONTACT: &str = "+console";

/// How long the REPL waits for a reply before treating the message as
/// silently dropped by the gate.
const REPLY_WAIT: Duration = Duration::from_secs(2);

pub async fn run_serve(config: CharlaConfig) -> Result<(), CharlaError> {
    let storage = Arc::new(MemoryStorage::new());
    seed_demo(&storage).await;
    let storage: Arc<dyn Storage> = storage;

    let transport = Arc::new(ConsoleTransport::new());
    let (registry, events) =
        SessionRegistry::new(Arc::clone(&transport) as Arc<_>, config.session.event_buffer);

    let sender: Arc<dyn OutboundSender> = Arc::clone(&registry) as Arc<_>;
    let pipeline = Arc::new(RoutingPipeline::new(storage, sender, &config));
    let driver = tokio::spawn(charla_engine::run(Arc::clone(&pipeline), events));

    let cancel = CancellationToken::new();
    let sweeper = spawn_sweeper(Arc::clone(&registry), &config.session, cancel.clone());

    registry.initialize_session(ACCOUNT).await?;
    info!(account = ACCOUNT, "console session initialized");

    let mut rl = DefaultEditor::new()
        .map_err(|e| CharlaError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "charla serve".bold().green());
    println!(
        "You are {} messaging account {}. Type {} to exit.\n",
        CONTACT.cyan(),
        ACCOUNT.cyan(),
        "/quit".yellow()
    );

    let prompt = format!("{}> ", CONTACT.cyan());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "/quit" || trimmed == "/exit" {
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                if !transport.deliver(ACCOUNT, CONTACT, trimmed).await {
                    eprintln!("{}", "error: session not connected".red());
                    continue;
                }
                // Gated messages produce no reply at all; don't wait forever.
                if tokio::time::timeout(REPLY_WAIT, transport.replied())
                    .await
                    .is_err()
                {
                    println!("{}", "(no reply)".dimmed());
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    cancel.cancel();
    registry.destroy_session(ACCOUNT).await;
    sweeper
        .await
        .map_err(|e| CharlaError::Internal(format!("sweeper task panicked: {e}")))?;
    // The pipeline still holds the registry (and with it the event channel),
    // so the driver loop won't see a close; stop it directly.
    driver.abort();
    let _ = driver.await;

    println!("{}", "goodbye".dimmed());
    Ok(())
}

/// One open sales bot with a tiny catalog, plus a keyworded appointment bot.
async fn seed_demo(storage: &MemoryStorage) {
    storage
        .add_tenant(
            ACCOUNT,
            TenantConfig {
                id: "demo-ventas".to_string(),
                owner_id: "owner-demo".to_string(),
                trigger_keywords: Vec::new(),
                linked_product_id: None,
                objective: BotObjective::Sales,
                personality: "casual".to_string(),
                instructions: String::new(),
            },
        )
        .await;
    storage
        .add_tenant(
            ACCOUNT,
            TenantConfig {
                id: "demo-citas".to_string(),
                owner_id: "owner-demo".to_string(),
                trigger_keywords: vec!["cita".to_string(), "agendar".to_string()],
                linked_product_id: None,
                objective: BotObjective::Appointments,
                personality: "formal".to_string(),
                instructions: String::new(),
            },
        )
        .await;
    storage
        .add_product(
            "demo-ventas",
            Product {
                id: "p-keratina".to_string(),
                name: "keratina premium".to_string(),
                description: "Tratamiento de keratina para alisado profesional".to_string(),
                price: 45.0,
                category: "belleza".to_string(),
                tags: vec!["pelo".to_string(), "alisado".to_string()],
            },
        )
        .await;
    storage
        .add_product(
            "demo-ventas",
            Product {
                id: "p-botox".to_string(),
                name: "botox capilar".to_string(),
                description: "Reparación profunda para cabello dañado".to_string(),
                price: 38.0,
                category: "belleza".to_string(),
                tags: vec!["pelo".to_string(), "reparación".to_string()],
            },
        )
        .await;
}
