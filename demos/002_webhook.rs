//! Receiving events through a webhook instead of the event session.
//!
//! Demonstrates:
//! - Serving the webhook router on a local address
//! - Registering and unregistering it with the server
//! - Graceful shutdown on Ctrl+C
//!
//! Usage:
//!   CHATLINK_TOKEN=secret cargo run --example 002_webhook
//!   CHATLINK_WEBHOOK_URL=http://10.0.0.5:8080/chat cargo run --example 002_webhook
//!   cargo run --example 002_webhook -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use chatlink::{Client, Error, Event, Result};
use common::Args;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Constants
// ============================================================================

const LISTEN_ADDR: &str = "127.0.0.1:8080";
const WEBHOOK_PATH: &str = "/chat";
const WEBHOOK_TOKEN: &str = "demo-webhook-secret";

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== 002: Webhook ===\n");

    let mut builder = Client::builder()
        .endpoint(&args.endpoint)
        .platform(&args.platform)
        .self_id(&args.self_id);
    if let Some(token) = &args.token {
        builder = builder.token(token);
    }
    let client = builder.build()?;

    client.on_any(|event: Arc<Event>| async move {
        println!("[Event] #{} {}", event.id, event.event_type);
        Ok::<(), Error>(())
    });

    // ========================================================================
    // Serve
    // ========================================================================

    let addr: SocketAddr = LISTEN_ADDR
        .parse()
        .map_err(|e| Error::config(format!("bad listen address: {e}")))?;
    let public_url = std::env::var("CHATLINK_WEBHOOK_URL")
        .unwrap_or_else(|_| format!("http://{LISTEN_ADDR}{WEBHOOK_PATH}"));

    let shutdown = CancellationToken::new();
    let webhook = client.webhook(Some(WEBHOOK_TOKEN.to_owned()));
    let server = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { webhook.serve(addr, WEBHOOK_PATH, shutdown).await }
    });

    client
        .actions()
        .admin_webhook_create(&public_url, Some(WEBHOOK_TOKEN))
        .await?;
    println!("[Setup] Registered {public_url}");

    common::wait_for_exit(args.no_wait).await;

    // ========================================================================
    // Cleanup
    // ========================================================================

    client.actions().admin_webhook_delete(&public_url).await?;
    shutdown.cancel();
    server
        .await
        .map_err(|e| Error::transport(format!("webhook task failed: {e}")))??;

    println!("\n=== Done ===");
    Ok(())
}
