//! Echo bot over the WebSocket event session.
//!
//! Demonstrates:
//! - Building a Client from endpoint, token and account
//! - Registering a message listener
//! - Replying through the action client
//! - Watching session state changes
//!
//! Usage:
//!   CHATLINK_TOKEN=secret cargo run --example 001_echo_bot
//!   cargo run --example 001_echo_bot -- --debug
//!   cargo run --example 001_echo_bot -- --no-wait

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use chatlink::markup::builders::{quote, text};
use chatlink::markup::plain_text;
use chatlink::{Client, Error, Event, Result};
use common::Args;

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
    println!("=== 001: Echo Bot ===\n");

    let mut builder = Client::builder()
        .endpoint(&args.endpoint)
        .platform(&args.platform)
        .self_id(&args.self_id);
    if let Some(token) = &args.token {
        builder = builder.token(token);
    }
    let client = builder.build()?;
    println!("[Setup] Client for {}", args.endpoint);

    // ========================================================================
    // Listeners
    // ========================================================================

    let actions = client.actions().clone();
    client.on("message-created", move |event: Arc<Event>| {
        let actions = actions.clone();
        async move {
            let channel = event.require_channel()?;
            let message = event.require_message()?;
            let user = event.require_user()?;
            if user.is_bot.unwrap_or(false) {
                return Ok::<(), Error>(());
            }

            let said = plain_text(&message.elements);
            println!("[Event] {} in {}: {said}", user.id, channel.id);

            let reply = [quote(message.id.clone()), text(said)];
            actions.message_create(&channel.id, &reply).await?;
            Ok::<(), Error>(())
        }
    });

    // ========================================================================
    // Session
    // ========================================================================

    let mut states = client.subscribe_state();
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = *states.borrow_and_update();
            println!("[State] {state}");
        }
    });

    client.connect()?;

    common::wait_for_exit(args.no_wait).await;
    client.close();
    client.wait_terminated().await;

    println!("\n=== Done ===");
    Ok(())
}
