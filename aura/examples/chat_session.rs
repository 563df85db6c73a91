//! Two-turn conversation through a `ChatSession`, printing the transcript.
//!
//! ```bash
//! export AURA_API_KEY=<key>
//! cargo run --example chat_session
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use aura::prelude::*;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let session = ChatSession::new(Aura::from_env()?);
    let mut updates = session.subscribe();

    let watcher = tokio::spawn(async move {
        let mut revisions = 0_usize;
        while updates.changed().await.is_ok() {
            revisions += 1;
        }
        revisions
    });

    for message in [
        "What pricing strategies suit a subscription bakery?",
        "Which of those is easiest to test in one month?",
    ] {
        if let Err(e) = session.send(message).await {
            eprintln!("Error: {}", e.user_message());
        }
    }

    for turn in session.snapshot() {
        println!("[{}] {}\n", turn.role, turn.content);
    }

    drop(session);
    println!("Transcript revisions observed: {}", watcher.await?);

    Ok(())
}
