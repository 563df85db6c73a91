//! Stream one business-assistant reply to stdout.
//!
//! ```bash
//! export AURA_FUNCTIONS_URL=https://<project>.supabase.co/functions/v1
//! export AURA_API_KEY=<key>
//! cargo run --example chat_stream
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io::Write as _;

use aura::prelude::*;
use futures::StreamExt;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let client = Aura::from_env()?;
    let request = ChatRequest::new(
        "Draft a one-paragraph SWOT summary for a small coffee roastery.",
        Vec::new(),
    );
    println!("You: {}\n", request.message);

    let mut deltas = client.chat_stream(&request).await?;
    print!("AURA: ");
    while let Some(item) = deltas.next().await {
        match item? {
            StreamItem::Delta(text) => {
                print!("{text}");
                std::io::stdout().flush()?;
            }
            StreamItem::Finished(reason) => {
                println!("\n\n[finished: {reason:?}]");
            }
        }
    }

    Ok(())
}
