//! Aura - client SDK for the AURA business assistant
//!
//! The assistant's work is done by hosted functions. This crate wraps them:
//! a streaming chat pipeline (transport, SSE framing, transcript accumulation)
//! plus typed clients for business-data analysis, market data and meeting
//! invitations, and Excel export of generated spreadsheets.

pub mod analysis;
pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod market;
pub mod meeting;
pub mod message;
pub mod prelude;
pub mod sse;
pub mod stream;
pub mod transcript;
pub mod workbook;

pub use client::Aura;
pub use config::AuraConfig;
pub use error::{Error, Result};
