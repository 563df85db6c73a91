//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use aura::prelude::*;
//! ```

pub use crate::analysis::{AnalysisFocus, SpreadsheetRow};
pub use crate::chat::{ChatOutcome, ChatRequest, ChatSession};
pub use crate::client::Aura;
pub use crate::config::AuraConfig;
pub use crate::error::{Error, Result};
pub use crate::market::{MarketSnapshot, Quote};
pub use crate::meeting::{MeetingDelivery, MeetingInvite};
pub use crate::message::{ChatTurn, Role};
pub use crate::stream::{DeltaStream, FinishReason, StreamItem};
pub use crate::transcript::{Transcript, TranscriptAccumulator};
pub use crate::workbook::SheetData;
