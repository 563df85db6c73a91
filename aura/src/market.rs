//! Market indices and commodity quotes.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::client::Aura;
use crate::error::Result;

/// Name of the market-data function.
pub const MARKET_FUNCTION: &str = "market-data";

/// Default refresh interval for [`Aura::watch_market`].
pub const DEFAULT_REFRESH: Duration = Duration::from_secs(60);

/// A single index or commodity quote.
///
/// Prices are preformatted by the function, so they stay strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Display name, e.g. "S&P 500" or "Gold".
    pub name: String,
    /// Current price or level.
    pub value: String,
    /// Percentage change.
    pub change: String,
    /// Whether the change is non-negative.
    pub is_positive: bool,
    /// Price unit for commodities, e.g. "/oz".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Snapshot returned by the market-data function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    /// Stock indices.
    #[serde(default)]
    pub indices: Vec<Quote>,
    /// Commodity prices.
    #[serde(default)]
    pub commodities: Vec<Quote>,
    /// When the function assembled the snapshot.
    pub last_updated: DateTime<Utc>,
}

impl MarketSnapshot {
    /// Looks up a quote by name across indices and commodities.
    #[must_use]
    pub fn quote(&self, name: &str) -> Option<&Quote> {
        self.indices
            .iter()
            .chain(&self.commodities)
            .find(|quote| quote.name.eq_ignore_ascii_case(name))
    }

    /// Age of the snapshot relative to `now`.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.last_updated)
    }
}

impl Aura {
    /// Fetches the current market snapshot.
    ///
    /// # Errors
    ///
    /// Any transport error, including an undecodable answer.
    pub async fn market_data(&self) -> Result<MarketSnapshot> {
        self.invoke_get(MARKET_FUNCTION).await
    }

    /// Polls the market-data function every `every`, starting immediately.
    ///
    /// Each poll yields its snapshot or its error; errors do not end the
    /// stream. Ticks missed while a poll is slow are skipped, not bunched up.
    /// A zero interval is raised to one second.
    pub fn watch_market(
        &self,
        every: Duration,
    ) -> impl Stream<Item = Result<MarketSnapshot>> + Send + use<> {
        let client = self.clone();
        let every = every.max(Duration::from_secs(1));
        async_stream::stream! {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let snapshot = client.market_data().await;
                if let Err(err) = &snapshot {
                    tracing::warn!(%err, "market data refresh failed");
                }
                yield snapshot;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "indices": [
            {"name": "S&P 500", "value": "5200.00", "change": "0.50", "isPositive": true}
        ],
        "commodities": [
            {"name": "Crude Oil", "value": "85.50", "unit": "/bbl", "change": "-0.80", "isPositive": false}
        ],
        "lastUpdated": "2026-03-02T14:30:00.000Z"
    }"#;

    #[test]
    fn test_snapshot_parses() {
        let snapshot: MarketSnapshot = serde_json::from_str(SAMPLE).expect("parse");
        assert_eq!(snapshot.indices.len(), 1);
        assert_eq!(snapshot.indices[0].unit, None);

        let oil = snapshot.quote("crude oil").expect("oil");
        assert!(!oil.is_positive);
        assert_eq!(oil.unit.as_deref(), Some("/bbl"));
    }

    #[test]
    fn test_snapshot_age() {
        let snapshot: MarketSnapshot = serde_json::from_str(SAMPLE).expect("parse");
        let later = snapshot.last_updated + chrono::Duration::seconds(90);
        assert_eq!(snapshot.age(later).num_seconds(), 90);
    }
}
