use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Transactions stay raw JSON here so each element is validated on its own.
#[derive(Debug, Default, Deserialize)]
pub struct AggregateRequest {
    #[serde(default)]
    pub transactions: Option<Vec<Value>>,
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
}

/// Optional reference instant, `?now=2024-03-06T12:00:00Z`.
#[derive(Debug, Default, Deserialize)]
pub struct NowQuery {
    pub now: Option<DateTime<Utc>>,
}
