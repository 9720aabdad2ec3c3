//! Client for the platform's sales API, the system of record for transactions.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::{
    config::Config,
    error::{AppError, AppResult},
};

/// `GET /sale` answers either with a bare array or with `{ "data": [...] }`.
/// Any other shape is an upstream error, never an empty batch.
fn sale_records(payload: Value) -> AppResult<Vec<Value>> {
    match payload {
        Value::Array(records) => Ok(records),
        Value::Null => Ok(Vec::new()),
        Value::Object(mut body) => match body.remove("data") {
            Some(Value::Array(records)) => Ok(records),
            Some(other) => Err(AppError::UpstreamPayload(format!(
                "expected `data` to be an array, found {other}"
            ))),
            None => {
                let keys: Vec<_> = body.keys().map(String::as_str).collect();
                Err(AppError::UpstreamPayload(format!(
                    "expected an array of sales, found an object with keys [{}]",
                    keys.join(", ")
                )))
            }
        },
        other => Err(AppError::UpstreamPayload(format!(
            "expected an array of sales, found {other}"
        ))),
    }
}

#[derive(Debug, Clone)]
pub struct SalesClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl SalesClient {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token,
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            config.sales_api_base_url.clone(),
            config.sales_api_token.clone(),
            config.request_timeout,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the raw sale documents; each one is validated during aggregation.
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn fetch_transactions(&self) -> AppResult<Vec<Value>> {
        let mut request = self.http.get(format!("{}/sale", self.base_url));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamStatus(status.as_u16()));
        }

        let records = sale_records(response.json::<Value>().await?)?;
        debug!(count = records.len(), "Fetched sale transactions");
        Ok(records)
    }
}
