use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::decoder::{parse_amount, parse_created_at};
use crate::error::DataFormatError;

/// A sale as delivered by the sales API or a CSV export.
///
/// Every field is optional and kept as a raw value, so decoding any JSON
/// object succeeds and one bad record never fails a whole batch. Validation
/// happens in [`TransactionRecord::parse`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(default, rename = "_id", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub created_at: Option<Value>,
    #[serde(default)]
    pub admin_earning: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout_status: Option<Value>,
}

impl TransactionRecord {
    pub fn new(created_at: &str, admin_earning: f64, payout_status: &str) -> Self {
        Self {
            created_at: Some(Value::from(created_at)),
            admin_earning: Some(Value::from(admin_earning)),
            payout_status: Some(Value::from(payout_status)),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(Value::String(id.into()));
        self
    }

    /// Decodes one element of a JSON batch. Anything but an object is rejected.
    pub fn decode(value: &Value) -> Result<Self, Rejected> {
        if !value.is_object() {
            return Err(Rejected {
                id: None,
                reason: DataFormatError::MalformedRecord(format!(
                    "expected an object, found {value}"
                )),
            });
        }

        Self::deserialize(value).map_err(|err| Rejected {
            id: value.get("_id").or_else(|| value.get("id")).and_then(label),
            reason: DataFormatError::MalformedRecord(err.to_string()),
        })
    }

    pub fn validate_value(value: &Value) -> Result<Transaction, Rejected> {
        Self::decode(value)?.validate()
    }

    /// `_id` wins over `id` when a document carries both.
    pub fn id_label(&self) -> Option<String> {
        self.object_id
            .as_ref()
            .and_then(label)
            .or_else(|| self.id.as_ref().and_then(label))
    }

    pub fn parse(&self) -> Result<Transaction, DataFormatError> {
        Ok(Transaction {
            id: self.id_label(),
            created_at: parse_created_at(self.created_at.as_ref())?,
            admin_earning: parse_amount(self.admin_earning.as_ref())?,
            payout_status: self
                .payout_status
                .as_ref()
                .and_then(label)
                .map(|status| PayoutStatus::from(status.as_str()))
                .unwrap_or_default(),
        })
    }

    pub fn validate(&self) -> Result<Transaction, Rejected> {
        self.parse().map_err(|reason| Rejected {
            id: self.id_label(),
            reason,
        })
    }
}

fn label(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// A record that failed validation, with whatever identified it upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    pub id: Option<String>,
    pub reason: DataFormatError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub admin_earning: f64,
    pub payout_status: PayoutStatus,
}

impl Transaction {
    /// Calendar day of the sale in UTC.
    pub fn day(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PayoutStatus {
    Pending,
    Paid,
    #[default]
    Unknown,
    Other(String),
}

impl PayoutStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl From<&str> for PayoutStatus {
    fn from(raw: &str) -> Self {
        let s = raw.trim();
        if s.eq_ignore_ascii_case("pending") {
            Self::Pending
        } else if s.eq_ignore_ascii_case("paid") {
            Self::Paid
        } else if s.is_empty() {
            Self::Unknown
        } else {
            Self::Other(s.to_owned())
        }
    }
}
