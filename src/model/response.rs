use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DataFormatError;

/// Total admin earning for one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub admin_earning: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
    pub total_earning: f64,
    pub pending_payout: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRecord {
    /// Position of the record in the input.
    pub index: usize,
    pub id: Option<String>,
    pub reason: DataFormatError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AggregationWarning {
    EmptyInput,
    /// The reference instant lies before the earliest transaction.
    #[serde(rename_all = "camelCase")]
    ClockSkew {
        now: DateTime<Utc>,
        earliest: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub skipped_count: usize,
    pub skipped: Vec<SkippedRecord>,
    pub warnings: Vec<AggregationWarning>,
}

impl Diagnostics {
    pub(crate) fn skip(&mut self, index: usize, id: Option<String>, reason: DataFormatError) {
        self.skipped.push(SkippedRecord { index, id, reason });
        self.skipped_count = self.skipped.len();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueReport {
    pub week_start: NaiveDate,
    pub weekly_series: Vec<DailyBucket>,
    pub all_time_series: Vec<DailyBucket>,
    pub summary: RevenueSummary,
    pub diagnostics: Diagnostics,
}

impl RevenueReport {
    pub const NO_DATA_MESSAGE: &'static str = "No data available";

    pub fn has_data(&self) -> bool {
        !self.all_time_series.is_empty()
    }

    /// Partial-data notice for the dashboard, present only when records were skipped.
    pub fn warning_banner(&self) -> Option<String> {
        match self.diagnostics.skipped_count {
            0 => None,
            1 => Some("1 transaction could not be read and is not included in these totals".into()),
            n => Some(format!(
                "{n} transactions could not be read and are not included in these totals"
            )),
        }
    }
}
