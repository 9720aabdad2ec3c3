//! Time-bucketed aggregation of sale transactions into revenue series.
//!
//! Day keys are UTC calendar dates. The weekly window runs from the Monday of
//! the ISO week containing `now` up to and including `now`'s day.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike as _, Days, NaiveDate, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    error::DataFormatError,
    model::{
        response::{AggregationWarning, DailyBucket, Diagnostics, RevenueReport, RevenueSummary},
        transaction::{Rejected, Transaction, TransactionRecord},
    },
};

/// Monday of the ISO week containing `day`.
pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Days::new(u64::from(day.weekday().num_days_from_monday()))
}

pub fn aggregate(records: &[TransactionRecord], now: DateTime<Utc>) -> RevenueReport {
    aggregate_parsed(records.iter().map(TransactionRecord::validate), now)
}

/// Aggregates a raw JSON batch. Elements that are not transaction objects are
/// skipped like any other malformed record.
pub fn aggregate_values(values: &[Value], now: DateTime<Utc>) -> RevenueReport {
    aggregate_parsed(values.iter().map(TransactionRecord::validate_value), now)
}

pub fn aggregate_now(records: &[TransactionRecord]) -> RevenueReport {
    aggregate(records, Utc::now())
}

/// Aggregates already-validated records. Rejected entries are reported in the
/// diagnostics under their position in `parsed`.
pub fn aggregate_parsed<I>(parsed: I, now: DateTime<Utc>) -> RevenueReport
where
    I: IntoIterator<Item = Result<Transaction, Rejected>>,
{
    let today = now.date_naive();
    let week_start = week_start(today);

    let mut weekly = BTreeMap::<NaiveDate, f64>::new();
    let mut all_time = BTreeMap::<NaiveDate, f64>::new();
    let mut summary = RevenueSummary::default();
    let mut diagnostics = Diagnostics::default();
    let mut earliest: Option<DateTime<Utc>> = None;
    let mut seen = 0_usize;

    for (index, entry) in parsed.into_iter().enumerate() {
        seen += 1;
        let transaction = match entry {
            Ok(transaction) => transaction,
            Err(Rejected { id, reason }) => {
                debug!(index, id = ?id, %reason, "Skipping malformed transaction");
                diagnostics.skip(index, id, reason);
                continue;
            }
        };

        let day = transaction.day();
        let amount = transaction.admin_earning;
        let in_week = (week_start..=today).contains(&day);
        let pending = transaction.payout_status.is_pending();

        let day_total = all_time.get(&day).copied().unwrap_or(0.0) + amount;
        let week_total = weekly.get(&day).copied().unwrap_or(0.0) + amount;
        let total_earning = summary.total_earning + amount;
        let pending_payout = summary.pending_payout + amount;
        let overflows = !day_total.is_finite()
            || !total_earning.is_finite()
            || (in_week && !week_total.is_finite())
            || (pending && !pending_payout.is_finite());
        if overflows {
            let reason = DataFormatError::AmountOverflow(amount.to_string());
            warn!(
                index,
                id = ?transaction.id,
                %reason,
                "Skipping transaction that overflows totals"
            );
            diagnostics.skip(index, transaction.id, reason);
            continue;
        }

        all_time.insert(day, day_total);
        if in_week {
            weekly.insert(day, week_total);
        }
        summary.total_earning = total_earning;
        if pending {
            summary.pending_payout = pending_payout;
        }

        earliest = Some(earliest.map_or(transaction.created_at, |e| e.min(transaction.created_at)));
    }

    if seen == 0 {
        diagnostics.warnings.push(AggregationWarning::EmptyInput);
    }

    if let Some(earliest) = earliest.filter(|earliest| now < *earliest) {
        warn!(%now, %earliest, "Reference time precedes every transaction");
        diagnostics
            .warnings
            .push(AggregationWarning::ClockSkew { now, earliest });
    }

    if diagnostics.skipped_count > 0 {
        warn!(
            skipped = diagnostics.skipped_count,
            total = seen,
            "Revenue aggregated from partial data"
        );
    }

    RevenueReport {
        week_start,
        weekly_series: into_series(weekly),
        all_time_series: into_series(all_time),
        summary,
        diagnostics,
    }
}

fn into_series(buckets: BTreeMap<NaiveDate, f64>) -> Vec<DailyBucket> {
    buckets
        .into_iter()
        .map(|(date, admin_earning)| DailyBucket {
            date,
            admin_earning,
        })
        .collect()
}
