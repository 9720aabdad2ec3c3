use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::response::RevenueReport;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// What the revenue dashboard currently shows.
///
/// Each refresh takes a generation number from [`DashboardState::begin_refresh`];
/// a result is only applied if no later refresh has started since, so a slow
/// response can never overwrite a newer one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    pub status: LoadStatus,
    pub generation: u64,
    pub report: Option<RevenueReport>,
    pub error: Option<String>,
    pub banner: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DashboardState {
    pub fn begin_refresh(&mut self) -> u64 {
        self.generation += 1;
        self.status = LoadStatus::Loading;
        self.generation
    }

    /// Returns `false` when the outcome was stale and discarded.
    pub fn complete(
        &mut self,
        generation: u64,
        outcome: Result<RevenueReport, String>,
        at: DateTime<Utc>,
    ) -> bool {
        if generation != self.generation {
            debug!(
                generation,
                current = self.generation,
                "Discarding stale revenue result"
            );
            return false;
        }

        match outcome {
            Ok(report) => {
                self.banner = report.warning_banner();
                self.report = Some(report);
                self.error = None;
                self.status = LoadStatus::Loaded;
            }
            // The last good report stays on screen next to the error.
            Err(message) => {
                self.error = Some(message);
                self.status = LoadStatus::Failed;
            }
        }
        self.updated_at = Some(at);
        true
    }

    pub fn empty_message(&self) -> Option<&'static str> {
        match (&self.status, &self.report) {
            (LoadStatus::Loaded, Some(report)) if !report.has_data() => {
                Some(RevenueReport::NO_DATA_MESSAGE)
            }
            _ => None,
        }
    }
}
