use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use citypulse_core::{
    DashboardStats, SlaAlert, SlaPolicy, StatsError, compute_dashboard_stats, compute_sla_alerts,
    sla_compliance, window_cutoff,
};

use crate::config::Config;
use crate::store::{IssueStore, StoreError};

pub mod api {
    pub mod v1;
}

/// Shared state for the staff dashboard endpoints.
#[derive(Clone)]
pub struct DashboardState {
    pub store: Arc<dyn IssueStore>,
    /// Activity window used when a request does not name one.
    pub window_days: u32,
    pub sla_policy: SlaPolicy,
    pub alert_threshold: TimeDelta,
}

impl DashboardState {
    pub fn from_config(config: &Config, store: Arc<dyn IssueStore>) -> Self {
        Self {
            store,
            window_days: config.activity_window_days,
            sla_policy: SlaPolicy::standard(),
            alert_threshold: config.sla_alert_threshold(),
        }
    }
}

/// Everything the dashboard shows, computed from one store snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardReport {
    pub stats: DashboardStats,
    pub sla_alerts: Vec<SlaAlert>,
    pub sla_compliance: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Unauthorized - Please login")]
    Unauthorized,
    #[error("Invalid dashboard query: {0}")]
    InvalidQuery(String),
    #[error(transparent)]
    InvalidWindow(#[from] StatsError),
    #[error("Failed to fetch dashboard statistics")]
    Store(#[from] StoreError),
}

pub struct DashboardService<'a> {
    state: &'a DashboardState,
}

impl<'a> DashboardService<'a> {
    pub fn new(state: &'a DashboardState) -> Self {
        Self { state }
    }

    /// Builds the dashboard report as of `now`.
    ///
    /// The window is checked before the store is read, so a bad request never
    /// costs a snapshot.
    #[tracing::instrument(skip(self))]
    pub async fn build_report(
        &self,
        now: DateTime<Utc>,
        window_days: Option<u32>,
    ) -> Result<DashboardReport, DashboardError> {
        let window_days = window_days.unwrap_or(self.state.window_days);
        window_cutoff(now, window_days)?;

        let issues = self.state.store.get_all().await?;
        let stats = compute_dashboard_stats(&issues, now, window_days)?;
        if !stats.warnings.is_empty() {
            tracing::warn!(
                "Dashboard skipped {} unusable timestamps",
                stats.warnings.len()
            );
        }

        let sla_alerts = compute_sla_alerts(
            &issues,
            now,
            &self.state.sla_policy,
            self.state.alert_threshold,
        );
        let sla_compliance = sla_compliance(&issues, &self.state.sla_policy);

        Ok(DashboardReport {
            stats,
            sla_alerts,
            sla_compliance,
        })
    }
}
