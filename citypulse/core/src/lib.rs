//! Core domain models and statistics for CityPulse.
pub mod issue;
pub mod sla;
pub mod stats;

pub use issue::{
    Coordinates, Issue, IssueCategory, IssueError, IssueId, IssuePriority, IssueStatus, Timestamp,
};
pub use sla::{SlaAlert, SlaPolicy, compute_sla_alerts, sla_compliance};
pub use stats::{
    CategoryCount, DEFAULT_WINDOW_DAYS, DailyCount, DashboardStats, DataQualityField,
    DataQualityKind, DataQualityWarning, StatsError, compute_dashboard_stats, window_cutoff,
};
