//! Dashboard statistics derived from a snapshot of issues.
//!
//! Everything here is a pure projection: the same issues and the same `now`
//! always yield the same [`DashboardStats`]. Bad records never abort the
//! computation; they are left out of the figure they would corrupt and
//! reported back as [`DataQualityWarning`]s.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::issue::{Issue, IssueId, IssueStatus};

/// Trailing number of days covered by the recent activity series.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

const MILLIS_PER_DAY: i128 = 86_400_000;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Number of issues created on one UTC calendar day (`YYYY-MM-DD`).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DailyCount {
    pub date: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub enum DataQualityField {
    CreatedAt,
    ResolvedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub enum DataQualityKind {
    /// The field holds text that is not an RFC 3339 timestamp.
    MalformedTimestamp,
    /// The issue is resolved but carries no resolution time.
    MissingResolvedAt,
    /// The issue was resolved before it was created; counted as zero days.
    NegativeResolutionTime,
}

/// A problem found in one issue while computing statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct DataQualityWarning {
    pub issue_id: IssueId,
    pub field: DataQualityField,
    pub kind: DataQualityKind,
}

impl DataQualityWarning {
    fn new(issue: &Issue, field: DataQualityField, kind: DataQualityKind) -> Self {
        Self {
            issue_id: issue.id.clone(),
            field,
            kind,
        }
    }
}

#[cfg(feature = "serde")]
fn is_zero(value: &usize) -> bool {
    *value == 0
}

/// Operational statistics shown on the staff dashboard.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct DashboardStats {
    pub total_issues: usize,
    pub open_issues: usize,
    pub in_progress_issues: usize,
    pub resolved_issues: usize,
    /// Closed issues plus issues whose status is not recognized.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "is_zero"))]
    pub other_status_issues: usize,
    /// Mean days from creation to resolution, rounded half-up to one decimal.
    pub average_resolution_time: f64,
    /// Issue count per category. Order carries no meaning.
    pub category_breakdown: Vec<CategoryCount>,
    /// Issues per creation day inside the window, ascending by date.
    pub recent_activity: Vec<DailyCount>,
    #[cfg_attr(
        feature = "serde",
        serde(
            rename = "dataQualityWarnings",
            default,
            skip_serializing_if = "Vec::is_empty"
        )
    )]
    pub warnings: Vec<DataQualityWarning>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("Aggregation window of {0} days reaches past the earliest representable time")]
    WindowOutOfRange(u32),
}

/// Start of the recent activity window: `now` minus `window_days` whole days.
pub fn window_cutoff(now: DateTime<Utc>, window_days: u32) -> Result<DateTime<Utc>, StatsError> {
    TimeDelta::try_days(i64::from(window_days))
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or(StatsError::WindowOutOfRange(window_days))
}

/// Computes dashboard statistics over `issues` as of `now`.
///
/// # Arguments
///
/// * `issues` - Snapshot of every issue in the store. Never modified.
/// * `now` - Reference instant for the activity window.
/// * `window_days` - Length of the activity window, see [`DEFAULT_WINDOW_DAYS`].
///
/// # Returns
///
/// The statistics, or `StatsError::WindowOutOfRange` when the window cannot
/// be represented.
pub fn compute_dashboard_stats(
    issues: &[Issue],
    now: DateTime<Utc>,
    window_days: u32,
) -> Result<DashboardStats, StatsError> {
    let cutoff = window_cutoff(now, window_days)?;
    let mut warnings = Vec::new();

    let counts = StatusCounts::tally(issues);
    let recent_activity = recent_activity(issues, cutoff, &mut warnings);
    let average_resolution_time = average_resolution_days(issues, &mut warnings);

    Ok(DashboardStats {
        total_issues: issues.len(),
        open_issues: counts.open,
        in_progress_issues: counts.in_progress,
        resolved_issues: counts.resolved,
        other_status_issues: counts.other,
        average_resolution_time,
        category_breakdown: category_breakdown(issues),
        recent_activity,
        warnings,
    })
}

#[derive(Default)]
struct StatusCounts {
    open: usize,
    in_progress: usize,
    resolved: usize,
    other: usize,
}

impl StatusCounts {
    fn tally(issues: &[Issue]) -> Self {
        issues.iter().fold(Self::default(), |mut counts, issue| {
            match issue.status {
                IssueStatus::Open => counts.open += 1,
                IssueStatus::InProgress => counts.in_progress += 1,
                IssueStatus::Resolved => counts.resolved += 1,
                IssueStatus::Closed | IssueStatus::Unrecognized(_) => counts.other += 1,
            }
            counts
        })
    }
}

/// Mean resolution time in days, rounded half-up to tenths.
///
/// Malformed `created_at` values are reported by [`recent_activity`], so they
/// are skipped silently here to avoid duplicate warnings.
fn average_resolution_days(issues: &[Issue], warnings: &mut Vec<DataQualityWarning>) -> f64 {
    let mut total_millis: i128 = 0;
    let mut resolved: i128 = 0;

    for issue in issues.iter().filter(|issue| issue.status == IssueStatus::Resolved) {
        let Some(resolved_at) = &issue.resolved_at else {
            warnings.push(DataQualityWarning::new(
                issue,
                DataQualityField::ResolvedAt,
                DataQualityKind::MissingResolvedAt,
            ));
            continue;
        };
        let Some(resolved_at) = resolved_at.instant() else {
            warnings.push(DataQualityWarning::new(
                issue,
                DataQualityField::ResolvedAt,
                DataQualityKind::MalformedTimestamp,
            ));
            continue;
        };
        let Some(created_at) = issue.created_at.instant() else {
            continue;
        };

        let mut elapsed = (resolved_at - created_at).num_milliseconds();
        if elapsed < 0 {
            warnings.push(DataQualityWarning::new(
                issue,
                DataQualityField::ResolvedAt,
                DataQualityKind::NegativeResolutionTime,
            ));
            elapsed = 0;
        }

        total_millis += i128::from(elapsed);
        resolved += 1;
    }

    if resolved == 0 {
        return 0.0;
    }

    // floor(total * 10 / denominator + 1/2), all in integers.
    let denominator = resolved * MILLIS_PER_DAY;
    let tenths = (total_millis * 20 + denominator) / (2 * denominator);
    tenths as f64 / 10.0
}

fn category_breakdown(issues: &[Issue]) -> Vec<CategoryCount> {
    let mut per_category: BTreeMap<&str, usize> = BTreeMap::new();
    for issue in issues {
        *per_category.entry(issue.category.as_str()).or_default() += 1;
    }

    per_category
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect()
}

/// Issues created at or after `cutoff`, grouped by their UTC creation day.
///
/// Days without issues are not emitted.
fn recent_activity(
    issues: &[Issue],
    cutoff: DateTime<Utc>,
    warnings: &mut Vec<DataQualityWarning>,
) -> Vec<DailyCount> {
    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();

    for issue in issues {
        match issue.created_at.instant() {
            Some(created_at) if created_at >= cutoff => {
                *per_day.entry(created_at.date_naive()).or_default() += 1;
            }
            Some(_) => {}
            None => warnings.push(DataQualityWarning::new(
                issue,
                DataQualityField::CreatedAt,
                DataQualityKind::MalformedTimestamp,
            )),
        }
    }

    per_day
        .into_iter()
        .map(|(date, count)| DailyCount {
            date: date.format("%Y-%m-%d").to_string(),
            count,
        })
        .collect()
}
