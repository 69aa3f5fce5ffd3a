//! Service-level deadlines per category and the alerts derived from them.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::issue::{Issue, IssueCategory, IssueId, IssuePriority, IssueStatus};

/// Resolution deadlines, in hours, for each issue category.
///
/// Priority scales the base allowance: critical issues get a quarter of it,
/// high half, medium all of it and low one and a half times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlaPolicy {
    category_hours: HashMap<String, u32>,
    fallback_hours: u32,
}

impl Default for SlaPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl SlaPolicy {
    /// The municipal default deadlines.
    pub fn standard() -> Self {
        let category_hours = [
            (IssueCategory::Pothole, 72),
            (IssueCategory::Streetlight, 48),
            (IssueCategory::Garbage, 24),
            (IssueCategory::WaterLeak, 24),
            (IssueCategory::Road, 120),
            (IssueCategory::Sanitation, 48),
            (IssueCategory::Drainage, 72),
            (IssueCategory::Electricity, 24),
            (IssueCategory::Traffic, 48),
            (IssueCategory::Other, 168),
        ]
        .into_iter()
        .map(|(category, hours)| (category.as_str().to_string(), hours))
        .collect();

        Self {
            category_hours,
            fallback_hours: 168,
        }
    }

    /// Overrides the deadline for one category.
    #[cfg(test)]
    fn with_category_hours(mut self, category: &IssueCategory, hours: u32) -> Self {
        self.category_hours
            .insert(category.as_str().to_string(), hours);
        self
    }

    /// Base allowance before priority scaling. Unlisted categories use the fallback.
    pub fn base_hours(&self, category: &IssueCategory) -> u32 {
        self.category_hours
            .get(category.as_str())
            .copied()
            .unwrap_or(self.fallback_hours)
    }

    /// Time an issue of this category and priority has to be resolved.
    pub fn allowance(&self, category: &IssueCategory, priority: IssuePriority) -> TimeDelta {
        let (numerator, denominator) = match priority {
            IssuePriority::Critical => (1, 4),
            IssuePriority::High => (1, 2),
            IssuePriority::Medium => (1, 1),
            IssuePriority::Low => (3, 2),
        };
        let minutes = i64::from(self.base_hours(category)) * 60 * numerator / denominator;
        TimeDelta::minutes(minutes)
    }

    /// Deadline of `issue`, or `None` when its creation time is unusable.
    pub fn deadline(&self, issue: &Issue) -> Option<DateTime<Utc>> {
        issue
            .created_at
            .instant()?
            .checked_add_signed(self.allowance(&issue.category, issue.priority))
    }
}

/// An unresolved issue that is close to, or past, its deadline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct SlaAlert {
    pub issue_id: IssueId,
    pub title: String,
    pub category: String,
    pub priority: IssuePriority,
    pub status: String,
    pub location: String,
    pub deadline: DateTime<Utc>,
    /// Minutes until the deadline; negative once breached.
    pub minutes_remaining: i64,
    pub breached: bool,
}

/// Alerts for open and in-progress issues whose deadline is within
/// `threshold` of `now`, soonest deadline first.
pub fn compute_sla_alerts(
    issues: &[Issue],
    now: DateTime<Utc>,
    policy: &SlaPolicy,
    threshold: TimeDelta,
) -> Vec<SlaAlert> {
    let mut alerts: Vec<SlaAlert> = issues
        .iter()
        .filter(|issue| issue.status.is_active())
        .filter_map(|issue| {
            let deadline = policy.deadline(issue)?;
            let remaining = deadline - now;
            (remaining <= threshold).then(|| SlaAlert {
                issue_id: issue.id.clone(),
                title: issue.title.clone(),
                category: issue.category.as_str().to_string(),
                priority: issue.priority,
                status: issue.status.as_str().to_string(),
                location: issue.location.clone(),
                deadline,
                minutes_remaining: remaining.num_minutes(),
                breached: remaining < TimeDelta::zero(),
            })
        })
        .collect();

    alerts.sort_by(|a, b| {
        a.deadline
            .cmp(&b.deadline)
            .then_with(|| a.issue_id.cmp(&b.issue_id))
    });
    alerts
}

/// Percentage of resolved issues that met their deadline, to one decimal.
///
/// Returns `None` when no resolved issue has usable timestamps.
pub fn sla_compliance(issues: &[Issue], policy: &SlaPolicy) -> Option<f64> {
    let (met, measured) = issues
        .iter()
        .filter(|issue| issue.status == IssueStatus::Resolved)
        .filter_map(|issue| {
            let resolved_at = issue.resolved_at.as_ref()?.instant()?;
            let deadline = policy.deadline(issue)?;
            Some(resolved_at <= deadline)
        })
        .fold((0u64, 0u64), |(met, measured), on_time| {
            (met + u64::from(on_time), measured + 1)
        });

    if measured == 0 {
        return None;
    }
    let tenths = (met * 2000 + measured) / (2 * measured);
    Some(tenths as f64 / 10.0)
}
