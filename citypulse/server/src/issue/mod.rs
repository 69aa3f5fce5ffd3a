use std::sync::Arc;

use chrono::{DateTime, Utc};
use citypulse_core::{Coordinates, Issue, IssueCategory, IssueError, IssueId, IssuePriority, IssueStatus};

use crate::store::{IssueStore, StoreError};

pub mod api {
    pub mod v1;
}

/// Details submitted by a citizen reporting a new issue.
#[derive(Debug, Clone, Default)]
pub struct NewIssue {
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub coordinates: Option<Coordinates>,
    pub photo_url: Option<String>,
    pub priority: Option<String>,
}

/// Exact-match filters for listing issues. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub status: Option<String>,
    pub category: Option<String>,
}

impl IssueFilter {
    fn matches(&self, issue: &Issue) -> bool {
        let status_matches = self
            .status
            .as_deref()
            .is_none_or(|status| issue.status.as_str() == status);
        let category_matches = self
            .category
            .as_deref()
            .is_none_or(|category| issue.category.as_str() == category);
        status_matches && category_matches
    }
}

/// Error type for IssueService operations.
#[derive(Debug, thiserror::Error)]
pub enum IssueServiceError {
    /// The submitted data is incomplete or uses unknown values.
    #[error("{0}")]
    Validation(String),
    /// No issue carries the requested identifier.
    #[error("Issue with ID '{0}' not found")]
    NotFound(IssueId),
    /// The requested status change breaks the issue lifecycle.
    #[error(transparent)]
    InvalidTransition(IssueError),
    /// The issue store failed.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for IssueServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => IssueServiceError::NotFound(id),
            StoreError::Transition(err) => IssueServiceError::InvalidTransition(err),
            other => IssueServiceError::Store(other),
        }
    }
}

#[derive(Clone)]
pub struct IssueState {
    pub store: Arc<dyn IssueStore>,
}

pub struct IssueService<'a> {
    store: &'a dyn IssueStore,
}

impl<'a> IssueService<'a> {
    pub fn new(store: &'a dyn IssueStore) -> Self {
        Self { store }
    }

    /// Validates and stores a newly reported issue.
    ///
    /// # Arguments
    ///
    /// * `new_issue` - The details submitted by the citizen.
    /// * `reporter` - Identity of the reporter, `anonymous` when absent.
    /// * `now` - Creation time of the issue.
    ///
    /// # Returns
    ///
    /// The stored `Issue`, open and with a fresh ID, or a validation error.
    #[tracing::instrument(skip(self))]
    pub async fn report_issue(
        &self,
        new_issue: NewIssue,
        reporter: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Issue, IssueServiceError> {
        let required = [
            &new_issue.title,
            &new_issue.description,
            &new_issue.category,
            &new_issue.location,
        ];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(IssueServiceError::Validation(
                "Title, description, category, and location are required".to_string(),
            ));
        }

        let category: IssueCategory = new_issue
            .category
            .parse()
            .map_err(|_| IssueServiceError::Validation("Invalid category".to_string()))?;
        let priority = match new_issue.priority.as_deref() {
            Some(priority) => priority
                .parse::<IssuePriority>()
                .map_err(|err| IssueServiceError::Validation(err.to_string()))?,
            None => IssuePriority::default(),
        };

        let mut issue = Issue::reported(
            uuid::Uuid::new_v4().to_string(),
            new_issue.title.trim(),
            new_issue.description.trim(),
            category,
            new_issue.location.trim(),
            now,
        );
        issue.priority = priority;
        issue.coordinates = new_issue.coordinates.unwrap_or_default();
        issue.photo_url = new_issue.photo_url;
        if let Some(reporter) = reporter {
            issue.reported_by = reporter.to_string();
        }

        let issue = self.store.append(issue).await?;
        tracing::info!("Issue {} reported in category {}", issue.id, issue.category);
        Ok(issue)
    }

    /// Lists issues matching `filter`, in store order.
    #[tracing::instrument(skip(self))]
    pub async fn list_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>, IssueServiceError> {
        let issues = self
            .store
            .get_all()
            .await?
            .into_iter()
            .filter(|issue| filter.matches(issue))
            .collect();
        Ok(issues)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_issue(&self, id: &str) -> Result<Issue, IssueServiceError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| IssueServiceError::NotFound(id.to_string()))
    }

    /// Moves an issue to the status named by `status`.
    ///
    /// # Returns
    ///
    /// The updated `Issue`, a validation error for an unknown status, or
    /// `InvalidTransition` when the lifecycle does not allow the change.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: &str,
        status: &str,
        now: DateTime<Utc>,
    ) -> Result<Issue, IssueServiceError> {
        let status: IssueStatus = status
            .parse()
            .map_err(|err: IssueError| IssueServiceError::Validation(err.to_string()))?;
        let issue = self.store.update_status(id, status, now).await?;
        tracing::info!("Issue {} moved to {}", issue.id, issue.status);
        Ok(issue)
    }
}
