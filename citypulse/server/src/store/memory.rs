use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use citypulse_core::{Issue, IssueStatus};
use tokio::sync::RwLock;

use super::{IssueStore, StoreError};

/// Issue store kept in process memory. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryIssueStore {
    issues: RwLock<Vec<Issue>>,
}

impl InMemoryIssueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `issues`.
    pub fn with_issues(issues: Vec<Issue>) -> Self {
        Self {
            issues: RwLock::new(issues),
        }
    }

    /// Creates a store from a YAML list of issue records.
    ///
    /// Timestamps that do not parse are kept as malformed values rather than
    /// rejecting the file; the dashboard reports them as data-quality warnings.
    pub fn from_yaml(yaml_content: &str) -> Result<Self, StoreError> {
        let issues: Vec<Issue> = serde_yaml::from_str(yaml_content)
            .map_err(|e| StoreError::Seed(format!("Invalid YAML format: {}", e)))?;
        Ok(Self::with_issues(issues))
    }

    /// Reads a YAML seed file from disk.
    #[tracing::instrument]
    pub async fn load_seed_file(path: &Path) -> Result<Self, StoreError> {
        let yaml_content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::Seed(format!("Cannot read {}: {}", path.display(), e)))?;
        let store = Self::from_yaml(&yaml_content)?;
        tracing::info!(
            "Loaded {} seed issues from {}",
            store.issues.read().await.len(),
            path.display()
        );
        Ok(store)
    }
}

#[async_trait]
impl IssueStore for InMemoryIssueStore {
    async fn get_all(&self) -> Result<Vec<Issue>, StoreError> {
        Ok(self.issues.read().await.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<Issue>, StoreError> {
        let issues = self.issues.read().await;
        Ok(issues.iter().find(|issue| issue.id == id).cloned())
    }

    async fn append(&self, issue: Issue) -> Result<Issue, StoreError> {
        let mut issues = self.issues.write().await;
        if issues.iter().any(|existing| existing.id == issue.id) {
            return Err(StoreError::Duplicate(issue.id));
        }
        issues.push(issue.clone());
        Ok(issue)
    }

    async fn update_status(
        &self,
        id: &str,
        status: IssueStatus,
        now: DateTime<Utc>,
    ) -> Result<Issue, StoreError> {
        let mut issues = self.issues.write().await;
        let issue = issues
            .iter_mut()
            .find(|issue| issue.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        issue.transition_to(status, now)?;
        Ok(issue.clone())
    }
}
