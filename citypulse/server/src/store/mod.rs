//! Issue Record Store.
//!
//! Handlers and services only ever see the [`IssueStore`] trait, so the
//! in-memory implementation used today can be swapped for a persistent one
//! without touching them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use citypulse_core::{Issue, IssueError, IssueId, IssueStatus};
use thiserror::Error;

mod memory;

pub use memory::InMemoryIssueStore;

/// Errors raised by issue store implementations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No issue carries the requested identifier.
    #[error("Issue with ID '{0}' not found")]
    NotFound(IssueId),
    /// An issue with the same identifier is already stored.
    #[error("Issue with ID '{0}' already exists")]
    Duplicate(IssueId),
    /// The requested status change breaks the issue lifecycle.
    #[error(transparent)]
    Transition(#[from] IssueError),
    /// Seed data could not be read or parsed.
    #[error("Failed to load seed issues: {0}")]
    Seed(String),
    /// The backing storage could not serve the request.
    #[error("Issue store unavailable: {0}")]
    Unavailable(String),
}

/// Capability for reading and writing issue records.
///
/// Implementations own their concurrency discipline; `get_all` must return a
/// coherent snapshot.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueStore: Send + Sync {
    /// Returns a snapshot of every stored issue.
    async fn get_all(&self) -> Result<Vec<Issue>, StoreError>;

    /// Returns the issue with the given ID, if any.
    async fn get(&self, id: &str) -> Result<Option<Issue>, StoreError>;

    /// Stores a new issue and returns it.
    async fn append(&self, issue: Issue) -> Result<Issue, StoreError>;

    /// Moves an issue to `status` as of `now` and returns the updated record.
    async fn update_status(
        &self,
        id: &str,
        status: IssueStatus,
        now: DateTime<Utc>,
    ) -> Result<Issue, StoreError>;
}
