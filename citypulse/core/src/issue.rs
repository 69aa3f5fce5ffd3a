use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Public alias for an issue's opaque identifier.
pub type IssueId = String;

/// Where an issue sits in its lifecycle.
///
/// Values outside the four known statuses are kept verbatim in
/// `Unrecognized` so that records written by other tools survive a
/// round trip through the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(from = "String", into = "String")
)]
pub enum IssueStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
    Unrecognized(String),
}

impl IssueStatus {
    /// Returns the wire representation of the status.
    pub fn as_str(&self) -> &str {
        match self {
            IssueStatus::Open => "open",
            IssueStatus::InProgress => "in-progress",
            IssueStatus::Resolved => "resolved",
            IssueStatus::Closed => "closed",
            IssueStatus::Unrecognized(raw) => raw,
        }
    }

    /// True for issues that still need work from the municipality.
    pub fn is_active(&self) -> bool {
        matches!(self, IssueStatus::Open | IssueStatus::InProgress)
    }

    // Position along open -> in-progress -> resolved.
    fn stage(&self) -> Option<u8> {
        match self {
            IssueStatus::Open => Some(0),
            IssueStatus::InProgress => Some(1),
            IssueStatus::Resolved => Some(2),
            IssueStatus::Closed | IssueStatus::Unrecognized(_) => None,
        }
    }
}

impl From<String> for IssueStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "open" => IssueStatus::Open,
            "in-progress" => IssueStatus::InProgress,
            "resolved" => IssueStatus::Resolved,
            "closed" => IssueStatus::Closed,
            _ => IssueStatus::Unrecognized(raw),
        }
    }
}

impl From<IssueStatus> for String {
    fn from(status: IssueStatus) -> Self {
        match status {
            IssueStatus::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for IssueStatus {
    type Err = IssueError;

    /// Parses one of the four known statuses, rejecting anything else.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match IssueStatus::from(s.to_string()) {
            IssueStatus::Unrecognized(raw) => Err(IssueError::UnknownStatus(raw)),
            status => Ok(status),
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of civic problem being reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(from = "String", into = "String")
)]
pub enum IssueCategory {
    Pothole,
    Streetlight,
    Garbage,
    WaterLeak,
    Road,
    Sanitation,
    Drainage,
    Electricity,
    Traffic,
    Other,
    /// A category string found in stored data that is not part of the known set.
    Unlisted(String),
}

impl IssueCategory {
    /// Every category a citizen can pick when reporting.
    pub const ALL: [IssueCategory; 10] = [
        IssueCategory::Pothole,
        IssueCategory::Streetlight,
        IssueCategory::Garbage,
        IssueCategory::WaterLeak,
        IssueCategory::Road,
        IssueCategory::Sanitation,
        IssueCategory::Drainage,
        IssueCategory::Electricity,
        IssueCategory::Traffic,
        IssueCategory::Other,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            IssueCategory::Pothole => "pothole",
            IssueCategory::Streetlight => "streetlight",
            IssueCategory::Garbage => "garbage",
            IssueCategory::WaterLeak => "water_leak",
            IssueCategory::Road => "road",
            IssueCategory::Sanitation => "sanitation",
            IssueCategory::Drainage => "drainage",
            IssueCategory::Electricity => "electricity",
            IssueCategory::Traffic => "traffic",
            IssueCategory::Other => "other",
            IssueCategory::Unlisted(raw) => raw,
        }
    }
}

impl From<String> for IssueCategory {
    fn from(raw: String) -> Self {
        IssueCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == raw)
            .unwrap_or(IssueCategory::Unlisted(raw))
    }
}

impl From<IssueCategory> for String {
    fn from(category: IssueCategory) -> Self {
        match category {
            IssueCategory::Unlisted(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for IssueCategory {
    type Err = IssueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match IssueCategory::from(s.to_string()) {
            IssueCategory::Unlisted(raw) => Err(IssueError::UnknownCategory(raw)),
            category => Ok(category),
        }
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency assigned to an issue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum IssuePriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl IssuePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssuePriority::Low => "low",
            IssuePriority::Medium => "medium",
            IssuePriority::High => "high",
            IssuePriority::Critical => "critical",
        }
    }
}

impl FromStr for IssuePriority {
    type Err = IssueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(IssuePriority::Low),
            "medium" => Ok(IssuePriority::Medium),
            "high" => Ok(IssuePriority::High),
            "critical" => Ok(IssuePriority::Critical),
            other => Err(IssueError::UnknownPriority(other.to_string())),
        }
    }
}

/// Geographic point of an issue.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A point in time as read from the issue store.
///
/// Stored records are not trusted to carry valid RFC 3339 strings, so an
/// unparseable value is kept as `Malformed` instead of failing the whole load.
/// Any scalar is accepted when deserializing; only strings can be `Valid`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(into = "String"))]
pub enum Timestamp {
    Valid(DateTime<Utc>),
    Malformed(String),
}

impl Timestamp {
    /// Parses an RFC 3339 string, keeping the raw text when it does not parse.
    pub fn parse(raw: &str) -> Self {
        DateTime::parse_from_rfc3339(raw)
            .map(|instant| Timestamp::Valid(instant.with_timezone(&Utc)))
            .unwrap_or_else(|_| Timestamp::Malformed(raw.to_string()))
    }

    /// Returns the instant when the timestamp is valid.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Valid(instant) => Some(*instant),
            Timestamp::Malformed(_) => None,
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Timestamp::Valid(instant)
    }
}

impl From<String> for Timestamp {
    fn from(raw: String) -> Self {
        Timestamp::parse(&raw)
    }
}

impl From<Timestamp> for String {
    fn from(timestamp: Timestamp) -> Self {
        match timestamp {
            Timestamp::Valid(instant) => instant.to_rfc3339_opts(SecondsFormat::Millis, true),
            Timestamp::Malformed(raw) => raw,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(TimestampVisitor)
    }
}

#[cfg(feature = "serde")]
struct TimestampVisitor;

#[cfg(feature = "serde")]
impl serde::de::Visitor<'_> for TimestampVisitor {
    type Value = Timestamp;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an RFC 3339 timestamp or any other scalar")
    }

    fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<Timestamp, E> {
        Ok(Timestamp::parse(value))
    }

    fn visit_i64<E: serde::de::Error>(self, value: i64) -> Result<Timestamp, E> {
        Ok(Timestamp::Malformed(value.to_string()))
    }

    fn visit_u64<E: serde::de::Error>(self, value: u64) -> Result<Timestamp, E> {
        Ok(Timestamp::Malformed(value.to_string()))
    }

    fn visit_f64<E: serde::de::Error>(self, value: f64) -> Result<Timestamp, E> {
        Ok(Timestamp::Malformed(value.to_string()))
    }

    fn visit_bool<E: serde::de::Error>(self, value: bool) -> Result<Timestamp, E> {
        Ok(Timestamp::Malformed(value.to_string()))
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Timestamp, E> {
        Ok(missing_timestamp())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IssueError {
    #[error("Unknown issue status '{0}'")]
    UnknownStatus(String),
    #[error("Unknown issue category '{0}'")]
    UnknownCategory(String),
    #[error("Unknown issue priority '{0}'")]
    UnknownPriority(String),
    #[error("Cannot move issue from '{from}' to '{to}'")]
    InvalidTransition { from: IssueStatus, to: IssueStatus },
}

#[cfg(feature = "serde")]
fn anonymous() -> String {
    "anonymous".to_string()
}

/// Stands in for a `createdAt` absent from a stored record.
#[cfg(feature = "serde")]
fn missing_timestamp() -> Timestamp {
    Timestamp::Malformed(String::new())
}

/// A citizen-reported civic problem.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct Issue {
    pub id: IssueId,
    pub title: String,
    pub description: String,
    pub category: IssueCategory,
    pub status: IssueStatus,
    #[cfg_attr(feature = "serde", serde(default))]
    pub priority: IssuePriority,
    pub location: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub coordinates: Coordinates,
    #[cfg_attr(feature = "serde", serde(default))]
    pub photo_url: Option<String>,
    #[cfg_attr(feature = "serde", serde(default = "anonymous"))]
    pub reported_by: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub votes: u32,
    #[cfg_attr(feature = "serde", serde(default = "missing_timestamp"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "serde", serde(default))]
    pub updated_at: Option<Timestamp>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub resolved_at: Option<Timestamp>,
}

impl Issue {
    /// Creates a freshly reported, open issue.
    pub fn reported(
        id: impl Into<IssueId>,
        title: impl Into<String>,
        description: impl Into<String>,
        category: IssueCategory,
        location: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Issue {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            category,
            status: IssueStatus::Open,
            priority: IssuePriority::default(),
            location: location.into(),
            coordinates: Coordinates::default(),
            photo_url: None,
            reported_by: "anonymous".to_string(),
            votes: 0,
            created_at: Timestamp::Valid(created_at),
            updated_at: Some(Timestamp::Valid(created_at)),
            resolved_at: None,
        }
    }

    /// Moves the issue to `next`, enforcing the one-way lifecycle.
    ///
    /// Statuses only advance along open -> in-progress -> resolved (skipping a
    /// step is allowed). `closed` can be reached from any other status and is
    /// terminal. Entering `resolved` stamps `resolved_at` with `now`.
    pub fn transition_to(&mut self, next: IssueStatus, now: DateTime<Utc>) -> Result<(), IssueError> {
        let allowed = match (&self.status, &next) {
            (IssueStatus::Closed, _) => false,
            (_, IssueStatus::Closed) => true,
            (current, target) => match (current.stage(), target.stage()) {
                (Some(from), Some(to)) => to > from,
                _ => false,
            },
        };

        if !allowed {
            return Err(IssueError::InvalidTransition {
                from: self.status.clone(),
                to: next,
            });
        }

        if next == IssueStatus::Resolved && self.resolved_at.is_none() {
            self.resolved_at = Some(Timestamp::Valid(now));
        }
        self.status = next;
        self.updated_at = Some(Timestamp::Valid(now));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, day, hour, 0, 0).unwrap()
    }

    fn pothole() -> Issue {
        Issue::reported("1", "Pothole", "Deep one", IssueCategory::Pothole, "Main Street", at(1, 0))
    }

    #[test]
    fn can_parse_known_statuses() {
        assert_eq!("open".parse::<IssueStatus>(), Ok(IssueStatus::Open));
        assert_eq!("in-progress".parse::<IssueStatus>(), Ok(IssueStatus::InProgress));
        assert_eq!("resolved".parse::<IssueStatus>(), Ok(IssueStatus::Resolved));
        assert_eq!("closed".parse::<IssueStatus>(), Ok(IssueStatus::Closed));
        assert_eq!(
            "pending".parse::<IssueStatus>(),
            Err(IssueError::UnknownStatus("pending".to_string()))
        );
    }

    #[test]
    fn keeps_unrecognized_status_verbatim() {
        let status = IssueStatus::from("on-hold".to_string());
        assert_eq!(status, IssueStatus::Unrecognized("on-hold".to_string()));
        assert_eq!(status.as_str(), "on-hold");
        assert_eq!(String::from(status), "on-hold");
    }

    #[test]
    fn maps_category_strings_to_the_known_set() {
        for category in IssueCategory::ALL {
            assert_eq!(IssueCategory::from(category.as_str().to_string()), category);
        }
        assert_eq!(
            IssueCategory::from("graffiti".to_string()),
            IssueCategory::Unlisted("graffiti".to_string())
        );
        assert!("graffiti".parse::<IssueCategory>().is_err());
        assert_eq!("water_leak".parse::<IssueCategory>(), Ok(IssueCategory::WaterLeak));
    }

    #[test]
    fn keeps_malformed_timestamps() {
        assert_eq!(
            Timestamp::parse("2025-01-01T10:00:00Z").instant(),
            Some(at(1, 10))
        );
        let malformed = Timestamp::parse("yesterday");
        assert_eq!(malformed, Timestamp::Malformed("yesterday".to_string()));
        assert_eq!(malformed.instant(), None);
    }

    #[test]
    fn normalizes_offsets_to_utc() {
        let timestamp = Timestamp::parse("2025-01-01T12:00:00+02:00");
        assert_eq!(timestamp.instant(), Some(at(1, 10)));
        assert_eq!(String::from(timestamp), "2025-01-01T10:00:00.000Z");
    }

    #[test]
    fn can_advance_through_the_lifecycle() {
        let mut issue = pothole();

        issue.transition_to(IssueStatus::InProgress, at(2, 0)).unwrap();
        assert_eq!(issue.status, IssueStatus::InProgress);
        assert_eq!(issue.resolved_at, None);

        issue.transition_to(IssueStatus::Resolved, at(3, 0)).unwrap();
        assert_eq!(issue.status, IssueStatus::Resolved);
        assert_eq!(issue.resolved_at, Some(Timestamp::Valid(at(3, 0))));
        assert_eq!(issue.updated_at, Some(Timestamp::Valid(at(3, 0))));
    }

    #[test]
    fn can_skip_straight_to_resolved() {
        let mut issue = pothole();
        issue.transition_to(IssueStatus::Resolved, at(2, 0)).unwrap();
        assert_eq!(issue.resolved_at, Some(Timestamp::Valid(at(2, 0))));
    }

    #[test]
    fn rejects_moving_backwards() {
        let mut issue = pothole();
        issue.transition_to(IssueStatus::Resolved, at(2, 0)).unwrap();

        let result = issue.transition_to(IssueStatus::Open, at(3, 0));

        assert_eq!(
            result,
            Err(IssueError::InvalidTransition {
                from: IssueStatus::Resolved,
                to: IssueStatus::Open,
            })
        );
        assert_eq!(issue.resolved_at, Some(Timestamp::Valid(at(2, 0))));
    }

    #[test]
    fn rejects_same_status() {
        let mut issue = pothole();
        assert!(issue.transition_to(IssueStatus::Open, at(2, 0)).is_err());
    }

    #[test]
    fn closed_is_terminal() {
        let mut issue = pothole();
        issue.transition_to(IssueStatus::Closed, at(2, 0)).unwrap();
        assert_eq!(issue.resolved_at, None);
        assert!(issue.transition_to(IssueStatus::Resolved, at(3, 0)).is_err());
        assert!(issue.transition_to(IssueStatus::Closed, at(3, 0)).is_err());
    }

    #[test]
    fn issue_with_unrecognized_status_can_only_be_closed() {
        let mut issue = pothole();
        issue.status = IssueStatus::Unrecognized("archived".to_string());
        assert!(issue.transition_to(IssueStatus::Resolved, at(2, 0)).is_err());
        assert!(issue.transition_to(IssueStatus::Closed, at(2, 0)).is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn can_deserialize_loosely_typed_records() {
        let json = r#"{
            "id": "42",
            "title": "Broken light",
            "description": "Dark corner",
            "category": "streetlight",
            "status": "on-hold",
            "location": "5th Avenue",
            "createdAt": "not a date",
            "resolvedAt": null
        }"#;

        let issue: Issue = serde_json::from_str(json).unwrap();

        assert_eq!(issue.category, IssueCategory::Streetlight);
        assert_eq!(issue.status, IssueStatus::Unrecognized("on-hold".to_string()));
        assert_eq!(issue.priority, IssuePriority::Medium);
        assert_eq!(issue.reported_by, "anonymous");
        assert_eq!(issue.created_at, Timestamp::Malformed("not a date".to_string()));
        assert_eq!(issue.resolved_at, None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn keeps_non_string_timestamps_as_malformed() {
        let json = r#"{
            "id": "7",
            "title": "Leak",
            "description": "Pipe burst",
            "category": "water_leak",
            "status": "resolved",
            "location": "Church Square",
            "createdAt": 1730449800000,
            "resolvedAt": 1.5
        }"#;

        let issue: Issue = serde_json::from_str(json).unwrap();

        assert_eq!(issue.created_at, Timestamp::Malformed("1730449800000".to_string()));
        assert_eq!(issue.resolved_at, Some(Timestamp::Malformed("1.5".to_string())));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn missing_created_at_is_malformed() {
        let json = r#"{
            "id": "8",
            "title": "Leak",
            "description": "Pipe burst",
            "category": "water_leak",
            "status": "open",
            "location": "Church Square"
        }"#;

        let issue: Issue = serde_json::from_str(json).unwrap();

        assert_eq!(issue.created_at, Timestamp::Malformed(String::new()));
        assert_eq!(issue.created_at.instant(), None);

        let with_null: Issue =
            serde_json::from_str(&json.replace(r#""open","#, r#""open", "createdAt": null,"#))
                .unwrap();
        assert_eq!(with_null.created_at, Timestamp::Malformed(String::new()));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn rejects_structured_timestamps() {
        let result = serde_json::from_str::<Timestamp>(r#"{"seconds": 12}"#);
        assert!(result.is_err());
    }
}
