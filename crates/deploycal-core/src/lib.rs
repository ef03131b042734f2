//! # deploycal-core
//!
//! Core domain model and traits for the deploycal deployment calendar.
//!
//! This crate provides:
//! - Domain types: `ReleaseWindow`, `ProjectRef`, `ReleaseVersion`, `RawIssue`, `CalendarRow`
//! - The issue-to-row transformation (`Issue`) and its lookup tables (`DeployRules`, `Labels`)
//! - Collaborator traits: `IssueTracker`, `Mailer`
//! - Error types
//!
//! ## Example
//!
//! ```rust
//! use deploycal_core::{DeployRules, Issue, Labels, RawIssue, ReleaseVersion};
//!
//! let raw = RawIssue::new("OPS-12")
//!     .summary("Rotate payment gateway keys")
//!     .fix_version(ReleaseVersion::new("10001", "ERP 2024.1.0").released_on("2024-03-10"))
//!     .assignee("Jane Doe (Ops)")
//!     .priority("High");
//!
//! let rules = DeployRules::default();
//! let labels = Labels::english();
//! let issue = Issue::new(raw, &rules, &labels);
//!
//! assert_eq!(issue.service_name().unwrap(), "ERP");
//! assert_eq!(issue.deploy_end().unwrap(), "2024-03-11 03:00");
//! ```

pub mod issue;
pub mod rules;

pub use issue::{service_code, strip_parenthetical, Issue};
pub use rules::{DeployRules, DeploySchedule, Labels, Locale, RiskLevel, TimeOfDay, TimeWindow};

use chrono::{Duration, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Tracker-side identifier of a release version
pub type VersionId = String;

/// Project key as shown in the tracker (e.g. `OPS`)
pub type ProjectKey = String;

/// chrono format of tracker release dates
pub const RELEASE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Only projects of this type take part in the calendar
pub const SOFTWARE_PROJECT_TYPE: &str = "software";

/// Parse a tracker release date.
///
/// The string must match `^\d{4}-\d{2}-\d{2}$` exactly and name a real
/// calendar day; anything else yields `None`.
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("release date pattern is valid")
    });

    if !pattern.is_match(raw) {
        return None;
    }
    NaiveDate::parse_from_str(raw, RELEASE_DATE_FORMAT).ok()
}

// ============================================================================
// Release Window
// ============================================================================

/// Inclusive reporting period
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReleaseWindow {
    /// Number of days covered by a trailing window
    pub const TRAILING_DAYS: i64 = 7;

    /// Create a window; `None` when `start` is after `end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// The seven days ending on (and including) `today`
    pub fn trailing_week(today: NaiveDate) -> Self {
        Self {
            start: today - Duration::days(Self::TRAILING_DAYS - 1),
            end: today,
        }
    }

    /// Inclusive on both ends
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Short `DD.MM-DD.MM` label used in file names and mail subjects
    pub fn label(&self) -> String {
        format!("{}-{}", self.start.format("%d.%m"), self.end.format("%d.%m"))
    }
}

// ============================================================================
// Projects and Versions
// ============================================================================

/// A tracker project
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    pub key: ProjectKey,
    #[serde(rename = "projectTypeKey", default)]
    pub project_type: String,
}

impl ProjectRef {
    pub fn new(key: impl Into<String>, project_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            project_type: project_type.into(),
        }
    }

    pub fn is_software(&self) -> bool {
        self.project_type == SOFTWARE_PROJECT_TYPE
    }
}

/// Set of project keys removed from the report.
///
/// Matching is exact string equality; `OPS` does not exclude `OPS2`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectExclusions {
    keys: BTreeSet<ProjectKey>,
}

impl ProjectExclusions {
    /// Parse a comma separated key list such as `"LEGACY,SANDBOX"`.
    /// Surrounding whitespace is dropped and empty entries are ignored.
    pub fn parse(list: &str) -> Self {
        list.split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

impl<S: Into<String>> FromIterator<S> for ProjectExclusions {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// A release/version record, also used for an issue's fix versions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseVersion {
    pub id: VersionId,
    pub name: String,
    #[serde(default)]
    pub release_date: Option<String>,
}

impl ReleaseVersion {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            release_date: None,
        }
    }

    /// Set the raw release date string
    pub fn released_on(mut self, date: impl Into<String>) -> Self {
        self.release_date = Some(date.into());
        self
    }

    /// Strictly parsed release date, `None` if absent or malformed
    pub fn release_date(&self) -> Option<NaiveDate> {
        self.release_date.as_deref().and_then(parse_release_date)
    }
}

// ============================================================================
// Issues
// ============================================================================

/// A tracker user reference
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub display_name: String,
}

impl UserRef {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
        }
    }
}

/// An issue as returned by the tracker, reduced to the fields the calendar reads
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIssue {
    pub key: String,
    pub summary: String,
    /// Fix versions in tracker order; the last one is authoritative
    pub fix_versions: Vec<ReleaseVersion>,
    pub assignee: Option<UserRef>,
    pub reporter: Option<UserRef>,
    /// Priority name (`Critical`, `High`, ...)
    pub priority: Option<String>,
    /// Explicit deployment manager, read from a tracker custom field
    pub deploy_manager: Option<UserRef>,
}

impl RawIssue {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            summary: String::new(),
            fix_versions: Vec::new(),
            assignee: None,
            reporter: None,
            priority: None,
            deploy_manager: None,
        }
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Append a fix version
    pub fn fix_version(mut self, version: ReleaseVersion) -> Self {
        self.fix_versions.push(version);
        self
    }

    pub fn assignee(mut self, display_name: impl Into<String>) -> Self {
        self.assignee = Some(UserRef::new(display_name));
        self
    }

    pub fn reporter(mut self, display_name: impl Into<String>) -> Self {
        self.reporter = Some(UserRef::new(display_name));
        self
    }

    pub fn priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn deploy_manager(mut self, display_name: impl Into<String>) -> Self {
        self.deploy_manager = Some(UserRef::new(display_name));
        self
    }
}

// ============================================================================
// Calendar Row
// ============================================================================

/// One line of the deployment calendar, columns A through K
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarRow {
    pub id: String,
    pub description: String,
    pub service_name: String,
    pub unavailability_note: String,
    pub deploy_start: String,
    pub deploy_end: String,
    pub deploy_status: String,
    pub deploy_manager: String,
    pub maintain_manager: String,
    pub deploy_risk: String,
    pub deploy_result: String,
}

impl CalendarRow {
    pub const COLUMN_COUNT: usize = 11;

    /// Cell values in column order
    pub fn cells(&self) -> [&str; Self::COLUMN_COUNT] {
        [
            &self.id,
            &self.description,
            &self.service_name,
            &self.unavailability_note,
            &self.deploy_start,
            &self.deploy_end,
            &self.deploy_status,
            &self.deploy_manager,
            &self.maintain_manager,
            &self.deploy_risk,
            &self.deploy_result,
        ]
    }
}

// ============================================================================
// Collaborator Traits
// ============================================================================

/// One search response
#[derive(Clone, Debug, Default)]
pub struct SearchPage {
    /// Total number of matches reported by the tracker
    pub total: u64,
    pub issues: Vec<RawIssue>,
}

/// Issue-tracker access used by the version filter and issue fetcher
pub trait IssueTracker {
    /// List every project visible to the configured account
    fn list_projects(&self) -> Result<Vec<ProjectRef>, TrackerError>;

    /// Released versions of one project
    fn released_versions(&self, project_key: &str) -> Result<Vec<ReleaseVersion>, TrackerError>;

    /// Run a JQL query, returning at most `max_results` issues
    fn search_issues(&self, jql: &str, max_results: u32) -> Result<SearchPage, TrackerError>;
}

/// A composed message ready for the mail provider
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub subject: String,
    pub body: String,
    /// Every recipient is blind-copied
    pub bcc: Vec<String>,
    pub attachment: PathBuf,
}

/// Provider acknowledgement of a sent message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailReceipt {
    pub id: String,
    pub message: String,
}

/// Mail provider access used by the notifier
pub trait Mailer {
    fn send(&self, mail: &OutgoingMail) -> Result<MailReceipt, MailError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Issue-tracker error
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Tracker answered {status} for {url}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("Could not decode tracker response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Issue-to-row transformation error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("Issue {0} has no fix version")]
    MissingFixVersion(String),

    #[error("Issue {key}: fix version {version} has invalid release date {raw:?}")]
    InvalidReleaseDate {
        key: String,
        version: String,
        raw: Option<String>,
    },
}

/// Spreadsheet rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

/// Mail provider error
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail request failed: {0}")]
    Transport(String),

    #[error("Mail provider rejected the message ({status}): {message} (id: {id})")]
    Rejected {
        status: u16,
        message: String,
        id: String,
    },

    #[error("Cannot attach {path}: {source}")]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn release_date_requires_strict_pattern() {
        assert_eq!(parse_release_date("2024-03-10"), Some(date(2024, 3, 10)));
        assert_eq!(parse_release_date("2024-3-10"), None);
        assert_eq!(parse_release_date("10.03.2024"), None);
        assert_eq!(parse_release_date(" 2024-03-10"), None);
        assert_eq!(parse_release_date("2024-03-10T00:00"), None);
        assert_eq!(parse_release_date(""), None);
    }

    #[test]
    fn release_date_rejects_impossible_day() {
        assert_eq!(parse_release_date("2024-02-30"), None);
        assert_eq!(parse_release_date("2024-13-01"), None);
    }

    #[test]
    fn trailing_week_covers_seven_days() {
        let window = ReleaseWindow::trailing_week(date(2024, 3, 10));
        assert_eq!(window.start, date(2024, 3, 4));
        assert_eq!(window.end, date(2024, 3, 10));
        assert_eq!((window.end - window.start).num_days() + 1, 7);
    }

    #[test]
    fn window_is_inclusive() {
        let window = ReleaseWindow::new(date(2024, 3, 4), date(2024, 3, 10)).unwrap();
        assert!(window.contains(date(2024, 3, 4)));
        assert!(window.contains(date(2024, 3, 10)));
        assert!(!window.contains(date(2024, 3, 3)));
        assert!(!window.contains(date(2024, 3, 11)));
    }

    #[test]
    fn reversed_window_is_rejected() {
        assert!(ReleaseWindow::new(date(2024, 3, 10), date(2024, 3, 4)).is_none());
    }

    #[test]
    fn window_label_uses_day_month() {
        let window = ReleaseWindow::new(date(2024, 2, 27), date(2024, 3, 4)).unwrap();
        assert_eq!(window.label(), "27.02-04.03");
    }

    #[test]
    fn exclusions_match_exact_keys_only() {
        let excluded = ProjectExclusions::parse("OPS, LEGACY,,");
        assert_eq!(excluded.len(), 2);
        assert!(excluded.contains("OPS"));
        assert!(excluded.contains("LEGACY"));
        assert!(!excluded.contains("OPS2"));
        assert!(!excluded.contains("OP"));
        assert!(ProjectExclusions::parse("").is_empty());
    }

    #[test]
    fn project_type_filter() {
        assert!(ProjectRef::new("ERP", "software").is_software());
        assert!(!ProjectRef::new("HR", "business").is_software());
    }

    #[test]
    fn version_deserializes_from_tracker_json() {
        let json = r#"{"id":"10001","name":"ERP 2024.1.0","releaseDate":"2024-03-10","released":true}"#;
        let version: ReleaseVersion = serde_json::from_str(json).unwrap();
        assert_eq!(version.release_date(), Some(date(2024, 3, 10)));

        let undated: ReleaseVersion = serde_json::from_str(r#"{"id":"1","name":"x"}"#).unwrap();
        assert_eq!(undated.release_date(), None);
    }

    #[test]
    fn row_cells_follow_column_order() {
        let row = CalendarRow {
            id: "A".into(),
            description: "B".into(),
            service_name: "C".into(),
            unavailability_note: "D".into(),
            deploy_start: "E".into(),
            deploy_end: "F".into(),
            deploy_status: "G".into(),
            deploy_manager: "H".into(),
            maintain_manager: "I".into(),
            deploy_risk: "J".into(),
            deploy_result: "K".into(),
        };
        assert_eq!(
            row.cells(),
            ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K"]
        );
    }
}
