//! # deploycal-tracker
//!
//! Release lookup against the issue tracker.
//!
//! This crate provides:
//! - [`filter_released_versions`]: versions of software projects released inside a window
//! - [`fetch_issues`]: issues shipped in those versions
//! - [`JiraClient`]: blocking Jira REST v2 implementation of [`IssueTracker`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use deploycal_core::{ProjectExclusions, ReleaseWindow};
//! use deploycal_tracker::{fetch_issues, filter_released_versions, IssueQuery, JiraClient, JiraConfig};
//!
//! let jira = JiraClient::new(JiraConfig::new(url, login, password))?;
//! let window = ReleaseWindow::trailing_week(today);
//! let versions = filter_released_versions(&jira, &window, &ProjectExclusions::parse("SANDBOX"))?;
//! let issues = fetch_issues(&jira, &versions, &IssueQuery::default())?;
//! ```
//!
//! [`IssueTracker`]: deploycal_core::IssueTracker

pub mod issues;
pub mod jira;
pub mod versions;

pub use issues::{fetch_issues, IssueQuery};
pub use jira::{JiraClient, JiraConfig};
pub use versions::filter_released_versions;
