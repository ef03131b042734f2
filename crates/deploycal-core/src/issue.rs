//! Issue-to-row transformation
//!
//! [`Issue`] wraps one [`RawIssue`] and derives the eleven calendar fields
//! from it. Everything except the deployment schedule is a cheap projection of
//! the raw record. The schedule depends on the service code and the release
//! date of the last fix version; it is computed on first access and cached
//! for the lifetime of the wrapper so that start and end always come from the
//! same computation.
//!
//! ## Field rules
//!
//! | Field | Rule |
//! |-------|------|
//! | service name | leading `^[A-Za-z_\-]+` token of the last fix version's name |
//! | deploy start/end | service window on the last fix version's release date |
//! | deploy manager | override user, else assignee, else reporter; `\s\(.+\)$` removed |
//! | maintain manager | assignee, else reporter; `\s\(.+\)$` removed |
//! | deploy risk | priority mapped through [`DeployRules`]; empty when unmapped |

use crate::rules::{DeployRules, DeploySchedule, Labels};
use crate::{CalendarRow, RawIssue, ReleaseVersion, TransformError};
use regex::Regex;
use std::cell::OnceCell;
use std::sync::OnceLock;

/// Service code of a fix version name.
///
/// Keeps the leading run of ASCII letters, `_` and `-`: `"ERP 2024.1.0"`
/// becomes `"ERP"`, `"WEB-hotfix 3"` becomes `"WEB-hotfix"`. A name that does
/// not start with such a run is returned unchanged.
pub fn service_code(version_name: &str) -> &str {
    static LEADING_TOKEN: OnceLock<Regex> = OnceLock::new();
    let re = LEADING_TOKEN
        .get_or_init(|| Regex::new(r"^([A-Za-z_\-]+)").expect("service token pattern is valid"));

    re.captures(version_name)
        .and_then(|caps| caps.get(1))
        .map_or(version_name, |token| token.as_str())
}

/// Drop a trailing `" (…)"` suffix from a display name.
///
/// `"Jane Doe (Team X)"` becomes `"Jane Doe"`. Surrounding whitespace and
/// stray parentheses are trimmed afterwards.
pub fn strip_parenthetical(display_name: &str) -> String {
    static SUFFIX: OnceLock<Regex> = OnceLock::new();
    let re = SUFFIX.get_or_init(|| Regex::new(r"\s\(.+\)$").expect("suffix pattern is valid"));

    re.replace(display_name, "")
        .trim_matches(|c: char| c.is_whitespace() || c == '(' || c == ')')
        .to_string()
}

/// Calendar view of one tracker issue
#[derive(Debug)]
pub struct Issue<'a> {
    raw: RawIssue,
    rules: &'a DeployRules,
    labels: &'a Labels,
    schedule: OnceCell<DeploySchedule>,
}

impl<'a> Issue<'a> {
    pub fn new(raw: RawIssue, rules: &'a DeployRules, labels: &'a Labels) -> Self {
        Self {
            raw,
            rules,
            labels,
            schedule: OnceCell::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.raw.key
    }

    pub fn summary(&self) -> &str {
        &self.raw.summary
    }

    /// The authoritative fix version (the last one listed)
    fn last_fix_version(&self) -> Result<&ReleaseVersion, TransformError> {
        self.raw
            .fix_versions
            .last()
            .ok_or_else(|| TransformError::MissingFixVersion(self.raw.key.clone()))
    }

    pub fn service_name(&self) -> Result<&str, TransformError> {
        Ok(service_code(&self.last_fix_version()?.name))
    }

    pub fn unavailability(&self) -> &'static str {
        self.labels.unavailability
    }

    /// Deployment schedule, computed once per issue
    pub fn deploy_schedule(&self) -> Result<&DeploySchedule, TransformError> {
        if let Some(schedule) = self.schedule.get() {
            return Ok(schedule);
        }

        let version = self.last_fix_version()?;
        let release_date =
            version
                .release_date()
                .ok_or_else(|| TransformError::InvalidReleaseDate {
                    key: self.raw.key.clone(),
                    version: version.name.clone(),
                    raw: version.release_date.clone(),
                })?;

        let computed = self
            .rules
            .schedule(service_code(&version.name), release_date);
        Ok(self.schedule.get_or_init(|| computed))
    }

    pub fn deploy_start(&self) -> Result<&str, TransformError> {
        Ok(&self.deploy_schedule()?.start)
    }

    pub fn deploy_end(&self) -> Result<&str, TransformError> {
        Ok(&self.deploy_schedule()?.end)
    }

    pub fn deploy_status(&self) -> &'static str {
        self.labels.deploy_status
    }

    /// Assignee display name, falling back to the reporter
    fn responsible_name(&self) -> &str {
        self.raw
            .assignee
            .as_ref()
            .or(self.raw.reporter.as_ref())
            .map_or("", |user| user.display_name.as_str())
    }

    pub fn deploy_manager(&self) -> String {
        let name = self
            .raw
            .deploy_manager
            .as_ref()
            .map_or_else(|| self.responsible_name(), |user| user.display_name.as_str());
        strip_parenthetical(name)
    }

    pub fn maintain_manager(&self) -> String {
        strip_parenthetical(self.responsible_name())
    }

    /// Risk label, empty when the priority is missing or unmapped
    pub fn deploy_risk(&self) -> &'static str {
        self.raw
            .priority
            .as_deref()
            .and_then(|priority| self.rules.risk_for(priority))
            .map_or("", |risk| self.labels.risk(risk))
    }

    pub fn deploy_result(&self) -> &'static str {
        self.labels.deploy_result
    }

    /// All eleven fields as a calendar row
    pub fn to_row(&self) -> Result<CalendarRow, TransformError> {
        Ok(CalendarRow {
            id: self.key().to_string(),
            description: self.summary().to_string(),
            service_name: self.service_name()?.to_string(),
            unavailability_note: self.unavailability().to_string(),
            deploy_start: self.deploy_start()?.to_string(),
            deploy_end: self.deploy_end()?.to_string(),
            deploy_status: self.deploy_status().to_string(),
            deploy_manager: self.deploy_manager(),
            maintain_manager: self.maintain_manager(),
            deploy_risk: self.deploy_risk().to_string(),
            deploy_result: self.deploy_result().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReleaseVersion;
    use pretty_assertions::assert_eq;

    fn released(name: &str, date: &str) -> ReleaseVersion {
        ReleaseVersion::new("1", name).released_on(date)
    }

    #[test]
    fn service_code_keeps_leading_token() {
        assert_eq!(service_code("ERP 2024.1.0"), "ERP");
        assert_eq!(service_code("WEB-hotfix 3"), "WEB-hotfix");
        assert_eq!(service_code("mobile_app   1.2"), "mobile_app");
        assert_eq!(service_code("WMS"), "WMS");
        assert_eq!(service_code("ERP2.0 final"), "ERP");
    }

    #[test]
    fn service_code_without_leading_letters_is_unchanged() {
        assert_eq!(service_code("2024.1 ERP"), "2024.1 ERP");
        assert_eq!(service_code(""), "");
    }

    #[test]
    fn strip_parenthetical_suffix() {
        assert_eq!(strip_parenthetical("Jane Doe (Team X)"), "Jane Doe");
        assert_eq!(strip_parenthetical("Jane Doe"), "Jane Doe");
        assert_eq!(strip_parenthetical("  Jane Doe  "), "Jane Doe");
        assert_eq!(strip_parenthetical("(Jane)"), "Jane");
        assert_eq!(strip_parenthetical(""), "");
    }

    #[test]
    fn strip_parenthetical_needs_leading_space() {
        assert_eq!(strip_parenthetical("Jane(Ops)"), "Jane(Ops");
    }

    #[test]
    fn service_name_uses_last_fix_version() {
        let rules = DeployRules::default();
        let labels = Labels::english();
        let raw = RawIssue::new("OPS-1")
            .fix_version(released("WMS 1.0", "2024-03-01"))
            .fix_version(released("ERP 2024.1.0", "2024-03-10"));
        let issue = Issue::new(raw, &rules, &labels);

        assert_eq!(issue.service_name().unwrap(), "ERP");
        assert_eq!(issue.deploy_start().unwrap(), "2024-03-10 23:00");
        assert_eq!(issue.deploy_end().unwrap(), "2024-03-11 03:00");
    }

    #[test]
    fn schedule_is_computed_once() {
        let rules = DeployRules::default();
        let labels = Labels::english();
        let raw = RawIssue::new("OPS-2").fix_version(released("WMS 5", "2024-03-10"));
        let issue = Issue::new(raw, &rules, &labels);

        let end_first = issue.deploy_end().unwrap();
        let start_first = issue.deploy_start().unwrap();
        let start_again = issue.deploy_start().unwrap();
        let end_again = issue.deploy_end().unwrap();

        assert_eq!(start_first, "2024-03-10 16:00");
        assert_eq!(end_first, "2024-03-10 17:00");
        assert!(std::ptr::eq(start_first, start_again));
        assert!(std::ptr::eq(end_first, end_again));
    }

    #[test]
    fn missing_fix_version_is_an_error() {
        let rules = DeployRules::default();
        let labels = Labels::english();
        let issue = Issue::new(RawIssue::new("OPS-3"), &rules, &labels);

        assert_eq!(
            issue.service_name(),
            Err(TransformError::MissingFixVersion("OPS-3".into()))
        );
        assert_eq!(
            issue.to_row(),
            Err(TransformError::MissingFixVersion("OPS-3".into()))
        );
    }

    #[test]
    fn malformed_release_date_is_an_error() {
        let rules = DeployRules::default();
        let labels = Labels::english();
        let raw = RawIssue::new("OPS-4").fix_version(released("WEB 1", "10.03.2024"));
        let issue = Issue::new(raw, &rules, &labels);

        assert_eq!(
            issue.deploy_start(),
            Err(TransformError::InvalidReleaseDate {
                key: "OPS-4".into(),
                version: "WEB 1".into(),
                raw: Some("10.03.2024".into()),
            })
        );
        assert_eq!(issue.service_name().unwrap(), "WEB");
    }

    #[test]
    fn deploy_manager_prefers_override() {
        let rules = DeployRules::default();
        let labels = Labels::english();
        let raw = RawIssue::new("OPS-5")
            .assignee("Jane Doe (Ops)")
            .deploy_manager("John Roe (Release Team)");
        let issue = Issue::new(raw, &rules, &labels);

        assert_eq!(issue.deploy_manager(), "John Roe");
        assert_eq!(issue.maintain_manager(), "Jane Doe");
    }

    #[test]
    fn managers_fall_back_to_reporter() {
        let rules = DeployRules::default();
        let labels = Labels::english();
        let raw = RawIssue::new("OPS-6").reporter("Ann Lee (QA)");
        let issue = Issue::new(raw, &rules, &labels);

        assert_eq!(issue.deploy_manager(), "Ann Lee");
        assert_eq!(issue.maintain_manager(), "Ann Lee");
    }

    #[test]
    fn managers_empty_without_people() {
        let rules = DeployRules::default();
        let labels = Labels::english();
        let issue = Issue::new(RawIssue::new("OPS-7"), &rules, &labels);

        assert_eq!(issue.deploy_manager(), "");
        assert_eq!(issue.maintain_manager(), "");
    }

    #[test]
    fn deploy_risk_mapping() {
        let rules = DeployRules::default();
        let labels = Labels::english();
        let risk = |priority: Option<&str>| {
            let mut raw = RawIssue::new("OPS-8");
            raw.priority = priority.map(str::to_string);
            Issue::new(raw, &rules, &labels).deploy_risk()
        };

        assert_eq!(risk(Some("Critical")), "High");
        assert_eq!(risk(Some("High")), "High");
        assert_eq!(risk(Some("Medium")), "Medium");
        assert_eq!(risk(Some("Low")), "Low");
        assert_eq!(risk(Some("Unknown")), "");
        assert_eq!(risk(None), "");
    }

    #[test]
    fn constants_follow_labels() {
        let rules = DeployRules::default();
        let labels = Labels::russian();
        let issue = Issue::new(RawIssue::new("OPS-9"), &rules, &labels);

        assert_eq!(issue.deploy_status(), "Выполнено");
        assert_eq!(issue.deploy_result(), "успешно");
    }

    #[test]
    fn full_row() {
        let rules = DeployRules::default();
        let labels = Labels::english();
        let raw = RawIssue::new("OPS-10")
            .summary("Rotate gateway keys")
            .fix_version(released("WMS 2024.3", "2024-03-10"))
            .assignee("Jane Doe (Ops)")
            .priority("High");

        let row = Issue::new(raw, &rules, &labels).to_row().unwrap();

        assert_eq!(
            row,
            CalendarRow {
                id: "OPS-10".into(),
                description: "Rotate gateway keys".into(),
                service_name: "WMS".into(),
                unavailability_note: "no disruption to key business processes is planned".into(),
                deploy_start: "2024-03-10 16:00".into(),
                deploy_end: "2024-03-10 17:00".into(),
                deploy_status: "Completed".into(),
                deploy_manager: "Jane Doe".into(),
                maintain_manager: "Jane Doe".into(),
                deploy_risk: "High".into(),
                deploy_result: "successful".into(),
            }
        );
    }
}
