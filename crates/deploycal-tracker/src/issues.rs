//! Issue fetcher
//!
//! Builds one JQL query over the released version ids and runs it once.
//! Results beyond `max_results` are not paginated; when the tracker reports
//! more matches than it returned, the list is truncated and a warning logged.

use deploycal_core::{IssueTracker, RawIssue, TrackerError, VersionId};
use tracing::{info, warn};

/// Default label marking issues that must not appear in the calendar
pub const DEFAULT_EXCLUDED_LABEL: &str = "RELEASEBUG";

/// Default result cap of the single search request
pub const DEFAULT_MAX_RESULTS: u32 = 2000;

/// Search parameters
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueQuery {
    /// Issues carrying this label are left out
    pub excluded_label: String,
    pub max_results: u32,
}

impl Default for IssueQuery {
    fn default() -> Self {
        Self {
            excluded_label: DEFAULT_EXCLUDED_LABEL.into(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl IssueQuery {
    pub fn excluded_label(mut self, label: impl Into<String>) -> Self {
        self.excluded_label = label.into();
        self
    }

    pub fn max_results(mut self, max: u32) -> Self {
        self.max_results = max;
        self
    }

    /// JQL for the given versions; `None` when there is nothing to select
    pub fn jql(&self, version_ids: &[VersionId]) -> Option<String> {
        if version_ids.is_empty() {
            return None;
        }

        Some(format!(
            "fixVersion in ({}) and (labels is EMPTY or labels not in ({})) order by fixVersion ASC",
            version_ids.join(","),
            self.excluded_label
        ))
    }
}

/// Issues whose fix version is one of `version_ids`.
///
/// An empty version list yields no issues without contacting the tracker.
pub fn fetch_issues<T: IssueTracker + ?Sized>(
    tracker: &T,
    version_ids: &[VersionId],
    query: &IssueQuery,
) -> Result<Vec<RawIssue>, TrackerError> {
    let Some(jql) = query.jql(version_ids) else {
        info!("No released versions in the window, skipping issue search");
        return Ok(Vec::new());
    };

    info!(jql = %jql, "Requesting issues");
    let page = tracker.search_issues(&jql, query.max_results)?;
    info!("Found {} issues", page.total);

    if page.total > page.issues.len() as u64 {
        warn!(
            total = page.total,
            returned = page.issues.len(),
            "Search result truncated at {} issues",
            query.max_results
        );
    }

    Ok(page.issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn jql_lists_versions_and_label() {
        let ids = vec!["10001".to_string(), "10002".to_string()];
        assert_eq!(
            IssueQuery::default().jql(&ids).unwrap(),
            "fixVersion in (10001,10002) and (labels is EMPTY or labels not in (RELEASEBUG)) order by fixVersion ASC"
        );
    }

    #[test]
    fn jql_uses_configured_label() {
        let ids = vec!["7".to_string()];
        let jql = IssueQuery::default().excluded_label("HOTFIX").jql(&ids).unwrap();
        assert!(jql.contains("labels not in (HOTFIX)"));
    }

    #[test]
    fn no_versions_no_query() {
        assert_eq!(IssueQuery::default().jql(&[]), None);
    }

    #[test]
    fn builder_sets_cap() {
        let query = IssueQuery::default().max_results(50);
        assert_eq!(query.max_results, 50);
        assert_eq!(query.excluded_label, DEFAULT_EXCLUDED_LABEL);
    }
}
