//! Blocking Jira REST v2 client
//!
//! Uses reqwest with basic auth. Three endpoints are used:
//! - `GET /rest/api/2/project`
//! - `GET /rest/api/2/project/{key}/version?status=released`
//! - `GET /rest/api/2/search`

use deploycal_core::{
    IssueTracker, ProjectRef, RawIssue, ReleaseVersion, SearchPage, TrackerError, UserRef,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

/// Custom field holding the deployment manager override
pub const DEFAULT_MANAGER_FIELD: &str = "customfield_12507";

/// Page size of the version listing
const VERSION_PAGE_SIZE: u32 = 5000;

/// Connection settings
#[derive(Clone, Debug)]
pub struct JiraConfig {
    pub base_url: String,
    pub login: String,
    pub password: String,
    /// Custom field id read into `RawIssue::deploy_manager`
    pub manager_field: String,
    pub timeout: Duration,
}

impl JiraConfig {
    pub fn new(
        base_url: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            login: login.into(),
            password: password.into(),
            manager_field: DEFAULT_MANAGER_FIELD.into(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn manager_field(mut self, field: impl Into<String>) -> Self {
        self.manager_field = field.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct JiraClient {
    http: reqwest::blocking::Client,
    config: JiraConfig,
}

impl JiraClient {
    pub fn new(config: JiraConfig) -> Result<Self, TrackerError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TrackerError::Transport {
                url: config.base_url.clone(),
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        info!(url = %config.base_url, login = %config.login, "Using Jira server");
        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, TrackerError> {
        let url = self.url(path);
        debug!(url = %url, "GET");

        let resp = self
            .http
            .get(&url)
            .basic_auth(&self.config.login, Some(&self.config.password))
            .header("Accept", "application/json")
            .query(query)
            .send()
            .map_err(|e| TrackerError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(TrackerError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }

        resp.json().map_err(|e| TrackerError::Decode {
            url,
            message: e.to_string(),
        })
    }
}

impl IssueTracker for JiraClient {
    fn list_projects(&self) -> Result<Vec<ProjectRef>, TrackerError> {
        self.get("/rest/api/2/project", &[])
    }

    fn released_versions(&self, project_key: &str) -> Result<Vec<ReleaseVersion>, TrackerError> {
        let page: VersionPage = self.get(
            &format!("/rest/api/2/project/{project_key}/version"),
            &[
                ("maxResults", VERSION_PAGE_SIZE.to_string()),
                ("status", "released".to_string()),
            ],
        )?;
        Ok(page.values)
    }

    fn search_issues(&self, jql: &str, max_results: u32) -> Result<SearchPage, TrackerError> {
        let fields = format!(
            "summary,fixVersions,assignee,reporter,priority,{}",
            self.config.manager_field
        );
        let path = "/rest/api/2/search";
        let resp: SearchResponse = self.get(
            path,
            &[
                ("jql", jql.to_string()),
                ("maxResults", max_results.to_string()),
                ("fields", fields),
            ],
        )?;

        resp.into_page(&self.config.manager_field)
            .map_err(|message| TrackerError::Decode {
                url: self.url(path),
                message,
            })
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Deserialize)]
struct VersionPage {
    #[serde(default)]
    values: Vec<ReleaseVersion>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    issues: Vec<WireIssue>,
}

impl SearchResponse {
    fn into_page(self, manager_field: &str) -> Result<SearchPage, String> {
        let issues = self
            .issues
            .into_iter()
            .map(|issue| issue.into_raw(manager_field))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SearchPage {
            total: self.total,
            issues,
        })
    }
}

#[derive(Deserialize)]
struct WireIssue {
    key: String,
    fields: WireFields,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFields {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    fix_versions: Vec<ReleaseVersion>,
    assignee: Option<UserRef>,
    reporter: Option<UserRef>,
    priority: Option<WirePriority>,
    #[serde(flatten)]
    custom: HashMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct WirePriority {
    name: String,
}

impl WireIssue {
    fn into_raw(mut self, manager_field: &str) -> Result<RawIssue, String> {
        let deploy_manager = match self.fields.custom.remove(manager_field) {
            None | Some(serde_json::Value::Null) => None,
            Some(value) => Some(serde_json::from_value::<UserRef>(value).map_err(|e| {
                format!("{}: field {manager_field} is not a user: {e}", self.key)
            })?),
        };

        Ok(RawIssue {
            key: self.key,
            summary: self.fields.summary,
            fix_versions: self.fields.fix_versions,
            assignee: self.fields.assignee,
            reporter: self.fields.reporter,
            priority: self.fields.priority.map(|p| p.name),
            deploy_manager,
        })
    }
}
