//! Report pipeline
//!
//! Version filter, issue fetcher, transformation, table, notifier; each stage
//! finishes before the next one starts and the first error ends the run.
//! Rows are all built before anything is written, so a failing issue leaves
//! no file behind.

use deploycal_core::{
    CalendarRow, DeployRules, Issue, IssueTracker, Labels, MailError, Mailer, ProjectExclusions,
    ReleaseWindow, RenderError, TrackerError, TransformError,
};
use deploycal_notify::{Notifier, SendOutcome};
use deploycal_render::{build, calendar_header, ReportNaming};
use deploycal_tracker::{fetch_issues, filter_released_versions, IssueQuery};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

/// Any error that ends a run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Tracker lookup failed: {0}")]
    Tracker(#[from] TrackerError),

    #[error("Cannot build calendar row: {0}")]
    Transform(#[from] TransformError),

    #[error("Cannot write calendar: {0}")]
    Render(#[from] RenderError),

    #[error("Cannot send calendar: {0}")]
    Mail(#[from] MailError),
}

/// Everything a run needs besides its collaborators
#[derive(Clone, Debug)]
pub struct ReportPlan {
    pub window: ReleaseWindow,
    pub exclusions: ProjectExclusions,
    pub query: IssueQuery,
    pub rules: DeployRules,
    pub labels: Labels,
    pub output_dir: PathBuf,
    pub recipients: Vec<String>,
    /// Log each row at info level
    pub log_rows: bool,
}

impl ReportPlan {
    pub fn new(window: ReleaseWindow) -> Self {
        Self {
            window,
            exclusions: ProjectExclusions::default(),
            query: IssueQuery::default(),
            rules: DeployRules::default(),
            labels: Labels::default(),
            output_dir: PathBuf::from("cache"),
            recipients: Vec::new(),
            log_rows: false,
        }
    }

    pub fn naming(&self) -> ReportNaming {
        ReportNaming::from_labels(&self.labels)
    }

    pub fn output_path(&self) -> PathBuf {
        self.naming().path(&self.output_dir, &self.window)
    }
}

/// Outcome of a finished run
#[derive(Clone, Debug)]
pub struct Report {
    pub window: ReleaseWindow,
    pub path: PathBuf,
    pub rows: Vec<CalendarRow>,
    pub outcome: SendOutcome,
}

/// Calendar rows for every issue released inside the plan's window
pub fn collect_rows<T: IssueTracker + ?Sized>(
    tracker: &T,
    plan: &ReportPlan,
) -> Result<Vec<CalendarRow>, PipelineError> {
    let versions = filter_released_versions(tracker, &plan.window, &plan.exclusions)?;
    let issues = fetch_issues(tracker, &versions, &plan.query)?;

    issues
        .into_iter()
        .map(|raw| -> Result<CalendarRow, PipelineError> {
            let row = Issue::new(raw, &plan.rules, &plan.labels).to_row()?;
            if plan.log_rows {
                info!(
                    id = %row.id,
                    service = %row.service_name,
                    start = %row.deploy_start,
                    end = %row.deploy_end,
                    manager = %row.deploy_manager,
                    risk = %row.deploy_risk,
                    "Row"
                );
            }
            Ok(row)
        })
        .collect()
}

/// Build, save and send the calendar
pub fn run<T, M>(
    tracker: &T,
    notifier: &Notifier<M>,
    plan: &ReportPlan,
) -> Result<Report, PipelineError>
where
    T: IssueTracker + ?Sized,
    M: Mailer,
{
    info!(window = %plan.window.label(), "Building deployment calendar");
    let rows = collect_rows(tracker, plan)?;

    let table = build(calendar_header(&plan.labels), rows)?;
    let path = plan.output_path();
    table.save(&path)?;

    let naming = plan.naming();
    let outcome = notifier.send(
        &path,
        &naming.subject(&plan.window),
        &naming.mail_body,
        &plan.recipients,
    )?;

    Ok(Report {
        window: plan.window,
        path,
        rows: table.rows().to_vec(),
        outcome,
    })
}
