//! Report file name and mail subject

use deploycal_core::{Labels, ReleaseWindow};
use std::path::{Path, PathBuf};

/// Names derived from the report title and the reporting window
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportNaming {
    pub title: String,
    pub mail_body: String,
}

impl ReportNaming {
    pub fn new(title: impl Into<String>, mail_body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            mail_body: mail_body.into(),
        }
    }

    pub fn from_labels(labels: &Labels) -> Self {
        Self::new(labels.report_title, labels.mail_body)
    }

    /// `Deployment_calendar_04.03-10.03.xlsx`
    pub fn file_name(&self, window: &ReleaseWindow) -> String {
        let stem: String = self
            .title
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect();
        format!("{stem}_{}.xlsx", window.label())
    }

    pub fn path(&self, dir: impl AsRef<Path>, window: &ReleaseWindow) -> PathBuf {
        dir.as_ref().join(self.file_name(window))
    }

    /// `Deployment calendar 04.03-10.03`
    pub fn subject(&self, window: &ReleaseWindow) -> String {
        format!("{} {}", self.title, window.label())
    }
}
