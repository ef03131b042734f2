//! Deployment rule tables and report wording
//!
//! `DeployRules` holds the per-service maintenance windows and the priority to
//! risk mapping. `Labels` holds every piece of fixed text that ends up in the
//! spreadsheet or the mail, so a report can be produced in more than one
//! language without touching the transformation.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Time windows
// ============================================================================

/// Wall-clock time without seconds
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl TimeOfDay {
    pub const fn new(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Start and end of a maintenance window
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeWindow {
    pub const fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    /// Window on whole hours
    pub const fn hours(start: u8, end: u8) -> Self {
        Self::new(TimeOfDay::new(start, 0), TimeOfDay::new(end, 0))
    }
}

/// Computed deployment start and end, formatted `YYYY-MM-DD HH:MM`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploySchedule {
    pub start: String,
    pub end: String,
}

// ============================================================================
// Risk
// ============================================================================

/// Deployment risk derived from issue priority
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

// ============================================================================
// Deploy rules
// ============================================================================

/// Lookup tables used by the issue transformer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployRules {
    service_windows: BTreeMap<String, TimeWindow>,
    default_window: TimeWindow,
    /// Service whose window crosses midnight
    long_running_service: Option<String>,
    risk_by_priority: BTreeMap<String, RiskLevel>,
}

impl Default for DeployRules {
    fn default() -> Self {
        let service_windows = [
            ("ERP", TimeWindow::hours(23, 3)),
            ("WMS", TimeWindow::hours(16, 17)),
            ("MDLP", TimeWindow::hours(12, 13)),
            ("WEB", TimeWindow::hours(13, 15)),
            ("IOS", TimeWindow::hours(10, 11)),
            ("ANDR", TimeWindow::hours(10, 11)),
        ]
        .into_iter()
        .map(|(service, window)| (service.to_string(), window))
        .collect();

        let risk_by_priority = [
            ("Critical", RiskLevel::High),
            ("High", RiskLevel::High),
            ("Medium", RiskLevel::Medium),
            ("Low", RiskLevel::Low),
        ]
        .into_iter()
        .map(|(priority, risk)| (priority.to_string(), risk))
        .collect();

        Self {
            service_windows,
            default_window: TimeWindow::hours(12, 14),
            long_running_service: Some("ERP".into()),
            risk_by_priority,
        }
    }
}

impl DeployRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or replace the window of one service
    pub fn service_window(mut self, service: impl Into<String>, window: TimeWindow) -> Self {
        self.service_windows.insert(service.into(), window);
        self
    }

    /// Window for services missing from the table
    pub fn default_window(mut self, window: TimeWindow) -> Self {
        self.default_window = window;
        self
    }

    /// Service whose deployment ends on the following day
    pub fn long_running_service(mut self, service: Option<String>) -> Self {
        self.long_running_service = service;
        self
    }

    /// Map a priority name to a risk level
    pub fn priority_risk(mut self, priority: impl Into<String>, risk: RiskLevel) -> Self {
        self.risk_by_priority.insert(priority.into(), risk);
        self
    }

    /// Window for `service`, falling back to the default window
    pub fn window_for(&self, service: &str) -> TimeWindow {
        self.service_windows
            .get(service)
            .copied()
            .unwrap_or(self.default_window)
    }

    pub fn is_long_running(&self, service: &str) -> bool {
        self.long_running_service.as_deref() == Some(service)
    }

    /// Risk for a priority name; `None` when the priority is not mapped
    pub fn risk_for(&self, priority: &str) -> Option<RiskLevel> {
        self.risk_by_priority.get(priority).copied()
    }

    /// Deployment start/end for a service released on `release_date`
    pub fn schedule(&self, service: &str, release_date: NaiveDate) -> DeploySchedule {
        let window = self.window_for(service);
        let end_date = if self.is_long_running(service) {
            release_date + Duration::days(1)
        } else {
            release_date
        };

        DeploySchedule {
            start: format!("{} {}", release_date.format("%Y-%m-%d"), window.start),
            end: format!("{} {}", end_date.format("%Y-%m-%d"), window.end),
        }
    }
}

// ============================================================================
// Labels
// ============================================================================

/// Report language
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    English,
    Russian,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Self::English),
            "ru" | "russian" => Ok(Self::Russian),
            other => Err(format!("unsupported locale '{other}' (expected en or ru)")),
        }
    }
}

/// Fixed wording of the report
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Labels {
    /// Column titles, A through K
    pub columns: [&'static str; 11],
    pub unavailability: &'static str,
    pub deploy_status: &'static str,
    pub deploy_result: &'static str,
    pub risk_high: &'static str,
    pub risk_medium: &'static str,
    pub risk_low: &'static str,
    /// Prefix of the file name and mail subject
    pub report_title: &'static str,
    pub mail_body: &'static str,
}

impl Default for Labels {
    fn default() -> Self {
        Self::english()
    }
}

impl Labels {
    pub fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::English => Self::english(),
            Locale::Russian => Self::russian(),
        }
    }

    pub fn english() -> Self {
        Self {
            columns: [
                "Code / ID",
                "Description",
                "Service",
                "Impact on key business processes",
                "Start date and time",
                "End date and time",
                "Deployment status",
                "Deployment manager",
                "Maintenance manager",
                "Deployment risks",
                "Deployment result",
            ],
            unavailability: "no disruption to key business processes is planned",
            deploy_status: "Completed",
            deploy_result: "successful",
            risk_high: "High",
            risk_medium: "Medium",
            risk_low: "Low",
            report_title: "Deployment calendar",
            mail_body: "Hello,\n\nThis week's deployment calendar is attached.",
        }
    }

    pub fn russian() -> Self {
        Self {
            columns: [
                "Код / ID",
                "Описание",
                "Сервис",
                "Влияние на ключевые бизнес-процессы",
                "Дата время начала",
                "Дата время окончания работ",
                "Статус внедрения",
                "Менеджер внедрения",
                "Менеджер сопровождения",
                "Риски внедрения",
                "Результат внедрения",
            ],
            unavailability: "Недоступность ключевых бизнес-сервисов не планируется",
            deploy_status: "Выполнено",
            deploy_result: "успешно",
            risk_high: "Высокий",
            risk_medium: "Средний",
            risk_low: "Низкий",
            report_title: "Календарь внедрений",
            mail_body: "Коллеги, добрый день!\n\nКалендарь внедрений за эту неделю во вложении.",
        }
    }

    pub fn risk(&self, risk: RiskLevel) -> &'static str {
        match risk {
            RiskLevel::High => self.risk_high,
            RiskLevel::Medium => self.risk_medium,
            RiskLevel::Low => self.risk_low,
        }
    }
}
