//! deploycal CLI - Weekly deployment calendar
//!
//! Collects the versions released during the last seven days, turns their
//! issues into a styled spreadsheet and mails it to the distribution list.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use deploycal_cli::config::{load_dotenv, UnconfiguredMailer};
use deploycal_cli::{exit_status_for_error, exit_status_for_outcome, Cli, ReportPlan, Settings};
use deploycal_core::{DeployRules, Labels, Mailer, ReleaseWindow};
use deploycal_notify::{DeliveryMode, MailgunClient, Notifier};
use deploycal_tracker::JiraClient;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    // .env has to be loaded before clap reads env-backed flags
    let dotenv = load_dotenv();
    let cli = Cli::parse();

    // Initialize tracing
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let result = dotenv
        .context("Loading environment")
        .and_then(|()| run(cli));

    match result {
        Ok(status) => ExitCode::from(status),
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(exit_status_for_error(&err))
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    let settings = Settings::from_cli(cli).context("Reading configuration")?;

    let today = settings.today.unwrap_or_else(|| Local::now().date_naive());
    let plan = ReportPlan {
        exclusions: settings.exclusions.clone(),
        query: settings.query.clone(),
        rules: DeployRules::default(),
        labels: Labels::for_locale(settings.locale),
        output_dir: settings.output_dir.clone(),
        recipients: settings
            .mail
            .as_ref()
            .map(|mail| mail.recipients.clone())
            .unwrap_or_default(),
        log_rows: settings.delivery == DeliveryMode::Debug,
        ..ReportPlan::new(ReleaseWindow::trailing_week(today))
    };

    let tracker = JiraClient::new(settings.jira.clone()).context("Connecting to Jira")?;

    match &settings.mail {
        Some(mail) => {
            let mailer =
                MailgunClient::new(mail.mailgun.clone()).context("Preparing Mailgun client")?;
            let notifier = Notifier::new(mailer, mail.sender.clone()).mode(settings.delivery);
            report(&tracker, &notifier, &plan)
        }
        None => {
            let notifier = Notifier::new(UnconfiguredMailer, String::new()).mode(settings.delivery);
            report(&tracker, &notifier, &plan)
        }
    }
}

fn report<M: Mailer>(tracker: &JiraClient, notifier: &Notifier<M>, plan: &ReportPlan) -> Result<u8> {
    let report =
        deploycal_cli::run(tracker, notifier, plan).context("Deployment calendar run failed")?;

    info!(
        window = %report.window.label(),
        path = %report.path.display(),
        rows = report.rows.len(),
        outcome = ?report.outcome,
        "Done"
    );

    Ok(exit_status_for_outcome(&report.outcome))
}
