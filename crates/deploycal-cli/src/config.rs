//! Command-line flags and environment configuration
//!
//! Every setting can be given as a flag or through the environment (a `.env`
//! file in the working directory is loaded first). Values required for the
//! tracker are always mandatory; mail settings are only required when the run
//! actually sends.

use chrono::NaiveDate;
use clap::Parser;
use deploycal_core::{Locale, MailError, MailReceipt, Mailer, OutgoingMail, ProjectExclusions};
use deploycal_notify::mailgun::DEFAULT_API_BASE;
use deploycal_notify::{parse_recipients, DeliveryMode, MailgunConfig};
use deploycal_tracker::issues::{DEFAULT_EXCLUDED_LABEL, DEFAULT_MAX_RESULTS};
use deploycal_tracker::jira::DEFAULT_MANAGER_FIELD;
use deploycal_tracker::{IssueQuery, JiraConfig};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "deploycal")]
#[command(author, version, about = "Weekly deployment calendar from Jira releases", long_about = None)]
pub struct Cli {
    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Build and save the calendar without sending it
    #[arg(long)]
    pub dry_run: bool,

    /// Log every row and skip sending (exit status 100)
    #[arg(long, env = "DEPLOYCAL_DEBUG")]
    pub debug: bool,

    /// Comma separated project keys to leave out
    #[arg(long, env = "SKIP_PROJECTS", default_value = "")]
    pub skip_projects: String,

    /// Report on the week ending at this date instead of today
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub today: Option<NaiveDate>,

    /// Directory the spreadsheet is written to
    #[arg(long, env = "DEPLOYCAL_OUTPUT_DIR", default_value = "cache")]
    pub output_dir: PathBuf,

    /// Report language (en, ru)
    #[arg(long, env = "DEPLOYCAL_LOCALE", default_value = "en")]
    pub locale: Locale,

    /// Jira base URL
    #[arg(long, env = "JIRA_URL")]
    pub jira_url: Option<String>,

    #[arg(long, env = "JIRA_LOGIN")]
    pub jira_login: Option<String>,

    #[arg(long, env = "JIRA_PASSWORD", hide_env_values = true)]
    pub jira_password: Option<String>,

    /// Custom field holding the deployment manager
    #[arg(long, env = "JIRA_MANAGER_FIELD", default_value = DEFAULT_MANAGER_FIELD)]
    pub manager_field: String,

    /// Issues with this label are left out
    #[arg(long, env = "JIRA_EXCLUDED_LABEL", default_value = DEFAULT_EXCLUDED_LABEL)]
    pub excluded_label: String,

    /// Result cap of the issue search
    #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
    pub max_results: u32,

    #[arg(long, env = "MAILGUN_DOMAIN")]
    pub mailgun_domain: Option<String>,

    #[arg(long, env = "MAILGUN_KEY", hide_env_values = true)]
    pub mailgun_key: Option<String>,

    #[arg(long, env = "MAILGUN_API_BASE", default_value = DEFAULT_API_BASE)]
    pub mailgun_api_base: String,

    /// Sender address, also the visible recipient
    #[arg(long, env = "EMAIL_SENDER")]
    pub sender: Option<String>,

    /// Comma separated list of blind-copied recipients
    #[arg(long, env = "RECIPIENTS")]
    pub recipients: Option<String>,
}

/// Configuration error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration value {0}")]
    Missing(&'static str),

    #[error("Invalid configuration value {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("Cannot load .env file: {0}")]
    DotEnv(String),
}

/// Mail delivery settings
#[derive(Clone, Debug)]
pub struct MailSettings {
    pub mailgun: MailgunConfig,
    pub sender: String,
    pub recipients: Vec<String>,
}

/// Validated run configuration
#[derive(Clone, Debug)]
pub struct Settings {
    pub jira: JiraConfig,
    /// `None` only when the run does not send
    pub mail: Option<MailSettings>,
    pub delivery: DeliveryMode,
    pub exclusions: ProjectExclusions,
    pub query: IssueQuery,
    pub output_dir: PathBuf,
    pub locale: Locale,
    pub today: Option<NaiveDate>,
}

/// Load `.env` if present; a missing file is not an error
pub fn load_dotenv() -> Result<(), ConfigError> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(ConfigError::DotEnv(err.to_string())),
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

impl Settings {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let delivery = if cli.debug {
            DeliveryMode::Debug
        } else if cli.dry_run {
            DeliveryMode::DryRun
        } else {
            DeliveryMode::Send
        };

        let jira = JiraConfig::new(
            required(cli.jira_url, "JIRA_URL")?,
            required(cli.jira_login, "JIRA_LOGIN")?,
            required(cli.jira_password, "JIRA_PASSWORD")?,
        )
        .manager_field(cli.manager_field);

        let mail = match Self::mail_settings(
            cli.mailgun_domain,
            cli.mailgun_key,
            cli.mailgun_api_base,
            cli.sender,
            cli.recipients,
        ) {
            Ok(mail) => Some(mail),
            Err(err) if delivery == DeliveryMode::Send => return Err(err),
            Err(_) => None,
        };

        if cli.max_results == 0 {
            return Err(ConfigError::Invalid {
                name: "max-results",
                reason: "must be greater than zero".into(),
            });
        }

        Ok(Self {
            jira,
            mail,
            delivery,
            exclusions: ProjectExclusions::parse(&cli.skip_projects),
            query: IssueQuery::default()
                .excluded_label(cli.excluded_label)
                .max_results(cli.max_results),
            output_dir: cli.output_dir,
            locale: cli.locale,
            today: cli.today,
        })
    }

    fn mail_settings(
        domain: Option<String>,
        key: Option<String>,
        api_base: String,
        sender: Option<String>,
        recipients: Option<String>,
    ) -> Result<MailSettings, ConfigError> {
        let mailgun = MailgunConfig::new(
            required(domain, "MAILGUN_DOMAIN")?,
            required(key, "MAILGUN_KEY")?,
        )
        .api_base(api_base);
        let sender = required(sender, "EMAIL_SENDER")?;
        let recipients = parse_recipients(&required(recipients, "RECIPIENTS")?);
        if recipients.is_empty() {
            return Err(ConfigError::Missing("RECIPIENTS"));
        }

        Ok(MailSettings {
            mailgun,
            sender,
            recipients,
        })
    }
}

/// Stand-in mailer for runs without mail settings; never reached because
/// such runs skip delivery
pub struct UnconfiguredMailer;

impl Mailer for UnconfiguredMailer {
    fn send(&self, _mail: &OutgoingMail) -> Result<MailReceipt, MailError> {
        Err(MailError::InvalidMessage("mail delivery is not configured".into()))
    }
}
