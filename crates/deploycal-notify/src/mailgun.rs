//! Blocking Mailgun client
//!
//! Posts a multipart message to `{api_base}/{domain}/messages` with basic
//! auth (`api`, key). The request carries a hard timeout, 10 seconds by
//! default.

use deploycal_core::{MailError, MailReceipt, Mailer, OutgoingMail};
use reqwest::blocking::multipart::Form;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// US region endpoint
pub const DEFAULT_API_BASE: &str = "https://api.mailgun.net/v3";

/// Upper bound of one send request
pub const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct MailgunConfig {
    pub api_base: String,
    pub domain: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl MailgunConfig {
    pub fn new(domain: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            domain: domain.into(),
            api_key: api_key.into(),
            timeout: SEND_TIMEOUT,
        }
    }

    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// `https://api.mailgun.net/v3/mg.example.com/messages`
    pub fn messages_url(&self) -> String {
        format!("{}/{}/messages", self.api_base.trim_end_matches('/'), self.domain)
    }
}

/// Mailgun response body, success or failure
#[derive(Debug, Default, Deserialize)]
struct MailgunResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    message: String,
}

pub struct MailgunClient {
    http: reqwest::blocking::Client,
    config: MailgunConfig,
}

impl MailgunClient {
    pub fn new(config: MailgunConfig) -> Result<Self, MailError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MailError::Transport(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    fn form(mail: &OutgoingMail) -> Result<Form, MailError> {
        let mut form = Form::new()
            .text("from", mail.from.clone())
            .text("to", mail.from.clone())
            .text("subject", mail.subject.clone())
            .text("text", mail.body.clone());

        for recipient in &mail.bcc {
            form = form.text("bcc", recipient.clone());
        }

        form.file("attachment", &mail.attachment)
            .map_err(|source| MailError::Attachment {
                path: mail.attachment.clone(),
                source,
            })
    }
}

impl Mailer for MailgunClient {
    fn send(&self, mail: &OutgoingMail) -> Result<MailReceipt, MailError> {
        let url = self.config.messages_url();
        debug!(url = %url, attachment = %mail.attachment.display(), "Posting message");

        let form = Self::form(mail)?;
        let resp = self
            .http
            .post(&url)
            .basic_auth("api", Some(&self.config.api_key))
            .multipart(form)
            .send()
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp.text().map_err(|e| MailError::Transport(e.to_string()))?;
        let body = parse_response(&text);

        if !status.is_success() {
            return Err(MailError::Rejected {
                status: status.as_u16(),
                message: body.message,
                id: body.id,
            });
        }

        Ok(MailReceipt {
            id: body.id,
            message: body.message,
        })
    }
}

/// Decode a Mailgun reply; non-JSON bodies become the message text
fn parse_response(text: &str) -> MailgunResponse {
    serde_json::from_str(text).unwrap_or_else(|_| MailgunResponse {
        id: String::new(),
        message: text.trim().to_string(),
    })
}
