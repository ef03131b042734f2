//! Notifier
//!
//! Sends the persisted calendar to the distribution list. The sender is also
//! the visible recipient; everybody on the list is blind-copied.

use deploycal_core::{MailError, MailReceipt, Mailer, OutgoingMail};
use std::path::Path;
use tracing::info;

/// Whether the notifier actually sends
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeliveryMode {
    #[default]
    Send,
    /// Build and save only
    DryRun,
    /// Build and save only, reported as a debug skip
    Debug,
}

/// Result of a send request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    Sent(MailReceipt),
    /// Nothing was sent because of the delivery mode
    Skipped(DeliveryMode),
}

/// Split a comma separated recipient list, dropping blanks
pub fn parse_recipients(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct Notifier<M> {
    mailer: M,
    sender: String,
    mode: DeliveryMode,
}

impl<M: Mailer> Notifier<M> {
    pub fn new(mailer: M, sender: impl Into<String>) -> Self {
        Self {
            mailer,
            sender: sender.into(),
            mode: DeliveryMode::Send,
        }
    }

    pub fn mode(mut self, mode: DeliveryMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mailer(&self) -> &M {
        &self.mailer
    }

    /// Mail `document` to `recipients`
    pub fn send(
        &self,
        document: &Path,
        subject: &str,
        body: &str,
        recipients: &[String],
    ) -> Result<SendOutcome, MailError> {
        if self.mode != DeliveryMode::Send {
            info!(mode = ?self.mode, path = %document.display(), "Email send prevented");
            return Ok(SendOutcome::Skipped(self.mode));
        }

        if recipients.is_empty() {
            return Err(MailError::InvalidMessage("no recipients".into()));
        }

        let mail = OutgoingMail {
            from: self.sender.clone(),
            subject: subject.to_string(),
            body: body.to_string(),
            bcc: recipients.to_vec(),
            attachment: document.to_path_buf(),
        };

        info!(path = %document.display(), "Sending calendar");
        let receipt = self.mailer.send(&mail)?;
        info!(id = %receipt.id, recipients = %recipients.join(","), "Calendar sent");

        Ok(SendOutcome::Sent(receipt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingMailer {
        sent: RefCell<Vec<OutgoingMail>>,
    }

    impl Mailer for RecordingMailer {
        fn send(&self, mail: &OutgoingMail) -> Result<MailReceipt, MailError> {
            self.sent.borrow_mut().push(mail.clone());
            Ok(MailReceipt {
                id: "<20240310.1@mg.example.com>".into(),
                message: "Queued. Thank you.".into(),
            })
        }
    }

    #[test]
    fn recipients_are_split_and_trimmed() {
        assert_eq!(
            parse_recipients("a@example.com, b@example.com,,"),
            vec!["a@example.com", "b@example.com"]
        );
        assert!(parse_recipients(" ").is_empty());
    }

    #[test]
    fn sends_with_bcc_and_attachment() {
        let notifier = Notifier::new(RecordingMailer::default(), "bot@example.com");
        let recipients = parse_recipients("a@example.com,b@example.com");

        let outcome = notifier
            .send(Path::new("cache/cal.xlsx"), "Subject", "Body", &recipients)
            .unwrap();

        assert!(matches!(outcome, SendOutcome::Sent(ref r) if r.message == "Queued. Thank you."));
        let sent = notifier.mailer().sent.borrow();
        assert_eq!(
            sent[0],
            OutgoingMail {
                from: "bot@example.com".into(),
                subject: "Subject".into(),
                body: "Body".into(),
                bcc: recipients.clone(),
                attachment: "cache/cal.xlsx".into(),
            }
        );
    }

    #[test]
    fn dry_run_and_debug_skip() {
        for mode in [DeliveryMode::DryRun, DeliveryMode::Debug] {
            let notifier = Notifier::new(RecordingMailer::default(), "bot@example.com").mode(mode);
            let outcome = notifier
                .send(Path::new("x.xlsx"), "S", "B", &["a@example.com".to_string()])
                .unwrap();

            assert_eq!(outcome, SendOutcome::Skipped(mode));
            assert!(notifier.mailer().sent.borrow().is_empty());
        }
    }

    #[test]
    fn empty_recipient_list_is_rejected() {
        let notifier = Notifier::new(RecordingMailer::default(), "bot@example.com");
        let err = notifier.send(Path::new("x.xlsx"), "S", "B", &[]).unwrap_err();
        assert!(matches!(err, MailError::InvalidMessage(_)));
    }
}
