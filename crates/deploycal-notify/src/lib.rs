//! # deploycal-notify
//!
//! Delivery of the saved calendar by mail.
//!
//! This crate provides:
//! - [`Notifier`]: composes the message, blind-copies every recipient and
//!   attaches the document, or skips sending in dry-run/debug mode
//! - [`MailgunClient`]: blocking Mailgun implementation of [`Mailer`]
//!
//! [`Mailer`]: deploycal_core::Mailer

pub mod mailgun;
pub mod notifier;

pub use mailgun::{MailgunClient, MailgunConfig};
pub use notifier::{parse_recipients, DeliveryMode, Notifier, SendOutcome};
