//! deploycal runner
//!
//! Configuration, pipeline and exit statuses behind the `deploycal` binary.
//!
//! ## Exit statuses
//!
//! | Status | Meaning |
//! |--------|---------|
//! | 0 | Calendar saved and sent, or skipped by `--dry-run` |
//! | 1 | Mail provider failed or rejected the send |
//! | 2 | Any other error (tracker, row data, spreadsheet) |
//! | 100 | Sending skipped by debug mode |
//! | 255 | Missing or invalid configuration |

pub mod config;
pub mod pipeline;

pub use config::{Cli, ConfigError, Settings};
pub use pipeline::{collect_rows, run, PipelineError, Report, ReportPlan};

use deploycal_core::MailError;
use deploycal_notify::{DeliveryMode, SendOutcome};

pub mod exit {
    pub const SUCCESS: u8 = 0;
    pub const SEND_FAILURE: u8 = 1;
    pub const FATAL: u8 = 2;
    pub const DEBUG_SKIP: u8 = 100;
    pub const CONFIG: u8 = 255;
}

/// Exit status of a successful run
pub fn exit_status_for_outcome(outcome: &SendOutcome) -> u8 {
    match outcome {
        SendOutcome::Skipped(DeliveryMode::Debug) => exit::DEBUG_SKIP,
        SendOutcome::Sent(_) | SendOutcome::Skipped(_) => exit::SUCCESS,
    }
}

/// Exit status of a failed run, found by walking the error chain
pub fn exit_status_for_error(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(pipeline) = cause.downcast_ref::<PipelineError>() {
            return match pipeline {
                PipelineError::Mail(_) => exit::SEND_FAILURE,
                _ => exit::FATAL,
            };
        }
        if cause.is::<ConfigError>() {
            return exit::CONFIG;
        }
        if cause.is::<MailError>() {
            return exit::SEND_FAILURE;
        }
    }
    exit::FATAL
}
