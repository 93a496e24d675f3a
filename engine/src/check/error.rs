//! Check failure taxonomy
//!
//! Every way a check can fail collapses into one message attached to the
//! failed response; callers only see success/failure plus this text.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Could not create request: {0}")]
    InvalidUrl(String),

    /// Transport-level timeout, carrying the timeout that was configured
    #[error("Timeout exceeded ({0:?})")]
    Timeout(Duration),

    /// Any other transport-level error, reported with its raw description
    #[error("{0}")]
    Transport(String),

    #[error("Could not read body: {0}")]
    BodyRead(String),

    #[error("Unexpected status code: {status} (expected: {expected:?})")]
    UnexpectedStatusCode { status: String, expected: Vec<u32> },

    #[error("Expected header '{name}' with value '{value}'")]
    HeaderMismatch { name: String, value: String },

    #[error("String '{0}' not found in body")]
    BodyMismatch(String),

    #[error("Invalid regex: {0}")]
    InvalidRegex(String),

    #[error("Regex '{0}' does not match body")]
    RegexMismatch(String),

    #[error("No certificate returned")]
    NoCertificate,

    #[error("Certificate expires on {0}")]
    CertificateExpires(DateTime<Utc>),
}
