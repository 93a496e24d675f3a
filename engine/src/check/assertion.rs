//! Response assertions
//!
//! Each assertion is a tagged variant; evaluation is a fixed-order,
//! fail-fast iteration dispatched via `match`. The body is fetched lazily,
//! so assertions before a body predicate failing means the body is never
//! read.

use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use regex::Regex;

use super::client::ProbeResponse;
use super::CheckError;

/// A named predicate over an HTTP response
#[derive(Debug, Clone)]
pub enum Assertion {
    /// Passes iff the status code is a member of the set
    StatusCodeIn(Vec<u32>),
    /// Passes iff the header is present with exactly this value
    HeaderEquals { name: String, value: String },
    /// Passes iff the body contains the literal substring
    BodyContains(String),
    /// Passes iff the body matches the pattern; an invalid pattern is a
    /// distinct failure
    BodyMatches(String),
    /// Passes iff the leaf certificate expires strictly after now + lead
    CertificateExpiry(Duration),
}

impl Assertion {
    async fn evaluate(&self, response: &mut ProbeResponse) -> Result<(), CheckError> {
        match self {
            Assertion::StatusCodeIn(codes) => {
                let observed = u32::from(response.status.as_u16());
                if codes.contains(&observed) {
                    Ok(())
                } else {
                    Err(CheckError::UnexpectedStatusCode {
                        status: response.status_line(),
                        expected: codes.clone(),
                    })
                }
            }
            Assertion::HeaderEquals { name, value } => {
                let found = response
                    .headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .is_some_and(|v| v == value);
                if found {
                    Ok(())
                } else {
                    Err(CheckError::HeaderMismatch {
                        name: name.clone(),
                        value: value.clone(),
                    })
                }
            }
            Assertion::BodyContains(needle) => {
                let body = response.body_text().await?;
                if body.contains(needle) {
                    Ok(())
                } else {
                    Err(CheckError::BodyMismatch(needle.clone()))
                }
            }
            Assertion::BodyMatches(pattern) => {
                // Compile before touching the body so a bad pattern fails on
                // its own class, not as a read side effect.
                let regex =
                    Regex::new(pattern).map_err(|e| CheckError::InvalidRegex(e.to_string()))?;
                let body = response.body_text().await?;
                if regex.is_match(body) {
                    Ok(())
                } else {
                    Err(CheckError::RegexMismatch(pattern.clone()))
                }
            }
            Assertion::CertificateExpiry(min_lead) => match response.cert_not_after {
                None => Err(CheckError::NoCertificate),
                Some(not_after) => {
                    let min = SystemTime::now() + *min_lead;
                    if not_after > min {
                        Ok(())
                    } else {
                        Err(CheckError::CertificateExpires(DateTime::<Utc>::from(
                            not_after,
                        )))
                    }
                }
            },
        }
    }
}

/// Runs assertions in declared order, stopping at the first failure.
pub(crate) async fn evaluate_all(
    assertions: &[Assertion],
    response: &mut ProbeResponse,
) -> Result<(), CheckError> {
    for assertion in assertions {
        assertion.evaluate(response).await?;
    }

    Ok(())
}
