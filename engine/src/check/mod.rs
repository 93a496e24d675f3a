//! Assertion engine
//!
//! A `Check` executes one HTTP probe and validates the response against the
//! assertions declared on it, in order, stopping at the first failure.

mod assertion;
mod client;
mod error;

pub use assertion::Assertion;
pub use client::{ProbeClient, ProbeResponse};
pub use error::CheckError;

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use base64::prelude::{Engine as _, BASE64_STANDARD};
use http::header::{AUTHORIZATION, USER_AGENT};
use http::{HeaderMap, HeaderValue, Uri};

use assertion::evaluate_all;

const CLIENT_TAG: &str = concat!("http-check/", env!("CARGO_PKG_VERSION"));

/// Immutable configuration of one check, built via [`CheckConfig::builder`].
#[derive(Debug, Clone)]
pub struct CheckConfig {
    url: String,
    basic_auth: Option<(String, String)>,
    debug: bool,
}

impl CheckConfig {
    pub fn builder(url: impl Into<String>) -> CheckConfigBuilder {
        CheckConfigBuilder {
            url: url.into(),
            basic_auth: None,
            debug: false,
        }
    }
}

/// Builder for [`CheckConfig`]. The URL is not validated here; a malformed
/// URL surfaces when the check runs.
#[derive(Debug)]
pub struct CheckConfigBuilder {
    url: String,
    basic_auth: Option<(String, String)>,
    debug: bool,
}

impl CheckConfigBuilder {
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some((username.into(), password.into()));
        self
    }

    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    pub fn build(self) -> CheckConfig {
        CheckConfig {
            url: self.url,
            basic_auth: self.basic_auth,
            debug: self.debug,
        }
    }
}

/// One configured probe plus its ordered assertion chain
pub struct Check {
    pub(crate) client: Arc<ProbeClient>,
    config: CheckConfig,
    pub(crate) assertions: Vec<Assertion>,
    transcript: String,
}

impl Check {
    pub fn new(client: Arc<ProbeClient>, config: CheckConfig) -> Self {
        Self {
            client,
            config,
            assertions: Vec::new(),
            transcript: String::new(),
        }
    }

    /// Passes iff the response status code is in `codes`
    pub fn assert_status_code_in(&mut self, codes: Vec<u32>) {
        self.assertions.push(Assertion::StatusCodeIn(codes));
    }

    /// Passes iff the header is present with exactly `value`
    pub fn assert_header_equals(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.assertions.push(Assertion::HeaderEquals {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Passes iff the body contains `needle` as a literal substring
    pub fn assert_body_contains(&mut self, needle: impl Into<String>) {
        self.assertions.push(Assertion::BodyContains(needle.into()));
    }

    /// Passes iff the body matches `pattern`; the pattern is compiled at
    /// evaluation time
    pub fn assert_body_matches(&mut self, pattern: impl Into<String>) {
        self.assertions.push(Assertion::BodyMatches(pattern.into()));
    }

    /// Passes iff the leaf certificate expires strictly after now + `min_lead`
    pub fn assert_certificate_expires_after(&mut self, min_lead: Duration) {
        self.assertions.push(Assertion::CertificateExpiry(min_lead));
    }

    /// Executes the probe and evaluates the assertion chain fail-fast.
    pub async fn run(&mut self) -> Result<(), CheckError> {
        let url = self
            .config
            .url
            .parse::<Uri>()
            .map_err(|e| CheckError::InvalidUrl(e.to_string()))?;
        let headers = self.request_headers()?;

        let mut response = self.client.get(&url, &headers).await?;

        if self.config.debug {
            self.record_transcript(&response);
        }

        evaluate_all(&self.assertions, &mut response).await
    }

    /// Debug transcript collected during [`run`](Self::run); empty unless
    /// debug was enabled on the config.
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    // The Authorization header is always sent, with empty credentials when
    // none were configured.
    fn request_headers(&self) -> Result<HeaderMap, CheckError> {
        let (username, password) = self.config.basic_auth.clone().unwrap_or_default();
        let token = BASE64_STANDARD.encode(format!("{username}:{password}"));

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_TAG));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {token}"))
                .map_err(|e| CheckError::Transport(e.to_string()))?,
        );

        Ok(headers)
    }

    fn record_transcript(&mut self, response: &ProbeResponse) {
        let _ = writeln!(self.transcript, "Status: {}", response.status_line());
        for (name, value) in &response.headers {
            let _ = writeln!(
                self.transcript,
                "{}: {}",
                name,
                value.to_str().unwrap_or("<binary>")
            );
        }
        let _ = writeln!(self.transcript);
    }
}
