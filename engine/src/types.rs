//! Domain types exchanged between the dispatch server and its callers

/// One check to perform. Immutable once submitted; string fields use the
/// empty string for "not set", mirroring the wire encoding.
#[derive(Debug, Clone, Default)]
pub struct CheckRequest {
    pub protocol: String,
    pub host: String,
    pub path: String,
    pub username: String,
    pub password: String,
    pub expected_status_codes: Vec<u32>,
    pub expected_body: String,
    pub expected_body_regex: String,
    pub cert_expire_days: u32,
    pub debug: bool,
    pub insecure: bool,
}

impl CheckRequest {
    /// Target URL the probe will request
    pub fn url(&self) -> String {
        format!("{}://{}{}", self.protocol, self.host, self.path)
    }
}

/// Verdict for one check. Produced exactly once per request.
#[derive(Debug, Clone)]
pub struct CheckResponse {
    pub success: bool,
    pub message: String,
    /// Empty unless the request had the debug flag set
    pub debug_message: String,
}
