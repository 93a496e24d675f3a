//! Check worker
//!
//! A worker is a long-lived task owning a secure and an insecure probe
//! client. It alternates between blocking on the shared queue and running
//! one check to completion; it never holds more than one task.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::info;

use super::Task;
use crate::check::{Check, CheckConfig, ProbeClient};
use crate::types::{CheckRequest, CheckResponse};

pub(crate) struct Worker {
    id: u32,
    secure: Arc<ProbeClient>,
    insecure: Arc<ProbeClient>,
    queue: Arc<Mutex<mpsc::Receiver<Task>>>,
}

impl Worker {
    pub(crate) fn new(
        id: u32,
        secure: Arc<ProbeClient>,
        insecure: Arc<ProbeClient>,
        queue: Arc<Mutex<mpsc::Receiver<Task>>>,
    ) -> Self {
        Self {
            id,
            secure,
            insecure,
            queue,
        }
    }

    pub(crate) fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        loop {
            // the mutex is only contended while idle; it is released before
            // the check executes
            let task = self.queue.lock().await.recv().await;
            let Some(task) = task else {
                break; // dispatch server dropped, nothing more to do
            };

            let response = self.process(task.request).await;
            let _ = task.reply.send(response);
        }
    }

    async fn process(&self, request: CheckRequest) -> CheckResponse {
        info!("#{}: processing check for {}", self.id, request.host);

        let mut check = self.check_for(&request);
        let start = Instant::now();
        let result = check.run().await;

        match result {
            Err(err) => CheckResponse {
                success: false,
                message: err.to_string(),
                debug_message: check.transcript().to_string(),
            },
            Ok(()) => CheckResponse {
                success: true,
                message: format!("Request took {:?}", start.elapsed()),
                debug_message: check.transcript().to_string(),
            },
        }
    }

    fn check_for(&self, request: &CheckRequest) -> Check {
        let mut config = CheckConfig::builder(request.url());
        if !request.username.is_empty() {
            config = config.basic_auth(&request.username, &request.password);
        }
        if request.debug {
            config = config.debug(true);
        }

        let client = if request.insecure {
            &self.insecure
        } else {
            &self.secure
        };
        let mut check = Check::new(Arc::clone(client), config.build());

        if !request.expected_status_codes.is_empty() {
            check.assert_status_code_in(request.expected_status_codes.clone());
        }
        if !request.expected_body.is_empty() {
            check.assert_body_contains(&request.expected_body);
        }
        if !request.expected_body_regex.is_empty() {
            check.assert_body_matches(&request.expected_body_regex);
        }
        if request.cert_expire_days > 0 {
            let lead = Duration::from_secs(u64::from(request.cert_expire_days) * 24 * 60 * 60);
            check.assert_certificate_expires_after(lead);
        }

        check
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Assertion;

    fn worker() -> Worker {
        let timeout = Duration::from_secs(1);
        let secure = Arc::new(ProbeClient::new(timeout, timeout, false).unwrap());
        let insecure = Arc::new(ProbeClient::new(timeout, timeout, true).unwrap());
        let (_tx, rx) = mpsc::channel(1);
        Worker::new(1, secure, insecure, Arc::new(Mutex::new(rx)))
    }

    fn full_request() -> CheckRequest {
        CheckRequest {
            protocol: "https".to_string(),
            host: "example.com".to_string(),
            path: "/health".to_string(),
            username: "user".to_string(),
            password: "secret".to_string(),
            expected_status_codes: vec![200, 301],
            expected_body: "ok".to_string(),
            expected_body_regex: r"\bok\b".to_string(),
            cert_expire_days: 14,
            debug: true,
            insecure: false,
        }
    }

    #[test]
    fn assertions_are_declared_in_request_order() {
        let w = worker();
        let check = w.check_for(&full_request());

        assert_eq!(check.assertions.len(), 4);
        assert!(matches!(&check.assertions[0], Assertion::StatusCodeIn(_)));
        assert!(matches!(&check.assertions[1], Assertion::BodyContains(_)));
        assert!(matches!(&check.assertions[2], Assertion::BodyMatches(_)));
        assert!(matches!(
            &check.assertions[3],
            Assertion::CertificateExpiry(d) if *d == Duration::from_secs(14 * 24 * 60 * 60)
        ));
    }

    #[test]
    fn empty_fields_add_no_assertions() {
        let w = worker();
        let request = CheckRequest {
            protocol: "http".to_string(),
            host: "example.com".to_string(),
            ..Default::default()
        };

        let check = w.check_for(&request);
        assert!(check.assertions.is_empty());
    }

    #[test]
    fn insecure_flag_selects_the_insecure_client() {
        let w = worker();

        let mut request = full_request();
        request.insecure = true;
        let check = w.check_for(&request);
        assert!(Arc::ptr_eq(&check.client, &w.insecure));

        request.insecure = false;
        let check = w.check_for(&request);
        assert!(Arc::ptr_eq(&check.client, &w.secure));
    }
}
