//! Dispatch server
//!
//! Owns the worker pool and the shared task queue. Callers submit one
//! request and block until a worker replies; the one-shot reply channel
//! guarantees exactly one response per task.

mod worker;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{error, info};

use crate::check::ProbeClient;
use crate::types::{CheckRequest, CheckResponse};
use worker::Worker;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Could not build TLS connector: {0}")]
    Tls(#[from] native_tls::Error),
}

/// A queued unit of work: one request paired with its single-use reply slot
pub(crate) struct Task {
    pub(crate) request: CheckRequest,
    pub(crate) reply: oneshot::Sender<CheckResponse>,
}

/// Runs HTTP checks on a fixed pool of workers, sized once at startup.
pub struct DispatchServer {
    queue: mpsc::Sender<Task>,
}

impl DispatchServer {
    /// Spawns `worker_count` workers, each sharing one TLS-verifying and one
    /// TLS-skipping probe client configured with the given timeouts.
    pub fn start(
        worker_count: u32,
        timeout: Duration,
        tls_handshake_timeout: Duration,
    ) -> Result<Self, EngineError> {
        let secure = Arc::new(ProbeClient::new(timeout, tls_handshake_timeout, false)?);
        let insecure = Arc::new(ProbeClient::new(timeout, tls_handshake_timeout, true)?);

        // capacity 1: a submit only completes its enqueue once a worker is
        // about to pick the task up, which is the sole backpressure here
        let (queue_tx, queue_rx) = mpsc::channel(1);
        let queue_rx = Arc::new(Mutex::new(queue_rx));

        for id in 1..=worker_count {
            Worker::new(
                id,
                Arc::clone(&secure),
                Arc::clone(&insecure),
                Arc::clone(&queue_rx),
            )
            .spawn();
        }
        info!("started {} check workers", worker_count);

        Ok(Self { queue: queue_tx })
    }

    /// Submits one check and waits for its result. Blocks while all workers
    /// are busy.
    pub async fn submit(&self, request: CheckRequest) -> CheckResponse {
        let (reply_tx, reply_rx) = oneshot::channel();
        let task = Task {
            request,
            reply: reply_tx,
        };

        if self.queue.send(task).await.is_err() {
            error!("check workers are gone, rejecting request");
            return failure("check workers are not running");
        }

        match reply_rx.await {
            Ok(response) => response,
            // only reachable if a worker died mid-check
            Err(_) => failure("check worker dropped the task"),
        }
    }
}

fn failure(message: &str) -> CheckResponse {
    CheckResponse {
        success: false,
        message: message.to_string(),
        debug_message: String::new(),
    }
}
