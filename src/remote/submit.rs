use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, info};
use reqwest::{StatusCode, Version};

use super::{FulcrumClient, RemoteError, TOKEN_HEADER};
use crate::records::Record;

/// Outcome of a successful submission, for the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub status: StatusCode,
    pub version: Version,
    pub elapsed: Duration,
}

/// Sends one record and waits for the answer.
pub trait RecordSender: Send + Sync + 'static {
    fn send(&self, record: &Record) -> Result<Receipt, RemoteError>;
}

impl RecordSender for FulcrumClient {
    fn send(&self, record: &Record) -> Result<Receipt, RemoteError> {
        let token = self.credentials.token()?;
        let started = Instant::now();
        let response = self
            .http
            .post(&self.config.records_url)
            .header(TOKEN_HEADER, token)
            .timeout(self.config.submit_timeout)
            .json(record)
            .send()?;

        let elapsed = started.elapsed();
        let status = response.status();
        let version = response.version();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RemoteError::Status { status, body });
        }

        Ok(Receipt {
            status,
            version,
            elapsed,
        })
    }
}

/// Hands a record off for submission without waiting for it.
pub trait Submit {
    fn submit(&self, record: Record);
}

/// Counts submissions that have been launched but not finished.
#[derive(Debug, Clone, Default)]
pub struct SubmissionTracker {
    inner: Arc<(Mutex<usize>, Condvar)>,
}

/// Marks one submission as in flight until dropped.
struct InFlight {
    tracker: SubmissionTracker,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let (_, idle) = &*self.tracker.inner;
        *self.tracker.count() -= 1;
        idle.notify_all();
    }
}

impl SubmissionTracker {
    fn count(&self) -> MutexGuard<'_, usize> {
        self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) -> InFlight {
        *self.count() += 1;
        InFlight {
            tracker: self.clone(),
        }
    }

    pub fn in_flight(&self) -> usize {
        *self.count()
    }

    /// Wait until no submission is in flight, for at most `timeout`.
    /// Returns `true` if everything finished.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let (_, idle) = &*self.inner;
        let (count, _) = idle
            .wait_timeout_while(self.count(), timeout, |count| *count > 0)
            .unwrap_or_else(PoisonError::into_inner);
        *count == 0
    }
}

/// Runs every submission on its own short-lived thread.
///
/// There is no pool and no cap: each record gets exactly one attempt, and a
/// slow or failing one never holds up the next.
pub struct DetachedSubmitter<S> {
    sender: Arc<S>,
    tracker: SubmissionTracker,
}

impl<S: RecordSender> DetachedSubmitter<S> {
    pub fn new(sender: Arc<S>, tracker: SubmissionTracker) -> Self {
        Self { sender, tracker }
    }

    pub fn tracker(&self) -> &SubmissionTracker {
        &self.tracker
    }
}

impl<S: RecordSender> Submit for DetachedSubmitter<S> {
    fn submit(&self, record: Record) {
        let sender = Arc::clone(&self.sender);
        let in_flight = self.tracker.begin();

        let spawned = thread::Builder::new()
            .name("submit".into())
            .spawn(move || {
                let _in_flight = in_flight;
                let label = record.status.label();
                match sender.send(&record) {
                    Ok(receipt) => info!(
                        "Submitted {} record: {} {:?} in {}ms",
                        label,
                        receipt.status,
                        receipt.version,
                        receipt.elapsed.as_millis()
                    ),
                    Err(RemoteError::Status { status, body }) => {
                        error!("Submitting {} record failed: service answered {}", label, status);
                        debug!("Rejected submission body: {}", body);
                    }
                    Err(e) => error!("Submitting {} record failed: {}", label, e),
                }
            });

        if let Err(e) = spawned {
            error!("Failed to start submission: {}", e);
        }
    }
}
