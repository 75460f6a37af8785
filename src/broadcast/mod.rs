//! Live fan-out of job narration to attached subscribers
//!
//! Each subscriber owns a bounded queue. Publishing never waits on a
//! subscriber: a queue that is full or closed counts as a failed delivery and
//! the subscriber is detached, which closes its queue.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 256;

struct Subscriber {
    id: u64,
    tx: mpsc::Sender<String>,
}

/// Receiving side handed to a live connection
pub struct LogSubscription {
    pub job_id: String,
    pub id: u64,
    receiver: mpsc::Receiver<String>,
}

impl LogSubscription {
    /// Next line, or `None` once the subscriber has been detached
    pub async fn recv(&mut self) -> Option<String> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<String> {
        self.receiver.try_recv().ok()
    }
}

/// Job-keyed registry of live subscribers
pub struct LogBroadcast {
    subscribers: DashMap<String, Vec<Subscriber>>,
    next_id: AtomicU64,
    buffer: usize,
}

impl Default for LogBroadcast {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_BUFFER)
    }
}

impl LogBroadcast {
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    /// Register a subscriber for `job_id`. Only lines published afterwards are delivered.
    pub fn attach(&self, job_id: &str) -> LogSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, receiver) = mpsc::channel(self.buffer);
        self.subscribers
            .entry(job_id.to_string())
            .or_default()
            .push(Subscriber { id, tx });
        debug!(job_id = %job_id, subscriber = id, "Live subscriber attached");
        LogSubscription {
            job_id: job_id.to_string(),
            id,
            receiver,
        }
    }

    /// Remove a subscriber; returns whether it was still attached
    pub fn detach(&self, job_id: &str, id: u64) -> bool {
        let removed = match self.subscribers.get_mut(job_id) {
            Some(mut subs) => {
                let before = subs.len();
                subs.retain(|s| s.id != id);
                before != subs.len()
            }
            None => false,
        };
        self.subscribers.remove_if(job_id, |_, subs| subs.is_empty());
        if removed {
            debug!(job_id = %job_id, subscriber = id, "Live subscriber detached");
        }
        removed
    }

    /// Deliver `line` to every subscriber currently attached to `job_id`.
    ///
    /// Returns the number of successful deliveries.
    pub fn publish(&self, job_id: &str, line: &str) -> usize {
        let mut delivered = 0;
        let mut emptied = false;

        if let Some(mut subs) = self.subscribers.get_mut(job_id) {
            subs.retain(|s| match s.tx.try_send(line.to_string()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    warn!(job_id = %job_id, subscriber = s.id, "Live subscriber lagging, detaching");
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(job_id = %job_id, subscriber = s.id, "Live subscriber gone, detaching");
                    false
                }
            });
            emptied = subs.is_empty();
        }

        if emptied {
            self.subscribers.remove_if(job_id, |_, subs| subs.is_empty());
        }
        delivered
    }

    pub fn subscriber_count(&self, job_id: &str) -> usize {
        self.subscribers.get(job_id).map(|s| s.len()).unwrap_or(0)
    }

    /// Attached subscribers across all jobs
    pub fn total_subscribers(&self) -> usize {
        self.subscribers.iter().map(|e| e.value().len()).sum()
    }
}
