//! Periodic batch-job trigger.
//!
//! The ticker is a handle owned by whoever starts it. It runs the job once
//! right away, then once per interval, until `stop()` or drop. Nothing about
//! it lives in the servers.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::backend::MessageResponse;

/// Interval used by the batch-job page.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Snapshot of a ticker.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BatchJobStatus {
    pub running: bool,
    pub started_at: DateTime<Utc>,
    pub executions: u64,
    pub failures: u64,
}

#[derive(Default)]
struct Counters {
    running: AtomicBool,
    executions: AtomicU64,
    failures: AtomicU64,
}

/// Handle for a running batch-job ticker.
///
/// Supports shutdown via `stop()` or automatic cleanup on `Drop`.
pub struct BatchJobTicker {
    started_at: DateTime<Utc>,
    counters: Arc<Counters>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl BatchJobTicker {
    /// Spawn the ticker on the current tokio runtime.
    ///
    /// A failed run is logged and counted; the ticker keeps going.
    pub fn start<F, Fut, E>(interval: Duration, mut job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: std::fmt::Display + Send + 'static,
    {
        let counters = Arc::new(Counters::default());
        counters.running.store(true, Ordering::SeqCst);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task_counters = counters.clone();
        let task = tokio::spawn(async move {
            tracing::info!(interval_ms = interval.as_millis() as u64, "Batch job ticker started");
            let mut ticks = tokio::time::interval(interval);
            ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticks.tick() => {}
                }

                // A stop that lands mid-run lets the run finish.
                match job().await {
                    Ok(()) => {
                        let n = task_counters.executions.fetch_add(1, Ordering::SeqCst) + 1;
                        tracing::debug!(executions = n, "Batch job run completed");
                    }
                    Err(e) => {
                        task_counters.failures.fetch_add(1, Ordering::SeqCst);
                        tracing::warn!(error = %e, "Batch job run failed");
                    }
                }
            }

            task_counters.running.store(false, Ordering::SeqCst);
            tracing::info!(
                executions = task_counters.executions.load(Ordering::SeqCst),
                failures = task_counters.failures.load(Ordering::SeqCst),
                "Batch job ticker stopped"
            );
        });

        Self {
            started_at: Utc::now(),
            counters,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }

    pub fn status(&self) -> BatchJobStatus {
        BatchJobStatus {
            running: self.counters.running.load(Ordering::SeqCst),
            started_at: self.started_at,
            executions: self.counters.executions.load(Ordering::SeqCst),
            failures: self.counters.failures.load(Ordering::SeqCst),
        }
    }

    /// Request shutdown. Safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Stop and wait for the task to exit; returns the final status.
    pub async fn join(mut self) -> BatchJobStatus {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Batch job ticker task failed: {e}");
            }
        }
        self.counters.running.store(false, Ordering::SeqCst);
        self.status()
    }
}

impl Drop for BatchJobTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

// ═══════════════════════════════════════════════════════════
// HTTP trigger
// ═══════════════════════════════════════════════════════════

/// Calls the front-end's `/api/batchjob` endpoint.
#[derive(Debug, Clone)]
pub struct BatchJobClient {
    url: String,
    client: reqwest::Client,
}

impl BatchJobClient {
    /// `frontend_url` is the front-end root, e.g. `http://127.0.0.1:3000`.
    pub fn new(frontend_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: format!("{}/api/batchjob", frontend_url.trim_end_matches('/')),
            client,
        })
    }

    /// `POST /api/batchjob`
    pub async fn start(&self) -> Result<MessageResponse, reqwest::Error> {
        self.client
            .post(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    /// `DELETE /api/batchjob`
    pub async fn stop(&self) -> Result<MessageResponse, reqwest::Error> {
        self.client
            .delete(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    /// Start a ticker that hits `POST /api/batchjob` every `interval`.
    pub fn spawn_ticker(&self, interval: Duration) -> BatchJobTicker {
        let client = self.clone();
        BatchJobTicker::start(interval, move || {
            let client = client.clone();
            async move { client.start().await.map(|_| ()) }
        })
    }
}
