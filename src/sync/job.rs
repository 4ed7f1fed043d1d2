//! Sync trigger shared by the CLI and the in-process scheduler.

use super::reconciler::{reconcile, SyncReport};
use crate::error::SyncError;
use crate::repository::CountryStore;
use crate::source::CountrySource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct SyncJob {
    source: Arc<dyn CountrySource>,
    store: Arc<dyn CountryStore>,
    timeout: Option<Duration>,
    /// Held for the duration of a run; a second concurrent run is refused.
    running: Arc<Mutex<()>>,
}

impl SyncJob {
    pub fn new(source: Arc<dyn CountrySource>, store: Arc<dyn CountryStore>) -> Self {
        SyncJob {
            source,
            store,
            timeout: None,
            running: Arc::new(Mutex::new(())),
        }
    }

    /// Abort a run that takes longer than `timeout`. Nothing is written unless the commit completed.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run one reconciliation against a fresh repository session.
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let _guard = self.running.try_lock().map_err(|_| SyncError::Busy)?;
        let mut repo = self.store.session();
        let work = reconcile(self.source.as_ref(), repo.as_mut());
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, work).await.map_err(|_| {
                tracing::warn!(timeout = ?limit, "sync run timed out");
                SyncError::TimedOut(limit)
            })?,
            None => work.await,
        }
    }

    /// Run every `period` until the task is dropped. The first run starts immediately;
    /// failures are logged and wait for the next tick.
    pub async fn run_every(self, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            match self.run().await {
                Ok(report) => tracing::info!("{}", report.message()),
                Err(e) => tracing::error!(error = %e, "scheduled country sync failed"),
            }
        }
    }
}
