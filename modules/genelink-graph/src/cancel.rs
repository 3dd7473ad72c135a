use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;
use tracing::info;

use crate::error::LinkError;

/// Run-wide cancellation: a flag for cheap checks between steps plus a
/// notifier so in-flight waits and queries can be abandoned immediately.
#[derive(Debug, Default)]
pub struct CancelSignal {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Resolves once `cancel` has been called.
    pub async fn cancelled(&self) {
        loop {
            // Register before checking so a cancel in between is not missed
            let notified = self.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    pub fn check(&self) -> Result<(), LinkError> {
        if self.is_cancelled() {
            info!("Run cancelled");
            return Err(LinkError::Cancelled);
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the run is cancelled first.
    pub async fn guard<T, F>(&self, fut: F) -> Result<T, LinkError>
    where
        F: Future<Output = Result<T, LinkError>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            _ = self.cancelled() => {
                info!("Run cancelled mid-step");
                Err(LinkError::Cancelled)
            }
            result = fut => result,
        }
    }
}
