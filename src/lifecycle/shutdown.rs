//! Shutdown coordination for the router daemon.
//!
//! The signal is latched: a task that subscribes after `trigger` still
//! observes it, so late-starting listeners never miss a shutdown.

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Owner side of the shutdown latch.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

/// Subscriber side, handed to each long-running task.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    /// Resolve once shutdown was triggered, or the owner was dropped.
    pub async fn wait(mut self) {
        let _ = self.rx.wait_for(|triggered| *triggered).await;
    }
}

/// Await every task after shutdown, logging any that panicked or were
/// cancelled. Returns how many did not finish cleanly.
pub async fn drain(tasks: Vec<JoinHandle<()>>) -> usize {
    let mut failed = 0;
    for task in tasks {
        if let Err(e) = task.await {
            failed += 1;
            tracing::error!(
                error = %e,
                panicked = e.is_panic(),
                "Background task did not finish cleanly"
            );
        }
    }
    failed
}
