//! One-shot readiness signal resolved when a store finishes loading.

use tokio::sync::watch;

use crate::error::{Result, StateError};

/// Sending half, owned by the store.
#[derive(Debug)]
pub(crate) struct ReadyLatch {
    tx: watch::Sender<bool>,
}

impl ReadyLatch {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Resolve the signal. Later calls are no-ops.
    pub(crate) fn resolve(&self) {
        self.tx.send_if_modified(|ready| !std::mem::replace(ready, true));
    }

    pub(crate) fn subscribe(&self) -> Readiness {
        Readiness {
            rx: self.tx.subscribe(),
        }
    }
}

/// Awaitable handle that resolves once the store has loaded its rows.
///
/// Handles are cheap to clone and may be obtained before `init` runs.
/// There is no timeout: waiting on a store whose `init` never completes
/// waits indefinitely.
#[derive(Debug, Clone)]
pub struct Readiness {
    rx: watch::Receiver<bool>,
}

impl Readiness {
    /// Whether the store has finished loading.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until the store has finished loading.
    ///
    /// # Errors
    /// Returns [`StateError::Closed`] if the store was dropped without ever
    /// becoming ready.
    pub async fn wait(&self) -> Result<()> {
        if self.is_ready() {
            return Ok(());
        }
        let mut rx = self.rx.clone();
        rx.wait_for(|ready| *ready)
            .await
            .map(|_| ())
            .map_err(|_| StateError::Closed.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn wait_resolves_after_resolve() {
        let latch = ReadyLatch::new();
        let readiness = latch.subscribe();
        assert!(!readiness.is_ready());

        let waiter = tokio::spawn({
            let readiness = readiness.clone();
            async move { readiness.wait().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        latch.resolve();

        waiter.await.unwrap().unwrap();
        assert!(readiness.is_ready());
    }

    #[tokio::test]
    async fn resolve_is_one_shot() {
        let latch = ReadyLatch::new();
        latch.resolve();
        latch.resolve();
        assert!(latch.subscribe().is_ready());
    }

    #[tokio::test]
    async fn ready_handle_survives_drop_of_latch() {
        let latch = ReadyLatch::new();
        let readiness = latch.subscribe();
        latch.resolve();
        drop(latch);
        assert!(readiness.wait().await.is_ok());
    }

    #[tokio::test]
    async fn dropped_latch_fails_pending_waiters() {
        let latch = ReadyLatch::new();
        let readiness = latch.subscribe();
        drop(latch);

        let err = readiness.wait().await.unwrap_err();
        assert!(matches!(err, crate::Error::State(StateError::Closed)));
    }
}
