//! Lifecycle handle for a spawned background task: a stop signal paired with
//! its `JoinHandle`. Scheduled work (the disconnect grace check, the
//! connection cleaner) is built on top of this the same way.

#[derive(Debug)]
pub struct TaskControl(
    tokio::sync::oneshot::Sender<()>,
    tokio::task::JoinHandle<()>,
);

impl TaskControl {
    pub fn new(
        stop: tokio::sync::oneshot::Sender<()>,
        handle: tokio::task::JoinHandle<()>,
    ) -> TaskControl {
        TaskControl(stop, handle)
    }

    pub async fn stop(self) {
        if !self.1.is_finished() && self.0.send(()).is_ok() {
            let _ = self.1.await;
        }
    }

    pub async fn wait(self) {
        let _ = self.1.await;
    }
}

/// Relays a one-shot stop signal into a broadcast receiver so a spawned task
/// can `tokio::select!` on it repeatedly without consuming it.
pub fn upgrade_oneshot<T: Clone + Send + 'static>(
    rx: tokio::sync::oneshot::Receiver<T>,
) -> tokio::sync::broadcast::Receiver<T> {
    let (broadcast_tx, broadcast_rx) = tokio::sync::broadcast::channel(1);
    tokio::spawn(relay(rx, broadcast_tx));
    broadcast_rx
}

async fn relay<T>(rx: tokio::sync::oneshot::Receiver<T>, tx: tokio::sync::broadcast::Sender<T>) {
    // The sender is dropped without sending whenever the task it controls
    // already finished on its own, or the caller used `wait()`/dropped the
    // `TaskControl` outright — not a bug, so don't propagate it as one.
    if let Ok(value) = rx.await {
        let _ = tx.send(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn relay_survives_a_dropped_sender() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let mut broadcast_rx = upgrade_oneshot(rx);
        drop(tx);
        tokio::task::yield_now().await;
        assert!(broadcast_rx.recv().await.is_err());
    }
}
