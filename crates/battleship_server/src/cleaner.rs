use std::sync::Arc;
use std::time::Duration;

use crate::events::now_millis;
use crate::ports::ConnectionRepository;
use crate::tasks::{upgrade_oneshot, TaskControl};

/// Periodic purge of stale `PlayerConnection` rows (spec §4.J), on the same
/// `interval` + `select!`-against-a-stop-signal shape as the teacher's
/// announcement timer.
pub fn spawn_cleaner(
    connections: Arc<dyn ConnectionRepository>,
    interval: Duration,
    stale_threshold: Duration,
) -> TaskControl {
    let (tx, rx) = tokio::sync::oneshot::channel();
    let mut stop = upgrade_oneshot(rx);

    let handle = tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so startup doesn't race
        // a purge against the connections a fresh process hasn't seen yet.
        timer.tick().await;

        loop {
            tokio::select! {
                _ = stop.recv() => return,
                _ = timer.tick() => {}
            }

            match connections
                .purge_stale(stale_threshold.as_millis() as u64, now_millis())
                .await
            {
                Ok(0) => {}
                Ok(n) => log::info!("connection cleaner purged {n} stale rows"),
                Err(e) => log::warn!("connection cleaner failed: {e}"),
            }
        }
    });

    TaskControl::new(tx, handle)
}
