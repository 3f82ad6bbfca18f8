use std::sync::Arc;
use std::time::Duration;

use battleship_core::{GameStatus, PlayerId};

use crate::events::{now_millis, EventPayload, GameEvent};
use crate::ports::{ConnectionRepository, EventSink, GameRepository};
use crate::Result;

/// Session-open/close bookkeeping, the grace-period pause and the two-sided
/// resume handshake's connectivity check all live here (spec §4.G).
pub struct ConnectionTracker {
    connections: Arc<dyn ConnectionRepository>,
    games: Arc<dyn GameRepository>,
    events: Arc<dyn EventSink>,
    grace_period: Duration,
}

impl ConnectionTracker {
    pub fn new(
        connections: Arc<dyn ConnectionRepository>,
        games: Arc<dyn GameRepository>,
        events: Arc<dyn EventSink>,
        grace_period: Duration,
    ) -> Arc<Self> {
        Arc::new(ConnectionTracker {
            connections,
            games,
            events,
            grace_period,
        })
    }

    /// First subscription to a game's topic. Emits `PLAYER_RECONNECTED` if
    /// the row existed with `connected=false`.
    pub async fn on_session_open(
        &self,
        game_code: &str,
        player_id: &PlayerId,
        player_name: &str,
        session_id: String,
    ) -> Result<()> {
        let reconnected = self
            .connections
            .upsert_connected(game_code, player_id, session_id, now_millis())
            .await?;

        if reconnected {
            let status = self.games.get(game_code).await?.read().await.status;
            self.events.publish(GameEvent::new(
                game_code,
                status,
                EventPayload::PlayerReconnected {
                    player_id: player_id.clone(),
                    player_name: player_name.to_string(),
                },
            ));
        }

        Ok(())
    }

    /// Transport session close: marks the row disconnected and schedules the
    /// delayed grace check. The task is cancellation-free by design (spec
    /// §5) — it re-reads the connection row when it fires rather than being
    /// aborted if the player reconnects first.
    pub async fn on_session_close(self: &Arc<Self>, session_id: String) -> Result<()> {
        let Some(conn) = self
            .connections
            .mark_disconnected_by_session(&session_id, now_millis())
            .await?
        else {
            return Ok(());
        };

        let tracker = Arc::clone(self);
        let grace_period = self.grace_period;
        tokio::spawn(async move {
            tokio::time::sleep(grace_period).await;
            if let Err(e) = tracker.fire_grace_check(&conn.game_code, &conn.player_id).await {
                log::warn!(
                    "disconnect grace check failed for {}/{}: {e}",
                    conn.game_code,
                    conn.player_id
                );
            }
        });

        Ok(())
    }

    async fn fire_grace_check(&self, game_code: &str, player_id: &PlayerId) -> Result<()> {
        // Re-read rather than trust the value captured when the task was
        // scheduled: the player may have reconnected in the meantime.
        let Some(conn) = self.connections.get(game_code, player_id).await? else {
            return Ok(());
        };
        if conn.connected {
            return Ok(());
        }

        let game_lock = self.games.get(game_code).await?;
        let (player_name, status, paused_now) = {
            let mut game = game_lock.write().await;
            let player_name = game
                .players
                .iter()
                .find(|p| &p.id == player_id)
                .map(|p| p.username.clone())
                .unwrap_or_default();
            let paused_now = game.status == GameStatus::Running;
            if paused_now {
                game.force_pause()?;
            }
            (player_name, game.status, paused_now)
        };

        self.events.publish(GameEvent::new(
            game_code,
            status,
            EventPayload::PlayerDisconnected {
                player_id: player_id.clone(),
                player_name,
            },
        ));

        if paused_now {
            self.events.publish(GameEvent::new(
                game_code,
                status,
                EventPayload::GamePaused {
                    player_id: player_id.clone(),
                },
            ));
        }

        Ok(())
    }
}
