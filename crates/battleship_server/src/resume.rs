use std::sync::Arc;

use battleship_core::{GameSnapshot, GameStatus, PlayerId, ResumeOutcome};

use crate::events::{EventPayload, GameEvent};
use crate::ports::{ConnectionRepository, EventSink, GameRepository, ResumeTokenRepository};
use crate::Result;

/// Response to a resume request: whether the two-phase handshake just
/// completed, the resulting status, and the caller's own per-player
/// snapshot (spec §4.H — never reveals the opponent's placements).
#[derive(Debug, Clone)]
pub struct ResumeResponse {
    pub handshake_complete: bool,
    pub status: GameStatus,
    pub snapshot: GameSnapshot,
}

/// Coordinates the two-phase resume handshake. The state machine transition
/// itself lives on `Game::request_resume`; this type supplies the one thing
/// `Game` cannot know on its own — whether both players are currently
/// connected — and turns the outcome into events.
pub struct ResumeCoordinator {
    games: Arc<dyn GameRepository>,
    connections: Arc<dyn ConnectionRepository>,
    tokens: Arc<dyn ResumeTokenRepository>,
    events: Arc<dyn EventSink>,
}

impl ResumeCoordinator {
    pub fn new(
        games: Arc<dyn GameRepository>,
        connections: Arc<dyn ConnectionRepository>,
        tokens: Arc<dyn ResumeTokenRepository>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        ResumeCoordinator {
            games,
            connections,
            tokens,
            events,
        }
    }

    /// Resolves `token` to a `(game_code, player_id)` pair and drives the
    /// handshake. Fails with `Error::NotFound` for an unknown token (spec
    /// end-to-end scenario 6).
    pub async fn resume(&self, token: &str) -> Result<ResumeResponse> {
        let (game_code, player_id) = self.tokens.resolve(token).await?;
        self.request_resume(&game_code, &player_id).await
    }

    async fn request_resume(&self, game_code: &str, player_id: &PlayerId) -> Result<ResumeResponse> {
        let game_lock = self.games.get(game_code).await?;

        let player_ids: Vec<PlayerId> = {
            let game = game_lock.read().await;
            game.players.iter().map(|p| p.id.clone()).collect()
        };
        let both_connected = self.connections.all_connected(game_code, &player_ids).await?;

        let (outcome, status, snapshot) = {
            let mut game = game_lock.write().await;
            let outcome = game.request_resume(player_id, both_connected)?;
            let snapshot = game.snapshot_for(player_id)?;
            (outcome, game.status, snapshot)
        };

        match outcome {
            ResumeOutcome::NoChange | ResumeOutcome::AlreadyPending => {}
            ResumeOutcome::Pending => self.events.publish(GameEvent::new(
                game_code,
                status,
                EventPayload::GameResumePending {
                    player_id: player_id.clone(),
                },
            )),
            ResumeOutcome::Completed => self.events.publish(GameEvent::new(
                game_code,
                status,
                EventPayload::GameResumed {
                    player_id: player_id.clone(),
                },
            )),
        }

        Ok(ResumeResponse {
            handshake_complete: matches!(outcome, ResumeOutcome::Completed),
            status,
            snapshot,
        })
    }
}
