use std::sync::Arc;

use rand::thread_rng;

use battleship_core::{Coordinate, GameAction, GameActionOutcome, GameStatus, PlayerId, ShotOutcome};

use crate::events::{EventPayload, GameEvent};
use crate::ports::{EventSink, GameRepository};
use crate::Result;

/// Dispatches the mutating `GameAction`s (everything in spec §4.D except
/// the lobby-driven `secondPlayerJoined` join, which the matchmaker owns,
/// and the resume handshake, which `resume::ResumeCoordinator` owns) and
/// turns each resulting transition into the events spec §4.I requires.
///
/// Events are published only after the mutation is committed to the
/// repository's lock, never before — spec §5's "events must be emitted
/// after the state change is durably committed".
pub struct GameService {
    games: Arc<dyn GameRepository>,
    events: Arc<dyn EventSink>,
}

impl GameService {
    pub fn new(games: Arc<dyn GameRepository>, events: Arc<dyn EventSink>) -> Self {
        GameService { games, events }
    }

    pub async fn confirm_board(&self, game_code: &str, player_id: &PlayerId) -> Result<GameStatus> {
        let game_lock = self.games.get(game_code).await?;

        let (player_name, status, current_turn) = {
            let mut game = game_lock.write().await;
            let player_name = player_name_of(&game.players, player_id);
            game.apply(
                GameAction::ConfirmBoard { player_id: player_id.clone() },
                &mut thread_rng(),
            )?;
            (player_name, game.status, game.current_turn_player_id.clone())
        };

        self.events.publish(GameEvent::new(
            game_code,
            status,
            EventPayload::BoardConfirmed {
                player_id: player_id.clone(),
                player_name,
            },
        ));

        if status == GameStatus::Running {
            let current_turn_player_id = current_turn.expect("running game always has a current turn");
            let current_turn_player_name = {
                let game = game_lock.read().await;
                player_name_of(&game.players, &current_turn_player_id)
            };
            self.events.publish(GameEvent::new(
                game_code,
                status,
                EventPayload::GameStarted {
                    current_turn_player_id,
                    current_turn_player_name,
                },
            ));
        }

        Ok(status)
    }

    pub async fn reroll_board(&self, game_code: &str, player_id: &PlayerId) -> Result<()> {
        let game_lock = self.games.get(game_code).await?;

        let (player_name, status) = {
            let mut game = game_lock.write().await;
            let player_name = player_name_of(&game.players, player_id);
            game.apply(
                GameAction::RerollBoard { player_id: player_id.clone() },
                &mut thread_rng(),
            )?;
            (player_name, game.status)
        };

        self.events.publish(GameEvent::new(
            game_code,
            status,
            EventPayload::BoardRerolled {
                player_id: player_id.clone(),
                player_name,
            },
        ));

        Ok(())
    }

    pub async fn fire_shot(
        &self,
        game_code: &str,
        player_id: &PlayerId,
        coordinate: Coordinate,
    ) -> Result<ShotOutcome> {
        let game_lock = self.games.get(game_code).await?;

        let (outcome, status, attacker_name, defender_id, defender_name, current_turn, turn_changed, winner) = {
            let mut game = game_lock.write().await;
            let previous_turn = game.current_turn_player_id.clone();
            let defender_id = game
                .players
                .iter()
                .find(|p| &p.id != player_id)
                .map(|p| p.id.clone());
            let attacker_name = player_name_of(&game.players, player_id);
            let defender_name = defender_id
                .as_ref()
                .map(|id| player_name_of(&game.players, id))
                .unwrap_or_default();

            let outcome = match game.apply(
                GameAction::FireShot { player_id: player_id.clone(), coordinate },
                &mut thread_rng(),
            )? {
                GameActionOutcome::Shot(outcome) => outcome,
                GameActionOutcome::Ack => unreachable!("FireShot always yields Shot"),
            };

            let turn_changed = game.current_turn_player_id != previous_turn;
            let winner = game.winner_player_id.clone();
            (
                outcome,
                game.status,
                attacker_name,
                defender_id.unwrap_or_default(),
                defender_name,
                game.current_turn_player_id.clone(),
                turn_changed,
                winner,
            )
        };

        if outcome == ShotOutcome::AlreadyShot {
            return Ok(outcome);
        }

        self.events.publish(GameEvent::new(
            game_code,
            status,
            EventPayload::ShotFired {
                attacker_id: player_id.clone(),
                attacker_name,
                defender_id,
                defender_name,
                x: coordinate.x,
                y: coordinate.y,
                result: outcome,
                hit: matches!(outcome, ShotOutcome::Hit | ShotOutcome::Sunk),
                ship_sunk: outcome == ShotOutcome::Sunk,
                current_turn_player_id: current_turn.clone().unwrap_or_default(),
            },
        ));

        if turn_changed {
            if let Some(current_turn_player_id) = current_turn {
                self.events.publish(GameEvent::new(
                    game_code,
                    status,
                    EventPayload::TurnChanged {
                        current_turn_player_id,
                        last_shot_result: outcome,
                    },
                ));
            }
        }

        if status == GameStatus::Finished {
            let winner_player_id = winner.expect("finished-by-shot game always has a winner");
            let winner_player_name = {
                let game = game_lock.read().await;
                player_name_of(&game.players, &winner_player_id)
            };
            self.events.publish(GameEvent::new(
                game_code,
                status,
                EventPayload::GameFinished {
                    winner_player_id,
                    winner_player_name,
                },
            ));
        }

        Ok(outcome)
    }

    pub async fn pause(&self, game_code: &str, player_id: &PlayerId) -> Result<()> {
        let game_lock = self.games.get(game_code).await?;
        let status = {
            let mut game = game_lock.write().await;
            game.apply(GameAction::Pause { player_id: player_id.clone() }, &mut thread_rng())?;
            game.status
        };
        self.events.publish(GameEvent::new(
            game_code,
            status,
            EventPayload::GamePaused { player_id: player_id.clone() },
        ));
        Ok(())
    }

    pub async fn forfeit(&self, game_code: &str, player_id: &PlayerId) -> Result<()> {
        let game_lock = self.games.get(game_code).await?;
        let (status, winner_player_id) = {
            let mut game = game_lock.write().await;
            game.apply(GameAction::Forfeit { player_id: player_id.clone() }, &mut thread_rng())?;
            (game.status, game.winner_player_id.clone())
        };

        self.events.publish(GameEvent::new(
            game_code,
            status,
            EventPayload::GameForfeited { player_id: player_id.clone() },
        ));

        let winner_player_id = winner_player_id.expect("forfeit always assigns the opponent as winner");
        let winner_player_name = {
            let game = game_lock.read().await;
            player_name_of(&game.players, &winner_player_id)
        };
        self.events.publish(GameEvent::new(
            game_code,
            status,
            EventPayload::GameFinished {
                winner_player_id,
                winner_player_name,
            },
        ));

        Ok(())
    }
}

fn player_name_of(players: &[battleship_core::Player], player_id: &PlayerId) -> String {
    players
        .iter()
        .find(|p| &p.id == player_id)
        .map(|p| p.username.clone())
        .unwrap_or_default()
}
