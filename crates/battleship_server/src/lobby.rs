use std::sync::Arc;

use rand::thread_rng;

use battleship_core::{Game, GameConfig, Player, PlayerId};

use crate::entities::{Lobby, LobbyStatus};
use crate::events::{now_millis, EventPayload, GameEvent};
use crate::ids::{generate_game_code, generate_lobby_code, generate_player_id};
use crate::ports::{EventSink, GameRepository, LobbyRepository, ResumeTokenRepository};
use crate::Result;

/// `autoJoin`'s result: the lobby the player landed in, their freshly-minted
/// id, and their resume token (spec §4.E).
#[derive(Debug, Clone)]
pub struct AutoJoinOutcome {
    pub lobby: Lobby,
    pub player_id: PlayerId,
    pub resume_token: String,
}

/// FIFO pairing under concurrent joins. `auto_join` is serialized through
/// `critical_section` — its own `Mutex`, distinct from any per-game lock,
/// since a join touches the lobby index rather than a single game (spec §5
/// "the matchmaker is a distinct critical section").
pub struct Matchmaker {
    lobbies: Arc<dyn LobbyRepository>,
    games: Arc<dyn GameRepository>,
    tokens: Arc<dyn ResumeTokenRepository>,
    events: Arc<dyn EventSink>,
    game_config: GameConfig,
    critical_section: tokio::sync::Mutex<()>,
}

impl Matchmaker {
    pub fn new(
        lobbies: Arc<dyn LobbyRepository>,
        games: Arc<dyn GameRepository>,
        tokens: Arc<dyn ResumeTokenRepository>,
        events: Arc<dyn EventSink>,
        game_config: GameConfig,
    ) -> Self {
        Matchmaker {
            lobbies,
            games,
            tokens,
            events,
            game_config,
            critical_section: tokio::sync::Mutex::new(()),
        }
    }

    pub async fn auto_join(&self, username: String) -> Result<AutoJoinOutcome> {
        let _guard = self.critical_section.lock().await;

        match self.lobbies.oldest_waiting().await? {
            None => self.open_new_lobby(username).await,
            Some(lobby) => self.join_existing_lobby(lobby, username).await,
        }
    }

    async fn open_new_lobby(&self, username: String) -> Result<AutoJoinOutcome> {
        let game_code = generate_game_code();
        let player_id = generate_player_id();

        let mut game = Game::new(game_code.clone(), self.game_config.clone());
        game.add_player(
            Player {
                id: player_id.clone(),
                username,
            },
            &mut thread_rng(),
        )?;
        self.games.create(game).await?;

        let lobby = Lobby {
            lobby_code: generate_lobby_code(),
            status: LobbyStatus::Waiting,
            game_code,
            version: 0,
            created_at_unix_millis: now_millis(),
        };
        self.lobbies.create(lobby.clone()).await?;

        let resume_token = self.tokens.mint_for(&lobby.game_code, &player_id).await?;

        Ok(AutoJoinOutcome {
            lobby,
            player_id,
            resume_token,
        })
    }

    async fn join_existing_lobby(&self, mut lobby: Lobby, username: String) -> Result<AutoJoinOutcome> {
        let player_id = generate_player_id();
        let game_lock = self.games.get(&lobby.game_code).await?;

        let game_status = {
            let mut game = game_lock.write().await;
            game.add_player(
                Player {
                    id: player_id.clone(),
                    username,
                },
                &mut thread_rng(),
            )?;
            game.status
        };

        lobby.status = LobbyStatus::Full;
        lobby.version += 1;
        self.lobbies.save(lobby.clone()).await?;

        let resume_token = self.tokens.mint_for(&lobby.game_code, &player_id).await?;

        self.events.publish(GameEvent::new(
            lobby.game_code.clone(),
            game_status,
            EventPayload::LobbyFull {
                lobby_code: lobby.lobby_code.clone(),
                game_code: lobby.game_code.clone(),
            },
        ));

        Ok(AutoJoinOutcome {
            lobby,
            player_id,
            resume_token,
        })
    }
}
