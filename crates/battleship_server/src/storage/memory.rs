use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::RwLock;

use battleship_core::{Game, PlayerId};

use crate::entities::{GameResumeToken, Lobby, LobbyStatus, PlayerConnection};
use crate::events::{now_millis, GameEvent};
use crate::ids::generate_resume_token;
use crate::ports::{ConnectionRepository, EventSink, GameRepository, LobbyRepository, ResumeTokenRepository};
use crate::{Error, Result};

/// Holds every game behind its own `RwLock`, giving per-game serialization
/// (spec §5's pessimistic strategy) without contending across games.
#[derive(Default)]
pub struct InMemoryGameRepository {
    games: RwLock<HashMap<String, Arc<RwLock<Game>>>>,
}

impl InMemoryGameRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameRepository for InMemoryGameRepository {
    async fn create(&self, game: Game) -> Result<()> {
        let mut games = self.games.write().await;
        if games.contains_key(&game.game_code) {
            return Err(Error::Conflict(format!(
                "game {} already exists",
                game.game_code
            )));
        }
        games.insert(game.game_code.clone(), Arc::new(RwLock::new(game)));
        Ok(())
    }

    async fn get(&self, game_code: &str) -> Result<Arc<RwLock<Game>>> {
        self.games
            .read()
            .await
            .get(game_code)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("game {game_code}")))
    }
}

/// Lobbies keyed by code, plus insertion order for the FIFO "oldest waiting"
/// scan spec §4.K requires.
#[derive(Default)]
pub struct InMemoryLobbyRepository {
    lobbies: RwLock<HashMap<String, Lobby>>,
    creation_order: RwLock<Vec<String>>,
}

impl InMemoryLobbyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LobbyRepository for InMemoryLobbyRepository {
    async fn create(&self, lobby: Lobby) -> Result<()> {
        let mut lobbies = self.lobbies.write().await;
        if lobbies.contains_key(&lobby.lobby_code) {
            return Err(Error::Conflict(format!(
                "lobby {} already exists",
                lobby.lobby_code
            )));
        }
        self.creation_order.write().await.push(lobby.lobby_code.clone());
        lobbies.insert(lobby.lobby_code.clone(), lobby);
        Ok(())
    }

    async fn get(&self, lobby_code: &str) -> Result<Lobby> {
        self.lobbies
            .read()
            .await
            .get(lobby_code)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("lobby {lobby_code}")))
    }

    async fn save(&self, lobby: Lobby) -> Result<()> {
        let mut lobbies = self.lobbies.write().await;
        if !lobbies.contains_key(&lobby.lobby_code) {
            return Err(Error::NotFound(format!("lobby {}", lobby.lobby_code)));
        }
        lobbies.insert(lobby.lobby_code.clone(), lobby);
        Ok(())
    }

    async fn oldest_waiting(&self) -> Result<Option<Lobby>> {
        let order = self.creation_order.read().await;
        let lobbies = self.lobbies.read().await;
        Ok(order
            .iter()
            .filter_map(|code| lobbies.get(code))
            .find(|lobby| lobby.status == LobbyStatus::Waiting)
            .cloned())
    }
}

/// Unique on `token` and on `(game_code, player_id)` (spec §4.F).
#[derive(Default)]
pub struct InMemoryResumeTokenRepository {
    by_token: RwLock<HashMap<String, GameResumeToken>>,
    by_game_player: RwLock<HashMap<(String, PlayerId), String>>,
}

impl InMemoryResumeTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResumeTokenRepository for InMemoryResumeTokenRepository {
    async fn mint_for(&self, game_code: &str, player_id: &PlayerId) -> Result<String> {
        let key = (game_code.to_string(), player_id.clone());

        if let Some(existing) = self.by_game_player.read().await.get(&key) {
            return Ok(existing.clone());
        }

        let mut by_token = self.by_token.write().await;
        let mut by_game_player = self.by_game_player.write().await;

        // Re-check under the write lock: another task may have minted one
        // between our read above and acquiring this lock.
        if let Some(existing) = by_game_player.get(&key) {
            return Ok(existing.clone());
        }

        let mut token = generate_resume_token();
        while by_token.contains_key(&token) {
            token = generate_resume_token();
        }

        by_token.insert(
            token.clone(),
            GameResumeToken {
                token: token.clone(),
                game_code: game_code.to_string(),
                player_id: player_id.clone(),
                last_used_at_unix_millis: None,
            },
        );
        by_game_player.insert(key, token.clone());

        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<(String, PlayerId)> {
        let mut by_token = self.by_token.write().await;
        let record = by_token
            .get_mut(token)
            .ok_or_else(|| Error::NotFound(format!("resume token {token}")))?;
        record.last_used_at_unix_millis = Some(now_millis());
        Ok((record.game_code.clone(), record.player_id.clone()))
    }
}

/// One row per `(game_code, player_id)`, plus a reverse index by the
/// transport `session_id` for the disconnect path (spec §4.G).
#[derive(Default)]
pub struct InMemoryConnectionRepository {
    by_key: RwLock<HashMap<(String, PlayerId), PlayerConnection>>,
    by_session: RwLock<HashMap<String, (String, PlayerId)>>,
}

impl InMemoryConnectionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRepository for InMemoryConnectionRepository {
    async fn upsert_connected(
        &self,
        game_code: &str,
        player_id: &PlayerId,
        session_id: String,
        now_millis: u64,
    ) -> Result<bool> {
        let key = (game_code.to_string(), player_id.clone());
        let mut by_key = self.by_key.write().await;

        let reconnected = match by_key.get(&key) {
            Some(row) => !row.connected,
            None => false,
        };

        by_key.insert(
            key.clone(),
            PlayerConnection {
                game_code: game_code.to_string(),
                player_id: player_id.clone(),
                session_id: Some(session_id.clone()),
                connected: true,
                last_seen_unix_millis: now_millis,
            },
        );
        self.by_session.write().await.insert(session_id, key);

        Ok(reconnected)
    }

    async fn mark_disconnected_by_session(
        &self,
        session_id: &str,
        now_millis: u64,
    ) -> Result<Option<PlayerConnection>> {
        let Some(key) = self.by_session.write().await.remove(session_id) else {
            return Ok(None);
        };

        let mut by_key = self.by_key.write().await;
        let Some(row) = by_key.get_mut(&key) else {
            return Ok(None);
        };
        row.connected = false;
        row.last_seen_unix_millis = now_millis;
        Ok(Some(row.clone()))
    }

    async fn get(&self, game_code: &str, player_id: &PlayerId) -> Result<Option<PlayerConnection>> {
        Ok(self
            .by_key
            .read()
            .await
            .get(&(game_code.to_string(), player_id.clone()))
            .cloned())
    }

    async fn all_connected(&self, game_code: &str, players: &[PlayerId]) -> Result<bool> {
        let by_key = self.by_key.read().await;
        Ok(players.iter().all(|player_id| {
            by_key
                .get(&(game_code.to_string(), player_id.clone()))
                .map(|row| row.connected)
                .unwrap_or(false)
        }))
    }

    async fn purge_stale(&self, threshold_millis: u64, now_millis: u64) -> Result<usize> {
        let cutoff = now_millis.saturating_sub(threshold_millis);
        let mut by_key = self.by_key.write().await;
        let stale: Vec<_> = by_key
            .iter()
            .filter(|(_, row)| row.last_seen_unix_millis < cutoff)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &stale {
            by_key.remove(key);
        }

        if !stale.is_empty() {
            let mut by_session = self.by_session.write().await;
            by_session.retain(|_, mapped_key| !stale.contains(mapped_key));
        }

        Ok(stale.len())
    }
}

/// Keeps every published event (for tests and for the literal "filtered by
/// type, equals the state transitions in order" property) and fans each one
/// out to a per-game broadcast topic for real-time subscribers.
pub struct InMemoryEventSink {
    log: Mutex<Vec<GameEvent>>,
    topics: Mutex<HashMap<String, tokio::sync::broadcast::Sender<GameEvent>>>,
}

impl Default for InMemoryEventSink {
    fn default() -> Self {
        InMemoryEventSink {
            log: Mutex::new(Vec::new()),
            topics: Mutex::new(HashMap::new()),
        }
    }
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to `/topic/games/{game_code}`, creating the topic if this
    /// is the first subscriber.
    pub fn subscribe(&self, game_code: &str) -> tokio::sync::broadcast::Receiver<GameEvent> {
        let mut topics = self.topics.lock().expect("event sink mutex poisoned");
        topics
            .entry(game_code.to_string())
            .or_insert_with(|| tokio::sync::broadcast::channel(128).0)
            .subscribe()
    }

    /// All events published for `game_code`, in publish order.
    pub fn events_for(&self, game_code: &str) -> Vec<GameEvent> {
        self.log
            .lock()
            .expect("event sink mutex poisoned")
            .iter()
            .filter(|event| event.game_code == game_code)
            .cloned()
            .collect()
    }
}

impl EventSink for InMemoryEventSink {
    fn publish(&self, event: GameEvent) {
        self.log
            .lock()
            .expect("event sink mutex poisoned")
            .push(event.clone());

        let topics = self.topics.lock().expect("event sink mutex poisoned");
        if let Some(sender) = topics.get(&event.game_code) {
            // No receivers is a normal, unsubscribed topic — not an error.
            let _ = sender.send(event);
        }
    }
}
