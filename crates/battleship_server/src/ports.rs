//! The external boundary. `battleship_server` implements everything inward
//! of these traits; a downstream web-framework crate implements `EventSink`
//! over its WebSocket/STOMP broker and the four repository traits over its
//! transactional store, then calls the service modules (`lobby`,
//! `connection`, `resume`) from its HTTP handlers.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use battleship_core::{Game, PlayerId};

use crate::entities::{Lobby, PlayerConnection};
use crate::events::GameEvent;
use crate::Result;

/// Typed fan-out to per-game topics (spec §4.I). `publish` is synchronous by
/// design — a slow transport must not be allowed to hold up a caller
/// mid-transaction; an implementation backed by a real broker is expected to
/// hand the event to a channel and return immediately (spec §5's
/// "publication must occur on a separate task" note).
pub trait EventSink: Send + Sync {
    fn publish(&self, event: GameEvent);
}

/// The atomic read-modify-write unit for a `Game` (spec §4.K). `get` returns
/// the shared lock handle itself rather than a snapshot, so callers hold it
/// for the duration of their transaction — the pessimistic per-game-lock
/// strategy spec §5 calls out as option (i).
#[async_trait]
pub trait GameRepository: Send + Sync {
    async fn create(&self, game: Game) -> Result<()>;
    async fn get(&self, game_code: &str) -> Result<Arc<RwLock<Game>>>;
}

/// FIFO scan by creation time with a status filter, plus unique lookup by
/// `lobby_code` (spec §4.K).
#[async_trait]
pub trait LobbyRepository: Send + Sync {
    async fn create(&self, lobby: Lobby) -> Result<()>;
    async fn get(&self, lobby_code: &str) -> Result<Lobby>;
    async fn save(&self, lobby: Lobby) -> Result<()>;
    async fn oldest_waiting(&self) -> Result<Option<Lobby>>;
}

/// Unique on `token`; unique on `(game_code, player_id)` (spec §4.F).
#[async_trait]
pub trait ResumeTokenRepository: Send + Sync {
    /// Idempotent: returns the existing token for `(game_code, player_id)`
    /// if one was already minted.
    async fn mint_for(&self, game_code: &str, player_id: &PlayerId) -> Result<String>;

    /// Resolves a token to its `(game_code, player_id)` and bumps
    /// `last_used_at`. Fails with `Error::NotFound` if absent.
    async fn resolve(&self, token: &str) -> Result<(String, PlayerId)>;
}

/// Upsert-on-open, locate-by-session-on-close, row-by-row purge (spec §4.G,
/// §4.J).
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// Upserts the connection row, returning `true` iff a previously
    /// disconnected row was flipped back to connected (a reconnect).
    async fn upsert_connected(
        &self,
        game_code: &str,
        player_id: &PlayerId,
        session_id: String,
        now_millis: u64,
    ) -> Result<bool>;

    /// Locates the row by `session_id`, marks it disconnected, and returns a
    /// copy of the updated row — or `None` if no row had that session.
    async fn mark_disconnected_by_session(
        &self,
        session_id: &str,
        now_millis: u64,
    ) -> Result<Option<PlayerConnection>>;

    async fn get(&self, game_code: &str, player_id: &PlayerId) -> Result<Option<PlayerConnection>>;

    async fn all_connected(&self, game_code: &str, players: &[PlayerId]) -> Result<bool>;

    /// Deletes rows with `last_seen < now_millis - threshold_millis`,
    /// returning the count removed.
    async fn purge_stale(&self, threshold_millis: u64, now_millis: u64) -> Result<usize>;
}
