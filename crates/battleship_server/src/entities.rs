use serde::{Deserialize, Serialize};

use battleship_core::PlayerId;

/// A matchmaking lobby bound to a single game. Holds an optimistic-concurrency
/// `version` stamp even though the default in-memory store serializes writes
/// through the matchmaker's own critical section rather than retrying on a
/// version conflict — see DESIGN.md for the open-question resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lobby {
    pub lobby_code: String,
    pub status: LobbyStatus,
    pub game_code: String,
    pub version: u64,
    pub created_at_unix_millis: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LobbyStatus {
    Waiting,
    Full,
}

/// Unique on `token`; unique on `(game_code, player_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResumeToken {
    pub token: String,
    pub game_code: String,
    pub player_id: PlayerId,
    pub last_used_at_unix_millis: Option<u64>,
}

/// Unique on `(game_code, player_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConnection {
    pub game_code: String,
    pub player_id: PlayerId,
    pub session_id: Option<String>,
    pub connected: bool,
    pub last_seen_unix_millis: u64,
}
