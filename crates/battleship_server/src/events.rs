use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use battleship_core::{GameStatus, PlayerId, ShotOutcome};

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the epoch")
        .as_millis() as u64
}

/// One entry per case, each with its own typed payload fields — replacing
/// the source's heterogeneous string-keyed map (spec §9 "Dynamic event
/// payloads").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    BoardConfirmed { player_id: PlayerId, player_name: String },
    BoardRerolled { player_id: PlayerId, player_name: String },
    GameStarted { current_turn_player_id: PlayerId, current_turn_player_name: String },
    ShotFired {
        attacker_id: PlayerId,
        attacker_name: String,
        defender_id: PlayerId,
        defender_name: String,
        x: u32,
        y: u32,
        result: ShotOutcome,
        hit: bool,
        ship_sunk: bool,
        current_turn_player_id: PlayerId,
    },
    TurnChanged { current_turn_player_id: PlayerId, last_shot_result: ShotOutcome },
    GameFinished { winner_player_id: PlayerId, winner_player_name: String },
    GamePaused { player_id: PlayerId },
    GameResumed { player_id: PlayerId },
    GameResumePending { player_id: PlayerId },
    GameForfeited { player_id: PlayerId },
    PlayerDisconnected { player_id: PlayerId, player_name: String },
    PlayerReconnected { player_id: PlayerId, player_name: String },
    LobbyFull { lobby_code: String, game_code: String },
    /// Warm-up publish performed at startup before accepting client
    /// connections, so the first real event doesn't pay first-publish
    /// latency (spec §4.I).
    WarmUp,
}

impl EventPayload {
    pub fn event_type(&self) -> GameEventType {
        match self {
            EventPayload::BoardConfirmed { .. } => GameEventType::BoardConfirmed,
            EventPayload::BoardRerolled { .. } => GameEventType::BoardRerolled,
            EventPayload::GameStarted { .. } => GameEventType::GameStarted,
            EventPayload::ShotFired { .. } => GameEventType::ShotFired,
            EventPayload::TurnChanged { .. } => GameEventType::TurnChanged,
            EventPayload::GameFinished { .. } => GameEventType::GameFinished,
            EventPayload::GamePaused { .. } => GameEventType::GamePaused,
            EventPayload::GameResumed { .. } => GameEventType::GameResumed,
            EventPayload::GameResumePending { .. } => GameEventType::GameResumePending,
            EventPayload::GameForfeited { .. } => GameEventType::GameForfeited,
            EventPayload::PlayerDisconnected { .. } => GameEventType::PlayerDisconnected,
            EventPayload::PlayerReconnected { .. } => GameEventType::PlayerReconnected,
            EventPayload::LobbyFull { .. } => GameEventType::LobbyFull,
            EventPayload::WarmUp => GameEventType::WarmUp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventType {
    BoardConfirmed,
    BoardRerolled,
    GameStarted,
    ShotFired,
    TurnChanged,
    GameFinished,
    GamePaused,
    GameResumed,
    GameResumePending,
    GameForfeited,
    PlayerDisconnected,
    PlayerReconnected,
    LobbyFull,
    WarmUp,
}

/// Published to the logical topic `/topic/games/{game_code}`. Ordering
/// within one game's topic is required; cross-game ordering is not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub game_code: String,
    pub game_status: GameStatus,
    pub timestamp_unix_millis: u64,
    pub payload: EventPayload,
}

impl GameEvent {
    pub fn new(game_code: impl Into<String>, game_status: GameStatus, payload: EventPayload) -> Self {
        GameEvent {
            game_code: game_code.into(),
            game_status,
            timestamp_unix_millis: now_millis(),
            payload,
        }
    }

    pub fn event_type(&self) -> GameEventType {
        self.payload.event_type()
    }
}
