//! Inert, serde-derived response shapes for the (external) HTTP boundary
//! named in spec §6. No serialization framework is wired up here — JSON
//! encoding itself is out of scope — but the shapes are part of the
//! contract, so they're first-class types rather than left implicit.

use serde::{Deserialize, Serialize};

use battleship_core::{GameStatus, PlayerId, Shot, ShipPlacement, ShotOutcome};

use crate::entities::LobbyStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDto {
    pub id: PlayerId,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyDto {
    pub lobby_code: String,
    pub status: LobbyStatus,
    pub game_code: String,
    pub resume_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamePublicDto {
    pub game_code: String,
    pub status: GameStatus,
    pub players: Vec<PlayerDto>,
    pub current_turn_player_id: Option<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardStateDto {
    pub placements: Vec<ShipPlacement>,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotResultDto {
    pub x: u32,
    pub y: u32,
    pub result: ShotOutcome,
    pub current_turn_player_id: Option<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResumeResponseDto {
    pub handshake_complete: bool,
    pub status: GameStatus,
    pub own_placements: Vec<ShipPlacement>,
    pub own_board_locked: bool,
    pub opponent_name: Option<String>,
    pub opponent_board_locked: bool,
    pub your_turn: bool,
    pub shots_against_you: Vec<Shot>,
    pub your_shots: Vec<Shot>,
}
