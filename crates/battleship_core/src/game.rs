use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::board::Board;
use crate::coordinate::Coordinate;
use crate::error::Error;
use crate::fleet::parse_fleet;
use crate::ids::PlayerId;
use crate::ship::ShipPlacement;
use crate::shot::{resolve_shot, ShotOutcome};

/// `(boardWidth, boardHeight, shipMargin, fleetDefinition)`. Default is the
/// classic 10x10 board with two destroyers, two cruisers, one battleship
/// and one carrier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub board_width: u32,
    pub board_height: u32,
    pub ship_margin: u32,
    pub fleet_definition: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            board_width: 10,
            board_height: 10,
            ship_margin: 2,
            fleet_definition: "2x2,2x3,1x4,1x5".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shot {
    pub coordinate: Coordinate,
    pub result: ShotOutcome,
    pub shooter: PlayerId,
    pub target_board: PlayerId,
}

/// Append-only chat entry. Chat itself is out of core scope; this is the
/// data shape the persistence boundary stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: PlayerId,
    pub text: String,
    pub created_at_unix_millis: u64,
}

impl ChatMessage {
    pub const MAX_LEN: usize = 500;

    pub fn new(sender: PlayerId, text: String, created_at_unix_millis: u64) -> crate::Result<Self> {
        if text.chars().count() > Self::MAX_LEN {
            return Err(Error::BadRequest(format!(
                "chat message exceeds {} characters",
                Self::MAX_LEN
            )));
        }
        Ok(ChatMessage {
            sender,
            text,
            created_at_unix_millis,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Waiting,
    Setup,
    Ready,
    Running,
    Paused,
    Finished,
}

impl GameStatus {
    fn is_action_valid(&self, action: &GameAction) -> bool {
        match self {
            GameStatus::Setup => matches!(
                action,
                GameAction::ConfirmBoard { .. } | GameAction::RerollBoard { .. }
            ),
            GameStatus::Running => matches!(
                action,
                GameAction::FireShot { .. } | GameAction::Pause { .. } | GameAction::Forfeit { .. }
            ),
            GameStatus::Waiting | GameStatus::Ready | GameStatus::Paused | GameStatus::Finished => {
                false
            }
        }
    }
}

/// A mutating request against a `Game` in its current status. Mirrors the
/// transition table in spec §4.D one-to-one; `Game::apply` rejects any
/// action `GameStatus::is_action_valid` does not allow for the current
/// status before dispatching it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameAction {
    ConfirmBoard { player_id: PlayerId },
    RerollBoard { player_id: PlayerId },
    FireShot { player_id: PlayerId, coordinate: Coordinate },
    Pause { player_id: PlayerId },
    Forfeit { player_id: PlayerId },
}

/// Result of a successful `request_resume` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// The game was WAITING; resume is a no-op success (post-refresh path).
    NoChange,
    /// First resume request while the partner hasn't matched it yet.
    Pending,
    /// The same player repeating a resume request before the partner
    /// responds — a no-op, distinct from `Pending` so callers don't
    /// re-publish the pending-resume event for it.
    AlreadyPending,
    /// Both players have now requested resume while connected; RUNNING.
    Completed,
}

/// Outcome of a dispatched `GameAction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameActionOutcome {
    Ack,
    Shot(ShotOutcome),
}

/// The aggregate root: players, boards, shot history and the state machine
/// in spec §4.D.
#[derive(Debug, Clone)]
pub struct Game {
    pub game_code: String,
    pub status: GameStatus,
    pub config: GameConfig,
    pub players: Vec<Player>,
    boards: HashMap<PlayerId, Board>,
    pub shots: Vec<Shot>,
    pub messages: Vec<ChatMessage>,
    pub current_turn_player_id: Option<PlayerId>,
    pub resume_ready_player_id: Option<PlayerId>,
    pub winner_player_id: Option<PlayerId>,
}

impl Game {
    pub fn new(game_code: String, config: GameConfig) -> Self {
        Game {
            game_code,
            status: GameStatus::Waiting,
            config,
            players: Vec::new(),
            boards: HashMap::new(),
            shots: Vec::new(),
            messages: Vec::new(),
            current_turn_player_id: None,
            resume_ready_player_id: None,
            winner_player_id: None,
        }
    }

    pub fn board(&self, player_id: &PlayerId) -> Option<&Board> {
        self.boards.get(player_id)
    }

    /// Replaces `player_id`'s board with `placements`, bypassing auto-place.
    /// Only compiled with the `test-util` feature, for tests that need a
    /// fixed, known layout instead of the rng-driven one `add_player` picks.
    #[cfg(any(test, feature = "test-util"))]
    pub fn set_placements_for_testing(
        &mut self,
        player_id: &PlayerId,
        placements: Vec<ShipPlacement>,
    ) -> crate::Result<()> {
        let board = self
            .boards
            .get_mut(player_id)
            .ok_or_else(|| Error::NotFound(format!("no board for {player_id}")))?;
        board.clear()?;
        for placement in placements {
            board.place(placement)?;
        }
        Ok(())
    }

    fn other_player(&self, player_id: &PlayerId) -> crate::Result<&Player> {
        self.players
            .iter()
            .find(|p| &p.id != player_id)
            .ok_or_else(|| Error::NotFound("opponent not present yet".into()))
    }

    fn require_member(&self, player_id: &PlayerId) -> crate::Result<()> {
        if self.players.iter().any(|p| &p.id == player_id) {
            Ok(())
        } else {
            Err(Error::Forbidden(format!(
                "player {player_id} is not part of this game"
            )))
        }
    }

    /// `WAITING --secondPlayerJoined--> SETUP`: adds a player, and once both
    /// have joined, auto-places both boards and transitions to SETUP.
    pub fn add_player(&mut self, player: Player, rng: &mut impl Rng) -> crate::Result<()> {
        if self.status != GameStatus::Waiting {
            return Err(Error::IllegalState(
                "players may only join while the game is waiting".into(),
            ));
        }
        if self.players.len() >= 2 {
            return Err(Error::IllegalState("game already has two players".into()));
        }
        if self.players.iter().any(|p| p.id == player.id) {
            return Err(Error::BadRequest("player already joined this game".into()));
        }

        let mut board = Board::new(self.config.board_width, self.config.board_height, player.id.clone());

        if self.players.len() + 1 == 2 {
            // Validate the fleet and auto-place both boards on locals first:
            // a bad fleet definition or an unplaceable fleet must not leave
            // the game with two joined players stuck in `Waiting` forever.
            let fleet = parse_fleet(
                &self.config.fleet_definition,
                self.config.board_width,
                self.config.board_height,
            )?;
            let mut existing_board = self
                .boards
                .get(&self.players[0].id)
                .cloned()
                .expect("first player's board inserted on their own join");
            existing_board.auto_place(&fleet, rng)?;
            board.auto_place(&fleet, rng)?;

            self.boards.insert(self.players[0].id.clone(), existing_board);
            self.boards.insert(player.id.clone(), board);
            self.players.push(player);
            self.status = GameStatus::Setup;
        } else {
            self.boards.insert(player.id.clone(), board);
            self.players.push(player);
        }

        Ok(())
    }

    /// Dispatches `action`, rejecting it with `IllegalState` if not valid
    /// for the current status.
    pub fn apply(
        &mut self,
        action: GameAction,
        rng: &mut impl Rng,
    ) -> crate::Result<GameActionOutcome> {
        if !self.status.is_action_valid(&action) {
            return Err(Error::IllegalState(format!(
                "{action:?} is not valid while the game is {:?}",
                self.status
            )));
        }

        match action {
            GameAction::ConfirmBoard { player_id } => {
                self.confirm_board(&player_id)?;
                Ok(GameActionOutcome::Ack)
            }
            GameAction::RerollBoard { player_id } => {
                self.reroll_board(&player_id, rng)?;
                Ok(GameActionOutcome::Ack)
            }
            GameAction::FireShot { player_id, coordinate } => {
                let outcome = self.fire_shot(&player_id, coordinate)?;
                Ok(GameActionOutcome::Shot(outcome))
            }
            GameAction::Pause { player_id } => {
                self.pause(&player_id)?;
                Ok(GameActionOutcome::Ack)
            }
            GameAction::Forfeit { player_id } => {
                self.forfeit(&player_id)?;
                Ok(GameActionOutcome::Ack)
            }
        }
    }

    fn confirm_board(&mut self, player_id: &PlayerId) -> crate::Result<()> {
        self.require_member(player_id)?;
        let board = self
            .boards
            .get_mut(player_id)
            .expect("member players always have a board");
        if board.is_locked() {
            return Err(Error::IllegalState("board is already confirmed".into()));
        }
        board.lock();

        if self.boards.values().all(Board::is_locked) {
            self.status = GameStatus::Ready;
            self.start_running();
        }

        Ok(())
    }

    fn reroll_board(&mut self, player_id: &PlayerId, rng: &mut impl Rng) -> crate::Result<()> {
        self.require_member(player_id)?;
        let fleet = parse_fleet(
            &self.config.fleet_definition,
            self.config.board_width,
            self.config.board_height,
        )?;
        let board = self
            .boards
            .get_mut(player_id)
            .expect("member players always have a board");
        if board.is_locked() {
            return Err(Error::IllegalState("board is already confirmed".into()));
        }
        board.clear()?;
        board.auto_place(&fleet, rng)?;
        Ok(())
    }

    /// `READY --(auto)--> RUNNING`: picks the starting player deterministically
    /// — the first player to have joined the game.
    fn start_running(&mut self) {
        self.current_turn_player_id = self.players.first().map(|p| p.id.clone());
        self.status = GameStatus::Running;
    }

    fn shot_coords_on(&self, target_board: &PlayerId) -> HashSet<Coordinate> {
        self.shots
            .iter()
            .filter(|s| &s.target_board == target_board)
            .map(|s| s.coordinate)
            .collect()
    }

    fn fire_shot(&mut self, player_id: &PlayerId, coordinate: Coordinate) -> crate::Result<ShotOutcome> {
        self.require_member(player_id)?;

        if self.current_turn_player_id.as_ref() != Some(player_id) {
            return Err(Error::OutOfTurn {
                current: self.current_turn_player_id.clone(),
            });
        }

        let opponent = self.other_player(player_id)?.id.clone();
        let target_board = self.boards.get(&opponent).expect("opponent has a board");

        if !coordinate.in_bounds(target_board.width, target_board.height) {
            return Err(Error::BadRequest("coordinate is out of bounds".into()));
        }

        let existing = self.shot_coords_on(&opponent);
        let outcome = resolve_shot(target_board, &existing, coordinate);

        if outcome == ShotOutcome::AlreadyShot {
            return Ok(outcome);
        }

        self.shots.push(Shot {
            coordinate,
            result: outcome,
            shooter: player_id.clone(),
            target_board: opponent.clone(),
        });

        match outcome {
            ShotOutcome::Miss => {
                self.current_turn_player_id = Some(opponent.clone());
            }
            ShotOutcome::Hit | ShotOutcome::Sunk => {
                // shooter keeps the turn
            }
            ShotOutcome::AlreadyShot => unreachable!("handled above"),
        }

        if outcome == ShotOutcome::Sunk {
            let updated = self.shot_coords_on(&opponent);
            let target_board = self.boards.get(&opponent).expect("opponent has a board");
            if target_board.fully_covered(&updated) {
                self.status = GameStatus::Finished;
                self.winner_player_id = Some(player_id.clone());
            }
        }

        Ok(outcome)
    }

    fn pause(&mut self, player_id: &PlayerId) -> crate::Result<()> {
        self.require_member(player_id)?;
        self.status = GameStatus::Paused;
        self.resume_ready_player_id = None;
        Ok(())
    }

    /// Forces a pause with no acting player — used by the connection
    /// tracker's disconnect grace check (spec §4.G).
    pub fn force_pause(&mut self) -> crate::Result<()> {
        if self.status != GameStatus::Running {
            return Err(Error::IllegalState(
                "can only force-pause a running game".into(),
            ));
        }
        self.status = GameStatus::Paused;
        self.resume_ready_player_id = None;
        Ok(())
    }

    fn forfeit(&mut self, player_id: &PlayerId) -> crate::Result<()> {
        self.require_member(player_id)?;
        let opponent = self.other_player(player_id)?.id.clone();
        self.status = GameStatus::Finished;
        self.winner_player_id = Some(opponent);
        Ok(())
    }

    /// Two-phase resume handshake (spec §4.H). `both_connected` must be
    /// supplied by the caller from the connection tracker — `Game` itself
    /// has no notion of transport connectivity.
    pub fn request_resume(
        &mut self,
        player_id: &PlayerId,
        both_connected: bool,
    ) -> crate::Result<ResumeOutcome> {
        self.require_member(player_id)?;

        match self.status {
            GameStatus::Waiting => Ok(ResumeOutcome::NoChange),
            GameStatus::Paused => match &self.resume_ready_player_id {
                None => {
                    self.resume_ready_player_id = Some(player_id.clone());
                    Ok(ResumeOutcome::Pending)
                }
                Some(existing) if existing == player_id => Ok(ResumeOutcome::AlreadyPending),
                Some(_other) => {
                    if !both_connected {
                        return Ok(ResumeOutcome::Pending);
                    }
                    self.resume_ready_player_id = None;
                    self.status = GameStatus::Running;
                    Ok(ResumeOutcome::Completed)
                }
            },
            _ => Err(Error::IllegalState(
                "resume is only valid while paused or waiting".into(),
            )),
        }
    }

    pub fn post_message(&mut self, message: ChatMessage) -> crate::Result<()> {
        self.require_member(&message.sender)?;
        self.messages.push(message);
        Ok(())
    }

    /// A per-player view that never reveals the opponent's placements.
    pub fn snapshot_for(&self, player_id: &PlayerId) -> crate::Result<GameSnapshot> {
        self.require_member(player_id)?;
        let own_board = self.boards.get(player_id).expect("member has a board");
        let opponent = self.players.iter().find(|p| &p.id != player_id);
        let opponent_board = opponent.and_then(|p| self.boards.get(&p.id));

        Ok(GameSnapshot {
            status: self.status,
            own_placements: own_board.placements().to_vec(),
            own_board_locked: own_board.is_locked(),
            opponent_name: opponent.map(|p| p.username.clone()),
            opponent_board_locked: opponent_board.map(Board::is_locked).unwrap_or(false),
            your_turn: self.current_turn_player_id.as_ref() == Some(player_id),
            shots_against_you: self
                .shots
                .iter()
                .filter(|s| &s.target_board == player_id)
                .cloned()
                .collect(),
            your_shots: self
                .shots
                .iter()
                .filter(|s| &s.shooter == player_id)
                .cloned()
                .collect(),
        })
    }
}

/// Per-player snapshot returned by the resume handshake and usable for any
/// "give me my view of the game" query. Deliberately excludes the
/// opponent's `ShipPlacement`s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub status: GameStatus,
    pub own_placements: Vec<ShipPlacement>,
    pub own_board_locked: bool,
    pub opponent_name: Option<String>,
    pub opponent_board_locked: bool,
    pub your_turn: bool,
    pub shots_against_you: Vec<Shot>,
    pub your_shots: Vec<Shot>,
}
