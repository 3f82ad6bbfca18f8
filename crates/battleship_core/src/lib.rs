//! Pure, synchronous Battleship game model: coordinates, ships, board
//! placement, the fleet-definition grammar, shot resolution and the game
//! aggregate's state machine.
//!
//! Nothing in this crate touches I/O, async runtimes or locking — it is the
//! part of the server that can be fuzzed and unit tested in isolation.
//! The coordination layer (lobbies, connections, resume handshakes, event
//! fan-out) lives in `battleship_server` and is built on top of `Game`.

mod board;
mod coordinate;
mod error;
mod fleet;
mod game;
mod ids;
mod ship;
mod shot;

pub use board::Board;
pub use coordinate::Coordinate;
pub use error::Error;
pub use fleet::parse_fleet;
pub use game::{
    ChatMessage, Game, GameAction, GameActionOutcome, GameConfig, GameSnapshot, GameStatus, Player,
    ResumeOutcome, Shot,
};
pub use ids::PlayerId;
pub use ship::{Orientation, ShipKind, ShipPlacement};
pub use shot::{resolve_shot, ShotOutcome};

pub type Result<T> = std::result::Result<T, Error>;
