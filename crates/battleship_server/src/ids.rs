use rand::distributions::Alphanumeric;
use rand::Rng;

use battleship_core::PlayerId;

/// Length of a lobby/game code. Short enough to read aloud, long enough that
/// two concurrently-created games never collide in practice.
const CODE_LEN: usize = 6;

/// Random bytes backing a resume token, hex-encoded. 16 bytes is 128 bits of
/// entropy, comfortably above the spec's "≥122 bits" floor.
const TOKEN_BYTES: usize = 16;

fn alphanumeric_code(rng: &mut impl Rng, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn generate_game_code() -> String {
    alphanumeric_code(&mut rand::thread_rng(), CODE_LEN)
}

pub fn generate_lobby_code() -> String {
    alphanumeric_code(&mut rand::thread_rng(), CODE_LEN)
}

/// Players are identified by an opaque, unguessable id minted here — never
/// by username, so duplicate usernames are unproblematic (spec §4.E).
pub fn generate_player_id() -> PlayerId {
    alphanumeric_code(&mut rand::thread_rng(), 12)
}

pub fn generate_resume_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}
