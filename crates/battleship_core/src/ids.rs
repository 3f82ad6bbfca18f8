/// Opaque, unguessable public identifiers. All are plain strings minted by
/// the coordination layer (`battleship_server`) — this crate never
/// generates them itself, it only carries them.
pub type PlayerId = String;
