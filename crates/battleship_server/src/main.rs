use std::sync::Arc;

use log::info;

use battleship_server::cleaner::spawn_cleaner;
use battleship_server::config_provider::default_config_provider;
use battleship_server::events::{EventPayload, GameEvent};
use battleship_server::lobby::Matchmaker;
use battleship_server::ports::EventSink;
use battleship_server::storage::memory::{
    InMemoryConnectionRepository, InMemoryEventSink, InMemoryGameRepository,
    InMemoryLobbyRepository, InMemoryResumeTokenRepository,
};

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    info!("Battleship server core startup");

    let cfg = default_config_provider();

    let games = Arc::new(InMemoryGameRepository::new());
    let lobbies = Arc::new(InMemoryLobbyRepository::new());
    let tokens = Arc::new(InMemoryResumeTokenRepository::new());
    let connections = Arc::new(InMemoryConnectionRepository::new());
    let events = Arc::new(InMemoryEventSink::new());

    // Warm-up publish to a throwaway topic before accepting client
    // connections, so the first real event doesn't pay first-publish
    // latency (spec §4.I).
    events.publish(GameEvent::new(
        "__warmup__",
        battleship_core::GameStatus::Waiting,
        EventPayload::WarmUp,
    ));

    let _matchmaker = Matchmaker::new(
        lobbies,
        games,
        tokens,
        events.clone(),
        cfg.game_config().clone(),
    );

    let cleaner = spawn_cleaner(
        connections,
        cfg.server_config().cleanup_interval,
        cfg.server_config().cleanup_threshold,
    );

    info!("Battleship server core ready — no HTTP/WebSocket transport is wired up in this crate; a downstream web-framework binary drives `Matchmaker`/`ConnectionTracker`/`ResumeCoordinator` through their public methods.");

    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down");
    cleaner.stop().await;
}
