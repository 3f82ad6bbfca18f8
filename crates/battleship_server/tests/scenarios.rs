use std::sync::Arc;
use std::time::Duration;

use battleship_core::{Coordinate, GameConfig, GameStatus, Orientation, ShipKind, ShipPlacement, ShotOutcome};

use battleship_server::connection::ConnectionTracker;
use battleship_server::events::GameEventType;
use battleship_server::game_service::GameService;
use battleship_server::lobby::Matchmaker;
use battleship_server::ports::{GameRepository, ResumeTokenRepository};
use battleship_server::resume::ResumeCoordinator;
use battleship_server::storage::memory::{
    InMemoryConnectionRepository, InMemoryEventSink, InMemoryGameRepository, InMemoryLobbyRepository,
    InMemoryResumeTokenRepository,
};
use battleship_server::Error;

struct Harness {
    games: Arc<InMemoryGameRepository>,
    lobbies: Arc<InMemoryLobbyRepository>,
    tokens: Arc<InMemoryResumeTokenRepository>,
    connections: Arc<InMemoryConnectionRepository>,
    events: Arc<InMemoryEventSink>,
}

impl Harness {
    fn new() -> Self {
        Harness {
            games: Arc::new(InMemoryGameRepository::new()),
            lobbies: Arc::new(InMemoryLobbyRepository::new()),
            tokens: Arc::new(InMemoryResumeTokenRepository::new()),
            connections: Arc::new(InMemoryConnectionRepository::new()),
            events: Arc::new(InMemoryEventSink::new()),
        }
    }

    fn matchmaker(&self) -> Matchmaker {
        Matchmaker::new(
            self.lobbies.clone(),
            self.games.clone(),
            self.tokens.clone(),
            self.events.clone(),
            GameConfig::default(),
        )
    }

    fn game_service(&self) -> GameService {
        GameService::new(self.games.clone(), self.events.clone())
    }

    fn resume_coordinator(&self) -> ResumeCoordinator {
        ResumeCoordinator::new(
            self.games.clone(),
            self.connections.clone(),
            self.tokens.clone(),
            self.events.clone(),
        )
    }

    fn connection_tracker(&self) -> Arc<ConnectionTracker> {
        ConnectionTracker::new(
            self.connections.clone(),
            self.games.clone(),
            self.events.clone(),
            Duration::from_secs(10),
        )
    }

    fn event_types(&self, game_code: &str) -> Vec<GameEventType> {
        self.events
            .events_for(game_code)
            .iter()
            .map(|e| e.event_type())
            .collect()
    }

    fn count(&self, game_code: &str, event_type: GameEventType) -> usize {
        self.event_types(game_code)
            .into_iter()
            .filter(|t| *t == event_type)
            .count()
    }
}

#[tokio::test]
async fn matchmake_and_start() {
    let h = Harness::new();
    let matchmaker = h.matchmaker();

    let ray = matchmaker.auto_join("Ray".to_string()).await.unwrap();
    assert_eq!(ray.lobby.status, battleship_server::entities::LobbyStatus::Waiting);
    assert!(!ray.resume_token.is_empty());

    let max = matchmaker.auto_join("Max".to_string()).await.unwrap();
    assert_eq!(max.lobby.lobby_code, ray.lobby.lobby_code);
    assert_eq!(max.lobby.status, battleship_server::entities::LobbyStatus::Full);

    let game_code = ray.lobby.game_code.clone();
    {
        let game_lock = h.games.get(&game_code).await.unwrap();
        let game = game_lock.read().await;
        assert_eq!(game.status, GameStatus::Setup);
        // The fleet grammar "2x2,2x3,1x4,1x5" (count x size) describes six
        // ships — two destroyers, two cruisers, one battleship, one carrier.
        assert_eq!(game.board(&ray.player_id).unwrap().placements().len(), 6);
        assert_eq!(game.board(&max.player_id).unwrap().placements().len(), 6);
    }

    let service = h.game_service();
    service.confirm_board(&game_code, &ray.player_id).await.unwrap();
    service.confirm_board(&game_code, &max.player_id).await.unwrap();

    let game_lock = h.games.get(&game_code).await.unwrap();
    assert_eq!(game_lock.read().await.status, GameStatus::Running);
    assert_eq!(h.count(&game_code, GameEventType::GameStarted), 1);
}

/// Builds a two-player game with Max's board replaced by a lone carrier at
/// `(0,0)`-`(0,4)` vertical, both boards confirmed, Ray to move first.
async fn running_game_with_known_carrier(h: &Harness) -> (String, String, String) {
    let matchmaker = h.matchmaker();
    let ray = matchmaker.auto_join("Ray".to_string()).await.unwrap();
    let max = matchmaker.auto_join("Max".to_string()).await.unwrap();
    let game_code = ray.lobby.game_code.clone();

    {
        let game_lock = h.games.get(&game_code).await.unwrap();
        let mut game = game_lock.write().await;
        game.set_placements_for_testing(
            &max.player_id,
            vec![ShipPlacement::new(
                ShipKind::Carrier,
                Coordinate::new(0, 0),
                Orientation::Vertical,
            )],
        )
        .unwrap();
    }

    let service = h.game_service();
    service.confirm_board(&game_code, &ray.player_id).await.unwrap();
    service.confirm_board(&game_code, &max.player_id).await.unwrap();

    (game_code, ray.player_id, max.player_id)
}

#[tokio::test]
async fn shot_sequence_hits_keep_turn_miss_flips_and_sinking_is_reported() {
    let h = Harness::new();
    let service = h.game_service();
    let (game_code, ray, _max) = running_game_with_known_carrier(&h).await;

    let outcome = service.fire_shot(&game_code, &ray, Coordinate::new(0, 0)).await.unwrap();
    assert_eq!(outcome, ShotOutcome::Hit);

    for y in 1..4 {
        let outcome = service
            .fire_shot(&game_code, &ray, Coordinate::new(0, y))
            .await
            .unwrap();
        assert_eq!(outcome, ShotOutcome::Hit);
    }

    let outcome = service.fire_shot(&game_code, &ray, Coordinate::new(0, 4)).await.unwrap();
    assert_eq!(outcome, ShotOutcome::Sunk);

    let outcome = service.fire_shot(&game_code, &ray, Coordinate::new(5, 5)).await.unwrap();
    assert_eq!(outcome, ShotOutcome::Miss);

    assert_eq!(h.count(&game_code, GameEventType::ShotFired), 6);
    assert_eq!(h.count(&game_code, GameEventType::TurnChanged), 1);

    let game_lock = h.games.get(&game_code).await.unwrap();
    let game = game_lock.read().await;
    assert_eq!(game.current_turn_player_id, Some(opponent_of(&game, &ray)));
}

fn opponent_of(game: &battleship_core::Game, player_id: &str) -> String {
    game.players
        .iter()
        .map(|p| p.id.clone())
        .find(|id| id != player_id)
        .unwrap()
}

#[tokio::test]
async fn already_shot_is_not_recorded_twice_and_does_not_move_the_turn() {
    let h = Harness::new();
    let service = h.game_service();
    let (game_code, ray, _max) = running_game_with_known_carrier(&h).await;

    let first = service.fire_shot(&game_code, &ray, Coordinate::new(0, 0)).await.unwrap();
    assert_eq!(first, ShotOutcome::Hit);

    let second = service.fire_shot(&game_code, &ray, Coordinate::new(0, 0)).await.unwrap();
    assert_eq!(second, ShotOutcome::AlreadyShot);

    let game_lock = h.games.get(&game_code).await.unwrap();
    let game = game_lock.read().await;
    assert_eq!(game.shots.len(), 1);
    assert_eq!(game.current_turn_player_id, Some(ray));
}

#[tokio::test(start_paused = true)]
async fn disconnect_and_resume_follows_the_two_phase_handshake() {
    let h = Harness::new();
    let (game_code, ray, max) = running_game_with_known_carrier(&h).await;

    let tracker = h.connection_tracker();
    tracker
        .on_session_open(&game_code, &ray, "Ray", "ray-session".to_string())
        .await
        .unwrap();
    tracker
        .on_session_open(&game_code, &max, "Max", "max-session".to_string())
        .await
        .unwrap();

    let turn_before_pause = {
        let game_lock = h.games.get(&game_code).await.unwrap();
        game_lock.read().await.current_turn_player_id.clone()
    };

    tracker.on_session_close("ray-session".to_string()).await.unwrap();
    tokio::time::advance(Duration::from_secs(11)).await;
    tokio::task::yield_now().await;

    {
        let game_lock = h.games.get(&game_code).await.unwrap();
        assert_eq!(game_lock.read().await.status, GameStatus::Paused);
    }
    let types = h.event_types(&game_code);
    let disconnected_at = types.iter().position(|t| *t == GameEventType::PlayerDisconnected);
    let paused_at = types.iter().position(|t| *t == GameEventType::GamePaused);
    assert!(disconnected_at.is_some() && paused_at.is_some());
    assert!(disconnected_at.unwrap() < paused_at.unwrap());

    let token_ray = h.tokens.mint_for(&game_code, &ray).await.unwrap();
    let token_max = h.tokens.mint_for(&game_code, &max).await.unwrap();

    // Ray reconnects the transport before resuming — the handshake still
    // needs Max's resume request before it can complete.
    tracker
        .on_session_open(&game_code, &ray, "Ray", "ray-session-2".to_string())
        .await
        .unwrap();
    tracker
        .on_session_open(&game_code, &max, "Max", "max-session-2".to_string())
        .await
        .unwrap();

    let resume = h.resume_coordinator();
    let first = resume.resume(&token_ray).await.unwrap();
    assert!(!first.handshake_complete);
    assert_eq!(first.status, GameStatus::Paused);
    assert_eq!(h.count(&game_code, GameEventType::GameResumePending), 1);

    // Ray asking again before Max responds is a no-op: same status, no
    // duplicate event.
    let repeat = resume.resume(&token_ray).await.unwrap();
    assert!(!repeat.handshake_complete);
    assert_eq!(repeat.status, GameStatus::Paused);
    assert_eq!(h.count(&game_code, GameEventType::GameResumePending), 1);

    let second = resume.resume(&token_max).await.unwrap();
    assert!(second.handshake_complete);
    assert_eq!(second.status, GameStatus::Running);
    assert_eq!(h.count(&game_code, GameEventType::GameResumed), 1);

    let game_lock = h.games.get(&game_code).await.unwrap();
    assert_eq!(game_lock.read().await.current_turn_player_id, turn_before_pause);
}

#[tokio::test]
async fn forfeit_finishes_the_game_for_the_opponent() {
    let h = Harness::new();
    let service = h.game_service();
    let (game_code, ray, max) = running_game_with_known_carrier(&h).await;

    service.forfeit(&game_code, &ray).await.unwrap();

    let game_lock = h.games.get(&game_code).await.unwrap();
    let game = game_lock.read().await;
    assert_eq!(game.status, GameStatus::Finished);
    assert_eq!(game.winner_player_id, Some(max));

    let types = h.event_types(&game_code);
    let forfeited_at = types.iter().position(|t| *t == GameEventType::GameForfeited).unwrap();
    let finished_at = types.iter().position(|t| *t == GameEventType::GameFinished).unwrap();
    assert!(forfeited_at < finished_at);
}

#[tokio::test]
async fn unknown_resume_token_is_not_found() {
    let h = Harness::new();
    let resume = h.resume_coordinator();
    let err = resume.resume("bogus").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}
