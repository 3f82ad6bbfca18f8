use std::time::Duration;

use battleship_core::GameConfig;

/// The four settings in spec §6, plus their env-var names and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub cleanup_interval: Duration,
    pub cleanup_threshold: Duration,
    pub disconnect_grace_period: Duration,
    pub scheduler_pool_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            cleanup_interval: Duration::from_millis(3_600_000),
            cleanup_threshold: Duration::from_secs(24 * 3_600),
            disconnect_grace_period: Duration::from_millis(10_000),
            scheduler_pool_size: 5,
        }
    }
}

impl ServerConfig {
    /// Reads `connection.cleanup.intervalMs`, `connection.cleanup.thresholdHours`,
    /// `disconnect.gracePeriodMs` and `scheduler.poolSize` from the process
    /// environment, falling back to the default for any key that is unset or
    /// fails to parse.
    pub fn from_env() -> Self {
        let defaults = ServerConfig::default();

        ServerConfig {
            cleanup_interval: env_millis(
                "CONNECTION_CLEANUP_INTERVAL_MS",
                defaults.cleanup_interval,
            ),
            cleanup_threshold: env_hours(
                "CONNECTION_CLEANUP_THRESHOLD_HOURS",
                defaults.cleanup_threshold,
            ),
            disconnect_grace_period: env_millis(
                "DISCONNECT_GRACE_PERIOD_MS",
                defaults.disconnect_grace_period,
            ),
            scheduler_pool_size: env_usize("SCHEDULER_POOL_SIZE", defaults.scheduler_pool_size),
        }
    }
}

fn env_millis(key: &str, default: Duration) -> Duration {
    env_parsed(key, default.as_millis() as u64)
        .map(Duration::from_millis)
        .unwrap_or(default)
}

fn env_hours(key: &str, default: Duration) -> Duration {
    env_parsed(key, default.as_secs() / 3_600)
        .map(|hours| Duration::from_secs(hours * 3_600))
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env_parsed(key, default as u64).map(|n| n as usize).unwrap_or(default)
}

fn env_parsed(key: &str, default: u64) -> Option<u64> {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("{key}={raw:?} is not a valid number, using default {default}");
                None
            }
        },
        Err(_) => None,
    }
}

/// Bundles `ServerConfig` with the game-rules config — mirrors the teacher's
/// `ConfigProvider` trait (`server_config()` / `game_config()`).
pub trait ConfigProvider: Send + Sync {
    fn server_config(&self) -> &ServerConfig;
    fn game_config(&self) -> &GameConfig;
}

mod default {
    use super::{ConfigProvider, ServerConfig};
    use battleship_core::GameConfig;

    pub struct DefaultConfigProvider {
        server: ServerConfig,
        game: GameConfig,
    }

    impl DefaultConfigProvider {
        pub fn new() -> Self {
            DefaultConfigProvider {
                server: ServerConfig::from_env(),
                game: GameConfig::default(),
            }
        }
    }

    impl ConfigProvider for DefaultConfigProvider {
        fn server_config(&self) -> &ServerConfig {
            &self.server
        }

        fn game_config(&self) -> &GameConfig {
            &self.game
        }
    }
}

pub fn default_config_provider() -> Box<dyn ConfigProvider> {
    Box::new(default::DefaultConfigProvider::new())
}
