use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::leaderboard::DEFAULT_PODIUM_SIZE;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataConfig {
    /// Directory holding `matches.json`, `players.json` and `predictions.json`.
    pub dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardConfig {
    pub podium_size: usize,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            podium_size: DEFAULT_PODIUM_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScorerConfig {
    pub data: DataConfig,
    pub server: ServerConfig,
    pub leaderboard: LeaderboardConfig,
}

impl ScorerConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("SCORER_DATA_DIR") {
            config.data.dir = PathBuf::from(dir);
        }
        if let Ok(host) = env::var("SCORER_HOST") {
            config.server.host = host;
        }
        if let Ok(Some(port)) = env::var("SCORER_PORT").map_or(Ok(None), |p| p.parse::<u16>().map(Some)) {
            config.server.port = port;
        }
        if let Ok(Some(size)) = env::var("SCORER_PODIUM_SIZE").map_or(Ok(None), |s| s.parse::<usize>().map(Some)) {
            config.leaderboard.podium_size = size;
        }

        config
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
