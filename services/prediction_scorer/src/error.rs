use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid timestamp on match {match_id}: {reason}")]
    InvalidTimestamp { match_id: String, reason: String },

    #[error("Invalid player role: {0}")]
    InvalidRole(String),

    #[error("Invalid player name: {0:?}")]
    InvalidName(String),

    #[error("Unknown match {0}")]
    UnknownMatch(String),

    #[error("Unknown player {0}")]
    UnknownPlayer(String),

    #[error("Player {player_id} has no target for match {match_id}")]
    MissingTarget { player_id: String, match_id: String },

    #[error("{collection} already contains {id}")]
    DuplicateId { collection: &'static str, id: String },

    #[error("Predictions are closed for match {0}")]
    PredictionsClosed(String),
}

pub type Result<T> = std::result::Result<T, ScoringError>;
