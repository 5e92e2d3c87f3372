use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ScoringError;
use crate::utils::parse_timestamp;

/// Status value the admin screens write once a match result is final.
pub const COMPLETED_STATUS: &str = "completed";
pub const UPCOMING_STATUS: &str = "upcoming";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PlayerRole {
    Batsman,
    Bowler,
    AllRounder,
    WicketKeeper,
    Auction,
}

impl PlayerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerRole::Batsman => "batsman",
            PlayerRole::Bowler => "bowler",
            PlayerRole::AllRounder => "all-rounder",
            PlayerRole::WicketKeeper => "wicket-keeper",
            PlayerRole::Auction => "auction",
        }
    }
}

impl fmt::Display for PlayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayerRole {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "batsman" => Ok(PlayerRole::Batsman),
            "bowler" => Ok(PlayerRole::Bowler),
            "all-rounder" | "allrounder" => Ok(PlayerRole::AllRounder),
            "wicket-keeper" | "wicketkeeper" => Ok(PlayerRole::WicketKeeper),
            "auction" => Ok(PlayerRole::Auction),
            other => Err(ScoringError::InvalidRole(other.to_string())),
        }
    }
}

/// A numeric threshold a player has to meet in one match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    #[serde(rename = "type", default)]
    pub unit: String,
    pub target: f64,
    /// Absent until the match result has been recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_points: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_selected: Option<bool>,
}

impl Target {
    pub fn new(unit: impl Into<String>, target: f64) -> Self {
        Self {
            unit: unit.into(),
            target,
            actual_points: None,
            is_selected: None,
        }
    }

    pub fn with_actual(mut self, actual_points: f64) -> Self {
        self.actual_points = Some(actual_points);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    pub team: String,
    pub role: PlayerRole,
    #[serde(default)]
    pub match_targets: BTreeMap<String, Target>,
}

impl Player {
    pub fn target_for(&self, match_id: &str) -> Option<&Target> {
        self.match_targets.get(match_id)
    }
}

/// A scheduled match. `players` is the roster attached from the player
/// collection and is never written back with the match document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", try_from = "MatchDocument")]
pub struct Match {
    pub id: String,
    pub team1: String,
    pub team2: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub status: String,
    #[serde(skip_serializing)]
    pub players: Vec<Player>,
}

impl Match {
    /// Heading shown for the match: its description, else "team1 vs team2".
    pub fn title(&self) -> String {
        match self.description.as_deref().map(str::trim) {
            Some(description) if !description.is_empty() => description.to_string(),
            _ => format!("{} vs {}", self.team1, self.team2),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == COMPLETED_STATUS
    }
}

/// Raw match record as exported from the document store. The timestamp may
/// be an RFC 3339 string, a `{seconds, nanoseconds}` object or epoch millis.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDocument {
    pub id: String,
    #[serde(default)]
    pub team1: String,
    #[serde(default)]
    pub team2: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub timestamp: Option<JsonValue>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub players: Vec<Player>,
}

impl TryFrom<MatchDocument> for Match {
    type Error = ScoringError;

    fn try_from(doc: MatchDocument) -> Result<Self, Self::Error> {
        let timestamp = match &doc.timestamp {
            Some(value) => parse_timestamp(value).map_err(|e| ScoringError::InvalidTimestamp {
                match_id: doc.id.clone(),
                reason: e.to_string(),
            })?,
            None => {
                return Err(ScoringError::InvalidTimestamp {
                    match_id: doc.id,
                    reason: "missing timestamp".to_string(),
                })
            }
        };

        Ok(Match {
            id: doc.id,
            team1: doc.team1,
            team2: doc.team2,
            description: doc.description,
            timestamp,
            status: doc.status.unwrap_or_else(|| UPCOMING_STATUS.to_string()),
            players: doc.players,
        })
    }
}

/// Compact view of a match carried on leaderboard entries and dashboard views.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub id: String,
    pub title: String,
    pub team1: String,
    pub team2: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
}

impl From<&Match> for MatchSummary {
    fn from(game: &Match) -> Self {
        Self {
            id: game.id.clone(),
            title: game.title(),
            team1: game.team1.clone(),
            team2: game.team2.clone(),
            timestamp: game.timestamp,
            status: game.status.clone(),
        }
    }
}

/// Player data copied into a prediction at submission time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub team: String,
    #[serde(rename = "type", default)]
    pub unit: String,
    #[serde(default)]
    pub target: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_points: Option<f64>,
}

/// One entry of `selectedPlayers`: either a bare player id or a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SelectedPlayer {
    Id(String),
    Snapshot(PlayerSnapshot),
}

impl SelectedPlayer {
    pub fn player_id(&self) -> &str {
        match self {
            SelectedPlayer::Id(id) => id,
            SelectedPlayer::Snapshot(snapshot) => &snapshot.id,
        }
    }
}

impl From<&str> for SelectedPlayer {
    fn from(id: &str) -> Self {
        SelectedPlayer::Id(id.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub user_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub match_id: String,
    #[serde(default)]
    pub selected_players: Vec<SelectedPlayer>,
}

impl Prediction {
    pub fn selection_count(&self) -> u32 {
        self.selected_players.len() as u32
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Upcoming,
    Live,
    Completed,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchStatus::Upcoming => "upcoming",
            MatchStatus::Live => "live",
            MatchStatus::Completed => "completed",
        };
        f.write_str(label)
    }
}
