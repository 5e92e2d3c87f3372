use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{debug, info};

use crate::error::Result;
use crate::types::{Match, MatchDocument, Player, Prediction};

pub const MATCHES_FILE: &str = "matches.json";
pub const PLAYERS_FILE: &str = "players.json";
pub const PREDICTIONS_FILE: &str = "predictions.json";

/// In-memory copy of the `matches`, `players` and `predictions` collections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub matches: Vec<Match>,
    pub players: Vec<Player>,
    pub predictions: Vec<Prediction>,
}

impl Snapshot {
    /// Load the three collections from `dir`. A missing file is an empty
    /// collection; a match with an unusable timestamp fails the whole load.
    pub fn load(dir: &Path) -> Result<Self> {
        let documents: Vec<MatchDocument> = read_collection(dir, MATCHES_FILE)?;
        let matches = documents
            .into_iter()
            .map(Match::try_from)
            .collect::<Result<Vec<_>>>()?;
        let players: Vec<Player> = read_collection(dir, PLAYERS_FILE)?;
        let predictions: Vec<Prediction> = read_collection(dir, PREDICTIONS_FILE)?;

        info!(
            "Loaded {} matches, {} players, {} predictions from {:?}",
            matches.len(),
            players.len(),
            predictions.len(),
            dir
        );

        Ok(Self {
            matches,
            players,
            predictions,
        })
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        write_collection(dir, MATCHES_FILE, &self.matches)?;
        write_collection(dir, PLAYERS_FILE, &self.players)?;
        write_collection(dir, PREDICTIONS_FILE, &self.predictions)?;
        info!("Saved snapshot to {:?}", dir);
        Ok(())
    }

    pub fn find_match(&self, match_id: &str) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == match_id)
    }

    pub fn find_player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    /// An owned copy of the match with the full player collection attached
    /// as its roster. Scoring paths that only read should borrow
    /// `self.players` through `RosterTargets::from_players` instead.
    pub fn match_with_roster(&self, match_id: &str) -> Option<Match> {
        self.find_match(match_id).map(|game| Match {
            players: self.players.clone(),
            ..game.clone()
        })
    }

    pub fn predictions_for_match(&self, match_id: &str) -> Vec<&Prediction> {
        self.predictions.iter().filter(|p| p.match_id == match_id).collect()
    }

    /// Distinct team names in first-seen order.
    pub fn teams(&self) -> Vec<String> {
        let mut teams: Vec<String> = Vec::new();
        for player in &self.players {
            if !teams.contains(&player.team) {
                teams.push(player.team.clone());
            }
        }
        teams
    }

    pub fn players_in_team(&self, team: &str) -> Vec<&Player> {
        self.players.iter().filter(|p| p.team == team).collect()
    }
}

fn read_collection<T: DeserializeOwned>(dir: &Path, file_name: &str) -> Result<Vec<T>> {
    let path = dir.join(file_name);
    if !path.exists() {
        debug!("No {:?}, starting with an empty collection", path);
        return Ok(Vec::new());
    }
    let reader = BufReader::new(File::open(&path)?);
    Ok(serde_json::from_reader(reader)?)
}

fn write_collection<T: Serialize>(dir: &Path, file_name: &str, items: &[T]) -> Result<()> {
    let writer = BufWriter::new(File::create(dir.join(file_name))?);
    serde_json::to_writer_pretty(writer, items)?;
    Ok(())
}
