//! Administrative writes against a [`Snapshot`]: the same edits the admin
//! screens make to the document store.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::{Result, ScoringError};
use crate::status::classify;
use crate::store::Snapshot;
use crate::types::{
    Match, MatchStatus, Player, PlayerRole, PlayerSnapshot, Prediction, SelectedPlayer, Target,
    COMPLETED_STATUS, UPCOMING_STATUS,
};
use crate::utils::slugify;

/// Unit a new target gets when the admin does not pick one.
pub fn default_target_type(role: PlayerRole) -> &'static str {
    match role {
        PlayerRole::Bowler => "wickets",
        PlayerRole::Auction => "Cr",
        _ => "runs",
    }
}

/// Prediction document id; one per user and match.
pub fn prediction_id(user_id: &str, match_id: &str) -> String {
    format!("{}_{}", user_id, match_id)
}

impl Snapshot {
    fn player_mut(&mut self, player_id: &str) -> Result<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or_else(|| ScoringError::UnknownPlayer(player_id.to_string()))
    }

    fn match_mut(&mut self, match_id: &str) -> Result<&mut Match> {
        self.matches
            .iter_mut()
            .find(|m| m.id == match_id)
            .ok_or_else(|| ScoringError::UnknownMatch(match_id.to_string()))
    }

    /// Add a player with no targets. The id is the slug of the name.
    pub fn add_player(&mut self, name: &str, team: &str, role: PlayerRole) -> Result<String> {
        let id = slugify(name);
        if id.is_empty() {
            return Err(ScoringError::InvalidName(name.to_string()));
        }
        if self.find_player(&id).is_some() {
            return Err(ScoringError::DuplicateId { collection: "players", id });
        }

        self.players.push(Player {
            id: id.clone(),
            name: name.trim().to_string(),
            team: team.trim().to_string(),
            role,
            match_targets: Default::default(),
        });
        info!("Added player {} ({}, {})", id, team, role);
        Ok(id)
    }

    /// Rename or move a player. Snapshots already embedded in predictions
    /// pick up the new name and team.
    pub fn update_player(&mut self, player_id: &str, name: &str, team: &str, role: PlayerRole) -> Result<()> {
        let player = self.player_mut(player_id)?;
        player.name = name.trim().to_string();
        player.team = team.trim().to_string();
        player.role = role;
        let (name, team) = (player.name.clone(), player.team.clone());

        let mut refreshed = 0;
        for selection in self.predictions.iter_mut().flat_map(|p| p.selected_players.iter_mut()) {
            if let SelectedPlayer::Snapshot(snapshot) = selection {
                if snapshot.id == player_id && (snapshot.name != name || snapshot.team != team) {
                    snapshot.name = name.clone();
                    snapshot.team = team.clone();
                    refreshed += 1;
                }
            }
        }
        info!(
            "Updated player {} ({}, {}); refreshed {} prediction snapshots",
            player_id, team, role, refreshed
        );
        Ok(())
    }

    pub fn delete_player(&mut self, player_id: &str) -> Result<Player> {
        let index = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or_else(|| ScoringError::UnknownPlayer(player_id.to_string()))?;
        info!("Deleted player {}", player_id);
        Ok(self.players.remove(index))
    }

    /// Set a player's target for a match. A result already recorded is kept.
    pub fn set_target(&mut self, player_id: &str, match_id: &str, unit: Option<&str>, target: f64) -> Result<()> {
        if self.find_match(match_id).is_none() {
            return Err(ScoringError::UnknownMatch(match_id.to_string()));
        }
        let player = self.player_mut(player_id)?;
        let unit = unit
            .map(str::to_string)
            .unwrap_or_else(|| default_target_type(player.role).to_string());

        let entry = player
            .match_targets
            .entry(match_id.to_string())
            .or_insert_with(|| Target::new(unit.clone(), target));
        entry.unit = unit;
        entry.target = target;
        entry.is_selected = Some(true);

        self.refresh_prediction_snapshots(match_id);
        Ok(())
    }

    /// Record how a player actually performed in a match.
    pub fn record_actual(&mut self, player_id: &str, match_id: &str, actual_points: f64) -> Result<()> {
        let player = self.player_mut(player_id)?;
        let target = player
            .match_targets
            .get_mut(match_id)
            .ok_or_else(|| ScoringError::MissingTarget {
                player_id: player_id.to_string(),
                match_id: match_id.to_string(),
            })?;
        target.actual_points = Some(actual_points);
        info!(
            "Recorded {} {} for {} in match {} (target {})",
            actual_points, target.unit, player_id, match_id, target.target
        );

        self.refresh_prediction_snapshots(match_id);
        Ok(())
    }

    /// Schedule a match. The id is derived from the teams and kickoff time.
    pub fn create_match(
        &mut self,
        team1: &str,
        team2: &str,
        description: Option<&str>,
        timestamp: DateTime<Utc>,
    ) -> Result<String> {
        let id = slugify(&format!("{} vs {} {}", team1, team2, timestamp.format("%Y%m%d%H%M")));
        if self.find_match(&id).is_some() {
            return Err(ScoringError::DuplicateId { collection: "matches", id });
        }

        self.matches.push(Match {
            id: id.clone(),
            team1: team1.trim().to_string(),
            team2: team2.trim().to_string(),
            description: description.map(str::trim).filter(|d| !d.is_empty()).map(str::to_string),
            timestamp,
            status: UPCOMING_STATUS.to_string(),
            players: Vec::new(),
        });
        info!("Created match {}", id);
        Ok(id)
    }

    pub fn set_match_status(&mut self, match_id: &str, status: &str) -> Result<()> {
        let game = self.match_mut(match_id)?;
        game.status = status.trim().to_string();
        info!("Match {} is now {}", match_id, game.status);
        Ok(())
    }

    pub fn complete_match(&mut self, match_id: &str) -> Result<()> {
        self.set_match_status(match_id, COMPLETED_STATUS)
    }

    /// Remove a match document. Predictions and targets referencing it stay,
    /// as they do in the document store.
    pub fn delete_match(&mut self, match_id: &str) -> Result<Match> {
        let index = self
            .matches
            .iter()
            .position(|m| m.id == match_id)
            .ok_or_else(|| ScoringError::UnknownMatch(match_id.to_string()))?;
        let orphaned = self.predictions_for_match(match_id).len();
        if orphaned > 0 {
            warn!("Deleting match {} leaves {} predictions behind", match_id, orphaned);
        }
        Ok(self.matches.remove(index))
    }

    /// Store a user's picks for an upcoming match, copying each player's
    /// current target into the prediction. A second submission by the same
    /// user for the same match replaces the first.
    pub fn submit_prediction(
        &mut self,
        user_id: &str,
        user_email: &str,
        match_id: &str,
        player_ids: &[&str],
        now: DateTime<Utc>,
    ) -> Result<String> {
        let game = self
            .find_match(match_id)
            .ok_or_else(|| ScoringError::UnknownMatch(match_id.to_string()))?;
        if classify(game, now) != MatchStatus::Upcoming {
            return Err(ScoringError::PredictionsClosed(match_id.to_string()));
        }

        let selected_players = player_ids
            .iter()
            .map(|id| -> Result<SelectedPlayer> {
                let player = self
                    .find_player(id)
                    .ok_or_else(|| ScoringError::UnknownPlayer(id.to_string()))?;
                let target = player.target_for(match_id);
                Ok(SelectedPlayer::Snapshot(PlayerSnapshot {
                    id: player.id.clone(),
                    name: player.name.clone(),
                    team: player.team.clone(),
                    unit: target.map(|t| t.unit.clone()).unwrap_or_default(),
                    target: target.map(|t| t.target),
                    actual_points: target.and_then(|t| t.actual_points),
                }))
            })
            .collect::<Result<Vec<_>>>()?;

        let before = self.predictions.len();
        self.predictions
            .retain(|p| !(p.user_id == user_id && p.match_id == match_id));
        if self.predictions.len() != before {
            info!("Replacing prediction of {} for match {}", user_id, match_id);
        }

        let id = prediction_id(user_id, match_id);
        self.predictions.push(Prediction {
            id: id.clone(),
            user_id: user_id.to_string(),
            user_email: user_email.to_string(),
            display_name: None,
            match_id: match_id.to_string(),
            selected_players,
        });
        Ok(id)
    }

    /// Copy recorded results into the player snapshots embedded in predictions
    /// for `match_id`. A snapshot keeps the target it was picked against; one
    /// taken before any target existed gets the current target. Returns how
    /// many snapshots changed.
    pub fn refresh_prediction_snapshots(&mut self, match_id: &str) -> usize {
        let players = &self.players;
        let mut changed = 0;
        for prediction in self.predictions.iter_mut().filter(|p| p.match_id == match_id) {
            for selection in prediction.selected_players.iter_mut() {
                let SelectedPlayer::Snapshot(snapshot) = selection else {
                    continue;
                };
                let Some(target) = players
                    .iter()
                    .find(|p| p.id == snapshot.id)
                    .and_then(|p| p.target_for(match_id))
                else {
                    continue;
                };
                let mut updated = false;
                if snapshot.target.is_none() {
                    snapshot.target = Some(target.target);
                    snapshot.unit = target.unit.clone();
                    updated = true;
                }
                if snapshot.actual_points != target.actual_points {
                    snapshot.actual_points = target.actual_points;
                    updated = true;
                }
                if updated {
                    changed += 1;
                }
            }
        }
        changed
    }
}
