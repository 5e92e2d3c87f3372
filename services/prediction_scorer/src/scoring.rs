use serde::{Deserialize, Serialize};

use crate::types::{Match, Player, Prediction, SelectedPlayer, Target};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum UnscoredReason {
    /// The selected id is not on the match roster.
    NotInRoster,
    /// The player has no target for this match.
    NoTarget,
    /// A target exists but no result has been recorded yet.
    AwaitingResult,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind", content = "reason")]
pub enum Outcome {
    Hit,
    Miss,
    Unscored(UnscoredReason),
}

impl Outcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, Outcome::Hit)
    }
}

/// The hit rule shared by every scoring path: meeting the threshold counts.
pub fn evaluate(threshold: f64, actual_points: Option<f64>) -> Outcome {
    match actual_points {
        None => Outcome::Unscored(UnscoredReason::AwaitingResult),
        Some(actual) if actual >= threshold => Outcome::Hit,
        Some(_) => Outcome::Miss,
    }
}

/// `None` while the target has no recorded result.
pub fn is_hit(target: &Target) -> Option<bool> {
    target.actual_points.map(|actual| actual >= target.target)
}

/// A selection resolved to its target and recorded result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTarget<'a> {
    pub name: &'a str,
    pub unit: &'a str,
    pub threshold: f64,
    pub actual_points: Option<f64>,
}

/// Where a selection's target comes from.
pub trait TargetSource {
    fn resolve<'a>(&'a self, selection: &'a SelectedPlayer) -> Result<ResolvedTarget<'a>, UnscoredReason>;
}

/// Joins selections against `Player.matchTargets` on a borrowed roster.
#[derive(Debug, Clone, Copy)]
pub struct RosterTargets<'m> {
    match_id: &'m str,
    players: &'m [Player],
}

impl<'m> RosterTargets<'m> {
    /// Uses the roster attached to `game`.
    pub fn new(game: &'m Match) -> Self {
        Self::from_players(&game.id, &game.players)
    }

    /// Uses `players` as the roster for `match_id` without attaching it to a match.
    pub fn from_players(match_id: &'m str, players: &'m [Player]) -> Self {
        Self { match_id, players }
    }
}

impl TargetSource for RosterTargets<'_> {
    fn resolve<'a>(&'a self, selection: &'a SelectedPlayer) -> Result<ResolvedTarget<'a>, UnscoredReason> {
        let player = self
            .players
            .iter()
            .find(|p| p.id == selection.player_id())
            .ok_or(UnscoredReason::NotInRoster)?;
        let target = player
            .target_for(self.match_id)
            .ok_or(UnscoredReason::NoTarget)?;
        Ok(ResolvedTarget {
            name: &player.name,
            unit: &target.unit,
            threshold: target.target,
            actual_points: target.actual_points,
        })
    }
}

/// Reads the target copied into the prediction itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTargets;

impl TargetSource for EmbeddedTargets {
    fn resolve<'a>(&'a self, selection: &'a SelectedPlayer) -> Result<ResolvedTarget<'a>, UnscoredReason> {
        match selection {
            SelectedPlayer::Snapshot(snapshot) => {
                let threshold = snapshot.target.ok_or(UnscoredReason::NoTarget)?;
                Ok(ResolvedTarget {
                    name: &snapshot.name,
                    unit: &snapshot.unit,
                    threshold,
                    actual_points: snapshot.actual_points,
                })
            }
            SelectedPlayer::Id(_) => Err(UnscoredReason::NoTarget),
        }
    }
}

/// Embedded snapshot when it carries a target, otherwise the roster. A
/// snapshot without a result takes the result recorded on the roster, so
/// predictions stored in either shape score the same as the roster join.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedOrRoster<'m> {
    embedded: EmbeddedTargets,
    roster: RosterTargets<'m>,
}

impl<'m> EmbeddedOrRoster<'m> {
    pub fn new(game: &'m Match) -> Self {
        Self::from_roster(RosterTargets::new(game))
    }

    pub fn from_players(match_id: &'m str, players: &'m [Player]) -> Self {
        Self::from_roster(RosterTargets::from_players(match_id, players))
    }

    fn from_roster(roster: RosterTargets<'m>) -> Self {
        Self {
            embedded: EmbeddedTargets,
            roster,
        }
    }
}

impl TargetSource for EmbeddedOrRoster<'_> {
    fn resolve<'a>(&'a self, selection: &'a SelectedPlayer) -> Result<ResolvedTarget<'a>, UnscoredReason> {
        match self.embedded.resolve(selection) {
            Ok(mut resolved) => {
                if resolved.actual_points.is_none() {
                    resolved.actual_points = self
                        .roster
                        .resolve(selection)
                        .ok()
                        .and_then(|r| r.actual_points);
                }
                Ok(resolved)
            }
            Err(_) => self.roster.resolve(selection),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectionResult {
    pub player_id: String,
    pub player_name: Option<String>,
    pub unit: Option<String>,
    pub target: Option<f64>,
    pub actual_points: Option<f64>,
    pub outcome: Outcome,
}

/// Evaluate every selection, keeping the prediction's order.
pub fn evaluate_selections<S: TargetSource>(prediction: &Prediction, source: &S) -> Vec<SelectionResult> {
    prediction
        .selected_players
        .iter()
        .map(|selection| match source.resolve(selection) {
            Ok(resolved) => SelectionResult {
                player_id: selection.player_id().to_string(),
                player_name: Some(resolved.name.to_string()).filter(|n| !n.is_empty()),
                unit: Some(resolved.unit.to_string()),
                target: Some(resolved.threshold),
                actual_points: resolved.actual_points,
                outcome: evaluate(resolved.threshold, resolved.actual_points),
            },
            Err(reason) => SelectionResult {
                player_id: selection.player_id().to_string(),
                player_name: None,
                unit: None,
                target: None,
                actual_points: None,
                outcome: Outcome::Unscored(reason),
            },
        })
        .collect()
}

pub fn score_with<S: TargetSource>(prediction: &Prediction, source: &S) -> u32 {
    prediction
        .selected_players
        .iter()
        .filter(|selection| {
            source
                .resolve(selection)
                .map(|resolved| evaluate(resolved.threshold, resolved.actual_points).is_hit())
                .unwrap_or(false)
        })
        .count() as u32
}

/// Number of selected players that met their target in `game`.
pub fn score_prediction(prediction: &Prediction, game: &Match) -> u32 {
    score_with(prediction, &RosterTargets::new(game))
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreCard {
    pub correct: u32,
    pub missed: u32,
    pub unscored: u32,
    pub total: u32,
}

impl ScoreCard {
    pub fn from_results(results: &[SelectionResult]) -> Self {
        results.iter().fold(ScoreCard::default(), |mut card, result| {
            card.total += 1;
            match result.outcome {
                Outcome::Hit => card.correct += 1,
                Outcome::Miss => card.missed += 1,
                Outcome::Unscored(_) => card.unscored += 1,
            }
            card
        })
    }
}
