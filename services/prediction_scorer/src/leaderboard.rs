use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::scoring::{score_with, EmbeddedTargets, TargetSource};
use crate::types::{Match, MatchSummary, Prediction};
use crate::utils::email_local_part;

/// Number of places that get a distinguished badge.
pub const DEFAULT_PODIUM_SIZE: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 0-based position after sorting.
    pub rank: usize,
    pub prediction_id: String,
    pub user_id: String,
    pub user_email: String,
    pub display_name: String,
    pub correct_predictions: u32,
    pub total_predictions: u32,
    pub accuracy: f64,
    pub match_id: String,
    pub match_details: Option<MatchSummary>,
}

impl LeaderboardEntry {
    pub fn is_podium(&self, podium_size: usize) -> bool {
        is_podium(self.rank, podium_size)
    }
}

pub fn is_podium(rank: usize, podium_size: usize) -> bool {
    rank < podium_size
}

/// Share of selections that hit, as a percentage. No selections is 0%.
pub fn accuracy_percent(correct: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * f64::from(correct) / f64::from(total)
    }
}

/// Upstream display name when present, else the email local part, else the user id.
pub fn display_name(prediction: &Prediction) -> String {
    if let Some(name) = prediction.display_name.as_deref().map(str::trim) {
        if !name.is_empty() {
            return name.to_string();
        }
    }
    let local = email_local_part(&prediction.user_email);
    if local.is_empty() {
        prediction.user_id.clone()
    } else {
        local.to_string()
    }
}

/// Matches the leaderboard can be shown for.
pub fn completed_matches(matches: &[Match]) -> Vec<&Match> {
    matches.iter().filter(|m| m.is_completed()).collect()
}

/// Rank predictions for `match_id` by the targets embedded in each prediction.
pub fn build_leaderboard(
    predictions: &[Prediction],
    match_id: &str,
    game: Option<&Match>,
) -> Vec<LeaderboardEntry> {
    build_leaderboard_with(predictions, match_id, game, &EmbeddedTargets)
}

/// Rank predictions for `match_id`, most hits first. Equal scores are ordered
/// by user id, then prediction id.
pub fn build_leaderboard_with<S: TargetSource>(
    predictions: &[Prediction],
    match_id: &str,
    game: Option<&Match>,
    source: &S,
) -> Vec<LeaderboardEntry> {
    let match_details = game.map(MatchSummary::from);
    let for_match: Vec<&Prediction> = predictions
        .iter()
        .filter(|p| p.match_id == match_id)
        .collect();

    let mut per_user: HashMap<&str, usize> = HashMap::new();
    for prediction in &for_match {
        *per_user.entry(prediction.user_id.as_str()).or_default() += 1;
    }
    for (user_id, count) in per_user.iter().filter(|(_, count)| **count > 1) {
        warn!(
            "User {} has {} predictions for match {}; ranking each separately",
            user_id, count, match_id
        );
    }

    let mut entries: Vec<LeaderboardEntry> = for_match
        .into_iter()
        .map(|prediction| {
            let correct = score_with(prediction, source);
            let total = prediction.selection_count();
            LeaderboardEntry {
                rank: 0,
                prediction_id: prediction.id.clone(),
                user_id: prediction.user_id.clone(),
                user_email: prediction.user_email.clone(),
                display_name: display_name(prediction),
                correct_predictions: correct,
                total_predictions: total,
                accuracy: accuracy_percent(correct, total),
                match_id: prediction.match_id.clone(),
                match_details: match_details.clone(),
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.correct_predictions
            .cmp(&a.correct_predictions)
            .then_with(|| a.user_id.cmp(&b.user_id))
            .then_with(|| a.prediction_id.cmp(&b.prediction_id))
    });
    for (rank, entry) in entries.iter_mut().enumerate() {
        entry.rank = rank;
    }

    debug!("Built leaderboard for match {} with {} entries", match_id, entries.len());
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{score_prediction, EmbeddedOrRoster, RosterTargets};
    use crate::types::{Player, PlayerRole, PlayerSnapshot, SelectedPlayer, Target};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn snapshot(id: &str, target: f64, actual: Option<f64>) -> SelectedPlayer {
        SelectedPlayer::Snapshot(PlayerSnapshot {
            id: id.to_string(),
            name: id.to_string(),
            team: "MI".to_string(),
            unit: "runs".to_string(),
            target: Some(target),
            actual_points: actual,
        })
    }

    fn prediction(id: &str, user: &str, match_id: &str, hits: usize, misses: usize) -> Prediction {
        let mut selected = Vec::new();
        for i in 0..hits {
            selected.push(snapshot(&format!("h{}", i), 10.0, Some(10.0)));
        }
        for i in 0..misses {
            selected.push(snapshot(&format!("m{}", i), 10.0, Some(3.0)));
        }
        Prediction {
            id: id.to_string(),
            user_id: user.to_string(),
            user_email: format!("{}@example.com", user),
            display_name: None,
            match_id: match_id.to_string(),
            selected_players: selected,
        }
    }

    #[test]
    fn test_sorted_by_correct_descending() {
        let predictions = vec![
            prediction("a", "carol", "m1", 1, 4),
            prediction("b", "alice", "m1", 4, 1),
            prediction("c", "bob", "m1", 2, 3),
            prediction("d", "dave", "m2", 5, 0),
        ];
        let board = build_leaderboard(&predictions, "m1", None);

        assert_eq!(
            board.iter().map(|e| e.user_id.as_str()).collect::<Vec<_>>(),
            vec!["alice", "bob", "carol"]
        );
        assert_eq!(board.iter().map(|e| e.rank).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(board.windows(2).all(|w| w[0].correct_predictions >= w[1].correct_predictions));
        assert_eq!(board[0].accuracy, 80.0);
        assert_eq!(board[0].display_name, "alice");
    }

    #[test]
    fn test_ties_break_by_user_id() {
        let predictions = vec![
            prediction("p3", "zed", "m1", 2, 3),
            prediction("p1", "amy", "m1", 2, 3),
            prediction("p2", "max", "m1", 2, 3),
        ];
        let board = build_leaderboard(&predictions, "m1", None);
        assert_eq!(
            board.iter().map(|e| e.user_id.as_str()).collect::<Vec<_>>(),
            vec!["amy", "max", "zed"]
        );

        let mut reversed = predictions.clone();
        reversed.reverse();
        assert_eq!(build_leaderboard(&reversed, "m1", None), board);
    }

    #[test]
    fn test_duplicate_predictions_are_kept() {
        let predictions = vec![
            prediction("late", "amy", "m1", 3, 2),
            prediction("early", "amy", "m1", 1, 4),
        ];
        let board = build_leaderboard(&predictions, "m1", None);
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].prediction_id, "late");
    }

    #[test]
    fn test_empty_selection_has_zero_accuracy() {
        let board = build_leaderboard(&[prediction("p", "amy", "m1", 0, 0)], "m1", None);
        assert_eq!(board[0].correct_predictions, 0);
        assert_eq!(board[0].total_predictions, 0);
        assert_eq!(board[0].accuracy, 0.0);
    }

    #[test]
    fn test_accuracy_is_a_ratio_not_fixed_multiplier() {
        assert_eq!(accuracy_percent(3, 3), 100.0);
        assert_eq!(accuracy_percent(1, 4), 25.0);
        assert_eq!(accuracy_percent(0, 0), 0.0);
    }

    #[test]
    fn test_unrecorded_results_do_not_count() {
        let mut p = prediction("p", "amy", "m1", 1, 0);
        p.selected_players.push(snapshot("pending", 5.0, None));
        let board = build_leaderboard(&[p], "m1", None);
        assert_eq!(board[0].correct_predictions, 1);
        assert_eq!(board[0].total_predictions, 2);
        assert_eq!(board[0].accuracy, 50.0);
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut p = prediction("p", "u1", "m1", 0, 0);
        p.user_email = "priya.s@example.com".to_string();
        assert_eq!(display_name(&p), "priya.s");
        p.display_name = Some("Priya".to_string());
        assert_eq!(display_name(&p), "Priya");
        p.display_name = None;
        p.user_email = String::new();
        assert_eq!(display_name(&p), "u1");
    }

    #[test]
    fn test_match_details_and_podium() {
        let game = Match {
            id: "m1".to_string(),
            team1: "GT".to_string(),
            team2: "LSG".to_string(),
            description: None,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap(),
            status: "completed".to_string(),
            players: Vec::new(),
        };
        let predictions: Vec<Prediction> = (0..5)
            .map(|i| prediction(&format!("p{}", i), &format!("user{}", i), "m1", i, 5 - i))
            .collect();
        let board = build_leaderboard(&predictions, "m1", Some(&game));

        assert_eq!(board[0].match_details.as_ref().unwrap().title, "GT vs LSG");
        assert_eq!(
            board.iter().filter(|e| e.is_podium(DEFAULT_PODIUM_SIZE)).count(),
            3
        );
        assert_eq!(board[0].user_id, "user4");
    }

    #[test]
    fn test_roster_source_for_bare_id_predictions() {
        let game = Match {
            id: "m1".to_string(),
            team1: "GT".to_string(),
            team2: "LSG".to_string(),
            description: None,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap(),
            status: "completed".to_string(),
            players: vec![Player {
                id: "shubman-gill".to_string(),
                name: "Shubman Gill".to_string(),
                team: "GT".to_string(),
                role: PlayerRole::Batsman,
                match_targets: [("m1".to_string(), Target::new("runs", 40.0).with_actual(41.0))]
                    .into_iter()
                    .collect(),
            }],
        };
        let p = Prediction {
            id: "p".to_string(),
            user_id: "u".to_string(),
            user_email: "u@example.com".to_string(),
            display_name: None,
            match_id: "m1".to_string(),
            selected_players: vec![SelectedPlayer::from("shubman-gill")],
        };

        assert_eq!(build_leaderboard(&[p.clone()], "m1", Some(&game))[0].correct_predictions, 0);
        let board = build_leaderboard_with(&[p], "m1", Some(&game), &RosterTargets::new(&game));
        assert_eq!(board[0].correct_predictions, 1);
    }

    #[test]
    fn test_stale_snapshots_rank_like_the_roster_join() {
        let game = Match {
            id: "m1".to_string(),
            team1: "GT".to_string(),
            team2: "LSG".to_string(),
            description: None,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap(),
            status: "completed".to_string(),
            players: vec![Player {
                id: "shubman-gill".to_string(),
                name: "Shubman Gill".to_string(),
                team: "GT".to_string(),
                role: PlayerRole::Batsman,
                match_targets: [("m1".to_string(), Target::new("runs", 50.0).with_actual(60.0))]
                    .into_iter()
                    .collect(),
            }],
        };
        let p = Prediction {
            id: "p".to_string(),
            user_id: "u".to_string(),
            user_email: "u@example.com".to_string(),
            display_name: None,
            match_id: "m1".to_string(),
            selected_players: vec![SelectedPlayer::Snapshot(PlayerSnapshot {
                id: "shubman-gill".to_string(),
                name: "Shubman Gill".to_string(),
                team: "GT".to_string(),
                unit: "runs".to_string(),
                target: Some(50.0),
                actual_points: None,
            })],
        };

        assert_eq!(score_prediction(&p, &game), 1);
        let board = build_leaderboard_with(&[p], "m1", Some(&game), &EmbeddedOrRoster::new(&game));
        assert_eq!(board[0].correct_predictions, 1);
        assert_eq!(board[0].accuracy, 100.0);
    }

    #[test]
    fn test_completed_matches_filter() {
        let mk = |id: &str, status: &str| Match {
            id: id.to_string(),
            team1: "A".to_string(),
            team2: "B".to_string(),
            description: None,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap(),
            status: status.to_string(),
            players: Vec::new(),
        };
        let matches = vec![mk("m1", "completed"), mk("m2", "live"), mk("m3", "completed")];
        let ids: Vec<&str> = completed_matches(&matches).iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m3"]);
    }
}
