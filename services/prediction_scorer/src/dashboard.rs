use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::{evaluate_selections, RosterTargets, ScoreCard, SelectionResult};
use crate::status::{classify, time_label};
use crate::types::{Match, MatchStatus, MatchSummary, Player, Prediction};

/// One match card on a user's dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    #[serde(rename = "match")]
    pub game: MatchSummary,
    pub status: MatchStatus,
    pub time_label: String,
    pub prediction: Option<Prediction>,
    pub selections: Vec<SelectionResult>,
    pub score: ScoreCard,
}

impl MatchView {
    /// Hit/miss markers are only shown once the match has started.
    pub fn results_visible(&self) -> bool {
        self.status != MatchStatus::Upcoming
    }

    pub fn correct_predictions(&self) -> u32 {
        self.score.correct
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardTabs {
    pub upcoming: Vec<MatchView>,
    pub live: Vec<MatchView>,
    pub completed: Vec<MatchView>,
}

/// Build `user_id`'s dashboard: every match newest first, each paired with
/// the first prediction the user made for it. Each match is scored against
/// the roster attached to it.
pub fn for_user(
    user_id: &str,
    matches: &[Match],
    predictions: &[Prediction],
    now: DateTime<Utc>,
) -> Vec<MatchView> {
    build_views(user_id, matches, predictions, now, RosterTargets::new)
}

/// Like [`for_user`], with `players` as the roster of every match.
pub fn for_user_with_players(
    user_id: &str,
    matches: &[Match],
    players: &[Player],
    predictions: &[Prediction],
    now: DateTime<Utc>,
) -> Vec<MatchView> {
    build_views(user_id, matches, predictions, now, |game| {
        RosterTargets::from_players(&game.id, players)
    })
}

fn build_views<'m, F>(
    user_id: &str,
    matches: &'m [Match],
    predictions: &[Prediction],
    now: DateTime<Utc>,
    roster_for: F,
) -> Vec<MatchView>
where
    F: Fn(&'m Match) -> RosterTargets<'m>,
{
    let own: Vec<&Prediction> = predictions.iter().filter(|p| p.user_id == user_id).collect();

    let mut ordered: Vec<&'m Match> = matches.iter().collect();
    ordered.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    ordered
        .into_iter()
        .map(|game| {
            let prediction = own.iter().find(|p| p.match_id == game.id).copied();
            let selections = prediction
                .map(|p| evaluate_selections(p, &roster_for(game)))
                .unwrap_or_default();
            MatchView {
                game: MatchSummary::from(game),
                status: classify(game, now),
                time_label: time_label(game.timestamp, now),
                prediction: prediction.cloned(),
                score: ScoreCard::from_results(&selections),
                selections,
            }
        })
        .collect()
}

/// Split views into the three dashboard tabs, keeping their order.
pub fn tabs(views: Vec<MatchView>) -> DashboardTabs {
    views.into_iter().fold(DashboardTabs::default(), |mut tabs, view| {
        match view.status {
            MatchStatus::Upcoming => tabs.upcoming.push(view),
            MatchStatus::Live => tabs.live.push(view),
            MatchStatus::Completed => tabs.completed.push(view),
        }
        tabs
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{Outcome, UnscoredReason};
    use crate::types::{PlayerRole, SelectedPlayer, Target};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 10, 12, 0, 0).unwrap()
    }

    fn batsman(id: &str, targets: &[(&str, Target)]) -> Player {
        Player {
            id: id.to_string(),
            name: id.to_string(),
            team: "RR".to_string(),
            role: PlayerRole::Batsman,
            match_targets: targets
                .iter()
                .map(|(m, t)| (m.to_string(), t.clone()))
                .collect(),
        }
    }

    fn game(id: &str, offset: Duration, status: &str, players: Vec<Player>) -> Match {
        Match {
            id: id.to_string(),
            team1: "RR".to_string(),
            team2: "PBKS".to_string(),
            description: None,
            timestamp: now() + offset,
            status: status.to_string(),
            players,
        }
    }

    fn pick(user: &str, match_id: &str, ids: &[&str]) -> Prediction {
        Prediction {
            id: format!("{}-{}", user, match_id),
            user_id: user.to_string(),
            user_email: format!("{}@example.com", user),
            display_name: None,
            match_id: match_id.to_string(),
            selected_players: ids.iter().map(|id| SelectedPlayer::from(*id)).collect(),
        }
    }

    #[test]
    fn test_for_user_groups_and_orders() {
        let roster = vec![
            batsman("jos", &[("done", Target::new("runs", 30.0).with_actual(45.0))]),
            batsman("sanju", &[("done", Target::new("runs", 30.0).with_actual(12.0))]),
        ];
        let matches = vec![
            game("done", -Duration::hours(30), "completed", roster.clone()),
            game("next", Duration::hours(25), "upcoming", roster.clone()),
            game("now", -Duration::hours(1), "upcoming", roster),
        ];
        let predictions = vec![
            pick("other", "done", &["jos", "sanju"]),
            pick("me", "done", &["jos", "sanju", "ghost"]),
        ];

        let views = for_user("me", &matches, &predictions, now());
        assert_eq!(
            views.iter().map(|v| v.game.id.as_str()).collect::<Vec<_>>(),
            vec!["next", "now", "done"]
        );
        assert_eq!(views[0].status, MatchStatus::Upcoming);
        assert_eq!(views[0].time_label, "1d");
        assert!(views[0].prediction.is_none());
        assert!(!views[0].results_visible());
        assert_eq!(views[1].status, MatchStatus::Live);
        assert_eq!(views[1].time_label, "Started");

        let done = &views[2];
        assert_eq!(done.status, MatchStatus::Completed);
        assert_eq!(done.prediction.as_ref().unwrap().user_id, "me");
        assert_eq!(done.correct_predictions(), 1);
        assert_eq!(done.score.total, 3);
        assert_eq!(done.selections[2].outcome, Outcome::Unscored(UnscoredReason::NotInRoster));
    }

    #[test]
    fn test_first_prediction_wins_on_duplicates() {
        let matches = vec![game("m", Duration::hours(2), "upcoming", Vec::new())];
        let mut first = pick("me", "m", &["a"]);
        first.id = "first".to_string();
        let mut second = pick("me", "m", &["b"]);
        second.id = "second".to_string();

        let views = for_user("me", &matches, &[first, second], now());
        assert_eq!(views[0].prediction.as_ref().unwrap().id, "first");
    }

    #[test]
    fn test_shared_roster_scores_like_attached_roster() {
        let roster = vec![
            batsman("jos", &[("done", Target::new("runs", 30.0).with_actual(45.0))]),
            batsman("sanju", &[("done", Target::new("runs", 30.0).with_actual(12.0))]),
        ];
        let attached = vec![game("done", -Duration::hours(30), "completed", roster.clone())];
        let bare = vec![game("done", -Duration::hours(30), "completed", Vec::new())];
        let predictions = vec![pick("me", "done", &["jos", "sanju", "ghost"])];

        let shared = for_user_with_players("me", &bare, &roster, &predictions, now());
        assert_eq!(shared, for_user("me", &attached, &predictions, now()));
        assert_eq!(shared[0].correct_predictions(), 1);
    }

    #[test]
    fn test_tabs_partition() {
        let matches = vec![
            game("a", Duration::hours(5), "upcoming", Vec::new()),
            game("b", -Duration::hours(5), "live", Vec::new()),
            game("c", -Duration::hours(50), "completed", Vec::new()),
            game("d", Duration::hours(50), "upcoming", Vec::new()),
        ];
        let tabs = tabs(for_user("me", &matches, &[], now()));
        assert_eq!(
            tabs.upcoming.iter().map(|v| v.game.id.as_str()).collect::<Vec<_>>(),
            vec!["d", "a"]
        );
        assert_eq!(tabs.live.len(), 1);
        assert_eq!(tabs.completed[0].game.id, "c");
    }
}
