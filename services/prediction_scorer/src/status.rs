use chrono::{DateTime, Utc};

use crate::types::{Match, MatchStatus};

const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;

/// Bucket a match relative to `now`. A future kickoff is always upcoming;
/// once started, only an explicit `completed` status moves it out of live.
pub fn classify(game: &Match, now: DateTime<Utc>) -> MatchStatus {
    if game.timestamp > now {
        MatchStatus::Upcoming
    } else if game.is_completed() {
        MatchStatus::Completed
    } else {
        MatchStatus::Live
    }
}

/// Whole hours from `now` until `timestamp`, rounded towards negative infinity.
pub fn hours_until(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (timestamp - now).num_milliseconds().div_euclid(MILLIS_PER_HOUR)
}

/// Short countdown label shown on match cards.
pub fn time_label(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let hours = hours_until(timestamp, now);
    if hours < 0 {
        "Started".to_string()
    } else if hours == 0 {
        "Starting soon".to_string()
    } else if hours < 24 {
        format!("{}h", hours)
    } else {
        format!("{}d", hours / 24)
    }
}
