use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::dashboard::MatchView;
use crate::leaderboard::LeaderboardEntry;
use crate::scoring::Outcome;

const LEADERBOARD_HEADER: &[&str] = &[
    "position",
    "user_id",
    "display_name",
    "user_email",
    "correct_predictions",
    "total_predictions",
    "accuracy",
    "match_id",
    "match_title",
];

pub fn write_leaderboard_csv<W: Write>(writer: W, entries: &[LeaderboardEntry]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(LEADERBOARD_HEADER)?;

    for entry in entries {
        wtr.write_record(&[
            &(entry.rank + 1).to_string(),
            &entry.user_id,
            &entry.display_name,
            &entry.user_email,
            &entry.correct_predictions.to_string(),
            &entry.total_predictions.to_string(),
            &format!("{:.1}", entry.accuracy),
            &entry.match_id,
            &entry
                .match_details
                .as_ref()
                .map(|m| m.title.clone())
                .unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_leaderboard_csv_file(path: &Path, entries: &[LeaderboardEntry]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    write_leaderboard_csv(file, entries)
}

/// One leaderboard line for terminal output.
pub fn format_entry(entry: &LeaderboardEntry, podium_size: usize) -> String {
    format!(
        "{}{:>3}. {} - {} correct out of {} ({:.0}%)",
        if entry.is_podium(podium_size) { "*" } else { " " },
        entry.rank + 1,
        entry.display_name,
        entry.correct_predictions,
        entry.total_predictions,
        entry.accuracy
    )
}

/// Match card summary for terminal output.
pub fn format_match_view(view: &MatchView) -> String {
    let mut out = format!("{} [{}] {}", view.game.title, view.status, view.time_label);
    match &view.prediction {
        None => out.push_str("\n    No selection"),
        Some(_) => {
            if view.results_visible() {
                out.push_str(&format!(
                    "\n    Result: {}/{}",
                    view.score.correct, view.score.total
                ));
            }
            for selection in &view.selections {
                let name = selection.player_name.as_deref().unwrap_or(&selection.player_id);
                let target = match (selection.target, selection.unit.as_deref()) {
                    (Some(target), Some(unit)) => format!("Target: {} {}", target, unit),
                    _ => "No target".to_string(),
                };
                let marker = match selection.outcome {
                    Outcome::Hit if view.results_visible() => " [hit]",
                    Outcome::Miss if view.results_visible() => " [miss]",
                    _ => "",
                };
                out.push_str(&format!("\n    - {} ({}){}", name, target, marker));
            }
        }
    }
    out
}
