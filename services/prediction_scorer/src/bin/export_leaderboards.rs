use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::{error, info};

use prediction_scorer::config::ScorerConfig;
use prediction_scorer::leaderboard::{build_leaderboard_with, completed_matches};
use prediction_scorer::report::write_leaderboard_csv_file;
use prediction_scorer::scoring::EmbeddedOrRoster;
use prediction_scorer::store::Snapshot;

/// Write one leaderboard CSV per completed match.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory with the exported collections
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(short, long, default_value = "leaderboards")]
    output_dir: PathBuf,

    /// Only export the first N completed matches
    #[arg(short, long)]
    limit: Option<usize>,
}

fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = ScorerConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.data.dir = dir;
    }

    let snapshot = Snapshot::load(&config.data.dir)?;
    let mut completed = completed_matches(&snapshot.matches);
    if let Some(limit) = cli.limit {
        completed.truncate(limit);
    }
    info!("Exporting {} completed matches to {:?}", completed.len(), cli.output_dir);

    let mut written = 0;
    for game in completed {
        let entries = build_leaderboard_with(
            &snapshot.predictions,
            &game.id,
            Some(game),
            &EmbeddedOrRoster::from_players(&game.id, &snapshot.players),
        );
        if entries.is_empty() {
            info!("Skipping {}: no predictions", game.id);
            continue;
        }

        let path = cli.output_dir.join(format!("{}.csv", game.id));
        match write_leaderboard_csv_file(&path, &entries) {
            Ok(()) => written += 1,
            Err(e) => error!("Failed to write {:?}: {}", path, e),
        }
    }

    println!("Wrote {} leaderboard files", written);
    Ok(())
}
