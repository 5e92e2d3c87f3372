use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use serde_json::Value as JsonValue;
use std::path::PathBuf;
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use prediction_scorer::config::ScorerConfig;
use prediction_scorer::dashboard::{for_user_with_players, tabs};
use prediction_scorer::leaderboard::{build_leaderboard_with, completed_matches};
use prediction_scorer::report::{format_entry, format_match_view, write_leaderboard_csv_file};
use prediction_scorer::scoring::EmbeddedOrRoster;
use prediction_scorer::status::{classify, time_label};
use prediction_scorer::store::Snapshot;
use prediction_scorer::types::PlayerRole;
use prediction_scorer::utils::parse_timestamp;
use prediction_scorer::web::{self, AppState};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory with matches.json, players.json and predictions.json
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List matches with their current phase
    Matches,
    /// Rank predictions for a completed match
    Leaderboard {
        /// Defaults to the first completed match
        #[arg(short, long)]
        match_id: Option<String>,

        /// Also write the ranking to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Show one user's matches and picks
    Dashboard {
        #[arg(short, long)]
        user_id: String,
    },
    /// Serve the JSON API
    Serve,
    /// Edit players, matches and results
    Admin {
        #[command(subcommand)]
        action: AdminCommand,
    },
}

#[derive(Debug, Subcommand)]
enum AdminCommand {
    AddPlayer {
        #[arg(long)]
        name: String,
        #[arg(long)]
        team: String,
        /// batsman, bowler, all-rounder, wicket-keeper or auction
        #[arg(long, default_value = "batsman")]
        role: String,
    },
    CreateMatch {
        #[arg(long)]
        team1: String,
        #[arg(long)]
        team2: String,
        /// RFC 3339 or YYYY-MM-DDTHH:MM (UTC)
        #[arg(long)]
        timestamp: String,
        #[arg(long)]
        description: Option<String>,
    },
    SetTarget {
        #[arg(long)]
        player: String,
        #[arg(long)]
        match_id: String,
        #[arg(long)]
        target: f64,
        /// Defaults by role: wickets for bowlers, Cr for auction, runs otherwise
        #[arg(long)]
        unit: Option<String>,
    },
    RecordActual {
        #[arg(long)]
        player: String,
        #[arg(long)]
        match_id: String,
        #[arg(long)]
        actual: f64,
    },
    CompleteMatch {
        #[arg(long)]
        match_id: String,
    },
    Predict {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        match_id: String,
        /// Player ids, in pick order
        #[arg(long, num_args = 1.., value_delimiter = ',')]
        players: Vec<String>,
    },
}

fn print_matches(snapshot: &Snapshot) {
    let now = Utc::now();
    let mut matches: Vec<_> = snapshot.matches.iter().collect();
    matches.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    println!("Matches:");
    println!("========\n");
    for game in matches {
        println!(
            "{:<32} {:<10} {:<14} {} ({} predictions)",
            game.id,
            classify(game, now).to_string(),
            time_label(game.timestamp, now),
            game.title(),
            snapshot.predictions_for_match(&game.id).len()
        );
    }
}

fn print_leaderboard(
    snapshot: &Snapshot,
    config: &ScorerConfig,
    match_id: Option<String>,
    csv: Option<PathBuf>,
) -> Result<()> {
    let match_id = match match_id {
        Some(id) => id,
        None => completed_matches(&snapshot.matches)
            .first()
            .map(|m| m.id.clone())
            .ok_or_else(|| anyhow!("No completed matches yet"))?,
    };
    let game = snapshot
        .find_match(&match_id)
        .ok_or_else(|| anyhow!("Unknown match {}", match_id))?;
    if !game.is_completed() {
        warn!("Match {} is not completed; results may be partial", match_id);
    }

    let entries = build_leaderboard_with(
        &snapshot.predictions,
        &match_id,
        Some(game),
        &EmbeddedOrRoster::from_players(&game.id, &snapshot.players),
    );

    println!("Leaderboard: {}", game.title());
    println!("============\n");
    if entries.is_empty() {
        println!("No predictions found for this match");
    }
    for entry in &entries {
        println!("{}", format_entry(entry, config.leaderboard.podium_size));
    }

    if let Some(path) = csv {
        write_leaderboard_csv_file(&path, &entries)?;
        info!("Wrote {} entries to {:?}", entries.len(), path);
    }
    Ok(())
}

fn print_dashboard(snapshot: &Snapshot, user_id: &str) {
    let views = for_user_with_players(
        user_id,
        &snapshot.matches,
        &snapshot.players,
        &snapshot.predictions,
        Utc::now(),
    );
    let selections = views.iter().filter(|v| v.prediction.is_some()).count();
    let tabs = tabs(views);

    println!("{} - {} selections\n", user_id, selections);
    for (heading, views, empty) in [
        ("Upcoming", &tabs.upcoming, "No upcoming matches"),
        ("Live", &tabs.live, "No live matches"),
        ("Completed", &tabs.completed, "No completed matches yet"),
    ] {
        println!("{}", heading);
        println!("{}", "-".repeat(heading.len()));
        if views.is_empty() {
            println!("  {}", empty);
        }
        for view in views {
            println!("  {}", format_match_view(view));
        }
        println!();
    }
}

fn run_admin(snapshot: &mut Snapshot, action: AdminCommand) -> Result<()> {
    match action {
        AdminCommand::AddPlayer { name, team, role } => {
            let role: PlayerRole = role.parse()?;
            let id = snapshot.add_player(&name, &team, role)?;
            println!("Added player {}", id);
        }
        AdminCommand::CreateMatch {
            team1,
            team2,
            timestamp,
            description,
        } => {
            let timestamp = parse_timestamp(&JsonValue::String(timestamp))
                .context("Invalid match timestamp")?;
            let id = snapshot.create_match(&team1, &team2, description.as_deref(), timestamp)?;
            println!("Created match {}", id);
        }
        AdminCommand::SetTarget {
            player,
            match_id,
            target,
            unit,
        } => snapshot.set_target(&player, &match_id, unit.as_deref(), target)?,
        AdminCommand::RecordActual {
            player,
            match_id,
            actual,
        } => snapshot.record_actual(&player, &match_id, actual)?,
        AdminCommand::CompleteMatch { match_id } => snapshot.complete_match(&match_id)?,
        AdminCommand::Predict {
            user_id,
            email,
            match_id,
            players,
        } => {
            let players: Vec<&str> = players.iter().map(String::as_str).collect();
            let id = snapshot.submit_prediction(&user_id, &email, &match_id, &players, Utc::now())?;
            println!("Saved prediction {}", id);
        }
    }
    Ok(())
}

async fn serve(snapshot: Snapshot, config: ScorerConfig) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, shutting down");
        }
        let _ = shutdown_tx.send(());
    });

    web::serve(AppState::new(snapshot, config), shutdown_rx).await
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = ScorerConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.data.dir = dir;
    }

    let mut snapshot = Snapshot::load(&config.data.dir)
        .with_context(|| format!("Failed to load data from {:?}", config.data.dir))?;

    match cli.command {
        Commands::Matches => print_matches(&snapshot),
        Commands::Leaderboard { match_id, csv } => print_leaderboard(&snapshot, &config, match_id, csv)?,
        Commands::Dashboard { user_id } => print_dashboard(&snapshot, &user_id),
        Commands::Serve => serve(snapshot, config).await?,
        Commands::Admin { action } => {
            run_admin(&mut snapshot, action)?;
            snapshot.save(&config.data.dir)?;
        }
    }

    Ok(())
}
