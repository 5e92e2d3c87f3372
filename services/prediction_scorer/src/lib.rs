pub mod admin;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod leaderboard;
pub mod report;
pub mod scoring;
pub mod status;
pub mod store;
pub mod types;
pub mod utils;
pub mod web;
