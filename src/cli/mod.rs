use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::catalog::{Catalog, ItunesCatalog};
use crate::config;
use crate::domain::ids::AlbumId;
use crate::http::server::HttpServer;
use crate::ranking::{AlbumStats, Leaderboard, dashboard, star_score};
use crate::storage::operations::Storage;

#[derive(Parser)]
#[command(name = "albumclub")]
#[command(version = "0.1")]
#[command(about = "Album rating club: submissions, ratings and rankings")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve,
    /// List submitted albums with their mean rating
    Albums,
    /// Show the leaderboard
    Stats,
    /// Show the ranked tracks of one album
    AlbumStats {
        /// Album id as stored in the database
        id: i64,
    },
    /// Search the music catalog
    Search {
        query: String,
    },
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let cfg = config::Config::load(&cli.config.to_string_lossy())?;

    match &cli.command {
        Commands::Serve => {
            println!("Starting HTTP server...");

            let storage =
                Storage::new(&cfg.database).context("Failed to initialize storage")?;
            let catalog =
                ItunesCatalog::new(&cfg.catalog).context("Failed to build catalog client")?;

            let http_server = HttpServer::new(storage, Box::new(catalog), cfg.http, cfg.ranking);

            println!(
                "HTTP server running at http://{}:{}",
                http_server.config.bind_addr, http_server.config.port
            );
            http_server.run();
        }

        Commands::Albums => {
            let mut storage =
                Storage::new(&cfg.database).context("Failed to initialize storage")?;
            let snapshot = storage.snapshot()?;

            println!("Albums ({}):", snapshot.albums.len());
            for entry in dashboard(&snapshot.albums, &snapshot.ratings) {
                let rating = match entry.rating {
                    Some(mean) => format!("{mean:.2}"),
                    None => "unrated".to_string(),
                };
                println!(
                    "  [{}] {} - {} (by {}): {}",
                    entry.album.id,
                    entry.album.artist,
                    entry.album.title,
                    entry.album.submitted_by,
                    rating
                );
            }
        }

        Commands::Stats => {
            let mut storage =
                Storage::new(&cfg.database).context("Failed to initialize storage")?;
            let snapshot = storage.snapshot()?;
            let board = Leaderboard::compute(&snapshot, cfg.ranking.masterpiece_threshold);

            match &board.best_track {
                Some(champion) => println!(
                    "Best track: {} - {} ({:.2}, {} votes)",
                    champion.ranked.track.artist,
                    champion.ranked.track.name,
                    champion.ranked.average_score,
                    champion.ranked.vote_count
                ),
                None => println!("Best track: nobody has voted yet"),
            }

            println!("Top albums:");
            for (position, ranked) in board.top_albums.iter().enumerate() {
                println!(
                    "  {}. {} - {} ({:.2}, {} votes)",
                    position + 1,
                    ranked.album.artist,
                    ranked.album.title,
                    ranked.average_score,
                    ranked.vote_count
                );
            }

            println!("Masterpieces:");
            for ranked in &board.masterpieces {
                println!("  - {} - {}", ranked.album.artist, ranked.album.title);
            }
        }

        Commands::AlbumStats { id } => {
            let storage = Storage::new(&cfg.database).context("Failed to initialize storage")?;
            let album_id = AlbumId(*id);
            let album = storage.get_album(album_id)?;
            let tracks = storage.tracks_for_album(album_id)?;
            let ratings = storage.ratings_for_album(album_id)?;

            let stats = AlbumStats::compute(album, &tracks, &ratings);

            println!(
                "{} - {}: {:.2} ({} votes, {} stars)",
                stats.album.artist,
                stats.album.title,
                stats.average_score,
                stats.vote_count,
                star_score(stats.average_score)
            );
            for ranked in &stats.ranked_tracks {
                println!(
                    "  {:>2}. {} ({:.2}, {} votes, {} stars)",
                    ranked.track.track_number,
                    ranked.track.name,
                    ranked.average_score,
                    ranked.vote_count,
                    ranked.star_score
                );
            }
        }

        Commands::Search { query } => {
            let catalog =
                ItunesCatalog::new(&cfg.catalog).context("Failed to build catalog client")?;
            let albums = catalog.search(query)?;

            println!("Found {} albums:", albums.len());
            for album in &albums {
                println!("  [{}] {} - {}", album.catalog_id, album.artist, album.title);
            }
        }
    }

    Ok(())
}
