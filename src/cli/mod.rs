use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config;
use crate::domain::track::{DEFAULT_COVER, NewTrack, TrackId, TrackRecord};
use crate::media::{self, SizePolicy};
use crate::storage::store::TrackStore;

#[derive(Parser)]
#[command(name = "tracklocker")]
#[command(version = "0.1")]
#[command(about = "Local media catalog with embedded audio and cover art")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "tracklocker.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a track to the catalog
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        artist: String,
        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Audio file to embed
        #[arg(long)]
        audio: PathBuf,
        /// Cover image to embed
        #[arg(long)]
        cover: Option<PathBuf>,
    },
    /// List all tracks in the catalog
    List,
    /// Show one track in detail
    Show { id: String },
    /// Print a shareable link for a track
    Share { id: String },
    /// Delete one track
    Delete { id: String },
    /// Delete every track in the catalog
    Clear {
        /// Confirm the deletion; clear refuses to run without it
        #[arg(short, long)]
        yes: bool,
    },
}

/// Entrypoint for CLI
pub fn run() {
    env_logger::init();

    let cli = Cli::parse();

    let cfg = config::Config::load_or_default(&cli.config).expect("Failed to load config");
    let mut store = TrackStore::new(&cfg.database).expect("Failed to open catalog database");

    match &cli.command {
        Commands::Add {
            name,
            artist,
            genre,
            description,
            audio,
            cover,
        } => add_track(
            &mut store,
            &cfg.limits,
            name,
            artist,
            genre.as_deref(),
            description.as_deref(),
            audio,
            cover.as_deref(),
        ),

        Commands::List => {
            let tracks = store.list_all().unwrap_or_else(|e| fail(&e.to_string()));

            if tracks.is_empty() {
                println!("No tracks yet. Add your first track with `tracklocker add`!");
                return;
            }

            for track in &tracks {
                println!("{} — {} ({})", track.name, track.artist, track.genre);
                println!("    id: {}", track.id);
            }
        }

        Commands::Show { id } => {
            let id = TrackId::from(id.as_str());
            match store.get_by_id(&id).unwrap_or_else(|e| fail(&e.to_string())) {
                Some(track) => print_track(&track),
                None => println!("Track {id} not found."),
            }
        }

        Commands::Share { id } => {
            let id = TrackId::from(id.as_str());
            match store.get_by_id(&id).unwrap_or_else(|e| fail(&e.to_string())) {
                Some(track) => {
                    println!("Listen to \"{}\" by {}:", track.name, track.artist);
                    println!("    tracklocker://track/{id}");
                }
                None => println!("Track {id} not found."),
            }
        }

        Commands::Delete { id } => {
            let id = TrackId::from(id.as_str());
            store
                .delete_by_id(&id)
                .unwrap_or_else(|e| fail(&e.to_string()));
            println!("Track {id} deleted.");
        }

        Commands::Clear { yes } => {
            if !*yes {
                println!("This removes every track and cannot be undone.");
                println!("Re-run with --yes to confirm.");
                return;
            }
            store.clear_all().unwrap_or_else(|e| fail(&e.to_string()));
            println!("All tracks deleted.");
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn add_track(
    store: &mut TrackStore,
    limits: &config::Limits,
    name: &str,
    artist: &str,
    genre: Option<&str>,
    description: Option<&str>,
    audio: &Path,
    cover: Option<&Path>,
) {
    let name = name.trim();
    let artist = artist.trim();
    if name.is_empty() || artist.is_empty() {
        fail("Please fill in the required fields: name and artist");
    }

    let encoded_audio = media::encode_upload(audio, SizePolicy::audio(limits.audio_mb))
        .unwrap_or_else(|e| fail(&e.to_string()));

    let encoded_cover = cover.map(|path| {
        media::encode_upload(path, SizePolicy::image(limits.image_mb))
            .unwrap_or_else(|e| fail(&e.to_string()))
    });

    let new = NewTrack {
        name: name.to_string(),
        artist: artist.to_string(),
        genre: non_empty(genre),
        description: non_empty(description),
        cover: encoded_cover.map(|c| c.data_url),
        audio: encoded_audio.data_url,
        audio_type: Some(encoded_audio.mime),
    };

    let id = store.create(new).unwrap_or_else(|e| fail(&e.to_string()));
    println!("Track \"{name}\" added with id {id}.");
}

fn print_track(track: &TrackRecord) {
    println!("{}", track.name);
    println!("  Artist:      {}", track.artist);
    println!("  Genre:       {}", track.genre);
    println!("  Description: {}", track.description);
    println!("  Added:       {}", format_added_at(&track.added_at));
    println!(
        "  Audio:       {} ({} embedded)",
        track.audio_type,
        approx_size(&track.audio)
    );
    if track.cover == DEFAULT_COVER {
        println!("  Cover:       built-in placeholder");
    } else {
        println!("  Cover:       {} embedded", approx_size(&track.cover));
    }
}

fn format_added_at(added_at: &str) -> String {
    match DateTime::parse_from_rfc3339(added_at) {
        Ok(instant) => instant
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        Err(_) => added_at.to_string(),
    }
}

/// Rough decoded size of a data URL payload, for display only
fn approx_size(data_url: &str) -> String {
    let payload = data_url.split(',').nth(1).unwrap_or("");
    let bytes = payload.len() * 3 / 4;
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn fail(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}
