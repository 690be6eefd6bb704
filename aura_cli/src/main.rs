use std::process::ExitCode;

use anyhow::Context;
use aura::{AuraResult, Verdict, Vibe};
use clap::Parser;
use tracing::{error, info};
use uuid::Uuid;

mod import;
mod refresh;
mod seed;

// catalog writes and DDL go through the service role, never the app's connection
const SERVICE_DATABASE_URL: &str = "SERVICE_DATABASE_URL";
const DATABASE_URL: &str = "DATABASE_URL";

#[derive(Debug, clap::Parser)]
#[command(version, about = "aura.fm catalog and rating tools")]
enum Command {
    /// Create the tables if they don't exist yet
    Schema {
        #[arg(long, env = SERVICE_DATABASE_URL, hide_env_values = true)]
        db: String,
    },
    /// Import the tracks of one or more playlists into the song catalog
    Import {
        #[arg(long, env = "SPOTIFY_CLIENT_ID")]
        client_id: String,
        #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
        client_secret: String,
        /// `id:vibe,id:vibe`
        #[arg(long, env = "SPOTIFY_PLAYLISTS")]
        playlists: Option<String>,
        /// Single playlist, used when --playlists is not given
        #[arg(long, env = "SPOTIFY_PLAYLIST_ID")]
        playlist_id: Option<String>,
        /// Vibe for playlists listed without one
        #[arg(long, env = "SPOTIFY_PLAYLIST_VIBE", default_value = "chill")]
        playlist_vibe: Vibe,
        #[arg(long, env = SERVICE_DATABASE_URL, hide_env_values = true)]
        db: String,
        #[arg(long, hide = true, default_value = import::spotify::DEFAULT_ACCOUNTS_URL)]
        accounts_url: String,
        #[arg(long, hide = true, default_value = import::spotify::DEFAULT_API_URL)]
        api_url: String,
    },
    /// Upsert the demo song catalog
    Seed {
        #[arg(long, env = SERVICE_DATABASE_URL, hide_env_values = true)]
        db: String,
    },
    /// Rate a song for a user
    Rate {
        #[arg(short, long)]
        user: Uuid,
        #[arg(short, long)]
        song: Uuid,
        verdict: Verdict,
        /// Recompute the user's aura afterwards, as at the end of a session
        #[arg(long)]
        refresh: bool,
        #[arg(long, env = DATABASE_URL, hide_env_values = true)]
        db: String,
    },
    /// Recompute and show a user's aura
    Aura {
        #[arg(short, long)]
        user: Uuid,
        #[arg(long)]
        json: bool,
        #[arg(long, env = DATABASE_URL, hide_env_values = true)]
        db: String,
    },
    /// Show how a user has rated so far
    Stats {
        #[arg(short, long)]
        user: Uuid,
        #[arg(long, env = DATABASE_URL, hide_env_values = true)]
        db: String,
    },
    /// Most liked songs across the community
    Leaderboard {
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
        #[arg(long, env = DATABASE_URL, hide_env_values = true)]
        db: String,
    },
    /// Find songs by title or artist
    Search {
        query: String,
        #[arg(short, long, default_value_t = 30)]
        limit: u32,
        #[arg(long, env = DATABASE_URL, hide_env_values = true)]
        db: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    {
        use tracing_subscriber::prelude::*;

        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init()
    }

    match run(Command::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Schema { db } => {
            connect(&db).await?.ensure_schema().await?;
            info!("schema is up to date");
        }
        Command::Import {
            client_id,
            client_secret,
            playlists,
            playlist_id,
            playlist_vibe,
            db,
            accounts_url,
            api_url,
        } => {
            let jobs =
                import::resolve_jobs(playlists.as_deref(), playlist_id.as_deref(), playlist_vibe)?;
            let api = import::spotify::SpotifyClient::new(
                import::spotify::Credentials {
                    client_id,
                    client_secret,
                },
                &accounts_url,
                &api_url,
            );
            let database = connect(&db).await?;

            let start = std::time::Instant::now();
            let summaries = match import::run_import(&api, &database, &jobs).await {
                Ok(summaries) => summaries,
                Err(err) => {
                    error!(stage = %err.stage(), "import aborted");
                    return Err(err.into());
                }
            };
            let elapsed = start.elapsed();

            for summary in &summaries {
                info!(
                    playlist_id = %summary.playlist_id,
                    vibe = %summary.vibe,
                    pages = summary.pages,
                    fetched = summary.fetched,
                    written = summary.written,
                    "imported playlist"
                );
            }
            info!(?elapsed, n_playlists = summaries.len(), "completed import");
        }
        Command::Seed { db } => {
            let songs = seed::demo_songs();
            let written = connect(&db).await?.upsert_songs(&songs).await?;
            info!(n_songs = songs.len(), written, "seeded demo songs");
        }
        Command::Rate {
            user,
            song,
            verdict,
            refresh,
            db,
        } => {
            let database = connect(&db).await?;
            let mut session = database.session().await?;
            session.ensure_profile(user, None).await?;
            session.rate_song(user, song, verdict).await?;
            info!(%user, %song, %verdict, "rated song");

            if refresh {
                let result = refresh::refresh_aura(&mut session, user).await?;
                print_aura(&result);
            }
        }
        Command::Aura { user, json, db } => {
            let database = connect(&db).await?;
            let mut session = database.session().await?;
            let result = refresh::refresh_aura(&mut session, user).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_aura(&result);
            }
        }
        Command::Stats { user, db } => {
            let database = connect(&db).await?;
            let mut session = database.session().await?;
            let profile = session.profile(user).await?;
            let stats = session.rating_stats(user).await?;

            if let Some(name) = profile.as_ref().and_then(|p| p.username.as_deref()) {
                println!("{name}");
            }
            match profile.and_then(|p| p.aura) {
                Some(aura) => {
                    let display = aura.display();
                    println!("aura: {} {}", display.emoji, display.label);
                }
                None => println!("aura: not computed yet"),
            }
            println!(
                "{} rated: {} liked, {} okay, {} skipped",
                stats.total(),
                stats.likes,
                stats.okays,
                stats.skips
            );
        }
        Command::Leaderboard { limit, db } => {
            let entries = connect(&db).await?.top_liked_songs(limit).await?;
            for entry in entries {
                println!(
                    "{:>3}. {} - {} ({} likes)",
                    entry.rank, entry.title, entry.artist, entry.likes
                );
            }
        }
        Command::Search { query, limit, db } => {
            let songs = connect(&db).await?.search_songs(&query, limit).await?;
            for song in songs {
                let vibe = song.vibe.map_or("-", |vibe| vibe.as_str());
                println!("{}  {} - {}  [{vibe}]", song.id, song.title, song.artist);
            }
        }
    }

    Ok(())
}

async fn connect(url: &str) -> anyhow::Result<database::Database> {
    database::Database::connect(url)
        .await
        .context("failed to connect to database")
}

fn print_aura(result: &AuraResult) {
    let display = result.aura.display();
    println!("{} {}", display.emoji, display.label);
    println!("{}", display.description);
    println!();
    for entry in &result.breakdown {
        println!(
            "{:<6} {:>3}  {:>5.1}%",
            entry.vibe.as_str(),
            entry.count,
            result.share(entry.vibe) * 100.0
        );
    }
    println!(
        "{} liked ({} with a vibe), {} rated",
        result.total_liked, result.total_tagged_likes, result.total_rated
    );
}
