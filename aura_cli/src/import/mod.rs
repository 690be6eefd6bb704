//! Batch import of playlist tracks into the song catalog.
//!
//! A run authenticates once, then walks each playlist's pages in order and
//! upserts the mapped songs. The first failure aborts the whole run; a rerun
//! is safe because songs are keyed on their catalog id.

use std::fmt;

use async_trait::async_trait;
use aura::{UnknownVibe, Vibe};
use database::{models::NewSong, Database, DatabaseError};
use tracing::{debug, info, instrument};

pub mod spotify;

use spotify::{map_track, PlaylistItem, TrackPage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    Authenticating,
    Paginating,
    Upserting,
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImportStage::Authenticating => "authenticating",
            ImportStage::Paginating => "paginating",
            ImportStage::Upserting => "upserting",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("request failed while {stage}")]
    Http {
        stage: ImportStage,
        #[source]
        source: reqwest::Error,
    },
    #[error("catalog answered {status} while {stage}: {body}")]
    Status {
        stage: ImportStage,
        status: u16,
        body: String,
    },
    #[error("storing songs from playlist {playlist_id} failed")]
    Store {
        playlist_id: String,
        #[source]
        source: DatabaseError,
    },
}

impl ImportError {
    pub fn stage(&self) -> ImportStage {
        match self {
            ImportError::Http { stage, .. } | ImportError::Status { stage, .. } => *stage,
            ImportError::Store { .. } => ImportStage::Upserting,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaylistSpecError {
    #[error("playlist entry {0:?} has no playlist id")]
    MissingId(String),
    #[error("playlist entry {entry:?}: {source}")]
    Vibe {
        entry: String,
        #[source]
        source: UnknownVibe,
    },
    #[error("no playlists configured")]
    NoPlaylists,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistJob {
    pub playlist_id: String,
    pub vibe: Vibe,
}

/// Parse `id:vibe,id:vibe`. An entry with no `:vibe` gets `default_vibe`.
/// Blank entries are ignored and order is kept.
pub fn parse_playlist_specs(
    specs: &str,
    default_vibe: Vibe,
) -> Result<Vec<PlaylistJob>, PlaylistSpecError> {
    specs
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| -> Result<PlaylistJob, PlaylistSpecError> {
            let (playlist_id, vibe) = match entry.split_once(':') {
                Some((id, vibe)) => {
                    let vibe = vibe.parse::<Vibe>().map_err(|source| PlaylistSpecError::Vibe {
                        entry: entry.to_string(),
                        source,
                    })?;
                    (id.trim(), vibe)
                }
                None => (entry, default_vibe),
            };
            if playlist_id.is_empty() {
                return Err(PlaylistSpecError::MissingId(entry.to_string()));
            }

            Ok(PlaylistJob {
                playlist_id: playlist_id.to_string(),
                vibe,
            })
        })
        .collect()
}

pub fn resolve_jobs(
    playlists: Option<&str>,
    playlist_id: Option<&str>,
    default_vibe: Vibe,
) -> Result<Vec<PlaylistJob>, PlaylistSpecError> {
    let jobs = match (playlists, playlist_id) {
        (Some(specs), _) => parse_playlist_specs(specs, default_vibe)?,
        (None, Some(id)) if !id.trim().is_empty() => vec![PlaylistJob {
            playlist_id: id.trim().to_string(),
            vibe: default_vibe,
        }],
        _ => Vec::new(),
    };

    if jobs.is_empty() {
        return Err(PlaylistSpecError::NoPlaylists);
    }
    Ok(jobs)
}

#[async_trait]
pub trait CatalogApi: Sync {
    async fn access_token(&self) -> Result<String, ImportError>;

    fn first_page_url(&self, playlist_id: &str) -> String;

    async fn fetch_page(&self, token: &str, url: &str) -> Result<TrackPage, ImportError>;
}

#[async_trait]
pub trait SongSink: Sync {
    async fn upsert_songs(&self, songs: &[NewSong]) -> Result<u64, DatabaseError>;
}

#[async_trait]
impl SongSink for Database {
    async fn upsert_songs(&self, songs: &[NewSong]) -> Result<u64, DatabaseError> {
        Database::upsert_songs(self, songs).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistSummary {
    pub playlist_id: String,
    pub vibe: Vibe,
    pub pages: usize,
    pub fetched: usize,
    pub mapped: usize,
    pub written: u64,
}

#[instrument(skip(api, sink), level = "debug")]
pub async fn run_import<A: CatalogApi, S: SongSink>(
    api: &A,
    sink: &S,
    jobs: &[PlaylistJob],
) -> Result<Vec<PlaylistSummary>, ImportError> {
    info!(stage = %ImportStage::Authenticating, "requesting access token");
    let token = api.access_token().await?;

    let mut summaries = Vec::with_capacity(jobs.len());
    for job in jobs {
        info!(stage = %ImportStage::Paginating, playlist_id = %job.playlist_id, "fetching playlist tracks");
        let (items, pages) = fetch_playlist(api, &token, &job.playlist_id).await?;
        let fetched = items.len();

        let songs = items
            .into_iter()
            .filter_map(|item| map_track(item, job.vibe))
            .collect::<Vec<_>>();
        info!(
            fetched,
            mapped = songs.len(),
            vibe = %job.vibe,
            "mapped playlist tracks"
        );

        let written = if songs.is_empty() {
            info!(playlist_id = %job.playlist_id, "no songs to upsert");
            0
        } else {
            info!(stage = %ImportStage::Upserting, n_songs = songs.len(), "upserting songs");
            sink.upsert_songs(&songs)
                .await
                .map_err(|source| ImportError::Store {
                    playlist_id: job.playlist_id.clone(),
                    source,
                })?
        };

        summaries.push(PlaylistSummary {
            playlist_id: job.playlist_id.clone(),
            vibe: job.vibe,
            pages,
            fetched,
            mapped: songs.len(),
            written,
        });
    }

    Ok(summaries)
}

async fn fetch_playlist<A: CatalogApi>(
    api: &A,
    token: &str,
    playlist_id: &str,
) -> Result<(Vec<PlaylistItem>, usize), ImportError> {
    let mut items = Vec::new();
    let mut pages = 0;
    let mut next = Some(api.first_page_url(playlist_id));

    while let Some(url) = next {
        let page = api.fetch_page(token, &url).await?;
        pages += 1;
        debug!(page = pages, n_items = page.items.len(), "fetched page");
        items.extend(page.items);
        next = page.next;
    }

    Ok((items, pages))
}
