use aura::{Aura, Vibe};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub album_art_url: Option<String>,
    pub vibe: Option<Vibe>,
    pub created_at: time::OffsetDateTime,
}

/// Identified by where it came from rather than by its row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSong {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub album_art_url: Option<String>,
    pub vibe: Option<Vibe>,
    pub provider: String,
    pub external_id: String,
}

impl NewSong {
    pub fn key(&self) -> (&str, &str) {
        (&self.provider, &self.external_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: Uuid,
    pub username: Option<String>,
    pub aura: Option<Aura>,
    pub total_ratings: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingStats {
    pub likes: u64,
    pub okays: u64,
    pub skips: u64,
}

impl RatingStats {
    pub fn total(&self) -> u64 {
        self.likes + self.okays + self.skips
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub song_id: Uuid,
    pub title: String,
    pub artist: String,
    pub album_art_url: Option<String>,
    pub likes: u64,
}
