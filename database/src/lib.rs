use std::collections::{hash_map::Entry, HashMap};

use sqlx::{Executor, Postgres, QueryBuilder};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

pub mod models;
mod session;

pub use session::Session;

const SCHEMA: &str = include_str!("../schema.sql");

// postgres caps a statement at 65535 bind parameters, each song row uses 8
const SONGS_PER_STATEMENT: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("no profile for user {0}")]
    ProfileNotFound(Uuid),
    #[error(transparent)]
    UnknownVerdict(#[from] aura::UnknownVerdict),
    #[error("{what} {value} does not fit in storage")]
    OutOfRange { what: &'static str, value: i64 },
}

pub struct Database {
    pool: sqlx::Pool<sqlx::Postgres>,
}

impl Database {
    pub async fn connect(url: &str) -> Result<Self, DatabaseError> {
        let pool = sqlx::PgPool::connect(url).await?;

        Ok(Self { pool })
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        self.pool.execute(SCHEMA).await?;
        Ok(())
    }

    /// The connection goes back to the pool when the [`Session`] is dropped.
    pub async fn session(&self) -> Result<Session, DatabaseError> {
        let connection = self.pool.acquire().await?;

        Ok(Session::new(connection))
    }

    #[instrument(skip(self, songs), fields(n_songs = songs.len()), level = "debug")]
    pub async fn upsert_songs(&self, songs: &[models::NewSong]) -> Result<u64, DatabaseError> {
        let unique = dedupe_by_key(songs);
        if unique.len() != songs.len() {
            debug!(
                duplicates = songs.len() - unique.len(),
                "dropped duplicate songs from batch"
            );
        }
        if unique.is_empty() {
            return Ok(0);
        }

        let mut transaction = self.pool.begin().await?;
        let mut rows_affected = 0;

        for chunk in unique.chunks(SONGS_PER_STATEMENT) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "insert into songs(title, artist, album, genre, album_art_url, vibe, provider, external_id) ",
            );
            builder.push_values(chunk, |mut row, song| {
                row.push_bind(&song.title)
                    .push_bind(&song.artist)
                    .push_bind(&song.album)
                    .push_bind(&song.genre)
                    .push_bind(&song.album_art_url)
                    .push_bind(song.vibe.map(|vibe| vibe.as_str()))
                    .push_bind(&song.provider)
                    .push_bind(&song.external_id);
            });
            builder.push(
                "
                on conflict (provider, external_id) do update set
                    title = excluded.title,
                    artist = excluded.artist,
                    album = excluded.album,
                    genre = excluded.genre,
                    album_art_url = excluded.album_art_url,
                    vibe = excluded.vibe
            ",
            );

            let result = builder.build().execute(&mut *transaction).await?;
            rows_affected += result.rows_affected();
        }

        transaction.commit().await?;
        debug!(n_rows = rows_affected, "affected rows");

        Ok(rows_affected)
    }

    #[instrument(skip(self), level = "trace")]
    pub async fn top_liked_songs(
        &self,
        limit: u32,
    ) -> Result<Vec<models::LeaderboardEntry>, DatabaseError> {
        let rows: Vec<(Uuid, String, String, Option<String>, i64)> = sqlx::query_as(
            "
            select s.id, s.title, s.artist, s.album_art_url, count(*) as likes
            from ratings r
            join songs s on s.id = r.song_id
            where r.rating = 'like'
            group by s.id
            order by likes desc, s.title asc
            limit $1
        ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .enumerate()
            .map(|(index, (song_id, title, artist, album_art_url, likes))| {
                Ok::<_, DatabaseError>(models::LeaderboardEntry {
                    rank: index + 1,
                    song_id,
                    title,
                    artist,
                    album_art_url,
                    likes: count_from_db("like count", likes)?,
                })
            })
            .collect()
    }

    #[instrument(skip(self), level = "trace")]
    pub async fn search_songs(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<models::Song>, DatabaseError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        #[allow(clippy::type_complexity)]
        let rows: Vec<(
            Uuid,
            String,
            String,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
            time::OffsetDateTime,
        )> = sqlx::query_as(
            "
            select id, title, artist, album, genre, album_art_url, vibe, created_at
            from songs
            where title ilike $1 escape '\\' or artist ilike $1 escape '\\'
            order by title, artist
            limit $2
        ",
        )
        .bind(format!("%{}%", escape_like(query)))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, title, artist, album, genre, album_art_url, vibe, created_at)| models::Song {
                    id,
                    title,
                    artist,
                    album,
                    genre,
                    album_art_url,
                    vibe: vibe.as_deref().and_then(parse_stored_vibe),
                    created_at,
                },
            )
            .collect())
    }
}

// last one wins, first-seen order. postgres refuses to upsert the same key
// twice in one statement
fn dedupe_by_key(songs: &[models::NewSong]) -> Vec<&models::NewSong> {
    let mut positions = HashMap::new();
    let mut unique: Vec<&models::NewSong> = Vec::with_capacity(songs.len());

    for song in songs {
        match positions.entry(song.key()) {
            Entry::Occupied(entry) => unique[*entry.get()] = song,
            Entry::Vacant(entry) => {
                entry.insert(unique.len());
                unique.push(song);
            }
        }
    }

    unique
}

fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub(crate) fn parse_stored_vibe(tag: &str) -> Option<aura::Vibe> {
    match tag.parse() {
        Ok(vibe) => Some(vibe),
        Err(err) => {
            warn!(%err, "ignoring stored vibe");
            None
        }
    }
}

pub(crate) fn count_from_db(what: &'static str, value: i64) -> Result<u64, DatabaseError> {
    u64::try_from(value).map_err(|_| DatabaseError::OutOfRange { what, value })
}
