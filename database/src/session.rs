use aura::{Aura, RatedVibe, Verdict};
use sqlx::{pool::PoolConnection, Postgres};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::{count_from_db, models, parse_stored_vibe, DatabaseError};

pub struct Session {
    connection: PoolConnection<Postgres>,
}

impl Session {
    pub(crate) fn new(connection: PoolConnection<Postgres>) -> Self {
        Self { connection }
    }

    #[instrument(skip(self), level = "trace")]
    pub async fn rated_vibes(&mut self, user_id: Uuid) -> Result<Vec<RatedVibe>, DatabaseError> {
        let rows: Vec<(String, Option<String>)> = sqlx::query_as(
            "
            select r.rating, s.vibe
            from ratings r
            join songs s on s.id = r.song_id
            where r.user_id = $1
        ",
        )
        .bind(user_id)
        .fetch_all(&mut *self.connection)
        .await?;
        debug!(n_rows = rows.len(), "fetched ratings");

        rows.into_iter()
            .map(|(rating, vibe)| rated_vibe_from_row(rating, vibe))
            .collect()
    }

    #[instrument(skip(self), level = "trace")]
    pub async fn profile(&mut self, user_id: Uuid) -> Result<Option<models::Profile>, DatabaseError> {
        let row: Option<(Option<String>, Option<String>, i32)> = sqlx::query_as(
            "select username, aura_type, total_ratings from profiles where id = $1",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.connection)
        .await?;

        let Some((username, aura_type, total_ratings)) = row else {
            return Ok(None);
        };

        let aura = aura_type.and_then(|tag| match tag.parse::<Aura>() {
            Ok(aura) => Some(aura),
            Err(err) => {
                warn!(%err, %user_id, "ignoring stored aura");
                None
            }
        });
        let total_ratings =
            u32::try_from(total_ratings).map_err(|_| DatabaseError::OutOfRange {
                what: "total ratings",
                value: total_ratings.into(),
            })?;

        Ok(Some(models::Profile {
            id: user_id,
            username,
            aura,
            total_ratings,
        }))
    }

    /// Create the profile row if the user doesn't have one yet. An existing
    /// username is left alone.
    #[instrument(skip(self), level = "trace")]
    pub async fn ensure_profile(
        &mut self,
        user_id: Uuid,
        username: Option<&str>,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            "
            insert into profiles(id, username)
            values ($1, $2)
            on conflict (id) do nothing
        ",
        )
        .bind(user_id)
        .bind(username)
        .execute(&mut *self.connection)
        .await?;

        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn write_aura(
        &mut self,
        user_id: Uuid,
        aura: Aura,
        total_ratings: usize,
    ) -> Result<(), DatabaseError> {
        let total_ratings = i32::try_from(total_ratings).map_err(|_| DatabaseError::OutOfRange {
            what: "total ratings",
            value: i64::try_from(total_ratings).unwrap_or(i64::MAX),
        })?;

        let result = sqlx::query(
            "update profiles set aura_type = $2, total_ratings = $3 where id = $1",
        )
        .bind(user_id)
        .bind(aura.as_str())
        .bind(total_ratings)
        .execute(&mut *self.connection)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::ProfileNotFound(user_id));
        }

        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn rate_song(
        &mut self,
        user_id: Uuid,
        song_id: Uuid,
        verdict: Verdict,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            "
            insert into ratings(user_id, song_id, rating)
            values ($1, $2, $3)
            on conflict (user_id, song_id) do update set
                rating = excluded.rating,
                rated_at = now()
        ",
        )
        .bind(user_id)
        .bind(song_id)
        .bind(verdict.as_str())
        .execute(&mut *self.connection)
        .await?;

        Ok(())
    }

    #[instrument(skip(self), level = "trace")]
    pub async fn rating_stats(&mut self, user_id: Uuid) -> Result<models::RatingStats, DatabaseError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "select rating, count(*) from ratings where user_id = $1 group by rating",
        )
        .bind(user_id)
        .fetch_all(&mut *self.connection)
        .await?;

        let mut stats = models::RatingStats::default();
        for (rating, count) in rows {
            let count = count_from_db("rating count", count)?;
            match rating.parse::<Verdict>()? {
                Verdict::Like => stats.likes = count,
                Verdict::Okay => stats.okays = count,
                Verdict::Skip => stats.skips = count,
            }
        }

        Ok(stats)
    }
}

pub(crate) fn rated_vibe_from_row(
    rating: String,
    vibe: Option<String>,
) -> Result<RatedVibe, DatabaseError> {
    Ok(RatedVibe {
        verdict: rating.parse::<Verdict>()?,
        vibe: vibe.as_deref().and_then(parse_stored_vibe),
    })
}
