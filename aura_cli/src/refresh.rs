use async_trait::async_trait;
use aura::{classify_default, Aura, AuraResult, RatedVibe};
use database::{DatabaseError, Session};
use tracing::{info, instrument};
use uuid::Uuid;

#[async_trait]
pub trait AuraStore: Send {
    async fn rated_vibes(&mut self, user_id: Uuid) -> Result<Vec<RatedVibe>, DatabaseError>;

    async fn write_aura(
        &mut self,
        user_id: Uuid,
        aura: Aura,
        total_ratings: usize,
    ) -> Result<(), DatabaseError>;
}

#[async_trait]
impl AuraStore for Session {
    async fn rated_vibes(&mut self, user_id: Uuid) -> Result<Vec<RatedVibe>, DatabaseError> {
        Session::rated_vibes(self, user_id).await
    }

    async fn write_aura(
        &mut self,
        user_id: Uuid,
        aura: Aura,
        total_ratings: usize,
    ) -> Result<(), DatabaseError> {
        Session::write_aura(self, user_id, aura, total_ratings).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("couldn't load ratings for user {user_id}, please try again")]
    Collect {
        user_id: Uuid,
        #[source]
        source: DatabaseError,
    },
    #[error("user {user_id} has no profile to save the aura on")]
    MissingProfile { user_id: Uuid },
    #[error("couldn't save the aura for user {user_id}, please try again")]
    Write {
        user_id: Uuid,
        #[source]
        source: DatabaseError,
    },
}

// nothing is written unless every rating could be read
#[instrument(skip(store), level = "debug")]
pub async fn refresh_aura<S: AuraStore>(
    store: &mut S,
    user_id: Uuid,
) -> Result<AuraResult, RefreshError> {
    let ratings = store
        .rated_vibes(user_id)
        .await
        .map_err(|source| RefreshError::Collect { user_id, source })?;

    let result = classify_default(&ratings);

    store
        .write_aura(user_id, result.aura, result.total_rated)
        .await
        .map_err(|source| match source {
            DatabaseError::ProfileNotFound(user_id) => RefreshError::MissingProfile { user_id },
            source => RefreshError::Write { user_id, source },
        })?;
    info!(
        aura = %result.aura,
        total_rated = result.total_rated,
        total_liked = result.total_liked,
        "refreshed aura"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use aura::{Verdict, Vibe};

    use super::*;

    #[derive(Default)]
    struct FakeStore {
        ratings: Vec<RatedVibe>,
        fail_collect: bool,
        write_error: Option<fn(Uuid) -> DatabaseError>,
        writes: Vec<(Uuid, Aura, usize)>,
    }

    #[async_trait]
    impl AuraStore for FakeStore {
        async fn rated_vibes(&mut self, _user_id: Uuid) -> Result<Vec<RatedVibe>, DatabaseError> {
            if self.fail_collect {
                return Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut));
            }
            Ok(self.ratings.clone())
        }

        async fn write_aura(
            &mut self,
            user_id: Uuid,
            aura: Aura,
            total_ratings: usize,
        ) -> Result<(), DatabaseError> {
            if let Some(error) = self.write_error {
                return Err(error(user_id));
            }
            self.writes.push((user_id, aura, total_ratings));
            Ok(())
        }
    }

    fn session_ratings() -> Vec<RatedVibe> {
        vec![
            RatedVibe::new(Verdict::Like, Some(Vibe::Chill)),
            RatedVibe::new(Verdict::Like, Some(Vibe::Chill)),
            RatedVibe::new(Verdict::Like, Some(Vibe::Hype)),
            RatedVibe::new(Verdict::Okay, Some(Vibe::Sad)),
            RatedVibe::new(Verdict::Skip, Some(Vibe::Indie)),
        ]
    }

    #[tokio::test]
    async fn writes_aura_and_total_rated() {
        let user_id = Uuid::new_v4();
        let mut store = FakeStore {
            ratings: session_ratings(),
            ..Default::default()
        };

        let result = refresh_aura(&mut store, user_id).await.unwrap();

        assert_eq!(result.aura, Aura::Vibe(Vibe::Chill));
        assert_eq!(store.writes, vec![(user_id, Aura::Vibe(Vibe::Chill), 5)]);
    }

    #[tokio::test]
    async fn refreshing_twice_writes_the_same_state() {
        let user_id = Uuid::new_v4();
        let mut store = FakeStore {
            ratings: session_ratings(),
            ..Default::default()
        };

        let first = refresh_aura(&mut store, user_id).await.unwrap();
        let second = refresh_aura(&mut store, user_id).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.writes[0], store.writes[1]);
    }

    #[tokio::test]
    async fn collect_failure_skips_the_write() {
        let mut store = FakeStore {
            ratings: session_ratings(),
            fail_collect: true,
            ..Default::default()
        };

        let err = refresh_aura(&mut store, Uuid::new_v4()).await.unwrap_err();

        assert!(matches!(err, RefreshError::Collect { .. }));
        assert!(store.writes.is_empty());
    }

    #[tokio::test]
    async fn missing_profile_is_not_retryable() {
        let user_id = Uuid::new_v4();
        let mut store = FakeStore {
            ratings: session_ratings(),
            write_error: Some(DatabaseError::ProfileNotFound),
            ..Default::default()
        };

        let err = refresh_aura(&mut store, user_id).await.unwrap_err();

        assert!(matches!(err, RefreshError::MissingProfile { user_id: id } if id == user_id));
        assert!(!err.to_string().contains("try again"));
    }

    #[tokio::test]
    async fn storage_failure_on_write_asks_for_retry() {
        let user_id = Uuid::new_v4();
        let mut store = FakeStore {
            ratings: session_ratings(),
            write_error: Some(|_| DatabaseError::Sqlx(sqlx::Error::PoolTimedOut)),
            ..Default::default()
        };

        let err = refresh_aura(&mut store, user_id).await.unwrap_err();

        assert!(matches!(
            err,
            RefreshError::Write {
                source: DatabaseError::Sqlx(sqlx::Error::PoolTimedOut),
                ..
            }
        ));
        assert!(err.to_string().contains("try again"));
    }

    #[tokio::test]
    async fn no_ratings_is_balanced() {
        let mut store = FakeStore::default();

        let result = refresh_aura(&mut store, Uuid::new_v4()).await.unwrap();

        assert_eq!(result.aura, Aura::Balanced);
        assert_eq!(store.writes[0].1, Aura::Balanced);
        assert_eq!(store.writes[0].2, 0);
    }
}
