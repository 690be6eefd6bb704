//! Client-credentials access to the Spotify Web API, and the mapping from its
//! playlist track objects to our songs.

use std::fmt;

use async_trait::async_trait;
use aura::Vibe;
use database::models::NewSong;
use serde::Deserialize;
use tracing::{debug, instrument, trace};

use super::{CatalogApi, ImportError, ImportStage};

pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const PROVIDER: &str = "spotify";
pub const UNKNOWN_ARTIST: &str = "Unknown artist";

// the largest page the playlist tracks endpoint hands out
const PAGE_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackPage {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    pub track: Option<Track>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    pub album: Option<Album>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Album {
    pub name: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub url: String,
}

/// Turn a playlist entry into a song tagged with the playlist's vibe. Entries
/// without a catalog track id can't be upserted and are dropped.
pub fn map_track(item: PlaylistItem, vibe: Vibe) -> Option<NewSong> {
    let track = item.track?;
    let Some(external_id) = track.id else {
        trace!(name = %track.name, "skipping track without id");
        return None;
    };

    let artist = track
        .artists
        .into_iter()
        .next()
        .map(|artist| artist.name)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
    let (album, album_art_url) = match track.album {
        Some(album) => (
            album.name,
            album.images.into_iter().next().map(|image| image.url),
        ),
        None => (None, None),
    };

    Some(NewSong {
        title: track.name,
        artist,
        album,
        genre: None,
        album_art_url,
        vibe: Some(vibe),
        provider: PROVIDER.to_string(),
        external_id,
    })
}

pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug)]
pub struct SpotifyClient {
    http: reqwest::Client,
    credentials: Credentials,
    accounts_url: String,
    api_url: String,
}

impl SpotifyClient {
    pub fn new(credentials: Credentials, accounts_url: &str, api_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
            accounts_url: accounts_url.trim_end_matches('/').to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }
}

async fn check_status(
    response: reqwest::Response,
    stage: ImportStage,
) -> Result<reqwest::Response, ImportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(err) => {
            debug!(%err, %status, "couldn't read error body");
            String::new()
        }
    };
    Err(ImportError::Status {
        stage,
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl CatalogApi for SpotifyClient {
    #[instrument(skip(self), level = "debug")]
    async fn access_token(&self) -> Result<String, ImportError> {
        let stage = ImportStage::Authenticating;
        let http_error = |source| ImportError::Http { stage, source };

        let response = self
            .http
            .post(format!("{}/api/token", self.accounts_url))
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(http_error)?;
        let token: TokenResponse = check_status(response, stage)
            .await?
            .json()
            .await
            .map_err(http_error)?;

        Ok(token.access_token)
    }

    fn first_page_url(&self, playlist_id: &str) -> String {
        format!(
            "{}/playlists/{playlist_id}/tracks?limit={PAGE_LIMIT}",
            self.api_url
        )
    }

    #[instrument(skip(self, token), level = "debug")]
    async fn fetch_page(&self, token: &str, url: &str) -> Result<TrackPage, ImportError> {
        let stage = ImportStage::Paginating;
        let http_error = |source| ImportError::Http { stage, source };

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(http_error)?;

        check_status(response, stage)
            .await?
            .json()
            .await
            .map_err(http_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(json: &str) -> PlaylistItem {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn maps_full_track() {
        let playlist_item = item(
            r#"{
                "added_at": "2024-01-01T00:00:00Z",
                "track": {
                    "id": "4uLU6hMCjMI75M1A2tKUQC",
                    "name": "Midnight City",
                    "artists": [{"name": "M83"}, {"name": "Someone Else"}],
                    "album": {
                        "name": "Hurry Up, We're Dreaming",
                        "images": [{"url": "https://i.scdn.co/image/large", "height": 640}, {"url": "https://i.scdn.co/image/small"}]
                    }
                }
            }"#,
        );

        let song = map_track(playlist_item, Vibe::Hype).unwrap();

        assert_eq!(
            song,
            NewSong {
                title: "Midnight City".to_string(),
                artist: "M83".to_string(),
                album: Some("Hurry Up, We're Dreaming".to_string()),
                genre: None,
                album_art_url: Some("https://i.scdn.co/image/large".to_string()),
                vibe: Some(Vibe::Hype),
                provider: "spotify".to_string(),
                external_id: "4uLU6hMCjMI75M1A2tKUQC".to_string(),
            }
        );
    }

    #[test]
    fn missing_artist_is_unknown() {
        let playlist_item = item(r#"{"track": {"id": "a", "name": "Untitled", "artists": []}}"#);

        let song = map_track(playlist_item, Vibe::Chill).unwrap();

        assert_eq!(song.artist, "Unknown artist");
        assert_eq!(song.album, None);
        assert_eq!(song.album_art_url, None);
    }

    #[test]
    fn album_without_images_has_no_cover() {
        let playlist_item = item(
            r#"{"track": {"id": "a", "name": "Untitled", "artists": [{"name": "Tape Hiss"}], "album": {"name": "Demos", "images": []}}}"#,
        );

        let song = map_track(playlist_item, Vibe::Chill).unwrap();

        assert_eq!(song.album.as_deref(), Some("Demos"));
        assert_eq!(song.album_art_url, None);
    }

    #[test]
    fn unmappable_items_are_dropped() {
        assert!(map_track(item(r#"{"track": null}"#), Vibe::Sad).is_none());
        assert!(map_track(
            item(r#"{"track": {"id": null, "name": "local.mp3", "artists": []}}"#),
            Vibe::Sad
        )
        .is_none());
    }

    #[test]
    fn parses_last_page() {
        let page: TrackPage = serde_json::from_str(
            r#"{"href": "x", "items": [{"track": null}], "limit": 100, "next": null, "offset": 0, "total": 1}"#,
        )
        .unwrap();

        assert_eq!(page.items.len(), 1);
        assert!(page.next.is_none());
    }

    #[test]
    fn first_page_url_requests_full_pages() {
        let client = SpotifyClient::new(
            Credentials {
                client_id: "id".to_string(),
                client_secret: "secret".to_string(),
            },
            DEFAULT_ACCOUNTS_URL,
            "http://localhost:9000/v1/",
        );

        assert_eq!(
            client.first_page_url("37i9dQZF1DX4WYpdgoIcn6"),
            "http://localhost:9000/v1/playlists/37i9dQZF1DX4WYpdgoIcn6/tracks?limit=100"
        );
    }

    fn response(status: u16, body: &'static str) -> reqwest::Response {
        http::Response::builder()
            .status(status)
            .body(body)
            .unwrap()
            .into()
    }

    #[tokio::test]
    async fn error_status_keeps_body_and_stage() {
        let err = check_status(response(401, "invalid_client"), ImportStage::Authenticating)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ImportError::Status {
                stage: ImportStage::Authenticating,
                status: 401,
                ref body,
            } if body == "invalid_client"
        ));
    }

    #[tokio::test]
    async fn success_passes_through() {
        let response = check_status(response(200, "{}"), ImportStage::Paginating)
            .await
            .unwrap();

        assert_eq!(response.text().await.unwrap(), "{}");
    }

    #[test]
    fn debug_output_hides_secret() {
        let credentials = Credentials {
            client_id: "id".to_string(),
            client_secret: "hunter2".to_string(),
        };

        assert!(!format!("{credentials:?}").contains("hunter2"));
    }
}
