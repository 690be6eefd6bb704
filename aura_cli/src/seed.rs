use aura::Vibe;
use database::models::NewSong;

pub const PROVIDER: &str = "seed";

// (title, artist, genre, vibe)
const DEMO_SONGS: [(&str, &str, &str, Vibe); 20] = [
    ("Night Drive", "Ocean Echoes", "Electronic", Vibe::Chill),
    ("Skyline Lights", "Neon Rivers", "Synthwave", Vibe::Hype),
    ("City Rain", "Lo-Fi Collective", "Lo-fi", Vibe::Chill),
    ("Velvet Sun", "Soft Season", "Indie Pop", Vibe::Indie),
    ("Glowstick Heart", "Club Mirage", "EDM", Vibe::Hype),
    ("Half-Open Window", "Bedroom Stories", "Bedroom Pop", Vibe::Indie),
    ("Afterglow Avenue", "Late Night Transit", "Alternative", Vibe::Chill),
    ("Tunnel Vision", "Monochrome", "Alt Rock", Vibe::Sad),
    ("Soft Static", "Tape Hiss", "Lo-fi", Vibe::Chill),
    ("Jetstream", "Aurora Lane", "Pop", Vibe::Hype),
    ("Glass Garden", "Ivy Bloom", "Indie", Vibe::Indie),
    ("Echo Chamber", "Faded Signals", "Indie Rock", Vibe::Sad),
    ("Moonlit Metro", "Parallel Lines", "Electronica", Vibe::Chill),
    ("Satellite Call", "Nova Relay", "Synth Pop", Vibe::Hype),
    ("Polaroid Ghosts", "Static Bloom", "Indie", Vibe::Sad),
    ("Crystal Arcade", "Pixel Pulse", "Chiptune", Vibe::Hype),
    ("Soft Focus", "Cloudroom", "Dream Pop", Vibe::Indie),
    ("Golden Hour Loop", "Sunset Loops", "Lo-fi", Vibe::Chill),
    ("Midnight Carousel", "Velour Night", "Alt Pop", Vibe::Indie),
    ("Static Hearts", "FM Arcade", "Synthwave", Vibe::Sad),
];

pub fn demo_songs() -> Vec<NewSong> {
    DEMO_SONGS
        .iter()
        .map(|&(title, artist, genre, vibe)| NewSong {
            title: title.to_string(),
            artist: artist.to_string(),
            album: None,
            genre: Some(genre.to_string()),
            album_art_url: None,
            vibe: Some(vibe),
            provider: PROVIDER.to_string(),
            external_id: format!("{}/{}", slug(artist), slug(title)),
        })
        .collect()
}

fn slug(s: &str) -> String {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn slugs_are_url_safe() {
        assert_eq!(slug("Half-Open Window"), "half-open-window");
        assert_eq!(slug("Lo-Fi Collective"), "lo-fi-collective");
        assert_eq!(slug("  FM  Arcade "), "fm-arcade");
    }

    #[test]
    fn demo_songs_have_unique_keys() {
        let songs = demo_songs();
        let keys = songs.iter().map(NewSong::key).collect::<HashSet<_>>();

        assert_eq!(songs.len(), 20);
        assert_eq!(keys.len(), songs.len());
        assert_eq!(songs[0].external_id, "ocean-echoes/night-drive");
    }

    #[test]
    fn demo_songs_cover_every_vibe() {
        let songs = demo_songs();

        for vibe in Vibe::ALL {
            assert!(songs.iter().any(|song| song.vibe == Some(vibe)), "{vibe}");
        }
    }
}
