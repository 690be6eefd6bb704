use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Vibe;

/// The dominant vibe of a user's likes, or `Balanced` when their likes carry
/// no usable vibe at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aura {
    Vibe(Vibe),
    Balanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuraDisplay {
    pub label: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
}

impl Aura {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aura::Vibe(vibe) => vibe.as_str(),
            Aura::Balanced => "balanced",
        }
    }

    pub fn display(&self) -> AuraDisplay {
        match self {
            Aura::Vibe(Vibe::Chill) => AuraDisplay {
                label: "Chill",
                emoji: "🌊",
                description: "You vibe with laid-back beats, dreamy melodies and late-night \
                    soundscapes. Your taste is effortlessly cool and introspective.",
            },
            Aura::Vibe(Vibe::Hype) => AuraDisplay {
                label: "Hype",
                emoji: "🔥",
                description: "You're all about high-energy tracks that get you moving. \
                    Upbeat rhythms and powerful drops are your jam.",
            },
            Aura::Vibe(Vibe::Sad) => AuraDisplay {
                label: "Sad",
                emoji: "💜",
                description: "You connect deeply with music that tells a story. Heartfelt \
                    lyrics and soulful melodies speak to you.",
            },
            Aura::Vibe(Vibe::Indie) => AuraDisplay {
                label: "Indie",
                emoji: "🎸",
                description: "You're drawn to unique and unconventional sounds. Your \
                    playlist is full of tracks that make a statement.",
            },
            Aura::Balanced => AuraDisplay {
                label: "Balanced",
                emoji: "✨",
                description: "No single vibe owns you yet. Keep rating songs and your \
                    aura will come into focus.",
            },
        }
    }
}

impl From<Vibe> for Aura {
    fn from(vibe: Vibe) -> Self {
        Aura::Vibe(vibe)
    }
}

impl fmt::Display for Aura {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown aura {0:?}")]
pub struct UnknownAura(pub String);

impl FromStr for Aura {
    type Err = UnknownAura;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("balanced") {
            return Ok(Aura::Balanced);
        }
        s.parse::<Vibe>()
            .map(Aura::Vibe)
            .map_err(|_| UnknownAura(s.to_string()))
    }
}

// Stored and serialized as the flat tag ("chill", "balanced"), not as an
// externally tagged enum.
impl Serialize for Aura {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Aura {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stored_tags() {
        assert_eq!("balanced".parse(), Ok(Aura::Balanced));
        assert_eq!("Balanced".parse(), Ok(Aura::Balanced));
        assert_eq!("sad".parse(), Ok(Aura::Vibe(Vibe::Sad)));
        assert!("Energetic".parse::<Aura>().is_err());
    }

    #[test]
    fn every_aura_has_distinct_display() {
        let auras = Vibe::ALL
            .into_iter()
            .map(Aura::from)
            .chain([Aura::Balanced])
            .collect::<Vec<_>>();

        for (index, aura) in auras.iter().enumerate() {
            let display = aura.display();
            assert!(!display.description.is_empty());
            assert!(display.label.eq_ignore_ascii_case(aura.as_str()));
            for other in &auras[index + 1..] {
                assert_ne!(display.emoji, other.display().emoji);
            }
        }
    }

    #[test]
    fn serializes_as_flat_tag() {
        assert_eq!(
            serde_json::to_string(&Aura::Vibe(Vibe::Hype)).unwrap(),
            r#""hype""#
        );
        assert_eq!(
            serde_json::from_str::<Aura>(r#""balanced""#).unwrap(),
            Aura::Balanced
        );
        assert!(serde_json::from_str::<Aura>(r#""mellow""#).is_err());
    }
}
