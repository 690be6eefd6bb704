use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

// declaration order is the order of `Vibe::ALL`, and the classifier breaks ties by it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vibe {
    Chill,
    Hype,
    Sad,
    Indie,
}

impl Vibe {
    pub const ALL: [Vibe; 4] = [Vibe::Chill, Vibe::Hype, Vibe::Sad, Vibe::Indie];

    pub fn as_str(&self) -> &'static str {
        match self {
            Vibe::Chill => "chill",
            Vibe::Hype => "hype",
            Vibe::Sad => "sad",
            Vibe::Indie => "indie",
        }
    }
}

impl fmt::Display for Vibe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown vibe tag {0:?}")]
pub struct UnknownVibe(pub String);

impl FromStr for Vibe {
    type Err = UnknownVibe;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Vibe::ALL
            .into_iter()
            .find(|vibe| vibe.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| UnknownVibe(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Like,
    Okay,
    Skip,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Like => "like",
            Verdict::Okay => "okay",
            Verdict::Skip => "skip",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown verdict {0:?}, expected one of like, okay, skip")]
pub struct UnknownVerdict(pub String);

// Verdicts come from our own rating flow, so unlike vibes there is no
// leniency about case or whitespace.
impl FromStr for Verdict {
    type Err = UnknownVerdict;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Verdict::Like),
            "okay" => Ok(Verdict::Okay),
            "skip" => Ok(Verdict::Skip),
            other => Err(UnknownVerdict(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatedVibe {
    pub verdict: Verdict,
    pub vibe: Option<Vibe>,
}

impl RatedVibe {
    pub fn new(verdict: Verdict, vibe: Option<Vibe>) -> Self {
        Self { verdict, vibe }
    }
}
