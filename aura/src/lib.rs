mod classify;
mod display;
mod vibe;

pub use classify::{classify, classify_default, AuraResult, ClassifyError, VibeCount};
pub use display::{Aura, AuraDisplay, UnknownAura};
pub use vibe::{RatedVibe, UnknownVerdict, UnknownVibe, Verdict, Vibe};
