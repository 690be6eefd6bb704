use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};

use crate::{Aura, RatedVibe, Verdict, Vibe};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    #[error("no vibe categories configured")]
    NoCategories,
    #[error("vibe category {0} is listed more than once")]
    DuplicateCategory(Vibe),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VibeCount {
    pub vibe: Vibe,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuraResult {
    pub aura: Aura,
    pub breakdown: Vec<VibeCount>,
    pub total_liked: usize,
    pub total_tagged_likes: usize,
    pub total_rated: usize,
}

impl AuraResult {
    pub fn count(&self, vibe: Vibe) -> usize {
        self.breakdown
            .iter()
            .find(|entry| entry.vibe == vibe)
            .map_or(0, |entry| entry.count)
    }

    /// Fraction of tagged likes that went to `vibe`, 0.0 when there are none.
    pub fn share(&self, vibe: Vibe) -> f64 {
        if self.total_tagged_likes == 0 {
            return 0.0;
        }
        self.count(vibe) as f64 / self.total_tagged_likes as f64
    }
}

/// Derive an aura from a user's ratings.
///
/// Only `like` verdicts are tallied. Likes whose vibe is absent or not one of
/// `categories` are counted in `total_liked` but not in the breakdown. The
/// aura is [`Aura::Balanced`] exactly when no like was tallied, otherwise it
/// is the top category, with ties going to whichever comes first in
/// `categories`.
#[instrument(skip(ratings), fields(n_ratings = ratings.len()), level = "trace")]
pub fn classify(ratings: &[RatedVibe], categories: &[Vibe]) -> Result<AuraResult, ClassifyError> {
    if categories.is_empty() {
        return Err(ClassifyError::NoCategories);
    }
    for (index, vibe) in categories.iter().enumerate() {
        if categories[..index].contains(vibe) {
            return Err(ClassifyError::DuplicateCategory(*vibe));
        }
    }

    Ok(tally(ratings, categories))
}

pub fn classify_default(ratings: &[RatedVibe]) -> AuraResult {
    tally(ratings, &Vibe::ALL)
}

fn tally(ratings: &[RatedVibe], categories: &[Vibe]) -> AuraResult {
    let mut breakdown = categories
        .iter()
        .map(|&vibe| VibeCount { vibe, count: 0 })
        .collect::<Vec<_>>();

    let mut total_liked = 0;
    for rated in ratings.iter().filter(|rated| rated.verdict == Verdict::Like) {
        total_liked += 1;
        let Some(vibe) = rated.vibe else {
            continue;
        };
        match breakdown.iter_mut().find(|entry| entry.vibe == vibe) {
            Some(entry) => entry.count += 1,
            None => trace!(%vibe, "liked vibe is not a configured category"),
        }
    }

    // stable, so equal counts stay in category order
    breakdown.sort_by(|a, b| b.count.cmp(&a.count));

    let total_tagged_likes = breakdown.iter().map(|entry| entry.count).sum();
    let aura = match total_tagged_likes {
        0 => Aura::Balanced,
        _ => Aura::Vibe(breakdown[0].vibe),
    };

    AuraResult {
        aura,
        breakdown,
        total_liked,
        total_tagged_likes,
        total_rated: ratings.len(),
    }
}
