use crate::search::CityCandidate;

/// Largest edit distance still accepted as a match.
pub const MAX_DISTANCE: usize = 5;

/// Anything with a display name that can be fuzzy-matched.
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for String {
    fn name(&self) -> &str {
        self
    }
}

impl Named for &str {
    fn name(&self) -> &str {
        self
    }
}

impl Named for CityCandidate {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Candidate with the smallest case-insensitive Levenshtein distance to
/// `query`. The earliest candidate wins ties; nothing within
/// [`MAX_DISTANCE`] yields `None`.
pub fn best_match<'a, T: Named>(query: &str, candidates: &'a [T]) -> Option<&'a T> {
    let query = query.to_lowercase();

    let (distance, best) = candidates
        .iter()
        .map(|c| (strsim::levenshtein(&query, &c.name().to_lowercase()), c))
        .fold(None, |best: Option<(usize, &T)>, (d, c)| match best {
            Some((bd, _)) if bd <= d => best,
            _ => Some((d, c)),
        })?;

    (distance <= MAX_DISTANCE).then_some(best)
}
