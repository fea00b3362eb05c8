use strsim::normalized_damerau_levenshtein;

pub const DEFAULT_CUTOFF: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyMatch<'c> {
    pub candidate: &'c str,
    pub score: f64,
}

/// Similarity in `[0, 1]`: `1 - distance / max(len)`, counted in chars.
/// A swap of two adjacent letters costs a single edit.
pub fn similarity(a: &str, b: &str) -> f64 {
    normalized_damerau_levenshtein(a, b)
}

/// Best candidate scoring at least `cutoff`.
///
/// Ties keep the candidate that came first, so the result is fixed for a
/// fixed candidate order.
pub fn best_match<'c, I>(token: &str, candidates: I, cutoff: f64) -> Option<FuzzyMatch<'c>>
where
    I: IntoIterator<Item = &'c str>,
{
    let token_len = token.chars().count();
    let mut best: Option<FuzzyMatch<'c>> = None;

    for candidate in candidates {
        if !length_can_reach(token_len, candidate.chars().count(), cutoff) {
            continue;
        }

        let score = similarity(token, candidate);
        if score < cutoff {
            continue;
        }

        match best {
            Some(current) if current.score >= score => {}
            _ => best = Some(FuzzyMatch { candidate, score }),
        }
    }

    best
}

// The edit distance is at least the length difference, which caps the score.
fn length_can_reach(a: usize, b: usize, cutoff: f64) -> bool {
    let longest = a.max(b);
    if longest == 0 {
        return true;
    }
    let ceiling = 1.0 - a.abs_diff(b) as f64 / longest as f64;
    ceiling >= cutoff
}
