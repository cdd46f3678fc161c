//! "Did you mean" suggestions for unresolved names

use strsim::levenshtein;

/// Maximum edit distance still considered a plausible typo
const MAX_DISTANCE: usize = 2;

/// Pick the candidate closest to `name`, if any is close enough.
///
/// Ties go to the earliest candidate, which enumeration order makes the
/// innermost binding.
pub fn did_you_mean<'a, I>(name: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&str, usize)> = None;
    for candidate in candidates {
        if candidate == name {
            continue;
        }
        let distance = levenshtein(name, candidate);
        if distance > MAX_DISTANCE || distance >= name.len().max(candidate.len()) {
            continue;
        }
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((candidate, distance));
        }
    }
    best.map(|(candidate, _)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_match() {
        let names = ["counter", "total", "index"];
        assert_eq!(did_you_mean("countr", names), Some("counter"));
        assert_eq!(did_you_mean("totall", names), Some("total"));
    }

    #[test]
    fn test_distant_names_rejected() {
        let names = ["alpha", "beta"];
        assert_eq!(did_you_mean("zzzzzz", names), None);
    }

    #[test]
    fn test_short_names_not_matched_noisily() {
        // "x" vs "y" is distance 1 but carries no signal
        assert_eq!(did_you_mean("x", ["y"]), None);
    }

    #[test]
    fn test_prefers_closest() {
        assert_eq!(
            did_you_mean("conter", ["content", "counter"]),
            Some("counter")
        );
    }
}
