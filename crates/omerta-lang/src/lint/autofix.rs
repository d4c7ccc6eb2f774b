//! Near-miss suggestions for unresolved names.

use strsim::levenshtein;

/// Largest edit distance at which a fix is applied automatically.
pub const FIX_DISTANCE: usize = 1;

/// Largest edit distance at which a name is still offered as a hint.
pub const HINT_DISTANCE: usize = 2;

/// A replacement name for an unresolved reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub name: String,
    /// Safe to apply without asking: the only candidate within
    /// [`FIX_DISTANCE`].
    pub fixable: bool,
}

/// Suggest a declared name for `needle`.
///
/// Candidates are ranked by edit distance, then by declaration order. The
/// result is fixable only when exactly one candidate lies within
/// [`FIX_DISTANCE`]; otherwise the closest candidate within
/// [`HINT_DISTANCE`] is returned as a hint.
pub fn suggest<'a>(needle: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<Suggestion> {
    let mut scored: Vec<(usize, &str)> = candidates
        .into_iter()
        .filter(|c| *c != needle)
        .map(|c| (levenshtein(needle, c), c))
        .filter(|(d, _)| *d <= HINT_DISTANCE)
        .collect();
    // Stable: equal distances keep declaration order.
    scored.sort_by_key(|(d, _)| *d);

    let close = scored.iter().filter(|(d, _)| *d <= FIX_DISTANCE).count();
    scored.first().map(|(_, name)| Suggestion {
        name: (*name).to_string(),
        fixable: close == 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::substitution("Ofer", &["Offer", "Accept"], Some(("Offer", true)))]
    #[case::insertion("Offerr", &["Offer"], Some(("Offer", true)))]
    #[case::deletion("chek", &["check", "settle"], Some(("check", true)))]
    #[case::two_close("Bid", &["Bad", "Bit"], Some(("Bad", false)))]
    #[case::hint_only("Setle", &["Settled"], Some(("Settled", false)))]
    #[case::too_far("Payment", &["Offer"], None)]
    #[case::no_candidates("Offer", &[], None)]
    fn suggestions(
        #[case] needle: &str,
        #[case] candidates: &[&str],
        #[case] expected: Option<(&str, bool)>,
    ) {
        let got = suggest(needle, candidates.iter().copied());
        let got = got.as_ref().map(|s| (s.name.as_str(), s.fixable));
        assert_eq!(got, expected);
    }

    #[test]
    fn transposition_counts_as_two_edits() {
        let got = suggest("Ofefr", ["Offer"]).expect("hint");
        assert!(!got.fixable);
    }
}
