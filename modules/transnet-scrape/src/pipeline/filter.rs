//! Location-based filtering for crawled accounts.
//!
//! Pure functions that decide which accounts advance to the next, more
//! expensive crawl stage. Degree-0 keeps accounts whose follower
//! neighborhood is concentrated around a target location; degree-1 keeps
//! accounts whose sampled friends span genuinely different locations.
//! No I/O, no hidden state; output sets do not depend on input order.

use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One account to be judged, reduced to what the filters need: its id and
/// the free-text locations of its relevant neighbors (persisted followers
/// for degree-0, sampled friends for degree-1). `None` marks a neighbor
/// with no usable location; it still counts toward the neighborhood size.
#[derive(Debug, Clone)]
pub struct FilterCandidate {
    pub id: i64,
    pub neighbor_locations: Vec<Option<String>>,
}

// ---------------------------------------------------------------------------
// Degree 0: neighborhood concentration around a target location
// ---------------------------------------------------------------------------

/// A candidate qualifies when the fraction of its neighbors whose
/// location matches `target_location` is at least `min_ratio`.
///
/// Neighbors without a location count toward the denominator only. A
/// candidate with zero neighbors has ratio 0 by definition and never
/// qualifies, whatever the threshold.
pub fn filter_degree0(
    candidates: &[FilterCandidate],
    target_location: &str,
    min_ratio: f64,
) -> BTreeSet<i64> {
    let mut qualifying = BTreeSet::new();

    for candidate in candidates {
        let total = candidate.neighbor_locations.len();
        if total == 0 {
            continue;
        }

        let matching = candidate
            .neighbor_locations
            .iter()
            .filter(|loc| {
                loc.as_deref()
                    .map(|l| location_matches(l, target_location))
                    .unwrap_or(false)
            })
            .count();

        if matching as f64 / total as f64 >= min_ratio {
            qualifying.insert(candidate.id);
        }
    }

    qualifying
}

/// Matching policy: both sides lowercased; a location matches when it
/// contains the target as a substring, or when the alphanumeric token
/// sets of location and target intersect ("Berlin" matches target
/// "Berlin, DE" via the shared token).
pub fn location_matches(location: &str, target: &str) -> bool {
    let loc = location.to_lowercase();
    let target = target.to_lowercase();

    if loc.contains(&target) {
        return true;
    }

    !tokens(&loc).is_disjoint(&tokens(&target))
}

fn tokens(s: &str) -> BTreeSet<&str> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Degree 1: transnational friend graphs
// ---------------------------------------------------------------------------

/// A candidate qualifies as transnational when its sampled friends span
/// at least two genuinely distinct locations: after normalization,
/// neither value contains the other. "Berlin" next to "Berlin, DE" is
/// one place; "Berlin" next to "Tokyo" is two.
pub fn filter_degree1(candidates: &[FilterCandidate]) -> BTreeSet<i64> {
    let mut qualifying = BTreeSet::new();

    for candidate in candidates {
        let locations: BTreeSet<String> = candidate
            .neighbor_locations
            .iter()
            .flatten()
            .map(|l| normalize_location(l))
            .filter(|l| !l.is_empty())
            .collect();

        if spans_distinct_locations(&locations) {
            qualifying.insert(candidate.id);
        }
    }

    qualifying
}

/// Normalization policy: trim, Unicode-lowercase, collapse internal
/// whitespace runs. Diacritics are preserved — "Berlín" and "Berlin"
/// stay different values.
pub fn normalize_location(raw: &str) -> String {
    raw.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn spans_distinct_locations(locations: &BTreeSet<String>) -> bool {
    let values: Vec<&String> = locations.iter().collect();
    for (i, a) in values.iter().enumerate() {
        for b in &values[i + 1..] {
            if !a.contains(b.as_str()) && !b.contains(a.as_str()) {
                return true;
            }
        }
    }
    false
}

// ===========================================================================
// Unit tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: i64, locations: &[Option<&str>]) -> FilterCandidate {
        FilterCandidate {
            id,
            neighbor_locations: locations.iter().map(|l| l.map(str::to_string)).collect(),
        }
    }

    // ===================================================================
    // location_matches
    // ===================================================================

    #[test]
    fn match_exact() {
        assert!(location_matches("Berlin", "Berlin"));
    }

    #[test]
    fn match_case_insensitive() {
        assert!(location_matches("BERLIN", "berlin"));
    }

    #[test]
    fn match_substring() {
        assert!(location_matches("Berlin, DE", "Berlin"));
        assert!(location_matches("South Berlin", "Berlin"));
    }

    #[test]
    fn match_token_against_longer_target() {
        // Location is shorter than the target but shares a token.
        assert!(location_matches("Berlin", "Berlin, DE"));
    }

    #[test]
    fn no_match_different_city() {
        assert!(!location_matches("Paris", "Berlin"));
    }

    #[test]
    fn no_match_partial_token_only_via_substring() {
        // "Berl" is not a token of "Berlin", but target-in-location
        // substring matching still applies the other way around.
        assert!(!location_matches("Berl", "Berlin"));
        assert!(location_matches("Berlin", "Berl"));
    }

    // ===================================================================
    // filter_degree0
    // ===================================================================

    #[test]
    fn alice_berlin_scenario() {
        // Root with followers in Berlin, "Berlin, DE", Paris: 2/3 >= 0.5.
        let alice = candidate(1, &[Some("Berlin"), Some("Berlin, DE"), Some("Paris")]);
        let qualifying = filter_degree0(&[alice], "Berlin", 0.5);
        assert!(qualifying.contains(&1));
    }

    #[test]
    fn below_threshold_does_not_qualify() {
        let c = candidate(1, &[Some("Berlin"), Some("Paris"), Some("Tokyo")]);
        assert!(filter_degree0(&[c], "Berlin", 0.5).is_empty());
    }

    #[test]
    fn ratio_exactly_at_threshold_qualifies() {
        let c = candidate(1, &[Some("Berlin"), Some("Paris")]);
        assert!(filter_degree0(&[c], "Berlin", 0.5).contains(&1));
    }

    #[test]
    fn zero_followers_never_qualifies() {
        let c = candidate(1, &[]);
        assert!(filter_degree0(&[c.clone()], "Berlin", 0.5).is_empty());
        // Even a zero threshold does not admit an empty neighborhood.
        assert!(filter_degree0(&[c], "Berlin", 0.0).is_empty());
    }

    #[test]
    fn absent_location_counts_in_denominator_only() {
        // 1 match out of 2 neighbors (one locationless): exactly 0.5.
        let at_half = candidate(1, &[Some("Berlin"), None]);
        assert!(filter_degree0(&[at_half], "Berlin", 0.5).contains(&1));

        // 1 match out of 3 neighbors (two locationless): below 0.5.
        let below = candidate(2, &[Some("Berlin"), None, None]);
        assert!(filter_degree0(&[below], "Berlin", 0.5).is_empty());
    }

    #[test]
    fn degree0_judges_each_candidate_independently() {
        let qualifies = candidate(1, &[Some("Berlin"), Some("Berlin")]);
        let fails = candidate(2, &[Some("Paris"), Some("Paris")]);
        let empty = candidate(3, &[]);
        let qualifying = filter_degree0(&[qualifies, fails, empty], "Berlin", 0.5);
        assert_eq!(qualifying.into_iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn degree0_is_order_independent() {
        let a = candidate(1, &[Some("Berlin"), Some("Paris")]);
        let b = candidate(2, &[Some("Berlin, DE"), Some("Berlin")]);
        let c = candidate(3, &[Some("Tokyo")]);

        let forward = filter_degree0(&[a.clone(), b.clone(), c.clone()], "Berlin", 0.5);
        let reversed = filter_degree0(&[c, b, a], "Berlin", 0.5);
        assert_eq!(forward, reversed);
    }

    // ===================================================================
    // normalize_location
    // ===================================================================

    #[test]
    fn normalization_lowercases_and_collapses_whitespace() {
        assert_eq!(normalize_location("  Berlin,   DE "), "berlin, de");
    }

    #[test]
    fn normalization_preserves_diacritics() {
        assert_eq!(normalize_location("Berlín"), "berlín");
    }

    // ===================================================================
    // filter_degree1
    // ===================================================================

    #[test]
    fn single_location_does_not_qualify() {
        let c = candidate(1, &[Some("Berlin"), Some("Berlin")]);
        assert!(filter_degree1(&[c]).is_empty());
    }

    #[test]
    fn two_distinct_locations_qualify() {
        let c = candidate(1, &[Some("Berlin"), Some("Tokyo")]);
        assert!(filter_degree1(&[c]).contains(&1));
    }

    #[test]
    fn mutual_substrings_are_one_place() {
        // "Berlin" is contained in "Berlin, DE": same place, no qualify.
        let c = candidate(1, &[Some("Berlin"), Some("Berlin, DE")]);
        assert!(filter_degree1(&[c]).is_empty());
    }

    #[test]
    fn substring_pair_plus_genuine_outlier_qualifies() {
        let c = candidate(1, &[Some("Berlin"), Some("Berlin, DE"), Some("Tokyo")]);
        assert!(filter_degree1(&[c]).contains(&1));
    }

    #[test]
    fn case_differences_are_one_place() {
        let c = candidate(1, &[Some("BERLIN"), Some("berlin")]);
        assert!(filter_degree1(&[c]).is_empty());
    }

    #[test]
    fn diacritics_make_distinct_values() {
        // Documented consequence of the normalization policy.
        let c = candidate(1, &[Some("Berlin"), Some("Berlín")]);
        assert!(filter_degree1(&[c]).contains(&1));
    }

    #[test]
    fn locationless_friends_are_ignored() {
        let c = candidate(1, &[Some("Berlin"), None, None]);
        assert!(filter_degree1(&[c]).is_empty());

        let d = candidate(2, &[Some("Berlin"), None, Some("Tokyo")]);
        assert!(filter_degree1(&[d]).contains(&2));
    }

    #[test]
    fn empty_friend_set_does_not_qualify() {
        let c = candidate(1, &[]);
        assert!(filter_degree1(&[c]).is_empty());
    }

    #[test]
    fn degree1_is_order_independent() {
        let a = candidate(1, &[Some("Berlin"), Some("Tokyo")]);
        let b = candidate(2, &[Some("Paris"), Some("Paris")]);

        let forward = filter_degree1(&[a.clone(), b.clone()]);
        let reversed = filter_degree1(&[b, a]);
        assert_eq!(forward, reversed);
    }
}
