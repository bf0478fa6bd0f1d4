//! Food-name similarity matching
//!
//! Lookup pipeline for detected food names: exact match, then substring
//! containment, then a fuzzy fallback with a similarity floor and bounded
//! result count. The scoring function is a pluggable trait so the edit
//! distance implementation can be swapped out.

use serde::Serialize;

/// Scores how similar two names are, in [0, 1]
pub trait SimilarityScorer {
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Levenshtein distance normalized by the longer string's length
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedLevenshtein;

impl SimilarityScorer for NormalizedLevenshtein {
    fn score(&self, a: &str, b: &str) -> f64 {
        let a_chars: Vec<char> = a.chars().collect();
        let b_chars: Vec<char> = b.chars().collect();
        let max_len = a_chars.len().max(b_chars.len());

        if max_len == 0 {
            return 0.0;
        }

        let distance = levenshtein(&a_chars, &b_chars);
        1.0 - (distance as f64 / max_len as f64)
    }
}

/// How a candidate matched the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Substring,
    Fuzzy,
}

/// One matched candidate
#[derive(Debug, Clone, Serialize)]
pub struct NameMatch {
    pub id: i64,
    pub name: String,
    pub kind: MatchKind,
    pub score: f64,
}

/// Configurable matcher over name snapshots
pub struct FoodMatcher<S: SimilarityScorer = NormalizedLevenshtein> {
    scorer: S,
    /// Minimum score for a fuzzy match to count
    similarity_floor: f64,
    /// Cap on substring results
    max_substring_results: usize,
    /// Cap on fuzzy results
    max_fuzzy_results: usize,
}

impl Default for FoodMatcher<NormalizedLevenshtein> {
    fn default() -> Self {
        Self {
            scorer: NormalizedLevenshtein,
            similarity_floor: 0.75,
            max_substring_results: 10,
            max_fuzzy_results: 5,
        }
    }
}

impl<S: SimilarityScorer> FoodMatcher<S> {
    pub fn with_scorer(scorer: S, similarity_floor: f64) -> Self {
        Self {
            scorer,
            similarity_floor,
            max_substring_results: 10,
            max_fuzzy_results: 5,
        }
    }

    /// Find candidates matching a query name
    ///
    /// Exact matches short-circuit; substring matches come next; only when
    /// neither stage finds anything does the fuzzy fallback run.
    pub fn find_matches(&self, query: &str, candidates: &[(i64, String)]) -> Vec<NameMatch> {
        let query_lower = query.trim().to_lowercase();
        if query_lower.is_empty() {
            return Vec::new();
        }

        // Stage 1: exact (case-insensitive)
        let exact: Vec<NameMatch> = candidates
            .iter()
            .filter(|(_, name)| name.to_lowercase() == query_lower)
            .map(|(id, name)| NameMatch {
                id: *id,
                name: name.clone(),
                kind: MatchKind::Exact,
                score: 1.0,
            })
            .collect();

        if !exact.is_empty() {
            return exact;
        }

        // Stage 2: substring containment
        let substring: Vec<NameMatch> = candidates
            .iter()
            .filter(|(_, name)| name.to_lowercase().contains(&query_lower))
            .take(self.max_substring_results)
            .map(|(id, name)| NameMatch {
                id: *id,
                name: name.clone(),
                kind: MatchKind::Substring,
                score: query_lower.len() as f64 / name.len().max(1) as f64,
            })
            .collect();

        if !substring.is_empty() {
            return substring;
        }

        // Stage 3: fuzzy fallback with similarity floor
        let mut fuzzy: Vec<NameMatch> = candidates
            .iter()
            .filter_map(|(id, name)| {
                let score = self.scorer.score(&query_lower, &name.to_lowercase());
                if score >= self.similarity_floor {
                    Some(NameMatch {
                        id: *id,
                        name: name.clone(),
                        kind: MatchKind::Fuzzy,
                        score,
                    })
                } else {
                    None
                }
            })
            .collect();

        fuzzy.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        fuzzy.truncate(self.max_fuzzy_results);
        fuzzy
    }
}

/// Classic two-row Levenshtein
fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution_cost = if ca == cb { 0 } else { 1 };
            current[j + 1] = (previous[j] + substitution_cost)
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<(i64, String)> {
        vec![
            (1, "Apple".to_string()),
            (2, "Green apple".to_string()),
            (3, "Pineapple".to_string()),
            (4, "Banana".to_string()),
            (5, "White rice".to_string()),
        ]
    }

    #[test]
    fn test_levenshtein_basics() {
        let s = NormalizedLevenshtein;
        assert_eq!(s.score("apple", "apple"), 1.0);
        assert_eq!(s.score("", ""), 0.0);
        // "apple" vs "aple": 1 deletion over 5 chars
        assert!((s.score("apple", "aple") - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_exact_match_short_circuits() {
        let matcher = FoodMatcher::default();
        let matches = matcher.find_matches("apple", &catalog());

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, 1);
        assert_eq!(matches[0].kind, MatchKind::Exact);
    }

    #[test]
    fn test_substring_match() {
        let matcher = FoodMatcher::default();
        let matches = matcher.find_matches("rice", &catalog());

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, 5);
        assert_eq!(matches[0].kind, MatchKind::Substring);
    }

    #[test]
    fn test_fuzzy_fallback_with_floor() {
        let matcher = FoodMatcher::default();

        // "banan" isn't contained in any name but is close to "Banana"
        let matches = matcher.find_matches("bananna", &catalog());
        assert!(!matches.is_empty());
        assert_eq!(matches[0].id, 4);
        assert_eq!(matches[0].kind, MatchKind::Fuzzy);
        assert!(matches[0].score >= 0.75);
    }

    #[test]
    fn test_no_match_below_floor() {
        let matcher = FoodMatcher::default();
        let matches = matcher.find_matches("chocolate cake", &catalog());
        assert!(matches.is_empty());
    }

    #[test]
    fn test_empty_query() {
        let matcher = FoodMatcher::default();
        assert!(matcher.find_matches("", &catalog()).is_empty());
        assert!(matcher.find_matches("   ", &catalog()).is_empty());
    }

    #[test]
    fn test_fuzzy_results_sorted_and_bounded() {
        let candidates: Vec<(i64, String)> = (0..20)
            .map(|i| (i, format!("appl{}", i)))
            .collect();

        let matcher = FoodMatcher::default();
        let matches = matcher.find_matches("apple", &candidates);

        assert!(matches.len() <= 5);
        for pair in matches.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }
}
