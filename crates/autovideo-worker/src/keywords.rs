//! Unsupervised keyword extraction for stock footage queries.
//!
//! A YAKE-style ranker: every word gets a score from five statistical
//! features (casing, position, frequency, context relatedness and sentence
//! spread), candidate phrases of one or two words combine their word scores,
//! and lower scores rank higher. Near-duplicate phrases are collapsed by
//! normalized Levenshtein similarity.

use std::collections::{HashMap, HashSet};

use crate::segmenter::split_sentences;

/// Longest candidate phrase, in words.
const MAX_NGRAM: usize = 2;
/// Phrases at least this similar to a better-ranked one are dropped.
const DEDUP_THRESHOLD: f64 = 0.9;

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// One word occurrence.
#[derive(Debug, Clone)]
struct Token {
    surface: String,
    key: String,
}

#[derive(Debug, Default)]
struct TermStats {
    tf: f64,
    /// Occurrences written in all caps (acronyms)
    tf_acronym: f64,
    /// Capitalized occurrences not opening a sentence
    tf_capitalized: f64,
    sentences: Vec<usize>,
    left: Vec<String>,
    right: Vec<String>,
}

/// Extract up to `max_keywords` key phrases, best first.
pub fn extract_keywords(text: &str, max_keywords: usize) -> Vec<String> {
    if max_keywords == 0 {
        return Vec::new();
    }

    let sentences: Vec<Vec<Token>> = split_sentences(text)
        .iter()
        .map(|s| tokenize(s))
        .filter(|tokens| !tokens.is_empty())
        .collect();
    if sentences.is_empty() {
        return Vec::new();
    }

    let stats = collect_stats(&sentences);
    let scores = score_terms(&stats, sentences.len());
    let candidates = score_candidates(&sentences, &scores);

    let mut selected: Vec<String> = Vec::new();
    for (surface, _) in candidates {
        let key = surface.to_lowercase();
        if selected
            .iter()
            .any(|s| similarity(&s.to_lowercase(), &key) >= DEDUP_THRESHOLD)
        {
            continue;
        }
        selected.push(surface);
        if selected.len() == max_keywords {
            break;
        }
    }
    selected
}

/// Build the stock search query for a scene.
pub fn search_query(genre: &str, keywords: &[String]) -> String {
    let mut query = genre.trim().to_string();
    for keyword in keywords {
        if !query.is_empty() {
            query.push(' ');
        }
        query.push_str(keyword);
    }
    query
}

fn tokenize(sentence: &str) -> Vec<Token> {
    sentence
        .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '-'))
        .map(|w| w.trim_matches(|c: char| c == '\'' || c == '-'))
        .filter(|w| !w.is_empty())
        .map(|w| Token {
            surface: w.to_string(),
            key: w.to_lowercase(),
        })
        .collect()
}

/// A word can head or be part of a candidate only if it has letters.
fn is_candidate_word(token: &Token) -> bool {
    token.key.chars().any(|c| c.is_alphabetic()) && !is_stopword(&token.key)
}

fn collect_stats(sentences: &[Vec<Token>]) -> HashMap<String, TermStats> {
    let mut stats: HashMap<String, TermStats> = HashMap::new();
    for (sentence_index, tokens) in sentences.iter().enumerate() {
        for (i, token) in tokens.iter().enumerate() {
            let entry = stats.entry(token.key.clone()).or_default();
            entry.tf += 1.0;
            entry.sentences.push(sentence_index);

            let letters: Vec<char> = token.surface.chars().filter(|c| c.is_alphabetic()).collect();
            if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) {
                entry.tf_acronym += 1.0;
            } else if i > 0 && letters.first().is_some_and(|c| c.is_uppercase()) {
                entry.tf_capitalized += 1.0;
            }

            // Co-occurrence window of one word on each side, stopwords excluded
            if i > 0 && !is_stopword(&tokens[i - 1].key) {
                entry.left.push(tokens[i - 1].key.clone());
            }
            if i + 1 < tokens.len() && !is_stopword(&tokens[i + 1].key) {
                entry.right.push(tokens[i + 1].key.clone());
            }
        }
    }
    stats
}

fn score_terms(stats: &HashMap<String, TermStats>, sentence_count: usize) -> HashMap<String, f64> {
    let content_tfs: Vec<f64> = stats
        .iter()
        .filter(|(key, _)| !is_stopword(key))
        .map(|(_, s)| s.tf)
        .collect();
    let (mean_tf, std_tf) = mean_and_std(&content_tfs);
    let max_tf = stats.values().map(|s| s.tf).fold(1.0, f64::max);

    stats
        .iter()
        .map(|(key, s)| {
            let casing = s.tf_acronym.max(s.tf_capitalized) / (1.0 + s.tf.ln());
            let position = (3.0 + median(&s.sentences)).ln().ln();
            let frequency = s.tf / (mean_tf + std_tf).max(f64::EPSILON);
            let relatedness = 1.0 + (dispersion(&s.left) + dispersion(&s.right)) * (s.tf / max_tf);
            let spread = distinct(&s.sentences) as f64 / sentence_count as f64;

            let score = (relatedness * position)
                / (casing + frequency / relatedness + spread / relatedness);
            (key.clone(), score)
        })
        .collect()
}

/// Rank 1- and 2-word candidates, best (lowest score) first.
fn score_candidates(sentences: &[Vec<Token>], scores: &HashMap<String, f64>) -> Vec<(String, f64)> {
    // key -> (first surface form, first position, occurrences)
    let mut found: HashMap<String, (String, usize, f64)> = HashMap::new();
    let mut position = 0usize;
    for tokens in sentences {
        for start in 0..tokens.len() {
            for len in 1..=MAX_NGRAM {
                let Some(words) = tokens.get(start..start + len) else {
                    break;
                };
                let (first, last) = (&words[0], &words[len - 1]);
                if !is_candidate_word(first) || !is_candidate_word(last) {
                    continue;
                }
                let key = words.iter().map(|t| t.key.as_str()).collect::<Vec<_>>().join(" ");
                let surface = words.iter().map(|t| t.surface.as_str()).collect::<Vec<_>>().join(" ");
                let entry = found.entry(key).or_insert((surface, position, 0.0));
                entry.2 += 1.0;
            }
            position += 1;
        }
    }

    let mut ranked: Vec<(String, f64, usize)> = found
        .into_iter()
        .map(|(key, (surface, first_seen, tf))| {
            let term_scores: Vec<f64> = key
                .split(' ')
                .map(|k| scores.get(k).copied().unwrap_or(1.0))
                .collect();
            let product: f64 = term_scores.iter().product();
            let sum: f64 = term_scores.iter().sum();
            (surface, product / (tf * (1.0 + sum)), first_seen)
        })
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.2.cmp(&b.2)));
    ranked.into_iter().map(|(surface, score, _)| (surface, score)).collect()
}

fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

fn median(values: &[usize]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    }
}

fn distinct<T: Eq + std::hash::Hash>(values: &[T]) -> usize {
    values.iter().collect::<HashSet<_>>().len()
}

/// Distinct neighbours over total neighbours (0 when there are none).
fn dispersion(neighbours: &[String]) -> f64 {
    if neighbours.is_empty() {
        return 0.0;
    }
    distinct(neighbours) as f64 / neighbours.len() as f64
}

/// Normalized Levenshtein similarity in [0, 1].
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&a, &b) as f64 / longest as f64
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_sentence() {
        let keywords = extract_keywords("A cat sleeps.", 3);
        assert!(!keywords.is_empty());
        assert!(keywords.len() <= 3);
        assert!(keywords.iter().any(|k| k.to_lowercase().contains("cat")));
        assert!(keywords.iter().all(|k| k != "A"));
    }

    #[test]
    fn test_candidates_never_start_or_end_with_stopword() {
        let text = "The old lighthouse stands on the rocky coast of the northern sea.";
        for keyword in extract_keywords(text, 10) {
            let words: Vec<String> = keyword.split(' ').map(|w| w.to_lowercase()).collect();
            assert!(words.len() <= MAX_NGRAM, "{keyword}");
            assert!(!is_stopword(&words[0]), "{keyword}");
            assert!(!is_stopword(&words[words.len() - 1]), "{keyword}");
        }
    }

    #[test]
    fn test_limit_is_respected() {
        let text = "Volcanic islands rise from the ocean floor. Lava cools into black sand beaches.";
        assert_eq!(extract_keywords(text, 2).len(), 2);
        assert!(extract_keywords(text, 0).is_empty());
    }

    #[test]
    fn test_no_keywords_from_stopwords_or_empty_text() {
        assert!(extract_keywords("", 3).is_empty());
        assert!(extract_keywords("It is what it is.", 3).is_empty());
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let text = "Rain forests hold half the species on Earth. Rain forests are shrinking.";
        assert_eq!(extract_keywords(text, 3), extract_keywords(text, 3));
    }

    #[test]
    fn test_near_duplicates_are_collapsed() {
        let keywords = extract_keywords("Rainforest. Rainforests.", 3);
        // "rainforest" vs "rainforests" is 10/11 similar
        assert_eq!(keywords.len(), 1);
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("cat", "cat"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
        assert!((similarity("cat", "cats") - 0.75).abs() < 1e-9);
        assert!((similarity("kitten", "sitting") - (1.0 - 3.0 / 7.0)).abs() < 1e-9);
    }

    #[test]
    fn test_search_query() {
        let keywords = vec!["cat".to_string(), "sleeps".to_string()];
        assert_eq!(search_query("Nature", &keywords), "Nature cat sleeps");
        assert_eq!(search_query("Nature", &[]), "Nature");
    }
}
