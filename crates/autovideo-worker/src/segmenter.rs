//! Script segmentation into timed scenes.

use autovideo_models::Scene;
use regex::Regex;
use std::sync::LazyLock;

/// Sentence terminator followed by whitespace.
static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence break pattern"));

/// Split a script into trimmed, non-empty sentences.
///
/// A sentence ends after `.`, `!` or `?` when whitespace follows; the
/// punctuation stays with the sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_BREAK.find_iter(text) {
        // Terminators are single-byte ASCII
        let end = m.start() + 1;
        push_trimmed(&mut sentences, &text[start..end]);
        start = m.end();
    }
    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, fragment: &str) {
    let fragment = fragment.trim();
    if !fragment.is_empty() {
        sentences.push(fragment.to_string());
    }
}

/// Share `total_duration` across sentences in proportion to their length in
/// characters.
///
/// The last scene takes whatever remains so the durations sum to the total.
pub fn apportion(sentences: Vec<String>, total_duration: f64) -> Vec<Scene> {
    let total_chars: usize = sentences.iter().map(|s| s.chars().count()).sum();
    if total_chars == 0 {
        return Vec::new();
    }

    let count = sentences.len();
    let mut allotted = 0.0;
    sentences
        .into_iter()
        .enumerate()
        .map(|(index, text)| {
            let duration = if index + 1 == count {
                (total_duration - allotted).max(0.0)
            } else {
                let share = text.chars().count() as f64 / total_chars as f64 * total_duration;
                allotted += share;
                share
            };
            Scene::new(index, text, duration)
        })
        .collect()
}
