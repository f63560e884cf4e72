// Fuzzy exemptions - approximate matching against a group's stored phrases.
//
// Similarity is the Sørensen-Dice coefficient over character bigrams, with
// whitespace ignored. Scores are symmetric and lie in [0, 1].

use super::moderation_models::ExceptionEntry;
use std::collections::HashMap;

/// Dice coefficient between two strings.
pub fn similarity(first: &str, second: &str) -> f64 {
    let first: Vec<char> = first.chars().filter(|c| !c.is_whitespace()).collect();
    let second: Vec<char> = second.chars().filter(|c| !c.is_whitespace()).collect();

    if first == second {
        return 1.0;
    }
    if first.len() < 2 || second.len() < 2 {
        return 0.0;
    }

    let mut bigrams: HashMap<(char, char), usize> = HashMap::new();
    for pair in first.windows(2) {
        *bigrams.entry((pair[0], pair[1])).or_insert(0) += 1;
    }

    let mut intersection = 0usize;
    for pair in second.windows(2) {
        if let Some(count) = bigrams.get_mut(&(pair[0], pair[1])) {
            if *count > 0 {
                *count -= 1;
                intersection += 1;
            }
        }
    }

    (2.0 * intersection as f64) / ((first.len() - 1) + (second.len() - 1)) as f64
}

/// Find the first stored exception close enough to `text`.
///
/// Returns the matching entry and its score.
pub fn find_fuzzy_match<'a>(
    text: &str,
    exceptions: &'a [ExceptionEntry],
    threshold: f64,
) -> Option<(&'a ExceptionEntry, f64)> {
    let input = text.to_lowercase();

    exceptions
        .iter()
        .map(|entry| (entry, similarity(&entry.text, &input)))
        .find(|(_, score)| *score >= threshold)
}

pub fn is_fuzzy_exempt(text: &str, exceptions: &[ExceptionEntry], threshold: f64) -> bool {
    match find_fuzzy_match(text, exceptions, threshold) {
        Some((entry, score)) => {
            tracing::info!(
                group_id = entry.group_id,
                score,
                exception = %entry.text,
                "Message matches stored exception"
            );
            true
        }
        None => false,
    }
}
