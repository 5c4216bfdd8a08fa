//! Trigram similarity with pg_trgm semantics.
//!
//! Text is split into words of alphanumeric characters, each word is
//! lower-cased and padded with two leading blanks and one trailing blank, and
//! the set of three-character windows is collected. Similarity is the
//! Jaccard index of the two sets.

use std::collections::HashSet;

type Trigram = [char; 3];

/// Distinct trigrams of `text`
pub fn trigrams(text: &str) -> HashSet<Trigram> {
    let mut set = HashSet::new();

    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let padded: Vec<char> = "  "
            .chars()
            .chain(word.chars().flat_map(char::to_lowercase))
            .chain(std::iter::once(' '))
            .collect();

        for window in padded.windows(3) {
            set.insert([window[0], window[1], window[2]]);
        }
    }

    set
}

/// Similarity in [0, 1]; 0 when either side has no trigrams
pub fn similarity(a: &str, b: &str) -> f32 {
    let left = trigrams(a);
    let right = trigrams(b);

    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let shared = left.intersection(&right).count();
    let union = left.len() + right.len() - shared;

    shared as f32 / union as f32
}

/// Best similarity between `text` and any single word.
///
/// One strongly matching word is enough to surface a document, so the
/// maximum is used rather than the mean.
pub fn max_word_similarity<'a>(text: &str, words: impl IntoIterator<Item = &'a str>) -> f32 {
    let target = trigrams(text);
    if target.is_empty() {
        return 0.0;
    }

    words
        .into_iter()
        .map(|word| {
            let grams = trigrams(word);
            if grams.is_empty() {
                return 0.0;
            }
            let shared = grams.intersection(&target).count();
            shared as f32 / (grams.len() + target.len() - shared) as f32
        })
        .fold(0.0, f32::max)
}
