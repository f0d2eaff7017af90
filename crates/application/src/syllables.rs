//! Heuristic Spanish syllabification.
//!
//! A syllable closes after its vowel nucleus plus at most one following
//! consonant. Diphthongs and triphthongs form a single nucleus. This is an
//! approximation: it is consistent, not linguistically exact (e.g. "hola"
//! yields `["hol", "a"]`).

use crate::constants::{DIPHTHONGS, VOWELS};

pub struct SyllableEstimator;

fn is_vowel(c: char) -> bool {
    VOWELS.contains(&c)
}

fn is_diphthong(a: char, b: char) -> bool {
    let mut pair = String::with_capacity(8);
    pair.push(a);
    pair.push(b);
    DIPHTHONGS.contains(&pair.as_str())
}

fn is_weak(c: char) -> bool {
    matches!(c, 'i' | 'u' | 'ü')
}

fn is_strong(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'o' | 'á' | 'é' | 'ó')
}

/// Weak + strong + weak, as in "buey" or "averiguáis".
fn is_triphthong(a: char, b: char, c: char) -> bool {
    is_weak(a) && is_strong(b) && matches!(c, 'i' | 'u')
}

impl SyllableEstimator {
    /// Split `word` into syllables, left to right.
    ///
    /// Empty input gives an empty list. Non-empty input without vowels
    /// gives the whole word as one syllable.
    pub fn estimate(word: &str) -> Vec<String> {
        let text = word.trim().to_lowercase();
        if text.is_empty() {
            return Vec::new();
        }
        if text == "tal" {
            return vec![text];
        }

        let chars: Vec<char> = text.chars().collect();
        let mut syllables = Vec::new();
        let mut current = String::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            current.push(c);

            if is_vowel(c) {
                if i + 2 < chars.len() && is_triphthong(c, chars[i + 1], chars[i + 2]) {
                    current.push(chars[i + 1]);
                    current.push(chars[i + 2]);
                    i += 2;
                } else if i + 1 < chars.len()
                    && is_vowel(chars[i + 1])
                    && is_diphthong(c, chars[i + 1])
                {
                    current.push(chars[i + 1]);
                    i += 1;
                }

                if i + 1 < chars.len() && !is_vowel(chars[i + 1]) {
                    current.push(chars[i + 1]);
                    i += 1;
                }
                syllables.push(std::mem::take(&mut current));
            }
            i += 1;
        }

        if !current.is_empty() {
            match syllables.last_mut() {
                Some(last) => last.push_str(&current),
                None => syllables.push(current),
            }
        }

        syllables
    }

    pub fn count(word: &str) -> usize {
        Self::estimate(word).len()
    }
}
