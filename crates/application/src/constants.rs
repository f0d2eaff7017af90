/// Spanish vowels, including accented forms and diaeresis.
pub const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u', 'á', 'é', 'í', 'ó', 'ú', 'ü'];

/// Vowel pairs kept together as one syllable nucleus.
pub const DIPHTHONGS: &[&str] = &[
    "ai", "au", "ei", "eu", "ia", "ie", "io", "iu", "oa", "oe", "oi", "ou", "ua", "ue", "ui", "uo",
];

/// Short, high-frequency words that pass the filter regardless of syllable count.
pub const SYLLABLE_EXCEPTIONS: &[&str] = &["tal", "que", "con", "por", "sin", "son"];

/// Quality score weights (confidence, duration, syllables).
pub const CONFIDENCE_WEIGHT: f64 = 0.6;
pub const DURATION_WEIGHT: f64 = 0.2;
pub const SYLLABLE_WEIGHT: f64 = 0.2;

/// Durations inside this range (seconds) score 1.0.
pub const PREFERRED_MIN_DURATION: f64 = 0.2;
pub const PREFERRED_MAX_DURATION: f64 = 2.0;

/// Syllable counts above this score 0.8; a single syllable scores 0.6.
pub const PREFERRED_MAX_SYLLABLES: usize = 5;

/// Prefix of generated entity ids (`word_001`, `word_002`, ...).
pub const ENTITY_ID_PREFIX: &str = "word_";

/// Name given to list-mapping entries that carry no speaker name.
pub const UNKNOWN_SPEAKER_NAME: &str = "Unknown Speaker";
