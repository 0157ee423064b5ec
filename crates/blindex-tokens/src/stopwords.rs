//! German stop words excluded from indexing and from queries.
//!
//! Articles, pronouns, auxiliaries, common conjunctions and prepositions.
//! Entries shorter than the minimum term length are kept so the list stays
//! correct if that minimum is lowered.

const STOP_WORDS: &[&str] = &[
    "der", "die", "das", "den", "dem", "des", "ein", "eine", "einer", "einem", "einen", "und",
    "oder", "aber", "wenn", "weil", "ist", "sind", "war", "waren", "wird", "werden", "hat",
    "haben", "hatte", "hatten", "ich", "du", "er", "sie", "es", "wir", "ihr", "mein", "meine",
    "dein", "deine", "sein", "seine", "was", "wer", "wie", "wo", "wann", "warum", "zu", "von",
    "mit", "bei", "für", "auf", "an", "in", "nicht", "kein", "keine", "auch", "noch", "nur",
    "schon",
];

/// Check a case-folded term against the stop list.
#[inline]
pub fn is_stop_word(term: &str) -> bool {
    STOP_WORDS.contains(&term)
}
