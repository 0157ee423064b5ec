//! Text tokenizer for the blind index.
//!
//! Pipeline: Unicode letter/digit runs → case fold → drop short runs
//!           → drop stop words → truncate long runs → prefix expansion
//!
//! Pure and total: any string yields a (possibly empty) term sequence.

use blindex_types::TokenizerSettings;

use crate::stopwords::is_stop_word;

/// Split text into maximal runs of alphanumeric characters.
///
/// Underscore, whitespace and punctuation all separate runs.
fn word_runs(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|run| !run.is_empty())
}

/// Take the first `n` chars of `s` as an owned string.
fn take_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// Normalizes text into index terms.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    settings: TokenizerSettings,
}

impl Tokenizer {
    pub fn new(settings: TokenizerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &TokenizerSettings {
        &self.settings
    }

    /// Normalize one word run.
    ///
    /// Returns `None` for runs that are too short or are stop words.
    /// Length checks run on the case-folded form.
    pub fn normalize(&self, run: &str) -> Option<String> {
        let folded = caseless::default_case_fold_str(run);
        let len = folded.chars().count();
        if len < self.settings.min_term_chars {
            return None;
        }
        if is_stop_word(&folded) {
            return None;
        }
        if len > self.settings.max_term_chars {
            return Some(take_chars(&folded, self.settings.max_term_chars));
        }
        Some(folded)
    }

    /// Expand a normalized term into itself plus, for long terms, its prefix.
    fn expand(&self, term: String) -> impl Iterator<Item = String> {
        let prefix = if term.chars().count() >= self.settings.prefix_trigger_chars {
            Some(take_chars(&term, self.settings.prefix_chars))
        } else {
            None
        };
        std::iter::once(term).chain(prefix)
    }

    /// Lazily produce terms in processing order.
    ///
    /// Each surviving run yields its full term first, then its prefix term.
    /// Duplicates are not removed here.
    pub fn terms<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        word_runs(text)
            .filter_map(move |run| self.normalize(run))
            .flat_map(move |term| self.expand(term))
    }

    /// Tokenize text into normalized terms.
    ///
    /// # Example
    ///
    /// ```
    /// use blindex_tokens::Tokenizer;
    ///
    /// let tokenizer = Tokenizer::default();
    /// let terms = tokenizer.tokenize("Die Vertragsstrafe, 5% p.a.");
    /// assert_eq!(terms, vec!["vertragsstrafe", "vertra"]);
    /// ```
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.terms(text).collect()
    }
}
