//! Pattern normalization.
//!
//! Turns one raw catalog line into its canonical ordered word list, or into
//! a typed [`Rejection`] explaining why the line was dropped. Rejections are
//! values, not errors: the loader logs them and keeps going.
//!
//! Normalization lowercases the pattern, drops single-character tokens,
//! optionally removes stopwords, and collapses adjacent words where the
//! earlier is a prefix of the later. Words keep their leading `*`/`^`
//! must-have markers here; the trie insertion step strips them.

use crate::config::EngineOptions;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::debug;

/// Highest word position the end-of-word index can represent.
pub const MAX_WORD_POSITIONS: usize = 31;

/// Stopwords that are never removed, regardless of the stopword file.
pub const KEEP_WORDS: [&str; 10] = [
    "system",
    "second",
    "little",
    "course",
    "world",
    "value",
    "right",
    "needs",
    "information",
    "invention",
];

/// A pattern line that survived normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPattern {
    /// Canonical word sequence, lowercased, markers intact.
    pub words: Vec<String>,
    /// Opaque cross-reference: everything after the first tab, verbatim.
    pub xref: String,
}

/// Why a pattern line was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Empty line or `#` comment. Skipped silently.
    Comment,
    /// Line contains the literal `_EXCEPTIONS`. Skipped silently.
    Exception,
    /// Characters outside `[A-Za-z0-9\s*\-^]` with address mode off.
    NonAlphanumeric,
    /// Fewer than two words survived normalization.
    TooFewWords,
    /// More than 31 words; unsupported by the end-of-word index.
    TooManyWords(usize),
}

impl Rejection {
    /// Whether the loader should log this rejection.
    pub fn is_silent(&self) -> bool {
        matches!(self, Rejection::Comment | Rejection::Exception)
    }

    pub fn reason(&self) -> String {
        match self {
            Rejection::Comment => "comment".to_string(),
            Rejection::Exception => "exception pattern".to_string(),
            Rejection::NonAlphanumeric => "non alphanumeric characters".to_string(),
            Rejection::TooFewWords => "non-conforming pattern".to_string(),
            Rejection::TooManyWords(n) => format!("too many words ({n})"),
        }
    }
}

fn valid_charset() -> &'static Regex {
    static CHARSET: OnceLock<Regex> = OnceLock::new();
    CHARSET.get_or_init(|| Regex::new(r"^[A-Za-z0-9\s*\-\^]*$").expect("charset regex"))
}

/// Case-insensitive prefix test with `*`/`^` markers ignored.
fn is_marker_prefix_of(prefix: &str, word: &str) -> bool {
    let stripped_prefix = strip_markers(prefix);
    let stripped_word = strip_markers(word);
    stripped_word.starts_with(&stripped_prefix)
}

/// Remove the `*` and `^` marker characters from a word.
pub fn strip_markers(word: &str) -> String {
    word.chars().filter(|&c| c != '*' && c != '^').collect()
}

/// Normalize one raw pattern line.
///
/// Returns the canonical word list plus the verbatim cross-reference, or the
/// reason the line was rejected. Loggable rejections and observed word-list
/// changes are reported through `tracing` at debug level, silent unless the
/// caller opts into pattern-processing logs.
pub fn normalize_line(
    line: &str,
    options: &EngineOptions,
    stopwords: &HashSet<String>,
) -> Result<NormalizedPattern, Rejection> {
    let trimmed = line.trim();

    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Err(Rejection::Comment);
    }
    if trimmed.contains("_EXCEPTIONS") {
        return Err(Rejection::Exception);
    }

    // Split off the cross-reference at the first tab; inner tabs in the
    // remainder are preserved verbatim.
    let (pattern, xref) = match trimmed.split_once('\t') {
        Some((head, tail)) => (head.to_string(), tail.to_string()),
        None => (trimmed.to_string(), String::new()),
    };

    let pattern = if valid_charset().is_match(&pattern) {
        pattern
    } else {
        debug!("Pattern with non alphanumeric char: {pattern}");
        if !options.address_mode {
            return Err(Rejection::NonAlphanumeric);
        }
        // Address mode keeps only alphanumerics and whitespace; everything
        // else, markers included, becomes a space.
        pattern
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c.is_whitespace() {
                    c
                } else {
                    ' '
                }
            })
            .collect()
    };

    let lowered = pattern.to_lowercase();
    let original: Vec<&str> = lowered.split_whitespace().collect();
    let original_count = original.len();

    let mut words: Vec<String> = original
        .iter()
        .filter(|w| w.len() > 1)
        .map(|w| w.to_string())
        .collect();

    if options.remove_stopwords {
        words.retain(|w| !stopwords.contains(w));
    }

    // Collapse adjacent words where the earlier is a prefix of the later.
    // The guard on the original token count keeps a pattern that started as
    // a single word from being eaten by this pass.
    if original_count != 1 && words.len() > 1 {
        let mut filtered = Vec::with_capacity(words.len());
        for i in 0..words.len() {
            let keep = i == words.len() - 1 || !is_marker_prefix_of(&words[i], &words[i + 1]);
            if keep {
                filtered.push(std::mem::take(&mut words[i]));
            }
        }
        words = filtered;
    }

    let changed = words.len() != original_count
        || words.iter().zip(&original).any(|(w, o)| w.as_str() != *o);
    if changed {
        debug!(
            "Pattern_ref: '{xref}' changed from: '{pattern}' to: '{}'",
            words.join(" ")
        );
    }

    if words.len() < 2 {
        return Err(Rejection::TooFewWords);
    }
    if words.len() > MAX_WORD_POSITIONS {
        return Err(Rejection::TooManyWords(words.len()));
    }

    Ok(NormalizedPattern { words, xref })
}

/// Parse comma-delimited stopword file content.
///
/// Tokens are trimmed and lowercased; the [`KEEP_WORDS`] allowlist is never
/// included.
pub fn parse_stopwords(content: &str) -> HashSet<String> {
    let keep: HashSet<&str> = KEEP_WORDS.iter().copied().collect();
    content
        .split(',')
        .map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty() && !keep.contains(token.as_str()))
        .collect()
}
