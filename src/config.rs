//! Engine configuration.
//!
//! [`EngineOptions`] collects the caller-facing switches that shape both
//! pattern loading and matching. The same options value is passed to the
//! index builder and to every matcher call, so a worker pool can share one
//! frozen configuration alongside the frozen index.

/// Options controlling pattern normalization and matching behavior.
///
/// # Example
/// ```
/// use phrase_engine::EngineOptions;
///
/// let options = EngineOptions::new()
///     .with_matching_substring(true)
///     .with_remove_stopwords(true);
/// assert!(options.matching_substring);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Record and report the literal substring of the input that realized
    /// each match.
    ///
    /// **Default**: false (batch mode); server mode forces this on.
    pub matching_substring: bool,

    /// Enable the LCSS refiner: admit matches whose words appear with gaps
    /// or reorderings, provided every must-have word is present.
    ///
    /// **Default**: false
    pub lcss_match: bool,

    /// Drop stopwords from patterns during normalization.
    ///
    /// Only effective when a stopword file has been loaded.
    ///
    /// **Default**: false
    pub remove_stopwords: bool,

    /// Address mode: instead of rejecting pattern lines that carry
    /// characters outside `[A-Za-z0-9\s*\-^]`, replace the offending bytes
    /// with spaces and continue normalization.
    ///
    /// **Default**: false
    pub address_mode: bool,
}

impl EngineOptions {
    pub fn new() -> Self {
        Self {
            matching_substring: false,
            lcss_match: false,
            remove_stopwords: false,
            address_mode: false,
        }
    }

    pub fn with_matching_substring(mut self, enabled: bool) -> Self {
        self.matching_substring = enabled;
        self
    }

    pub fn with_lcss_match(mut self, enabled: bool) -> Self {
        self.lcss_match = enabled;
        self
    }

    pub fn with_remove_stopwords(mut self, enabled: bool) -> Self {
        self.remove_stopwords = enabled;
        self
    }

    pub fn with_address_mode(mut self, enabled: bool) -> Self {
        self.address_mode = enabled;
        self
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::new()
    }
}
