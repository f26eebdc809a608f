//! Dictionary lookup for words selected in the transcript.

use parley_core::config::ChatConfig;

/// Builds dictionary URLs from a base such as
/// `https://dictionary.cambridge.org/dictionary/english/`.
#[derive(Debug, Clone)]
pub struct DictionaryLookup {
    base_url: String,
}

impl DictionaryLookup {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(config.dictionary_url.clone())
    }

    /// URL for `selection`, or `None` if nothing but whitespace is selected.
    pub fn url_for(&self, selection: &str) -> Option<String> {
        let word = selection.trim();
        if word.is_empty() {
            return None;
        }
        Some(format!("{}{}", self.base_url, urlencoding::encode(word)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAMBRIDGE: &str = "https://dictionary.cambridge.org/dictionary/english/";

    #[test]
    fn test_single_word() {
        let lookup = DictionaryLookup::new(CAMBRIDGE);
        assert_eq!(
            lookup.url_for("  serendipity\n").as_deref(),
            Some("https://dictionary.cambridge.org/dictionary/english/serendipity")
        );
    }

    #[test]
    fn test_phrase_is_percent_encoded() {
        let lookup = DictionaryLookup::new(CAMBRIDGE);
        assert_eq!(
            lookup.url_for("look up").as_deref(),
            Some("https://dictionary.cambridge.org/dictionary/english/look%20up")
        );
        assert_eq!(
            lookup.url_for("don't/do").as_deref(),
            Some("https://dictionary.cambridge.org/dictionary/english/don%27t%2Fdo")
        );
    }

    #[test]
    fn test_from_config() {
        let lookup = DictionaryLookup::from_config(&ChatConfig::default());
        assert_eq!(
            lookup.url_for("tutor").as_deref(),
            Some("https://dictionary.cambridge.org/dictionary/english/tutor")
        );
    }

    #[test]
    fn test_blank_selection() {
        let lookup = DictionaryLookup::new(CAMBRIDGE);
        assert_eq!(lookup.url_for(""), None);
        assert_eq!(lookup.url_for(" \t "), None);
    }
}
