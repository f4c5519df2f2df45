//! Tokenization of raw social-media messages
//!
//! Turns raw text into a token sequence using an ordered set of lexical
//! patterns. Text matching no pattern is dropped, never errored: the
//! tokenizer must survive arbitrary message content.

use regex::Regex;
use tracing::warn;

use crate::models::Token;

/// Ordered lexical patterns, highest priority first. The scanner is a
/// single alternation regex; the regex engine's leftmost-first semantics
/// make earlier branches win at the same position.
const TOKEN_PATTERNS: &[&str] = &[
    // Emoticons, e.g. :-) ;P =D <3 and the mirrored (-: forms
    r"[<>]?[:;=8][\-o\*']?[\)\]\(\[dDpP/\\\}\{@\|]",
    r"[\)\]\(\[dDpP/\\\}\{@\|][\-o\*']?[:;=8][<>]?",
    r"<3",
    // URLs
    r"(?:https?://|www\.)[^\s]+",
    // @-mentions and hashtags
    r"@\w+",
    r"#\w+",
    // Contractions and possessives as a single token (don't, she's, John's)
    r"[A-Za-z]+(?:'[A-Za-z]+)+",
    // Abbreviations with internal periods (U.S.A., e.g.)
    r"(?:[A-Za-z]\.){2,}",
    // Numbers: currency, percentages, decimals, time-ranges (12:30, 9-5)
    r"[$€£]?\d+(?:[.,:\-]\d+)*%?",
    // Ellipses
    r"\.\.\.+|…",
    // Generic word characters
    r"\w+",
    // Bare hashtag/mention markers, kept for the tagger's merge rule
    r"[#@]",
];

pub struct Tokenizer {
    scanner: Regex,
    unicode_escape: Regex,
    html_entity: Regex,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        let alternation = TOKEN_PATTERNS.join("|");
        Self {
            // The pattern set is fixed at compile time; a build failure here
            // is a programming error, not an input error.
            scanner: Regex::new(&alternation).expect("token pattern set must compile"),
            unicode_escape: Regex::new(r"\\u([0-9a-fA-F]{4})").expect("escape pattern"),
            html_entity: Regex::new(r"&#(\d+);").expect("entity pattern"),
        }
    }

    /// Tokenize a message into a finite token sequence.
    ///
    /// Never fails: unmatched characters are silently omitted. Each call is
    /// independent and side-effect free.
    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        let trimmed = text.trim();
        let decoded = self.decode_unicode_escapes(trimmed);
        let decoded = self.decode_html_entities(&decoded);

        self.scanner
            .find_iter(&decoded)
            .map(|m| Token::with_offset(m.as_str(), m.start()))
            .collect()
    }

    /// Decode literal `\uXXXX` escape notation into real characters.
    fn decode_unicode_escapes(&self, text: &str) -> String {
        if !self.unicode_escape.is_match(text) {
            return text.to_string();
        }

        let decoded = self
            .unicode_escape
            .replace_all(text, |caps: &regex::Captures<'_>| {
                u32::from_str_radix(&caps[1], 16)
                    .ok()
                    .and_then(char::from_u32)
                    .map_or_else(|| caps[0].to_string(), |c| c.to_string())
            })
            .into_owned();

        // Escape notation was present but decoding produced no change
        // (e.g. a surrogate codepoint). Keep going with the original text.
        if decoded == text {
            warn!("unicode escape normalization had no effect: {}", text);
        }
        decoded
    }

    /// Decode HTML numeric character references (`&#NNN;`) into real characters.
    fn decode_html_entities(&self, text: &str) -> String {
        if !self.html_entity.is_match(text) {
            return text.to_string();
        }

        let decoded = self
            .html_entity
            .replace_all(text, |caps: &regex::Captures<'_>| {
                caps[1]
                    .parse::<u32>()
                    .ok()
                    .and_then(char::from_u32)
                    .map_or_else(|| caps[0].to_string(), |c| c.to_string())
            })
            .into_owned();

        if decoded == text {
            warn!("html entity normalization had no effect: {}", text);
        }
        decoded
    }
}
