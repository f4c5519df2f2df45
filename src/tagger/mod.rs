//! Rule-augmented part-of-speech tagging
//!
//! A left-to-right scan with one token of lookahead assigns the custom
//! social-media tags (hashtag, mention, URL, retweet marker, name-entity
//! and interjection overrides); everything else is delegated to the
//! statistical oracle. Later rules win ties, and custom tags always survive
//! the oracle's output.

pub mod oracle;

use std::collections::HashSet;
use std::path::Path;

use tracing::warn;

pub use oracle::FrequencyTagOracle;
pub use oracle::TaggingOracle;

use crate::errors::SentiStreamError;
use crate::models::PosTag;
use crate::models::TaggedToken;
use crate::models::Token;
use crate::Result;

pub struct RuleTagger {
    oracle: Box<dyn TaggingOracle>,
    name_entities: HashSet<String>,
    interjections: HashSet<String>,
}

impl RuleTagger {
    pub fn new(
        oracle: Box<dyn TaggingOracle>,
        name_entities: HashSet<String>,
        interjections: HashSet<String>,
    ) -> Self {
        Self {
            oracle,
            name_entities,
            interjections,
        }
    }

    /// Build a tagger from resource files; any missing resource is fatal.
    pub fn from_files<P: AsRef<Path>>(
        oracle: Box<dyn TaggingOracle>,
        name_entities_path: P,
        interjections_path: P,
    ) -> Result<Self> {
        Ok(Self::new(
            oracle,
            load_word_set(name_entities_path)?,
            load_word_set(interjections_path)?,
        ))
    }

    /// Assign exactly one tag to every token.
    pub fn tag(&self, tokens: &[Token]) -> Vec<TaggedToken> {
        let mut merged: Vec<Token> = Vec::with_capacity(tokens.len());
        let mut forced: Vec<Option<PosTag>> = Vec::with_capacity(tokens.len());

        let mut i = 0;
        while i < tokens.len() {
            let current = &tokens[i];
            let mut token = current.clone();
            let mut tag: Option<PosTag> = None;

            if (current.surface == "#" || current.surface == "@") && i + 1 < tokens.len() {
                // A split hashtag/mention: merge with the lookahead token.
                let next = &tokens[i + 1];
                token = Token::merged_from(current, next);
                tag = if current.surface == "#" {
                    Some(PosTag::Hashtag)
                } else if next.surface.starts_with('#') {
                    // The mention rule does not override a hashtag that
                    // appears after merging.
                    Some(PosTag::Hashtag)
                } else {
                    Some(PosTag::UserMention)
                };
                i += 1;
            } else if current.surface.starts_with('#') {
                tag = Some(PosTag::Hashtag);
            } else if current.surface.starts_with('@') {
                tag = Some(PosTag::UserMention);
            }

            // Applied in addition to the above; later rules win ties.
            if token.surface.contains(".com")
                || token.surface.starts_with("http:")
                || token.surface.starts_with("www.")
            {
                tag = Some(PosTag::Url);
            }

            let lowered = token.surface.to_lowercase();
            if lowered == "rt" || token.surface == "retweet" || token.surface == "Retweet" {
                tag = Some(PosTag::RetweetMarker);
            }
            if self.name_entities.contains(&lowered) {
                tag = Some(PosTag::ProperNoun);
            }
            if self.interjections.contains(&lowered) {
                tag = Some(PosTag::Interjection);
            }

            merged.push(token);
            forced.push(tag);
            i += 1;
        }

        let mut oracle_tags = self.oracle.tag_sentence(&merged, &forced);
        if oracle_tags.len() != merged.len() {
            warn!(
                "tagging oracle returned {} tags for {} tokens",
                oracle_tags.len(),
                merged.len()
            );
            oracle_tags.resize(merged.len(), PosTag::Tag("NN".to_string()));
        }

        merged
            .into_iter()
            .zip(forced)
            .zip(oracle_tags)
            .map(|((token, forced_tag), oracle_tag)| {
                // Custom tags survive the oracle verbatim.
                let tag = forced_tag.unwrap_or(oracle_tag);
                TaggedToken::new(token, tag)
            })
            .collect()
    }
}

/// Load a one-entry-per-line word set, lowercased. Missing files are fatal.
pub fn load_word_set<P: AsRef<Path>>(path: P) -> Result<HashSet<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        SentiStreamError::ResourceLoad(format!("{}: {}", path.display(), e))
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_lowercase)
        .collect())
}
