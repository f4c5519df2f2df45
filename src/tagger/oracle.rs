//! Statistical tagging oracle
//!
//! The rule layer delegates every token it cannot classify to an oracle
//! implementing [`TaggingOracle`]. The default implementation is a
//! word-frequency model with shape fallbacks; a missing or empty model file
//! fails closed at startup.

use std::collections::HashMap;
use std::path::Path;

use tracing::info;

use crate::errors::SentiStreamError;
use crate::models::PosTag;
use crate::models::Token;
use crate::Result;

/// External statistical tagger seam.
///
/// `hints` carries the tags already forced by the rule layer; the oracle may
/// use them as context but the rule layer guarantees they survive in the
/// final output regardless of what the oracle returns. Implementations must
/// return exactly one tag per token.
pub trait TaggingOracle: Send + Sync {
    fn tag_sentence(&self, tokens: &[Token], hints: &[Option<PosTag>]) -> Vec<PosTag>;
}

/// Word -> most-frequent-tag oracle with shape fallbacks.
pub struct FrequencyTagOracle {
    model: HashMap<String, String>,
}

impl FrequencyTagOracle {
    /// Load the word/tag model from a tab-separated file.
    ///
    /// A missing or empty model is a fatal initialization error: the tagger
    /// must not silently degrade to shape heuristics alone.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SentiStreamError::TaggerInit(format!("{}: {}", path.display(), e))
        })?;

        let mut model = HashMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((word, tag)) = line.split_once('\t') {
                model.insert(word.trim().to_lowercase(), tag.trim().to_string());
            }
        }

        if model.is_empty() {
            return Err(SentiStreamError::TaggerInit(format!(
                "{}: tagging model is empty",
                path.display()
            )));
        }
        info!("Loaded tagging model: {} words from {}", model.len(), path.display());
        Ok(Self { model })
    }

    #[cfg(test)]
    pub(crate) fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            model: pairs
                .iter()
                .map(|(w, t)| ((*w).to_lowercase(), (*t).to_string()))
                .collect(),
        }
    }

    fn shape_tag(surface: &str) -> &'static str {
        if surface.chars().all(|c| c.is_ascii_digit() || ".,:%$-".contains(c))
            && surface.chars().any(|c| c.is_ascii_digit())
        {
            "CD"
        } else if surface.ends_with("ly") {
            "RB"
        } else if surface.ends_with("ing") {
            "VBG"
        } else if surface.ends_with("ed") {
            "VBD"
        } else if surface.chars().next().is_some_and(char::is_uppercase) {
            "NNP"
        } else {
            "NN"
        }
    }
}

impl TaggingOracle for FrequencyTagOracle {
    fn tag_sentence(&self, tokens: &[Token], hints: &[Option<PosTag>]) -> Vec<PosTag> {
        tokens
            .iter()
            .enumerate()
            .map(|(i, token)| {
                if let Some(Some(hint)) = hints.get(i) {
                    return hint.clone();
                }
                let tag = self
                    .model
                    .get(&token.surface.to_lowercase())
                    .map_or_else(|| Self::shape_tag(&token.surface).to_string(), Clone::clone);
                PosTag::Tag(tag)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_model_lookup() {
        let oracle = FrequencyTagOracle::from_pairs(&[("love", "VB"), ("day", "NN")]);
        let tokens = vec![Token::new("love"), Token::new("day")];
        let hints = vec![None, None];
        let tags = oracle.tag_sentence(&tokens, &hints);
        assert_eq!(tags, vec![PosTag::Tag("VB".into()), PosTag::Tag("NN".into())]);
    }

    #[test]
    fn test_shape_fallbacks() {
        let oracle = FrequencyTagOracle::from_pairs(&[("seen", "VBN")]);
        let tokens = vec![
            Token::new("42"),
            Token::new("quickly"),
            Token::new("running"),
            Token::new("jumped"),
            Token::new("London"),
            Token::new("thing"),
        ];
        let hints = vec![None; 6];
        let tags = oracle.tag_sentence(&tokens, &hints);
        assert_eq!(tags[0], PosTag::Tag("CD".into()));
        assert_eq!(tags[1], PosTag::Tag("RB".into()));
        assert_eq!(tags[2], PosTag::Tag("VBG".into()));
        assert_eq!(tags[3], PosTag::Tag("VBD".into()));
        assert_eq!(tags[4], PosTag::Tag("NNP".into()));
    }

    #[test]
    fn test_hints_echoed() {
        let oracle = FrequencyTagOracle::from_pairs(&[("love", "VB")]);
        let tokens = vec![Token::new("#rust"), Token::new("love")];
        let hints = vec![Some(PosTag::Hashtag), None];
        let tags = oracle.tag_sentence(&tokens, &hints);
        assert_eq!(tags[0], PosTag::Hashtag);
        assert_eq!(tags[1], PosTag::Tag("VB".into()));
    }

    #[test]
    fn test_missing_model_fails_closed() {
        assert!(FrequencyTagOracle::load("/nonexistent/tagger.tsv").is_err());
    }

    #[test]
    fn test_empty_model_fails_closed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# nothing but comments").unwrap();
        assert!(FrequencyTagOracle::load(file.path()).is_err());
    }

    #[test]
    fn test_model_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "love\tVB\nday\tNN").unwrap();
        let oracle = FrequencyTagOracle::load(file.path()).unwrap();
        let tags = oracle.tag_sentence(&[Token::new("Love")], &[None]);
        assert_eq!(tags, vec![PosTag::Tag("VB".into())]);
    }
}
