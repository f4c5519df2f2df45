use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

/// A single token produced by the tokenizer.
///
/// `merged` is set when the token was formed by combining two adjacent raw
/// tokens, e.g. a hashtag split as `"#"` + `"test"` by the source feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub surface: String,
    pub offset: Option<usize>,
    pub merged: bool,
}

impl Token {
    pub fn new(surface: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            offset: None,
            merged: false,
        }
    }

    pub fn with_offset(surface: impl Into<String>, offset: usize) -> Self {
        Self {
            surface: surface.into(),
            offset: Some(offset),
            merged: false,
        }
    }

    /// Build a synthetic token from two adjacent raw tokens.
    pub fn merged_from(first: &Token, second: &Token) -> Self {
        Self {
            surface: format!("{}{}", first.surface, second.surface),
            offset: first.offset,
            merged: true,
        }
    }
}

/// Part-of-speech tag attached to a token.
///
/// The statistical tagset is carried as-is in `Tag`; the remaining variants
/// are custom tags assigned by the rule layer and always win over the
/// statistical tagger's output for the same token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PosTag {
    /// Standard tag from the statistical tagset (Penn-style, e.g. "NN", "VBZ").
    Tag(String),
    Hashtag,
    UserMention,
    Url,
    RetweetMarker,
    /// Name-entity override.
    ProperNoun,
    /// Interjection override.
    Interjection,
}

impl PosTag {
    /// True for tags assigned by the rule layer rather than the oracle.
    pub fn is_custom(&self) -> bool {
        !matches!(self, PosTag::Tag(_))
    }

    /// Coarse category used as the lexicon lookup key, where one applies.
    pub fn coarse(&self) -> Option<CoarsePos> {
        match self {
            PosTag::Tag(t) => CoarsePos::from_penn(t),
            PosTag::ProperNoun => Some(CoarsePos::Noun),
            _ => None,
        }
    }
}

/// A token with exactly one part-of-speech tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedToken {
    pub token: Token,
    pub tag: PosTag,
}

impl TaggedToken {
    pub fn new(token: Token, tag: PosTag) -> Self {
        Self { token, tag }
    }
}

/// Coarse part-of-speech category used as a lexicon lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CoarsePos {
    Noun,
    Verb,
    Adjective,
    Adverb,
}

impl CoarsePos {
    /// Parse the single-letter column used by the lexicon source file.
    pub fn from_letter(letter: &str) -> Option<Self> {
        match letter {
            "n" => Some(CoarsePos::Noun),
            "v" => Some(CoarsePos::Verb),
            "a" => Some(CoarsePos::Adjective),
            "r" => Some(CoarsePos::Adverb),
            _ => None,
        }
    }

    /// Map a Penn-style tag onto a coarse category.
    pub fn from_penn(tag: &str) -> Option<Self> {
        match tag.chars().next() {
            Some('N') => Some(CoarsePos::Noun),
            Some('V') => Some(CoarsePos::Verb),
            Some('J') => Some(CoarsePos::Adjective),
            Some('R') if tag.starts_with("RB") => Some(CoarsePos::Adverb),
            _ => None,
        }
    }
}

/// Sparse feature vector: feature index -> weight.
///
/// A `BTreeMap` keeps iteration order stable so serialized caches
/// round-trip identically.
pub type SparseVector = BTreeMap<u32, f64>;

/// A message's feature vector together with its continuous sentiment score
/// and derived ordinal class. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledExample {
    pub features: SparseVector,
    pub score: f64,
    pub class: usize,
}

impl LabeledExample {
    pub fn new(features: SparseVector, score: f64, class: usize) -> Self {
        Self {
            features,
            score,
            class,
        }
    }
}
