//! Feature vector generation
//!
//! Converts a tagged message into a sparse numeric vector for the
//! classifier. The exact feature set is policy behind the
//! [`FeatureGenerator`] seam; the default generator derives aggregate
//! lexicon statistics and custom-tag counts.

use std::sync::Arc;

use crate::lexicon::SentimentLexicon;
use crate::models::CoarsePos;
use crate::models::PosTag;
use crate::models::SparseVector;
use crate::models::TaggedToken;

/// Pluggable feature-vector generator seam.
///
/// Implementations must be deterministic: the same tagged message always
/// produces the same sparse vector.
pub trait FeatureGenerator: Send + Sync {
    fn generate(&self, message: &[TaggedToken]) -> SparseVector;
}

// Fixed feature indices. Zero-valued features are omitted from the sparse
// vector, so indices must stay stable across releases for cached vectors
// to remain valid.
const TOKEN_COUNT: u32 = 0;
const SCORE_SUM: u32 = 1;
const SCORE_MEAN: u32 = 2;
const SCORE_MIN: u32 = 3;
const SCORE_MAX: u32 = 4;
const POSITIVE_COUNT: u32 = 5;
const NEGATIVE_COUNT: u32 = 6;
const UNKNOWN_COUNT: u32 = 7;
const HASHTAG_COUNT: u32 = 8;
const MENTION_COUNT: u32 = 9;
const URL_COUNT: u32 = 10;
const RETWEET_COUNT: u32 = 11;
const PROPER_NOUN_COUNT: u32 = 12;
const INTERJECTION_COUNT: u32 = 13;
const NOUN_COUNT: u32 = 14;
const VERB_COUNT: u32 = 15;
const ADJECTIVE_COUNT: u32 = 16;
const ADVERB_COUNT: u32 = 17;

/// Default generator: aggregate lexicon scores plus tag statistics.
pub struct LexiconFeatureGenerator {
    lexicon: Arc<SentimentLexicon>,
}

impl LexiconFeatureGenerator {
    pub fn new(lexicon: Arc<SentimentLexicon>) -> Self {
        Self { lexicon }
    }
}

impl FeatureGenerator for LexiconFeatureGenerator {
    fn generate(&self, message: &[TaggedToken]) -> SparseVector {
        let mut vector = SparseVector::new();
        let mut set = |index: u32, value: f64| {
            if value != 0.0 {
                vector.insert(index, value);
            }
        };

        set(TOKEN_COUNT, message.len() as f64);

        let mut sum = 0.0;
        let mut hits = 0usize;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut positive = 0usize;
        let mut negative = 0usize;
        let mut unknown = 0usize;

        for tagged in message {
            let score = tagged.tag.coarse().and_then(|pos| {
                self.lexicon.weighted_score(&tagged.token.surface, pos)
            });
            match score {
                Some(score) => {
                    sum += score;
                    hits += 1;
                    min = min.min(score);
                    max = max.max(score);
                    if score > 0.0 {
                        positive += 1;
                    } else if score < 0.0 {
                        negative += 1;
                    }
                }
                None => unknown += 1,
            }
        }

        if hits > 0 {
            set(SCORE_SUM, sum);
            set(SCORE_MEAN, sum / hits as f64);
            set(SCORE_MIN, min);
            set(SCORE_MAX, max);
        }
        set(POSITIVE_COUNT, positive as f64);
        set(NEGATIVE_COUNT, negative as f64);
        set(UNKNOWN_COUNT, unknown as f64);

        let count_tag = |predicate: fn(&PosTag) -> bool| {
            message.iter().filter(|t| predicate(&t.tag)).count() as f64
        };
        set(HASHTAG_COUNT, count_tag(|t| *t == PosTag::Hashtag));
        set(MENTION_COUNT, count_tag(|t| *t == PosTag::UserMention));
        set(URL_COUNT, count_tag(|t| *t == PosTag::Url));
        set(RETWEET_COUNT, count_tag(|t| *t == PosTag::RetweetMarker));
        set(PROPER_NOUN_COUNT, count_tag(|t| *t == PosTag::ProperNoun));
        set(INTERJECTION_COUNT, count_tag(|t| *t == PosTag::Interjection));

        let count_coarse = |pos: CoarsePos| {
            message
                .iter()
                .filter(|t| t.tag.coarse() == Some(pos))
                .count() as f64
        };
        set(NOUN_COUNT, count_coarse(CoarsePos::Noun));
        set(VERB_COUNT, count_coarse(CoarsePos::Verb));
        set(ADJECTIVE_COUNT, count_coarse(CoarsePos::Adjective));
        set(ADVERB_COUNT, count_coarse(CoarsePos::Adverb));

        vector
    }
}
