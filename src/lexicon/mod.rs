//! Sentiment lexicon store
//!
//! Loads a fixed tab-delimited sentiment dictionary once at startup and
//! exposes rank-weighted sense averages for (lemma, coarse POS) pairs.
//! Malformed lines are recoverable: logged and skipped. An empty resulting
//! lexicon is fatal.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::Path;

use tracing::info;
use tracing::warn;

use crate::errors::SentiStreamError;
use crate::models::CoarsePos;
use crate::Result;

/// Per-(lemma, POS) sense scores and the cached rank-weighted average.
#[derive(Debug, Clone)]
struct LexiconEntry {
    /// rank -> signed score (positive - negative); ranks unique per entry.
    senses: BTreeMap<u32, f64>,
    /// Cached at load time, immutable afterwards.
    weighted: f64,
}

/// Read-only sentiment dictionary keyed by (lemma, coarse POS).
#[derive(Debug, Default)]
pub struct SentimentLexicon {
    entries: HashMap<(String, CoarsePos), LexiconEntry>,
}

impl SentimentLexicon {
    /// Load the lexicon from a tab-delimited source file.
    ///
    /// Each non-comment, non-blank line must carry exactly 6 tab-separated
    /// fields: coarse POS, sense id (ignored), positive score, negative
    /// score, whitespace-separated `lemma#rank` synonyms, gloss (ignored).
    /// Lines violating the format are logged and skipped.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SentiStreamError::LexiconLoad(format!("{}: {}", path.display(), e))
        })?;

        let lexicon = Self::parse(&content);
        if lexicon.entries.is_empty() {
            return Err(SentiStreamError::LexiconLoad(format!(
                "{}: no usable entries",
                path.display()
            )));
        }
        info!(
            "Loaded sentiment lexicon: {} entries from {}",
            lexicon.entries.len(),
            path.display()
        );
        Ok(lexicon)
    }

    fn parse(content: &str) -> Self {
        let mut senses: HashMap<(String, CoarsePos), BTreeMap<u32, f64>> = HashMap::new();

        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 6 {
                warn!(
                    "lexicon line {}: expected 6 fields, got {} - skipped",
                    line_no + 1,
                    fields.len()
                );
                continue;
            }

            let Some(pos) = CoarsePos::from_letter(fields[0].trim()) else {
                warn!("lexicon line {}: unknown POS {:?} - skipped", line_no + 1, fields[0]);
                continue;
            };
            let (Ok(positive), Ok(negative)) =
                (fields[2].trim().parse::<f64>(), fields[3].trim().parse::<f64>())
            else {
                warn!("lexicon line {}: unparsable scores - skipped", line_no + 1);
                continue;
            };

            let signed = positive - negative;
            if signed == 0.0 {
                continue;
            }

            for synonym in fields[4].split_whitespace() {
                let Some((lemma, rank)) = synonym.rsplit_once('#') else {
                    warn!(
                        "lexicon line {}: malformed synonym {:?} - skipped",
                        line_no + 1,
                        synonym
                    );
                    continue;
                };
                let Ok(rank) = rank.parse::<u32>() else {
                    warn!(
                        "lexicon line {}: bad sense rank in {:?} - skipped",
                        line_no + 1,
                        synonym
                    );
                    continue;
                };
                if rank == 0 {
                    warn!("lexicon line {}: sense rank 0 in {:?} - skipped", line_no + 1, synonym);
                    continue;
                }

                let entry = senses.entry((lemma.to_lowercase(), pos)).or_default();
                if entry.contains_key(&rank) {
                    warn!(
                        "lexicon line {}: duplicate rank {} for {:?} - first kept",
                        line_no + 1,
                        rank,
                        lemma
                    );
                    continue;
                }
                entry.insert(rank, signed);
            }
        }

        let entries = senses
            .into_iter()
            .map(|(key, senses)| {
                let weighted = rank_weighted_average(&senses);
                (key, LexiconEntry { senses, weighted })
            })
            .collect();

        Self { entries }
    }

    /// Rank-weighted average score for a lemma, cached at load time.
    pub fn weighted_score(&self, lemma: &str, pos: CoarsePos) -> Option<f64> {
        self.entries
            .get(&(lemma.to_lowercase(), pos))
            .map(|e| e.weighted)
    }

    /// Signed score of one specific sense; rank 1 is the most common sense
    /// and serves as the fast non-averaged lookup.
    pub fn score(&self, lemma: &str, pos: CoarsePos, rank: u32) -> Option<f64> {
        self.entries
            .get(&(lemma.to_lowercase(), pos))
            .and_then(|e| e.senses.get(&rank).copied())
    }

    /// Full rank -> score enumeration for introspection.
    pub fn senses(&self, lemma: &str, pos: CoarsePos) -> Option<&BTreeMap<u32, f64>> {
        self.entries
            .get(&(lemma.to_lowercase(), pos))
            .map(|e| &e.senses)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rank-weighted synset average: the first sense contributes full weight,
/// the second half weight, and so on.
///
/// `score = sum(score_r / r) / sum(1 / r)`
fn rank_weighted_average(senses: &BTreeMap<u32, f64>) -> f64 {
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (&rank, &score) in senses {
        numerator += score / f64::from(rank);
        denominator += 1.0 / f64::from(rank);
    }
    numerator / denominator
}
