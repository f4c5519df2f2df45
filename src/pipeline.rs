//! End-to-end sentiment pipeline
//!
//! Wires tokenizer, preprocessor, tagger, lexicon, discretizer and
//! classifier into one explicitly constructed unit. All shared state is
//! loaded once at construction (the init barrier) and read-only afterwards,
//! so a built pipeline may be shared freely across threads; only `train`
//! takes `&mut self`.

use std::sync::Arc;

use tracing::info;
use tracing::warn;

use crate::classifier::cache::TrainingCache;
use crate::classifier::KernelSvm;
use crate::classifier::SvmModel;
use crate::config::AppConfig;
use crate::discretizer::ScoreDiscretizer;
use crate::errors::SentiStreamError;
use crate::features::FeatureGenerator;
use crate::features::LexiconFeatureGenerator;
use crate::lexicon::SentimentLexicon;
use crate::models::LabeledExample;
use crate::models::SparseVector;
use crate::models::TaggedToken;
use crate::preprocess::Preprocessor;
use crate::preprocess::SlangTable;
use crate::tagger::FrequencyTagOracle;
use crate::tagger::RuleTagger;
use crate::tokenizer::Tokenizer;
use crate::Result;

pub struct SentimentPipeline {
    tokenizer: Tokenizer,
    preprocessor: Preprocessor,
    tagger: RuleTagger,
    lexicon: Arc<SentimentLexicon>,
    discretizer: ScoreDiscretizer,
    features: Box<dyn FeatureGenerator>,
    svm: KernelSvm,
    cache: Option<TrainingCache>,
    model: Option<SvmModel>,
}

impl SentimentPipeline {
    /// Assemble a pipeline from explicitly constructed components.
    pub fn new(
        tokenizer: Tokenizer,
        preprocessor: Preprocessor,
        tagger: RuleTagger,
        lexicon: Arc<SentimentLexicon>,
        discretizer: ScoreDiscretizer,
        svm: KernelSvm,
        cache: Option<TrainingCache>,
    ) -> Self {
        let features = Box::new(LexiconFeatureGenerator::new(Arc::clone(&lexicon)));
        Self {
            tokenizer,
            preprocessor,
            tagger,
            lexicon,
            discretizer,
            features,
            svm,
            cache,
            model: None,
        }
    }

    /// Load every startup resource and assemble the pipeline.
    ///
    /// This is the one-time initialization barrier: a missing lexicon,
    /// slang table, word set or tagging model aborts startup rather than
    /// letting the pipeline silently serve degraded results.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        if config.classes() == 0 {
            return Err(SentiStreamError::Config(
                "classifier.classes must be positive".to_string(),
            ));
        }
        let (min, max) = config.score_range();
        if max <= min {
            return Err(SentiStreamError::Config(
                "classifier.max_score must exceed min_score".to_string(),
            ));
        }

        let lexicon = Arc::new(SentimentLexicon::load(config.lexicon_path())?);
        let slang = SlangTable::load(config.slang_paths())?;
        let oracle = FrequencyTagOracle::load(config.tagger_model_path())?;
        let tagger = RuleTagger::from_files(
            Box::new(oracle),
            config.name_entities_path(),
            config.interjections_path(),
        )?;
        let cache = config
            .cache_enabled()
            .then(|| TrainingCache::new(&config.classifier.cache_dir));

        info!("Sentiment pipeline initialized");
        Ok(Self::new(
            Tokenizer::new(),
            Preprocessor::new(slang),
            tagger,
            lexicon,
            ScoreDiscretizer::new(config.classes(), min, max),
            KernelSvm::new(config.classifier.c, config.classifier.gamma),
            cache,
        ))
    }

    /// Replace the default lexicon-based feature generator.
    pub fn with_feature_generator(mut self, features: Box<dyn FeatureGenerator>) -> Self {
        self.features = features;
        self
    }

    /// Tokenize, normalize and tag one message.
    pub fn analyze(&self, text: &str) -> Vec<TaggedToken> {
        let tokens = self.tokenizer.tokenize(text);
        let tokens = self.preprocessor.preprocess(tokens);
        self.tagger.tag(&tokens)
    }

    /// Mean rank-weighted lexicon score over the message's scorable tokens,
    /// or `None` when no token has a lexicon entry.
    pub fn lexicon_score(&self, text: &str) -> Option<f64> {
        let tagged = self.analyze(text);
        let scores: Vec<f64> = tagged
            .iter()
            .filter_map(|t| {
                t.tag
                    .coarse()
                    .and_then(|pos| self.lexicon.weighted_score(&t.token.surface, pos))
            })
            .collect();
        if scores.is_empty() {
            return None;
        }
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }

    /// Feature vector for one message.
    pub fn feature_vector(&self, text: &str) -> SparseVector {
        self.features.generate(&self.analyze(text))
    }

    /// Train the classifier on (message, continuous score) pairs.
    ///
    /// Feature vectors and the trained model are cached keyed by corpus
    /// identity; a warm cache skips both feature generation and training.
    pub fn train(&mut self, corpus: &[(String, f64)]) -> Result<()> {
        if corpus.is_empty() {
            return Err(SentiStreamError::EmptyTrainingSet);
        }

        let key = TrainingCache::corpus_key(corpus);
        let examples = match self.cache.as_ref().and_then(|c| c.load_examples(&key)) {
            Some(examples) => {
                info!("Reusing {} cached feature vectors", examples.len());
                examples
            }
            None => {
                let examples: Vec<LabeledExample> = corpus
                    .iter()
                    .map(|(text, score)| {
                        LabeledExample::new(
                            self.feature_vector(text),
                            *score,
                            self.discretizer.classify(*score),
                        )
                    })
                    .collect();
                if let Some(cache) = &self.cache {
                    if let Err(e) = cache.store_examples(&key, &examples) {
                        warn!("failed to store feature-vector cache: {}", e);
                    }
                }
                examples
            }
        };

        let model = match self.cache.as_ref().and_then(|c| c.load_model(&key)) {
            Some(model) => {
                info!("Reusing cached model for corpus {}", &key[..12]);
                model
            }
            None => {
                let model = self.svm.train(&examples)?;
                if let Some(cache) = &self.cache {
                    if let Err(e) = cache.store_model(&key, &model) {
                        warn!("failed to store model cache: {}", e);
                    }
                }
                model
            }
        };

        self.model = Some(model);
        Ok(())
    }

    /// Predict the ordinal sentiment class of a message.
    pub fn classify(&self, text: &str) -> Result<usize> {
        let model = self.model.as_ref().ok_or(SentiStreamError::ModelNotTrained)?;
        Ok(self.svm.evaluate(model, &self.feature_vector(text)))
    }

    /// Per-class probability estimates for a message.
    pub fn probabilities(&self, text: &str) -> Result<Vec<f64>> {
        let model = self.model.as_ref().ok_or(SentiStreamError::ModelNotTrained)?;
        Ok(self.svm.probabilities(model, &self.feature_vector(text)))
    }

    /// The trained model, if any.
    pub fn model(&self) -> Option<&SvmModel> {
        self.model.as_ref()
    }

    /// The score discretizer used for training labels.
    pub fn discretizer(&self) -> ScoreDiscretizer {
        self.discretizer
    }
}
