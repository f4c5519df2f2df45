//! Training artifact cache
//!
//! Feature generation and SVM training are expensive; both artifacts are
//! persisted keyed by the identity of the training corpus and reloaded when
//! that identity is unchanged. Cache loss is never fatal: any read or parse
//! failure is a miss that triggers full recomputation.

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use sha2::Digest;
use sha2::Sha256;
use tracing::debug;
use tracing::warn;

use super::SvmModel;
use crate::models::LabeledExample;
use crate::Result;

pub struct TrainingCache {
    dir: PathBuf,
}

impl TrainingCache {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Content identity of a training corpus: a hash over every message and
    /// its continuous score. Any change to the corpus changes the key.
    pub fn corpus_key(corpus: &[(String, f64)]) -> String {
        let mut hasher = Sha256::new();
        hasher.update((corpus.len() as u64).to_le_bytes());
        for (message, score) in corpus {
            hasher.update((message.len() as u64).to_le_bytes());
            hasher.update(message.as_bytes());
            hasher.update(score.to_bits().to_le_bytes());
        }
        hex::encode(hasher.finalize())
    }

    fn examples_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("examples-{key}.json"))
    }

    fn model_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("model-{key}.json"))
    }

    /// Load cached feature vectors for the given corpus key, if present.
    pub fn load_examples(&self, key: &str) -> Option<Vec<LabeledExample>> {
        self.load_json(&self.examples_path(key))
    }

    /// Load a cached trained model for the given corpus key, if present.
    pub fn load_model(&self, key: &str) -> Option<SvmModel> {
        self.load_json(&self.model_path(key))
    }

    pub fn store_examples(&self, key: &str, examples: &[LabeledExample]) -> Result<()> {
        self.store_json(&self.examples_path(key), examples)
    }

    pub fn store_model(&self, key: &str, model: &SvmModel) -> Result<()> {
        self.store_json(&self.model_path(key), model)
    }

    fn load_json<T: serde::de::DeserializeOwned>(&self, path: &Path) -> Option<T> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("cache read failed for {}: {} - recomputing", path.display(), e);
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => {
                debug!("cache hit: {}", path.display());
                Some(value)
            }
            Err(e) => {
                warn!("cache parse failed for {}: {} - recomputing", path.display(), e);
                None
            }
        }
    }

    /// Serialize to a temporary file in the cache directory, then atomically
    /// rename into place.
    fn store_json<T: serde::Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string(value)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(path).map_err(|e| e.error)?;
        debug!("cache stored: {}", path.display());
        Ok(())
    }
}
