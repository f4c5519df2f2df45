use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Tab-separated sentiment lexicon source.
    pub lexicon_path: String,
    /// Slang / correction mapping files, applied in order (first key wins).
    pub slang_paths: Vec<String>,
    /// Name-entity list, one entry per line.
    pub name_entities_path: String,
    /// Interjection list, one entry per line.
    pub interjections_path: String,
    /// Word -> tag model for the statistical tagging oracle.
    pub tagger_model_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Number of ordinal sentiment classes.
    #[serde(default = "default_classes")]
    pub classes: usize,
    /// Lower bound of the continuous score range.
    pub min_score: f64,
    /// Upper bound of the continuous score range.
    pub max_score: f64,
    /// Regularization constant.
    #[serde(default = "default_c")]
    pub c: f64,
    /// RBF kernel bandwidth.
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    /// Directory for feature-vector and model caches.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
    /// Disable to force retraining on every run.
    #[serde(default = "default_enable_cache")]
    pub enable_cache: bool,
}

fn default_classes() -> usize {
    5
}

fn default_c() -> f64 {
    1.0
}

fn default_gamma() -> f64 {
    0.5
}

fn default_cache_dir() -> String {
    "cache".to_string()
}

fn default_enable_cache() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub backtrace: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub resources: ResourceConfig,
    pub classifier: ClassifierConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from default config file path
    pub fn load() -> crate::Result<Self> {
        // Try to load from config.toml first, then fall back to config.example.toml
        if Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else if Path::new("config.example.toml").exists() {
            tracing::warn!(
                "Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")
        } else {
            Err(crate::SentiStreamError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config file found. Please create config.toml or config.example.toml",
            )))
        }
    }

    /// Get lexicon source path
    pub fn lexicon_path(&self) -> &str {
        &self.resources.lexicon_path
    }

    /// Get slang mapping file paths
    pub fn slang_paths(&self) -> &[String] {
        &self.resources.slang_paths
    }

    /// Get name-entity list path
    pub fn name_entities_path(&self) -> &str {
        &self.resources.name_entities_path
    }

    /// Get interjection list path
    pub fn interjections_path(&self) -> &str {
        &self.resources.interjections_path
    }

    /// Get tagger model path
    pub fn tagger_model_path(&self) -> &str {
        &self.resources.tagger_model_path
    }

    /// Number of ordinal sentiment classes
    pub fn classes(&self) -> usize {
        self.classifier.classes
    }

    /// Continuous score range as (min, max)
    pub fn score_range(&self) -> (f64, f64) {
        (self.classifier.min_score, self.classifier.max_score)
    }

    /// Check if the training cache is enabled
    pub fn cache_enabled(&self) -> bool {
        self.classifier.enable_cache
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            resources: ResourceConfig {
                lexicon_path: "resources/sentiment-lexicon.tsv".to_string(),
                slang_paths: vec!["resources/slang.tsv".to_string()],
                name_entities_path: "resources/name-entities.txt".to_string(),
                interjections_path: "resources/interjections.txt".to_string(),
                tagger_model_path: "resources/tagger-model.tsv".to_string(),
            },
            classifier: ClassifierConfig {
                classes: 5,
                min_score: 1.0,
                max_score: 9.0,
                c: 1.0,
                gamma: 0.5,
                cache_dir: "cache".to_string(),
                enable_cache: true,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                backtrace: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.classes(), 5);
        assert_eq!(config.score_range(), (1.0, 9.0));
        assert!(config.cache_enabled());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[resources]
lexicon_path = "lex.tsv"
slang_paths = ["slang-a.tsv", "slang-b.tsv"]
name_entities_path = "names.txt"
interjections_path = "interjections.txt"
tagger_model_path = "tagger.tsv"

[classifier]
min_score = 1.0
max_score = 9.0
classes = 5

[logging]
level = "debug"
backtrace = false
"#
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.lexicon_path(), "lex.tsv");
        assert_eq!(config.slang_paths().len(), 2);
        assert_eq!(config.classes(), 5);
        assert_eq!(config.score_range(), (1.0, 9.0));
        // Unspecified fields fall back to defaults
        assert!((config.classifier.c - 1.0).abs() < f64::EPSILON);
        assert!(config.cache_enabled());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml [").unwrap();
        assert!(AppConfig::from_file(file.path()).is_err());
    }
}
