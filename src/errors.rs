use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentiStreamError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Lexicon load error: {0}")]
    LexiconLoad(String),

    #[error("Resource load error: {0}")]
    ResourceLoad(String),

    #[error("Tagger initialization error: {0}")]
    TaggerInit(String),

    #[error("Training set is empty")]
    EmptyTrainingSet,

    #[error("Training error: {0}")]
    Training(String),

    #[error("Model has not been trained yet")]
    ModelNotTrained,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SentiStreamError>;
