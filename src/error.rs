use thiserror::Error;

#[derive(Error, Debug)]
pub enum SectionParseError {
    #[error("No header row found: column {column} has no cell matching {pattern}")]
    HeaderRowNotFound { column: usize, pattern: String },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Invalid fuzzy cutoff {0}: must be greater than 0.0 and at most 1.0")]
    InvalidFuzzyCutoff(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SectionParseError>;
