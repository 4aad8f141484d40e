use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input table is missing required columns: {columns:?}. The input must carry MOVIE_NAME (plus optional MOVIE_FORMAT, MOVIE_LENGUAJE, MOVIE_DURATION); regenerate the extract with those headers and rerun")]
    MissingColumns { columns: Vec<String> },

    #[error("Enrichment source error: {message}")]
    Source { message: String },

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
