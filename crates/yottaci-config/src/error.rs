use thiserror::Error;

/// Errors reading or interpreting the persisted task document.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("failed to read task document at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("task document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors resolving the build configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration document is not valid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("configuration {requested} requested but document only defines {available}")]
    DocumentIndex { requested: u32, available: usize },
}
