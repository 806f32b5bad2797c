use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScorepackError {
    /// Artifact is structurally invalid: missing baseline, bad delta shape,
    /// stray reserved tokens or unresolvable sentinel markers.
    #[error("malformed artifact: {0}")]
    MalformedArtifact(String),

    /// Artifact declares a format version this build does not understand.
    #[error("unsupported artifact version {0}")]
    UnsupportedVersion(u64),

    /// The code generator ran out of representable indices.
    #[error("dictionary code space exhausted")]
    DictionaryExhausted,

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Propagated JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Propagated I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScorepackError>;

impl ScorepackError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        ScorepackError::MalformedArtifact(msg.into())
    }
}
