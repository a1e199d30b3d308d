use thiserror::Error;

/// Fatal failures of one analysis run.
///
/// Individual malformed events never produce one of these; the reducer
/// absorbs them. Only an input that cannot be opened, decoded or
/// configured ends the run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("cannot open replay: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Decode(String),

    #[error("config parse error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl AnalysisError {
    pub fn decode_at_line(line: usize, err: serde_json::Error) -> Self {
        AnalysisError::Decode(format!("line {}: {}", line, err))
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
