use thiserror::Error;

/// Errors produced while building or solving a racing line.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RaceLineError {
    #[error("degenerate track input: {0}")]
    DegenerateInput(String),

    #[error("interpolation failed: {0}")]
    Interpolation(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("no elevation profile configured for track {0}")]
    UnknownTrack(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RaceLineError>;
