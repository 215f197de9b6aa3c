use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop a scoring run before any client is evaluated.
///
/// Per-client conditions (no current-window data, out-of-range scores) are not
/// errors; they are reported through `ClientEvaluation` and `RecordIssue`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("failed to read config file {}", path.display())]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
