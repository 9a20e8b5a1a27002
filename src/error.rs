use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TutorError>;

/// Rejected session construction. Wrong keystrokes are never errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("practice text is empty")]
    EmptyText,

    #[error("target wpm must be a finite, non-negative number (got {0})")]
    InvalidTargetWpm(f64),
}

/// Failure to supply practice content for a level.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("invalid level number: {0}")]
    UnknownLevel(u32),

    #[error("level {level} has no content file {file}")]
    MissingContent { level: u32, file: String },

    #[error("content {0} is empty")]
    EmptyContent(String),

    #[error("content {file} is not valid utf-8")]
    InvalidEncoding { file: String },

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum TutorError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Level(#[from] LevelError),

    #[error("progress store: {0}")]
    Progress(#[from] rusqlite::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
