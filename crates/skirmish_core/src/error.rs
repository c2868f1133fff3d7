//! Error types for the game simulation.
//!
//! Simulation operations are inert when issued in the wrong state and never
//! return these errors; they surface from data loading and
//! [`Simulation::check_invariants`](crate::simulation::Simulation::check_invariants).

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all game simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// A data file does not exist.
    #[error("Data file not found: {0}")]
    FileNotFound(String),

    /// Reading a data file failed.
    #[error("Failed to read data file: {0}")]
    Io(#[from] std::io::Error),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// A template name is not in the catalog.
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}

impl GameError {
    /// Wrap a RON parse failure for `path`.
    pub(crate) fn parse(path: impl Into<String>, err: &ron::error::SpannedError) -> Self {
        Self::DataParseError {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
