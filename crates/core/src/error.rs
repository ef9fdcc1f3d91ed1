//! Error taxonomy for the client.
//!
//! Only [`ClientError`] escapes the subsystem (at startup). Everything else is
//! logged and swallowed at the boundary where it occurs.

use thiserror::Error;

/// Why an inbound payload was discarded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("payload is not valid JSON: {0}")]
    NotJson(String),
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("payload has neither `settings` nor `maze.cells`")]
    MissingGrid,
    #[error("`maze.cells` is not a sequence")]
    CellsNotSequence,
    #[error("`maze.cells` is empty")]
    EmptyCells,
    #[error("row {row} of `maze.cells` is not a sequence")]
    RowNotSequence { row: usize },
    #[error("cell ({col}, {row}) has unknown tag {code}")]
    UnknownCell { row: usize, col: usize, code: String },
    #[error("`maze.width`/`maze.height` must be positive integers")]
    BadDimensions,
    #[error("`settings` is malformed: {0}")]
    BadSettings(String),
    #[error("field `{field}` has the wrong type")]
    BadField { field: &'static str },
}

/// A drawing operation could not be carried out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("drawing surface unavailable: {0}")]
    Unavailable(String),
    #[error("drawing failed: {0}")]
    Draw(String),
}

/// The duplex channel reported a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("could not open socket: {0}")]
    Open(String),
    #[error("could not send: {0}")]
    Send(String),
    #[error("socket is not open")]
    NotOpen,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Fatal initialization failures.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server url `{url}`: {reason}")]
    InvalidServerUrl { url: String, reason: String },
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
