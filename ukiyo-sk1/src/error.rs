//! Error types for the SK1 codec.

use std::fmt;

/// A specialized [`Result`] type for SK1 codec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A fatal error raised by the SK1 loader, saver or presenter.
///
/// Malformed directive lines are deliberately not fatal; they are
/// collected in a [`crate::loader::ParseReport`] instead.
#[derive(Debug)]
pub enum Error {
    /// The underlying file could not be read or written.
    Io(std::io::Error),
    /// The document could not be loaded.
    Load(String),
    /// The document could not be saved.
    Save(String),
    /// The caller cancelled the operation through its token.
    Cancelled,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "i/o error: {e}"),
            Self::Load(msg) => write!(f, "error while loading: {msg}"),
            Self::Save(msg) => write!(f, "error while saving: {msg}"),
            Self::Cancelled => f.write_str("operation cancelled"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
