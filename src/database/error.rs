//! Error type for database save/load

use std::path::PathBuf;
use std::{io, result};
use thiserror::Error;

/// Reasons a session cannot be saved or loaded.
///
/// The `Display` text of each variant is meant to be shown to the user as is.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot open {}: {source}", .path.display())]
    CannotOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("not a session database")]
    SignatureMismatch,

    /// Files are only readable by the format version that wrote them.
    #[error("database format version {found} is not supported (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("cannot compress image: {0}")]
    CompressionFailure(#[source] io::Error),

    #[error("cannot decompress image: {0}")]
    DecompressionFailure(#[source] io::Error),

    #[error("no loader is registered as {0:?}")]
    UnresolvedLoader(String),

    #[error("no assembler is registered as {0:?}")]
    UnresolvedAssembler(String),

    /// A length prefix runs past the end of the file, or a string is not
    /// UTF-8.
    #[error("malformed {0} in session database")]
    Malformed(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("session lock is poisoned")]
    Poisoned,
}

pub type Result<T> = result::Result<T, Error>;
