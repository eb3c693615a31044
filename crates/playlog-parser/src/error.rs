use std::fmt;
use std::path::PathBuf;

/// Result type for playlog-parser operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the parser layer
#[derive(Debug)]
pub enum Error {
    /// IO operation failed
    Io(std::io::Error),

    /// Reading a specific log file failed
    Read { path: PathBuf, source: std::io::Error },

    /// Operator-supplied pattern was rejected
    Pattern { pattern: String, message: String },

    /// Directory traversal failed
    WalkDir(walkdir::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Read { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            Error::Pattern { pattern, message } => {
                write!(f, "Invalid pattern '{}': {}", pattern, message)
            }
            Error::WalkDir(err) => write!(f, "Directory traversal error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Read { source, .. } => Some(source),
            Error::WalkDir(err) => Some(err),
            Error::Pattern { .. } => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::WalkDir(err)
    }
}
