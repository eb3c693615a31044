use std::fmt;
use std::path::PathBuf;

/// Result type for playlog-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the store layer
#[derive(Debug)]
pub enum Error {
    /// IO operation failed
    Io(std::io::Error),

    /// A record file could not be parsed or serialized
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Archive could not be written or read
    Zip(zip::result::ZipError),

    /// An archive entry would land outside the restore target
    RestoreIntegrity { entry: String },

    /// Requested record or archive does not exist
    NotFound(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Json { path, source } => {
                write!(f, "Invalid record file {}: {}", path.display(), source)
            }
            Error::Zip(err) => write!(f, "Archive error: {}", err),
            Error::RestoreIntegrity { entry } => {
                write!(f, "Archive entry escapes the restore directory: {}", entry)
            }
            Error::NotFound(what) => write!(f, "Not found: {}", what),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json { source, .. } => Some(source),
            Error::Zip(err) => Some(err),
            Error::RestoreIntegrity { .. } | Error::NotFound(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Zip(err)
    }
}
