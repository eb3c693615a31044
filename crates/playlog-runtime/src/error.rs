use std::fmt;
use std::path::PathBuf;

/// Result type for playlog-runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the runtime layer
#[derive(Debug)]
pub enum Error {
    /// Raw log directory missing or unreadable
    InputDiscovery {
        path: PathBuf,
        source: playlog_parser::Error,
    },

    /// Date filter could not be parsed
    DateParse(String),

    /// Record store, backup or restore failure
    Store(playlog_store::Error),

    /// Reading or merging log files failed
    Parser(playlog_parser::Error),

    /// Session processing failed part way through a run
    Processing(anyhow::Error),

    /// IO operation failed
    Io(std::io::Error),

    /// Configuration error
    Config(String),

    /// Invalid operation or state
    InvalidOperation(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InputDiscovery { path, source } => {
                write!(f, "Cannot read log directory {}: {}", path.display(), source)
            }
            Error::DateParse(msg) => write!(f, "Invalid date filter: {}", msg),
            Error::Store(err) => write!(f, "Store error: {}", err),
            Error::Parser(err) => write!(f, "Parser error: {}", err),
            Error::Processing(err) => write!(f, "Processing error: {:#}", err),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InputDiscovery { source, .. } => Some(source),
            Error::Store(err) => Some(err),
            Error::Parser(err) => Some(err),
            Error::Processing(err) => Some(err.as_ref()),
            Error::Io(err) => Some(err),
            Error::DateParse(_) | Error::Config(_) | Error::InvalidOperation(_) => None,
        }
    }
}

impl From<playlog_store::Error> for Error {
    fn from(err: playlog_store::Error) -> Self {
        Error::Store(err)
    }
}

impl From<playlog_parser::Error> for Error {
    fn from(err: playlog_parser::Error) -> Self {
        Error::Parser(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}
