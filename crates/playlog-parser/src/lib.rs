// Error types
pub mod error;

// File discovery and readers
pub mod discovery;
pub mod io;

// Chronological merge
pub mod stream;

// Line -> Event classification
pub mod classify;
pub mod patterns;

// Chat scoring
pub mod laugh;

pub use classify::{ClassifierOptions, EventClassifier};
pub use discovery::{LogFile, discover_log_files, filter_by_date};
pub use error::{Error, Result};
pub use io::{open_log, parse_raw_line};
pub use laugh::count_laughs;
pub use patterns::{PatternKind, PatternOutcome, PatternSet};
pub use stream::{LineSource, SessionLineStream};
