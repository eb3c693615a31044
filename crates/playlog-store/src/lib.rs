// Error types
pub mod error;

// Live participant records
pub mod records;

// Snapshots and restore
pub mod archive;
pub mod restore;

pub use archive::{BackupArchiver, BackupInfo};
pub use error::{Error, Result};
pub use records::{ParticipantStore, Section};
pub use restore::{RestoreSummary, restore_archive};
