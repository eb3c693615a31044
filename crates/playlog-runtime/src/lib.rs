pub mod config;
pub mod error;
pub mod ingest;
pub mod report;
pub mod restore;
pub mod throttle;

pub use config::{Config, WorkspacePaths, resolve_workspace_path};
pub use error::{Error, Result};
pub use ingest::{
    IngestOutcome, IngestProgress, IngestRequest, IngestSummary, IngestionJob,
    ParticipantChange, run_in_background,
};
pub use report::{render_report, write_report};
pub use restore::{CONFIRM_TOKEN, ReloadHook, RestoreReply, RestoreSessions, spawn_reaper};
pub use throttle::{ProcessingIntensity, Throttle};
