use playlog_parser::LogFile;

/// Files replayed through one `SessionProcessor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionBatch {
    pub files: Vec<LogFile>,
}

/// Splits an ordered file list into independently processed sessions.
pub trait SessionGrouper: Send + Sync {
    fn group(&self, files: Vec<LogFile>) -> Vec<SessionBatch>;
}

/// Treats the whole filtered file set as one session.
///
/// Splitting at server restarts would plug in here without touching the
/// state machine.
#[derive(Debug, Default, Clone, Copy)]
pub struct SingleSession;

impl SessionGrouper for SingleSession {
    fn group(&self, files: Vec<LogFile>) -> Vec<SessionBatch> {
        if files.is_empty() {
            Vec::new()
        } else {
            vec![SessionBatch { files }]
        }
    }
}
