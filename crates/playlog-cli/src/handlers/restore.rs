use anyhow::{Result, anyhow};
use playlog_runtime::{
    Config, ReloadHook, RestoreReply, RestoreSessions, WorkspacePaths, spawn_reaper,
};
use playlog_store::{BackupArchiver, ParticipantStore};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::views;

const REAPER_PERIOD: Duration = Duration::from_secs(1);

/// Reloads the live store after a restore, opening it fresh when it could
/// not be read beforehand.
struct StoreReloader {
    root: PathBuf,
    store: Option<ParticipantStore>,
}

impl ReloadHook for StoreReloader {
    fn reload(&mut self) -> anyhow::Result<()> {
        match self.store.as_mut() {
            Some(store) => ReloadHook::reload(store)?,
            None => self.store = Some(ParticipantStore::open(&self.root)?),
        }
        if let Some(store) = &self.store {
            println!("Store now holds {} participant record(s).", store.len());
        }
        Ok(())
    }
}

pub fn handle(config: &Config, paths: &WorkspacePaths) -> Result<()> {
    let operator = operator_name();
    let archiver = BackupArchiver::new(&paths.backups, config.ingest.max_backups);
    let timeout = Duration::from_secs(config.restore.timeout_secs);

    let store = match ParticipantStore::open(&paths.store) {
        Ok(store) => Some(store),
        Err(err) => {
            tracing::warn!(error = %err, "Live store unreadable; it will be opened after restore");
            None
        }
    };
    let mut hook = StoreReloader {
        root: paths.store.clone(),
        store,
    };

    let sessions = Arc::new(Mutex::new(RestoreSessions::new(
        archiver,
        &paths.store,
        timeout,
    )));
    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();
    let reaper = spawn_reaper(Arc::clone(&sessions), REAPER_PERIOD);

    let mut reply = lock(&sessions)?.begin(&operator, Instant::now())?;
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    while views::print_restore_reply(&reply) {
        print!("> ");
        io::stdout().flush()?;

        let input = match lines.next() {
            Some(line) => line?,
            None => "cancel".to_string(),
        };
        reply = lock(&sessions)?.respond(&operator, &input, Instant::now(), &mut hook)?;
        if matches!(reply, RestoreReply::NoSession) {
            reply = RestoreReply::Expired;
        }
    }

    drop(sessions);
    reaper.abort();
    Ok(())
}

fn lock(sessions: &Mutex<RestoreSessions>) -> Result<MutexGuard<'_, RestoreSessions>> {
    sessions
        .lock()
        .map_err(|_| anyhow!("restore session state is poisoned"))
}

fn operator_name() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "console".to_string())
}
