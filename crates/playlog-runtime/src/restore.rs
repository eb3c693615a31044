use playlog_store::{
    BackupArchiver, BackupInfo, ParticipantStore, RestoreSummary, restore_archive,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::{Error, Result};

/// Word the operator must type to go through with a restore.
pub const CONFIRM_TOKEN: &str = "RESTORE";

const CANCEL: &str = "cancel";

/// Anything holding state derived from the record store that must be
/// refreshed after a restore.
pub trait ReloadHook {
    fn reload(&mut self) -> anyhow::Result<()>;
}

impl ReloadHook for ParticipantStore {
    fn reload(&mut self) -> anyhow::Result<()> {
        ParticipantStore::reload(self)?;
        Ok(())
    }
}

/// What the prompt loop should show next.
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreReply {
    /// Numbered archives, newest first; answer with an ordinal.
    Listing { backups: Vec<BackupInfo> },
    NoBackups,
    /// Answer with [`CONFIRM_TOKEN`] to proceed.
    ConfirmPrompt { backup: BackupInfo },
    InvalidSelection { input: String, choices: usize },
    ConfirmationMismatch,
    Cancelled,
    Expired,
    NoSession,
    Restored { summary: RestoreSummary },
}

#[derive(Debug, Clone)]
enum Stage {
    Selecting { backups: Vec<BackupInfo> },
    Confirming { backup: BackupInfo },
}

#[derive(Debug, Clone)]
struct Pending {
    stage: Stage,
    last_activity: Instant,
}

/// Interactive restore state, at most one pending session per operator.
///
/// A session moves from selecting an archive to confirming it. `cancel` is
/// accepted at either step, and a session idle for longer than the timeout
/// is dropped.
#[derive(Debug)]
pub struct RestoreSessions {
    archiver: BackupArchiver,
    store_root: PathBuf,
    timeout: Duration,
    pending: HashMap<String, Pending>,
}

impl RestoreSessions {
    pub fn new(
        archiver: BackupArchiver,
        store_root: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            archiver,
            store_root: store_root.into(),
            timeout,
            pending: HashMap::new(),
        }
    }

    pub fn is_pending(&self, operator: &str) -> bool {
        self.pending.contains_key(operator)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Start (or restart) a session for `operator`.
    pub fn begin(&mut self, operator: &str, now: Instant) -> Result<RestoreReply> {
        self.pending.remove(operator);

        let backups = self.archiver.list()?;
        if backups.is_empty() {
            return Ok(RestoreReply::NoBackups);
        }

        self.pending.insert(
            operator.to_string(),
            Pending {
                stage: Stage::Selecting {
                    backups: backups.clone(),
                },
                last_activity: now,
            },
        );
        Ok(RestoreReply::Listing { backups })
    }

    /// Feed one line of operator input into their session.
    pub fn respond(
        &mut self,
        operator: &str,
        input: &str,
        now: Instant,
        hook: &mut dyn ReloadHook,
    ) -> Result<RestoreReply> {
        let Some(mut pending) = self.pending.remove(operator) else {
            return Ok(RestoreReply::NoSession);
        };
        if self.is_stale(&pending, now) {
            tracing::info!(operator = %operator, "Restore session expired");
            return Ok(RestoreReply::Expired);
        }

        let input = input.trim();
        if input.eq_ignore_ascii_case(CANCEL) {
            tracing::info!(operator = %operator, "Restore cancelled");
            return Ok(RestoreReply::Cancelled);
        }
        pending.last_activity = now;

        match pending.stage {
            Stage::Selecting { ref backups } => {
                let choice = input
                    .parse::<usize>()
                    .ok()
                    .filter(|n| (1..=backups.len()).contains(n));
                let reply = match choice {
                    Some(n) => {
                        let backup = backups[n - 1].clone();
                        pending.stage = Stage::Confirming {
                            backup: backup.clone(),
                        };
                        RestoreReply::ConfirmPrompt { backup }
                    }
                    None => RestoreReply::InvalidSelection {
                        input: input.to_string(),
                        choices: backups.len(),
                    },
                };
                self.pending.insert(operator.to_string(), pending);
                Ok(reply)
            }
            Stage::Confirming { ref backup } => {
                if input != CONFIRM_TOKEN {
                    self.pending.insert(operator.to_string(), pending);
                    return Ok(RestoreReply::ConfirmationMismatch);
                }

                tracing::warn!(
                    operator = %operator,
                    archive = %backup.path.display(),
                    "Restoring backup over live records"
                );
                let summary = restore_archive(&backup.path, &self.store_root)?;
                hook.reload().map_err(|err| {
                    Error::InvalidOperation(format!(
                        "restored {} but reload failed: {:#}",
                        backup.name, err
                    ))
                })?;
                Ok(RestoreReply::Restored { summary })
            }
        }
    }

    /// Drop every session idle past the timeout. Returns the operators
    /// whose sessions were dropped.
    pub fn expire_stale(&mut self, now: Instant) -> Vec<String> {
        let timeout = self.timeout;
        let mut expired = self
            .pending
            .iter()
            .filter(|(_, pending)| {
                now.saturating_duration_since(pending.last_activity) >= timeout
            })
            .map(|(operator, _)| operator.clone())
            .collect::<Vec<_>>();
        expired.sort();
        for operator in &expired {
            self.pending.remove(operator);
        }
        expired
    }

    fn is_stale(&self, pending: &Pending, now: Instant) -> bool {
        now.saturating_duration_since(pending.last_activity) >= self.timeout
    }
}

/// Sweep stale restore sessions every `period` until the sessions are
/// dropped by every other owner.
pub fn spawn_reaper(
    sessions: Arc<Mutex<RestoreSessions>>,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    let weak = Arc::downgrade(&sessions);
    drop(sessions);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let Some(sessions) = weak.upgrade() else {
                break;
            };
            let expired = match sessions.lock() {
                Ok(mut guard) => guard.expire_stale(Instant::now()),
                Err(_) => break,
            };
            for operator in expired {
                tracing::info!(operator = %operator, "Restore session timed out");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    struct CountingHook(usize);

    impl ReloadHook for CountingHook {
        fn reload(&mut self) -> anyhow::Result<()> {
            self.0 += 1;
            Ok(())
        }
    }

    fn setup(timeout: Duration) -> anyhow::Result<(TempDir, RestoreSessions)> {
        let temp = TempDir::new()?;
        let store = temp.path().join("players");
        fs::create_dir_all(store.join("active"))?;
        fs::write(store.join("active/Steve.json"), "{\"base_name\":\"Steve\"}\n")?;

        let archiver = BackupArchiver::new(temp.path().join("backups"), 5);
        let at = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        archiver.create(&store, at)?;

        let sessions = RestoreSessions::new(archiver, store, timeout);
        Ok((temp, sessions))
    }

    #[test]
    fn test_full_restore_flow() -> anyhow::Result<()> {
        let (temp, mut sessions) = setup(Duration::from_secs(60))?;
        let store = temp.path().join("players");
        fs::write(store.join("active/Steve.json"), "changed")?;
        fs::write(store.join("active/Alex.json"), "{}")?;

        let now = Instant::now();
        let mut hook = CountingHook(0);

        assert!(matches!(
            sessions.begin("op", now)?,
            RestoreReply::Listing { ref backups } if backups.len() == 1
        ));
        assert!(matches!(
            sessions.respond("op", "7", now, &mut hook)?,
            RestoreReply::InvalidSelection { choices: 1, .. }
        ));
        assert!(matches!(
            sessions.respond("op", "1", now, &mut hook)?,
            RestoreReply::ConfirmPrompt { .. }
        ));
        assert_eq!(
            sessions.respond("op", "restore", now, &mut hook)?,
            RestoreReply::ConfirmationMismatch
        );
        assert!(matches!(
            sessions.respond("op", CONFIRM_TOKEN, now, &mut hook)?,
            RestoreReply::Restored { ref summary } if summary.files == 1
        ));

        assert_eq!(hook.0, 1);
        assert!(!sessions.is_pending("op"));
        assert_eq!(
            fs::read_to_string(store.join("active/Steve.json"))?,
            "{\"base_name\":\"Steve\"}\n"
        );
        assert!(!store.join("active/Alex.json").exists());
        Ok(())
    }

    #[test]
    fn test_cancel_at_any_prompt() -> anyhow::Result<()> {
        let (_temp, mut sessions) = setup(Duration::from_secs(60))?;
        let now = Instant::now();
        let mut hook = CountingHook(0);

        sessions.begin("op", now)?;
        assert_eq!(sessions.respond("op", "CANCEL", now, &mut hook)?, RestoreReply::Cancelled);
        assert_eq!(sessions.respond("op", "1", now, &mut hook)?, RestoreReply::NoSession);

        sessions.begin("op", now)?;
        sessions.respond("op", "1", now, &mut hook)?;
        assert_eq!(sessions.respond("op", " cancel ", now, &mut hook)?, RestoreReply::Cancelled);
        assert_eq!(hook.0, 0);
        Ok(())
    }

    #[test]
    fn test_sessions_are_per_operator() -> anyhow::Result<()> {
        let (_temp, mut sessions) = setup(Duration::from_secs(60))?;
        let now = Instant::now();
        let mut hook = CountingHook(0);

        sessions.begin("alice", now)?;
        sessions.begin("bob", now)?;
        sessions.respond("alice", "1", now, &mut hook)?;

        assert_eq!(sessions.pending_count(), 2);
        assert!(matches!(
            sessions.respond("bob", "1", now, &mut hook)?,
            RestoreReply::ConfirmPrompt { .. }
        ));
        Ok(())
    }

    #[test]
    fn test_idle_session_expires() -> anyhow::Result<()> {
        let (_temp, mut sessions) = setup(Duration::from_secs(30))?;
        let start = Instant::now();
        let mut hook = CountingHook(0);

        sessions.begin("op", start)?;
        let late = start + Duration::from_secs(31);
        assert_eq!(sessions.respond("op", "1", late, &mut hook)?, RestoreReply::Expired);
        assert!(!sessions.is_pending("op"));

        sessions.begin("op", start)?;
        assert!(sessions.expire_stale(start + Duration::from_secs(10)).is_empty());
        assert_eq!(sessions.expire_stale(late), vec!["op".to_string()]);
        Ok(())
    }

    #[test]
    fn test_no_backups() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let archiver = BackupArchiver::new(temp.path().join("backups"), 5);
        let mut sessions = RestoreSessions::new(archiver, temp.path(), Duration::from_secs(5));
        assert_eq!(sessions.begin("op", Instant::now())?, RestoreReply::NoBackups);
        assert!(!sessions.is_pending("op"));
        Ok(())
    }

    #[tokio::test]
    async fn test_reaper_drops_stale_sessions() -> anyhow::Result<()> {
        let (_temp, mut sessions) = setup(Duration::ZERO)?;
        sessions.begin("op", Instant::now())?;
        let sessions = Arc::new(Mutex::new(sessions));

        let reaper = spawn_reaper(Arc::clone(&sessions), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sessions.lock().unwrap().pending_count(), 0);

        drop(sessions);
        tokio::time::timeout(Duration::from_secs(1), reaper).await??;
        Ok(())
    }
}
