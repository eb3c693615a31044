use chrono::{Local, NaiveDate, NaiveDateTime};
use playlog_engine::{IdentityResolver, SessionGrouper, SessionProcessor, SingleSession};
use playlog_parser::{
    EventClassifier, LogFile, SessionLineStream, discover_log_files, filter_by_date,
};
use playlog_store::{BackupArchiver, ParticipantStore};
use playlog_types::{ParticipantId, SessionDelta};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::{Config, WorkspacePaths};
use crate::report::write_report;
use crate::throttle::Throttle;
use crate::{Error, Result};

/// What the invoker asked for.
#[derive(Debug, Clone, Default)]
pub struct IngestRequest {
    /// Inclusive lower bound, `YYYY-MM-DD`
    pub from: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD`
    pub to: Option<String>,
    pub reason: String,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub enum IngestProgress {
    Discovering {
        dir: PathBuf,
    },
    Discovered {
        total: usize,
    },
    Filtered {
        matched: usize,
    },
    NothingToDo,
    Grouped {
        sessions: usize,
    },
    BackupCreated {
        path: PathBuf,
    },
    BackupsPruned {
        removed: usize,
    },
    BackupSkipped,
    SessionStarted {
        index: usize,
        total: usize,
        files: usize,
    },
    SessionProcessed {
        index: usize,
        lines: usize,
        participants: usize,
    },
    SessionMerged {
        index: usize,
        records: usize,
    },
    FilesRelocated {
        count: usize,
        dir: PathBuf,
    },
    ReportWritten {
        path: PathBuf,
    },
    Completed {
        dry_run: bool,
        report: PathBuf,
    },
}

/// Net statistic changes for one participant over the whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantChange {
    pub participant: ParticipantId,
    pub name: String,
    pub statistics: BTreeMap<String, i64>,
}

impl ParticipantChange {
    fn from_delta(delta: &SessionDelta) -> Self {
        let mut change = Self {
            participant: delta.participant_id.clone(),
            name: delta.base_name.clone(),
            statistics: BTreeMap::new(),
        };
        change.add(delta);
        change
    }

    fn add(&mut self, delta: &SessionDelta) {
        for (key, value) in &delta.statistics {
            if *value != 0 {
                *self.statistics.entry(key.clone()).or_insert(0) += value;
            }
        }
    }

    pub fn stat(&self, key: &str) -> i64 {
        self.statistics.get(key).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub started_at: NaiveDateTime,
    pub duration: Duration,
    pub reason: String,
    pub dry_run: bool,
    pub files: Vec<PathBuf>,
    pub sessions: usize,
    pub lines: usize,
    pub changes: Vec<ParticipantChange>,
    pub backup: Option<PathBuf>,
    /// `None` when nothing matched and the run stopped early.
    pub report: Option<PathBuf>,
}

impl IngestSummary {
    pub fn nothing_to_do(&self) -> bool {
        self.files.is_empty()
    }
}

/// Result delivered to whoever spawned a background run.
#[derive(Debug)]
pub enum IngestOutcome {
    Completed(IngestSummary),
    Failed { message: String },
}

/// Batch ingestion of raw logs into the participant store.
///
/// Steps run strictly in order:
/// 1. Discover candidate files
/// 2. Apply the date filter
/// 3. Group files into sessions
/// 4. Back up the store and prune old backups (skipped on dry run)
/// 5. Process each session and merge its deltas
/// 6. Move consumed files to the processed directory (skipped on dry run)
/// 7. Write the run report
pub struct IngestionJob {
    config: Config,
    paths: WorkspacePaths,
    grouper: Box<dyn SessionGrouper>,
    now: Option<NaiveDateTime>,
}

impl IngestionJob {
    pub fn new(config: Config, paths: WorkspacePaths) -> Self {
        Self {
            config,
            paths,
            grouper: Box::new(SingleSession),
            now: None,
        }
    }

    pub fn with_grouper(mut self, grouper: Box<dyn SessionGrouper>) -> Self {
        self.grouper = grouper;
        self
    }

    /// Pin the wall clock, used for "today", backup names and the report.
    pub fn at(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    pub fn paths(&self) -> &WorkspacePaths {
        &self.paths
    }

    pub fn run<F>(&self, request: &IngestRequest, mut on_progress: F) -> Result<IngestSummary>
    where
        F: FnMut(IngestProgress),
    {
        let from = parse_date(request.from.as_deref())?;
        let to = parse_date(request.to.as_deref())?;
        if let (Some(from), Some(to)) = (from, to)
            && from > to
        {
            return Err(Error::DateParse(format!("{} is after {}", from, to)));
        }

        let clock = Instant::now();
        let started_at = self.now.unwrap_or_else(|| Local::now().naive_local());
        let mut summary = IngestSummary {
            started_at,
            duration: Duration::ZERO,
            reason: request.reason.clone(),
            dry_run: request.dry_run,
            files: Vec::new(),
            sessions: 0,
            lines: 0,
            changes: Vec::new(),
            backup: None,
            report: None,
        };

        // 1. discover
        on_progress(IngestProgress::Discovering {
            dir: self.paths.logs.clone(),
        });
        let discovered = discover_log_files(
            &self.paths.logs,
            &self.config.ingest.current_log,
            started_at.date(),
        )
        .map_err(|source| Error::InputDiscovery {
            path: self.paths.logs.clone(),
            source,
        })?;
        on_progress(IngestProgress::Discovered {
            total: discovered.len(),
        });

        // 2. filter
        let files = filter_by_date(discovered, from, to);
        on_progress(IngestProgress::Filtered {
            matched: files.len(),
        });
        if files.is_empty() {
            tracing::info!("No log files matched; nothing to do");
            on_progress(IngestProgress::NothingToDo);
            summary.duration = clock.elapsed();
            return Ok(summary);
        }
        summary.files = files.iter().map(|f| f.path.clone()).collect();

        // 3. group
        let batches = self.grouper.group(files.clone());
        summary.sessions = batches.len();
        on_progress(IngestProgress::Grouped {
            sessions: batches.len(),
        });

        // 4. backup
        let mut store = ParticipantStore::open(&self.paths.store)?;
        if request.dry_run {
            store = store.read_only();
            on_progress(IngestProgress::BackupSkipped);
        } else {
            let archiver =
                BackupArchiver::new(&self.paths.backups, self.config.ingest.max_backups);
            let backup = archiver.create(&self.paths.store, started_at)?;
            on_progress(IngestProgress::BackupCreated {
                path: backup.clone(),
            });
            let removed = archiver.prune()?;
            on_progress(IngestProgress::BackupsPruned {
                removed: removed.len(),
            });
            summary.backup = Some(backup);
            store.ensure_layout()?;
        }

        // 5. process and merge
        let classifier = EventClassifier::new(self.config.classifier_options());
        let mut resolver = IdentityResolver::new(&self.config.ingest.ignored_names);
        let mut throttle = Throttle::new(self.config.ingest.intensity);
        let mut changes: BTreeMap<ParticipantId, ParticipantChange> = BTreeMap::new();

        let total = batches.len();
        for (index, batch) in batches.iter().enumerate() {
            let index = index + 1;
            on_progress(IngestProgress::SessionStarted {
                index,
                total,
                files: batch.files.len(),
            });

            let mut lines = 0;
            let mut processor = SessionProcessor::new(&mut store, &mut resolver);
            for line in SessionLineStream::open(&batch.files)? {
                let line = line?;
                processor
                    .apply(line.timestamp, classifier.classify(&line.content))
                    .map_err(Error::Processing)?;
                lines += 1;
                throttle.tick();
            }
            let outcome = processor.finish();
            summary.lines += lines;
            on_progress(IngestProgress::SessionProcessed {
                index,
                lines,
                participants: outcome.deltas.len(),
            });

            let mut merged = 0;
            for delta in outcome.changed() {
                changes
                    .entry(delta.participant_id.clone())
                    .and_modify(|change| change.add(delta))
                    .or_insert_with(|| ParticipantChange::from_delta(delta));
                if store.merge(delta)? {
                    merged += 1;
                }
            }
            if !request.dry_run {
                on_progress(IngestProgress::SessionMerged {
                    index,
                    records: merged,
                });
            }
            tracing::info!(
                session = index,
                lines,
                participants = outcome.deltas.len(),
                forced_leaves = outcome.forced_leaves,
                dry_run = request.dry_run,
                "Session processed"
            );
        }
        summary.changes = changes.into_values().collect();

        // 6. relocate
        if !request.dry_run {
            let count = relocate(&files, &self.paths.processed)?;
            on_progress(IngestProgress::FilesRelocated {
                count,
                dir: self.paths.processed.clone(),
            });
        }

        // 7. report
        summary.duration = clock.elapsed();
        let report = write_report(&self.paths.reports, &summary)?;
        on_progress(IngestProgress::ReportWritten {
            path: report.clone(),
        });
        summary.report = Some(report.clone());

        on_progress(IngestProgress::Completed {
            dry_run: request.dry_run,
            report,
        });
        Ok(summary)
    }
}

/// Run a job on the blocking pool. Failures are logged in full and
/// reported to the caller only as a generic message.
pub fn run_in_background<F>(
    job: IngestionJob,
    request: IngestRequest,
    on_progress: F,
) -> tokio::task::JoinHandle<IngestOutcome>
where
    F: FnMut(IngestProgress) + Send + 'static,
{
    tokio::task::spawn_blocking(move || match job.run(&request, on_progress) {
        Ok(summary) => IngestOutcome::Completed(summary),
        Err(err) => {
            tracing::error!(
                error = %error_chain(&err),
                reason = %request.reason,
                "Ingestion aborted"
            );
            IngestOutcome::Failed {
                message: "Ingestion failed; see the log for details".to_string(),
            }
        }
    })
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    raw.map(|raw| {
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|err| Error::DateParse(format!("'{}': {}", raw, err)))
    })
    .transpose()
}

/// Move every consumed file into `dir`, replacing same-named files there.
/// Moves already done stay done if a later one fails.
fn relocate(files: &[LogFile], dir: &Path) -> Result<usize> {
    fs::create_dir_all(dir)?;
    let mut moved = 0;
    for file in files {
        let Some(name) = file.path.file_name() else {
            continue;
        };
        let target = dir.join(name);
        if target.exists() {
            fs::remove_file(&target)?;
        }
        if fs::rename(&file.path, &target).is_err() {
            fs::copy(&file.path, &target)?;
            fs::remove_file(&file.path)?;
        }
        tracing::debug!(from = %file.path.display(), to = %target.display(), "Relocated log file");
        moved += 1;
    }
    Ok(moved)
}
