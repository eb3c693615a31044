use chrono::{NaiveDate, NaiveDateTime};
use flate2::Compression;
use flate2::write::GzEncoder;
use playlog_engine::{SessionBatch, SessionGrouper};
use playlog_parser::LogFile;
use playlog_runtime::{
    Config, Error, IngestOutcome, IngestProgress, IngestRequest, IngestionJob, WorkspacePaths,
    run_in_background,
};
use playlog_store::ParticipantStore;
use playlog_types::{ParticipantDirectory, ParticipantId, stats};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 3)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

fn write_gz(path: &Path, text: &str) -> anyhow::Result<()> {
    let mut encoder = GzEncoder::new(File::create(path)?, Compression::default());
    encoder.write_all(text.as_bytes())?;
    encoder.finish()?;
    Ok(())
}

fn workspace() -> anyhow::Result<(TempDir, Config, WorkspacePaths)> {
    let temp = TempDir::new()?;
    let config = Config::default();
    let paths = config.workspace(temp.path());
    fs::create_dir_all(&paths.logs)?;

    write_gz(
        &paths.logs.join("2024-03-01-1.log.gz"),
        "[22:00:00] [Server thread/INFO]: Steve joined the game\n\
         [22:30:00] [Server thread/INFO]: <Steve> kusa www\n\
         [23:00:00] [Server thread/INFO]: Steve left the game\n",
    )?;
    fs::write(
        paths.logs.join("2024-03-02-1.log"),
        "[10:00:00] [Server thread/INFO]: Alex joined the game\n\
         [10:05:00] [Server thread/INFO]: Alex fell from a high place\n\
         [10:10:00] [Server thread/INFO]: Alex left the game\n",
    )?;
    Ok((temp, config, paths))
}

fn request(dry_run: bool) -> IngestRequest {
    IngestRequest {
        reason: "test run".to_string(),
        dry_run,
        ..IngestRequest::default()
    }
}

fn top_level_files(dir: &Path) -> anyhow::Result<usize> {
    let mut count = 0;
    for entry in fs::read_dir(dir)? {
        if entry?.file_type()?.is_file() {
            count += 1;
        }
    }
    Ok(count)
}

#[test]
fn test_applied_run_merges_relocates_and_reports() -> anyhow::Result<()> {
    let (_temp, config, paths) = workspace()?;
    let job = IngestionJob::new(config, paths.clone()).at(now());

    let mut progress = Vec::new();
    let summary = job.run(&request(false), |p| progress.push(p))?;

    assert_eq!(summary.files.len(), 2);
    assert_eq!(summary.sessions, 1);
    assert!(summary.backup.as_ref().is_some_and(|b| b.exists()));
    assert!(matches!(
        progress.last(),
        Some(IngestProgress::Completed { dry_run: false, .. })
    ));

    let store = ParticipantStore::open(&paths.store)?;
    let steve = store.get(&ParticipantId::derive("Steve", None)).unwrap();
    assert_eq!(steve.stat(stats::PLAYTIME_SECONDS), 3600);
    assert_eq!(steve.stat(stats::CHAT_COUNT), 1);
    assert_eq!(steve.stat(stats::LAUGH_COUNT), 4);
    let alex = store.get(&ParticipantId::derive("Alex", None)).unwrap();
    assert_eq!(alex.stat(stats::DEATHS), 1);
    assert!(alex.accounts.is_empty());

    assert_eq!(top_level_files(&paths.logs)?, 0);
    assert!(paths.processed.join("2024-03-01-1.log.gz").exists());
    assert!(paths.processed.join("2024-03-02-1.log").exists());

    let report = fs::read_to_string(paths.reports.join("ingest-2024-03-03.txt"))?;
    assert!(report.contains("mode:     applied"));
    assert!(report.contains("Alex: joins +1, deaths +1, playtime +10m00s"));
    Ok(())
}

#[test]
fn test_second_run_finds_nothing() -> anyhow::Result<()> {
    let (_temp, config, paths) = workspace()?;
    let job = IngestionJob::new(config, paths.clone()).at(now());

    job.run(&request(false), |_| {})?;
    let before = fs::read_to_string(paths.store.join("active").join("Steve.json"))?;

    let mut progress = Vec::new();
    let second = job.run(&request(false), |p| progress.push(p))?;

    assert!(second.nothing_to_do());
    assert!(second.report.is_none());
    assert!(progress.iter().any(|p| matches!(p, IngestProgress::NothingToDo)));
    assert_eq!(
        fs::read_to_string(paths.store.join("active").join("Steve.json"))?,
        before
    );
    Ok(())
}

#[test]
fn test_dry_run_writes_nothing_but_report() -> anyhow::Result<()> {
    let (_temp, config, paths) = workspace()?;
    let job = IngestionJob::new(config, paths.clone()).at(now());

    let summary = job.run(&request(true), |_| {})?;

    assert!(summary.backup.is_none());
    assert!(!paths.store.exists());
    assert!(!paths.backups.exists());
    assert!(!paths.processed.exists());
    assert!(paths.logs.join("2024-03-01-1.log.gz").exists());

    let steve = summary
        .changes
        .iter()
        .find(|c| c.name == "Steve")
        .unwrap();
    assert_eq!(steve.stat(stats::PLAYTIME_SECONDS), 3600);

    let report = fs::read_to_string(summary.report.unwrap())?;
    assert!(report.contains("dry run"));
    assert!(report.contains("would change:"));
    Ok(())
}

#[test]
fn test_date_filter_limits_files() -> anyhow::Result<()> {
    let (_temp, config, paths) = workspace()?;
    let job = IngestionJob::new(config, paths.clone()).at(now());

    let summary = job.run(
        &IngestRequest {
            from: Some("2024-03-02".to_string()),
            to: Some("2024-03-02".to_string()),
            ..request(false)
        },
        |_| {},
    )?;

    assert_eq!(summary.files, vec![paths.logs.join("2024-03-02-1.log")]);
    assert!(paths.logs.join("2024-03-01-1.log.gz").exists());
    Ok(())
}

struct PerFile;

impl SessionGrouper for PerFile {
    fn group(&self, files: Vec<LogFile>) -> Vec<SessionBatch> {
        files
            .into_iter()
            .map(|file| SessionBatch { files: vec![file] })
            .collect()
    }
}

#[test]
fn test_custom_grouper_splits_sessions() -> anyhow::Result<()> {
    let (_temp, config, paths) = workspace()?;
    let job = IngestionJob::new(config, paths.clone())
        .with_grouper(Box::new(PerFile))
        .at(now());

    let mut started = 0;
    let summary = job.run(&request(false), |p| {
        if matches!(p, IngestProgress::SessionStarted { files: 1, .. }) {
            started += 1;
        }
    })?;

    assert_eq!(summary.sessions, 2);
    assert_eq!(started, 2);
    assert_eq!(summary.changes.len(), 2);
    Ok(())
}

#[test]
fn test_bad_date_rejected_before_io() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let config = Config::default();
    let paths = config.workspace(temp.path());
    let job = IngestionJob::new(config, paths.clone()).at(now());

    let mut progress = Vec::new();
    let err = job
        .run(
            &IngestRequest {
                from: Some("yesterday".to_string()),
                ..request(false)
            },
            |p| progress.push(p),
        )
        .unwrap_err();

    assert!(matches!(err, Error::DateParse(_)));
    assert!(progress.is_empty());
    Ok(())
}

#[test]
fn test_missing_log_dir_stops_before_backup() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let config = Config::default();
    let paths = config.workspace(temp.path());
    let job = IngestionJob::new(config, paths.clone()).at(now());

    let err = job.run(&request(false), |_| {}).unwrap_err();
    assert!(matches!(err, Error::InputDiscovery { .. }));
    assert!(!paths.backups.exists());
    Ok(())
}

#[tokio::test]
async fn test_background_failure_is_generic() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let config = Config::default();
    let paths = config.workspace(temp.path());
    let job = IngestionJob::new(config, paths).at(now());

    match run_in_background(job, request(false), |_| {}).await? {
        IngestOutcome::Failed { message } => {
            assert!(!message.contains(temp.path().to_string_lossy().as_ref()));
        }
        IngestOutcome::Completed(_) => panic!("run should fail without a log directory"),
    }
    Ok(())
}

#[tokio::test]
async fn test_background_success() -> anyhow::Result<()> {
    let (_temp, config, paths) = workspace()?;
    let job = IngestionJob::new(config, paths).at(now());

    let outcome = run_in_background(job, request(false), |_| {}).await?;
    assert!(matches!(outcome, IngestOutcome::Completed(ref s) if s.files.len() == 2));
    Ok(())
}
