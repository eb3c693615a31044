use chrono::NaiveDate;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

use crate::{Error, Result};

/// Rotated log names: `2024-03-01-2.log` or `2024-03-01-2.log.gz`
static ROTATED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})-(\d+)\.log(\.gz)?$").expect("valid rotated-name regex")
});

/// One raw log file selected for ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    pub path: PathBuf,
    /// Calendar day the file covers. The current file is assigned "today".
    pub day: NaiveDate,
    pub index: u32,
    pub is_current: bool,
}

impl LogFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn is_compressed(&self) -> bool {
        self.path.extension().is_some_and(|ext| ext == "gz")
    }

    /// Parse a rotated file name into (day, index)
    pub fn parse_rotated_name(name: &str) -> Option<(NaiveDate, u32)> {
        let caps = ROTATED_NAME.captures(name)?;
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        let index = caps[4].parse().ok()?;
        Some((NaiveDate::from_ymd_opt(year, month, day)?, index))
    }
}

/// List candidate log files in `dir`, ordered by (day, rotation index)
/// with the current file last.
///
/// Only the top level of `dir` is scanned, so a processed-archive
/// directory nested inside it is never rediscovered. Files with no
/// recognizable day are skipped, except `current_name`.
pub fn discover_log_files(
    dir: &Path,
    current_name: &str,
    today: NaiveDate,
) -> Result<Vec<LogFile>> {
    if !dir.is_dir() {
        return Err(Error::Read {
            path: dir.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "log directory does not exist",
            ),
        });
    }

    let mut rotated = Vec::new();
    let mut current = None;

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();

        if name == current_name {
            current = Some(LogFile {
                path: entry.path().to_path_buf(),
                day: today,
                index: u32::MAX,
                is_current: true,
            });
            continue;
        }

        match LogFile::parse_rotated_name(&name) {
            Some((day, index)) => rotated.push(LogFile {
                path: entry.path().to_path_buf(),
                day,
                index,
                is_current: false,
            }),
            None => tracing::debug!(file = %name, "Skipping file without a recognizable day"),
        }
    }

    rotated.sort_by(|a, b| (a.day, a.index, &a.path).cmp(&(b.day, b.index, &b.path)));
    rotated.extend(current);
    Ok(rotated)
}

/// Keep files whose day falls inside the inclusive `[from, to]` range.
pub fn filter_by_date(
    files: Vec<LogFile>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<LogFile> {
    files
        .into_iter()
        .filter(|file| from.is_none_or(|from| file.day >= from))
        .filter(|file| to.is_none_or(|to| file.day <= to))
        .collect()
}
