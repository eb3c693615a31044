use chrono::{DateTime, Local, NaiveDateTime};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::records::Section;
use crate::{Error, Result};

const PREFIX: &str = "playlog-backup-";
const EXTENSION: &str = "zip";

/// One archive found in the backup directory.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupInfo {
    pub path: PathBuf,
    pub name: String,
    pub modified: DateTime<Local>,
    pub size: u64,
}

/// Writes, lists and prunes timestamped snapshots of the record store.
#[derive(Debug, Clone)]
pub struct BackupArchiver {
    dir: PathBuf,
    max_backups: usize,
}

impl BackupArchiver {
    /// `max_backups` of zero keeps every archive.
    pub fn new(dir: impl Into<PathBuf>, max_backups: usize) -> Self {
        Self {
            dir: dir.into(),
            max_backups,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Zip the active and discharged trees under `store_root` into a new
    /// archive named after `now`.
    ///
    /// The archive is written under a temporary name and renamed into place,
    /// so an interrupted snapshot never shows up in [`BackupArchiver::list`].
    pub fn create(&self, store_root: &Path, now: NaiveDateTime) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let target = self.unused_name(now);
        let partial = target.with_extension("zip.partial");

        let written = write_archive(store_root, &partial);
        if let Err(err) = written {
            let _ = fs::remove_file(&partial);
            return Err(err);
        }
        fs::rename(&partial, &target)?;

        tracing::info!(archive = %target.display(), "Created backup");
        Ok(target)
    }

    /// All archives, newest first.
    pub fn list(&self) -> Result<Vec<BackupInfo>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !is_backup_name(name) {
                continue;
            }
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            backups.push(BackupInfo {
                name: name.to_string(),
                modified: DateTime::<Local>::from(metadata.modified()?),
                size: metadata.len(),
                path,
            });
        }

        backups.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| b.name.cmp(&a.name))
        });
        Ok(backups)
    }

    /// Delete the oldest archives beyond the retention limit.
    pub fn prune(&self) -> Result<Vec<PathBuf>> {
        if self.max_backups == 0 {
            return Ok(Vec::new());
        }

        let mut removed = Vec::new();
        for backup in self.list()?.into_iter().skip(self.max_backups) {
            fs::remove_file(&backup.path)?;
            tracing::info!(archive = %backup.path.display(), "Pruned old backup");
            removed.push(backup.path);
        }
        Ok(removed)
    }

    fn unused_name(&self, now: NaiveDateTime) -> PathBuf {
        let stem = format!("{}{}", PREFIX, now.format("%Y%m%d-%H%M%S"));
        let mut candidate = self.dir.join(format!("{}.{}", stem, EXTENSION));
        let mut suffix = 1;
        while candidate.exists() {
            candidate = self.dir.join(format!("{}-{}.{}", stem, suffix, EXTENSION));
            suffix += 1;
        }
        candidate
    }
}

fn is_backup_name(name: &str) -> bool {
    name.starts_with(PREFIX) && name.ends_with(&format!(".{}", EXTENSION))
}

fn write_archive(store_root: &Path, destination: &Path) -> Result<()> {
    let mut zip = ZipWriter::new(File::create(destination)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for section in Section::ALL {
        let top = section.dir_name();
        zip.add_directory(format!("{}/", top), options)?;

        let source = store_root.join(top);
        if !source.is_dir() {
            continue;
        }

        for entry in WalkDir::new(&source).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|err| Error::Io(io::Error::other(err)))?;
            let relative = entry
                .path()
                .strip_prefix(store_root)
                .map_err(|err| Error::Io(io::Error::other(err)))?;
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if entry.file_type().is_dir() {
                zip.add_directory(format!("{}/", name), options)?;
            } else if entry.file_type().is_file() {
                zip.start_file(name, options)?;
                io::copy(&mut File::open(entry.path())?, &mut zip)?;
            }
        }
    }

    zip.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use filetime::{FileTime, set_file_mtime};
    use tempfile::TempDir;

    fn at(s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, s)
            .unwrap()
    }

    #[test]
    fn test_archive_name_is_timestamped() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let archiver = BackupArchiver::new(temp.path().join("backups"), 5);

        let first = archiver.create(&temp.path().join("store"), at(7))?;
        let second = archiver.create(&temp.path().join("store"), at(7))?;

        assert_eq!(
            first.file_name().unwrap().to_str(),
            Some("playlog-backup-20240301-120007.zip")
        );
        assert_eq!(
            second.file_name().unwrap().to_str(),
            Some("playlog-backup-20240301-120007-1.zip")
        );
        Ok(())
    }

    #[test]
    fn test_prune_keeps_newest_by_mtime() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let archiver = BackupArchiver::new(temp.path(), 2);

        // Names sort opposite to age so ordering must come from mtime.
        let ages = [
            ("playlog-backup-c.zip", 100),
            ("playlog-backup-b.zip", 200),
            ("playlog-backup-a.zip", 300),
        ];
        for (name, secs) in ages {
            let path = temp.path().join(name);
            fs::write(&path, b"zip")?;
            set_file_mtime(&path, FileTime::from_unix_time(1_700_000_000 + secs, 0))?;
        }
        fs::write(temp.path().join("notes.txt"), b"keep me")?;

        let removed = archiver.prune()?;
        assert_eq!(removed, vec![temp.path().join("playlog-backup-c.zip")]);

        let names: Vec<String> = archiver.list()?.into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["playlog-backup-a.zip", "playlog-backup-b.zip"]);
        assert!(temp.path().join("notes.txt").exists());
        Ok(())
    }

    #[test]
    fn test_zero_retention_keeps_everything() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let archiver = BackupArchiver::new(temp.path(), 0);
        for i in 0..3 {
            archiver.create(&temp.path().join("store"), at(i))?;
        }
        assert!(archiver.prune()?.is_empty());
        assert_eq!(archiver.list()?.len(), 3);
        Ok(())
    }

    #[test]
    fn test_list_missing_dir_is_empty() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let archiver = BackupArchiver::new(temp.path().join("nope"), 3);
        assert!(archiver.list()?.is_empty());
        Ok(())
    }
}
