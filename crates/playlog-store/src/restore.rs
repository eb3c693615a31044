use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};
use zip::ZipArchive;

use crate::records::Section;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreSummary {
    pub archive: PathBuf,
    pub files: usize,
}

/// Replace the live record trees under `store_root` with an archive's
/// contents.
///
/// The archive is opened before anything is deleted. Each entry's path is
/// checked against the target directory before its bytes are written; an
/// entry that would escape aborts the restore with
/// [`Error::RestoreIntegrity`], leaving earlier entries in place.
pub fn restore_archive(archive_path: &Path, store_root: &Path) -> Result<RestoreSummary> {
    if !archive_path.is_file() {
        return Err(Error::NotFound(format!(
            "backup {}",
            archive_path.display()
        )));
    }
    let mut archive = ZipArchive::new(File::open(archive_path)?)?;

    for section in Section::ALL {
        let live = store_root.join(section.dir_name());
        if live.exists() {
            fs::remove_dir_all(&live)?;
        }
        fs::create_dir_all(&live)?;
    }

    let mut files = 0;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_string();

        let Some(relative) = entry.enclosed_name() else {
            return Err(Error::RestoreIntegrity { entry: name });
        };
        if !is_record_tree(&relative) {
            tracing::warn!(entry = %name, "Skipping archive entry outside the record trees");
            continue;
        }
        let target = store_root.join(&relative);
        if !target.starts_with(store_root) {
            return Err(Error::RestoreIntegrity { entry: name });
        }

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        io::copy(&mut entry, &mut File::create(&target)?)?;
        files += 1;
    }

    tracing::info!(archive = %archive_path.display(), files, "Restored backup");
    Ok(RestoreSummary {
        archive: archive_path.to_path_buf(),
        files,
    })
}

fn is_record_tree(relative: &Path) -> bool {
    match relative.components().next() {
        Some(Component::Normal(top)) => Section::ALL
            .iter()
            .any(|section| top == section.dir_name()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) -> anyhow::Result<()> {
        let mut zip = ZipWriter::new(File::create(path)?);
        for (name, content) in entries {
            zip.start_file(*name, SimpleFileOptions::default())?;
            zip.write_all(content.as_bytes())?;
        }
        zip.finish()?;
        Ok(())
    }

    #[test]
    fn test_traversal_entry_aborts_restore() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let store = temp.path().join("store");
        let archive = temp.path().join("evil.zip");
        write_zip(
            &archive,
            &[
                ("active/Steve.json", "{}"),
                ("../escaped.json", "{}"),
                ("active/Alex.json", "{}"),
            ],
        )?;

        let err = restore_archive(&archive, &store).unwrap_err();
        assert!(matches!(err, Error::RestoreIntegrity { ref entry } if entry == "../escaped.json"));
        assert!(!temp.path().join("escaped.json").exists());
        assert!(store.join("active/Steve.json").exists());
        assert!(!store.join("active/Alex.json").exists());
        Ok(())
    }

    #[test]
    fn test_restore_replaces_live_trees() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let store = temp.path().join("store");
        fs::create_dir_all(store.join("active"))?;
        fs::write(store.join("active/Stale.json"), "{}")?;

        let archive = temp.path().join("snapshot.zip");
        write_zip(
            &archive,
            &[
                ("active/Steve.json", "steve"),
                ("discharged/Alex.json", "alex"),
                ("README.txt", "ignored"),
            ],
        )?;

        let summary = restore_archive(&archive, &store)?;
        assert_eq!(summary.files, 2);
        assert!(!store.join("active/Stale.json").exists());
        assert_eq!(fs::read_to_string(store.join("active/Steve.json"))?, "steve");
        assert_eq!(fs::read_to_string(store.join("discharged/Alex.json"))?, "alex");
        assert!(!store.join("README.txt").exists());
        Ok(())
    }

    #[test]
    fn test_missing_archive_leaves_store_untouched() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let store = temp.path().join("store");
        fs::create_dir_all(store.join("active"))?;
        fs::write(store.join("active/Steve.json"), "{}")?;

        let err = restore_archive(&temp.path().join("missing.zip"), &store).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(store.join("active/Steve.json").exists());
        Ok(())
    }
}
