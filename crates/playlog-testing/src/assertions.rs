//! Assertions against the on-disk state a run leaves behind.

use anyhow::{Context, Result};
use playlog_types::ParticipantRecord;
use std::fs;
use std::path::Path;

/// Read `<store>/<section>/<id>.json`.
pub fn read_record(store: &Path, section: &str, id: &str) -> Result<ParticipantRecord> {
    let path = store.join(section).join(format!("{}.json", id));
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Missing participant record {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid record {}", path.display()))
}

/// Assert that an active record carries `expected` for `key`.
pub fn assert_stat(store: &Path, id: &str, key: &str, expected: i64) -> Result<()> {
    let record = read_record(store, "active", id)?;
    let actual = record.stat(key);
    if actual != expected {
        anyhow::bail!("{}.{}: expected {}, got {}", id, key, expected, actual);
    }
    Ok(())
}

/// Assert the number of regular files directly inside `dir`.
pub fn assert_file_count(dir: &Path, expected: usize) -> Result<()> {
    let actual = if dir.is_dir() {
        fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .count()
    } else {
        0
    };

    if actual != expected {
        anyhow::bail!(
            "Expected {} file(s) in {}, found {}",
            expected,
            dir.display(),
            actual
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_assert_stat() -> Result<()> {
        let temp = TempDir::new()?;
        let active = temp.path().join("active");
        fs::create_dir_all(&active)?;
        fs::write(
            active.join("Steve.json"),
            r#"{"base_name":"Steve","statistics":{"deaths":2}}"#,
        )?;

        assert!(assert_stat(temp.path(), "Steve", "deaths", 2).is_ok());
        assert!(assert_stat(temp.path(), "Steve", "deaths", 3).is_err());
        assert!(assert_stat(temp.path(), "Alex", "deaths", 0).is_err());
        Ok(())
    }

    #[test]
    fn test_assert_file_count_on_missing_dir() -> Result<()> {
        let temp = TempDir::new()?;
        assert!(assert_file_count(&temp.path().join("nope"), 0).is_ok());
        Ok(())
    }
}
