use anyhow::Result;
use chrono::Local;
use playlog_runtime::{Config, WorkspacePaths};
use playlog_store::BackupArchiver;

use crate::views;

pub fn create(config: &Config, paths: &WorkspacePaths) -> Result<()> {
    let archiver = BackupArchiver::new(&paths.backups, config.ingest.max_backups);
    let archive = archiver.create(&paths.store, Local::now().naive_local())?;
    let removed = archiver.prune()?;

    println!("Created {}", archive.display());
    if !removed.is_empty() {
        println!("Pruned {} old backup(s)", removed.len());
    }
    Ok(())
}

pub fn list(config: &Config, paths: &WorkspacePaths) -> Result<()> {
    let archiver = BackupArchiver::new(&paths.backups, config.ingest.max_backups);
    views::print_backups(&archiver.list()?);
    Ok(())
}
