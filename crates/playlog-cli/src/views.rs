use owo_colors::OwoColorize;
use playlog_runtime::{IngestProgress, IngestSummary, RestoreReply, CONFIRM_TOKEN};
use playlog_store::BackupInfo;

pub fn print_progress(progress: &IngestProgress) {
    match progress {
        IngestProgress::Discovering { dir } => {
            println!("Scanning {}", dir.display());
        }
        IngestProgress::Discovered { total } => {
            println!("  found {} log file(s)", total);
        }
        IngestProgress::Filtered { matched } => {
            println!("  {} file(s) inside the date range", matched);
        }
        IngestProgress::NothingToDo => {}
        IngestProgress::Grouped { sessions } => {
            println!("  {} session(s) to process", sessions);
        }
        IngestProgress::BackupCreated { path } => {
            println!("{} {}", "Backup:".cyan(), path.display());
        }
        IngestProgress::BackupsPruned { removed } => {
            if *removed > 0 {
                println!("  pruned {} old backup(s)", removed);
            }
        }
        IngestProgress::BackupSkipped => {
            println!("{}", "Dry run: no backup taken".yellow());
        }
        IngestProgress::SessionStarted {
            index,
            total,
            files,
        } => {
            println!("Session {}/{} ({} file(s))", index, total, files);
        }
        IngestProgress::SessionProcessed {
            lines,
            participants,
            ..
        } => {
            println!("  {} line(s), {} participant(s)", lines, participants);
        }
        IngestProgress::SessionMerged { records, .. } => {
            println!("  merged into {} record(s)", records);
        }
        IngestProgress::FilesRelocated { count, dir } => {
            println!("Moved {} file(s) to {}", count, dir.display());
        }
        IngestProgress::ReportWritten { path } => {
            println!("Report: {}", path.display());
        }
        IngestProgress::Completed { .. } => {}
    }
}

pub fn print_summary(summary: &IngestSummary) {
    if summary.nothing_to_do() {
        println!("No new log files to ingest.");
        return;
    }

    let report = summary
        .report
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    println!();
    if summary.dry_run {
        println!(
            "{} {} participant(s) would change; nothing was written. See {}",
            "Dry run complete.".yellow().bold(),
            summary.changes.len(),
            report
        );
    } else {
        println!(
            "{} {} participant(s) updated from {} file(s). See {}",
            "Ingest complete.".green().bold(),
            summary.changes.len(),
            summary.files.len(),
            report
        );
    }
}

pub fn print_backups(backups: &[BackupInfo]) {
    if backups.is_empty() {
        println!("No backups yet.");
        return;
    }
    for (i, backup) in backups.iter().enumerate() {
        println!(
            "{:>3}  {}  {}  {}",
            i + 1,
            backup.name,
            backup.modified.format("%Y-%m-%d %H:%M:%S"),
            format_size(backup.size).dimmed()
        );
    }
}

/// Print a restore reply. Returns false once the session is over.
pub fn print_restore_reply(reply: &RestoreReply) -> bool {
    match reply {
        RestoreReply::Listing { backups } => {
            println!("Available backups (newest first):");
            print_backups(backups);
            println!("Pick a number, or type 'cancel':");
            true
        }
        RestoreReply::NoBackups => {
            println!("No backups to restore from.");
            false
        }
        RestoreReply::ConfirmPrompt { backup } => {
            println!(
                "{} every live participant record will be replaced by {}.",
                "Warning:".red().bold(),
                backup.name
            );
            println!("Type {} to continue, or 'cancel':", CONFIRM_TOKEN.bold());
            true
        }
        RestoreReply::InvalidSelection { input, choices } => {
            println!("'{}' is not a number between 1 and {}.", input, choices);
            true
        }
        RestoreReply::ConfirmationMismatch => {
            println!("Type {} exactly, or 'cancel':", CONFIRM_TOKEN);
            true
        }
        RestoreReply::Cancelled => {
            println!("Restore cancelled.");
            false
        }
        RestoreReply::Expired => {
            println!("Restore session timed out; run `playlog restore` again.");
            false
        }
        RestoreReply::NoSession => {
            println!("No restore in progress.");
            false
        }
        RestoreReply::Restored { summary } => {
            println!(
                "{} {} file(s) from {}",
                "Restored".green().bold(),
                summary.files,
                summary.archive.display()
            );
            false
        }
    }
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
