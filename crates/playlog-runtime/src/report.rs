use playlog_types::stats;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::Result;
use crate::ingest::{IngestSummary, ParticipantChange};

const LABELS: [(&str, &str); 6] = [
    (stats::JOINS, "joins"),
    (stats::DEATHS, "deaths"),
    (stats::PLAYTIME_SECONDS, "playtime"),
    (stats::CHAT_COUNT, "chats"),
    (stats::LAUGH_COUNT, "laughs"),
    (stats::PHOTOSHOOT_COUNT, "photoshoots"),
];

/// Write the report for `summary` to `<dir>/ingest-YYYY-MM-DD.txt`,
/// replacing any earlier report for the same day.
pub fn write_report(dir: &Path, summary: &IngestSummary) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!(
        "ingest-{}.txt",
        summary.started_at.format("%Y-%m-%d")
    ));
    fs::write(&path, render_report(summary))?;
    Ok(path)
}

pub fn render_report(summary: &IngestSummary) -> String {
    let mut out = String::new();
    let mode = if summary.dry_run {
        "dry run (nothing was written)"
    } else {
        "applied"
    };

    let _ = writeln!(out, "playlog ingest report");
    let _ = writeln!(out, "started:  {}", summary.started_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "duration: {:.2}s", summary.duration.as_secs_f64());
    let _ = writeln!(out, "mode:     {}", mode);
    let _ = writeln!(
        out,
        "reason:   {}",
        if summary.reason.trim().is_empty() {
            "-"
        } else {
            summary.reason.trim()
        }
    );
    let _ = writeln!(out, "files:    {}", summary.files.len());
    let _ = writeln!(out, "sessions: {}", summary.sessions);
    let _ = writeln!(out, "lines:    {}", summary.lines);
    if let Some(backup) = &summary.backup {
        let _ = writeln!(out, "backup:   {}", file_name(backup));
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "processed files:");
    for file in &summary.files {
        let _ = writeln!(out, "  {}", file_name(file));
    }

    let _ = writeln!(out);
    let heading = if summary.dry_run {
        "would change:"
    } else {
        "changes:"
    };
    let _ = writeln!(out, "{}", heading);
    if summary.changes.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for change in &summary.changes {
        let _ = writeln!(out, "  {}: {}", change.participant, describe(change));
    }

    out
}

fn describe(change: &ParticipantChange) -> String {
    let parts = LABELS
        .iter()
        .filter_map(|(key, label)| {
            let value = change.stat(key);
            if value == 0 {
                return None;
            }
            if *key == stats::PLAYTIME_SECONDS {
                Some(format!("{} +{}", label, format_seconds(value)))
            } else {
                Some(format!("{} +{}", label, value))
            }
        })
        .collect::<Vec<_>>();

    if parts.is_empty() {
        "no counter changes".to_string()
    } else {
        parts.join(", ")
    }
}

fn format_seconds(total: i64) -> String {
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{}h{:02}m{:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
