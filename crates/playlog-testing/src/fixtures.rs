//! Server log fixtures.

use anyhow::Result;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Builder for the text of one server log file.
///
/// ```
/// use playlog_testing::ServerLog;
///
/// let log = ServerLog::new()
///     .join("10:00:00", "Steve")
///     .chat("10:01:00", "Steve", "hello")
///     .leave("10:30:00", "Steve");
/// assert_eq!(log.text().lines().count(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ServerLog {
    lines: Vec<String>,
}

impl ServerLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw `[HH:MM:SS] [Server thread/INFO]: <content>` line.
    pub fn line(mut self, time: &str, content: &str) -> Self {
        self.lines
            .push(format!("[{}] [Server thread/INFO]: {}", time, content));
        self
    }

    /// Append a line with no timestamp (stack trace, wrapped message).
    pub fn continuation(mut self, content: &str) -> Self {
        self.lines.push(content.to_string());
        self
    }

    pub fn account(self, time: &str, name: &str, account: &str) -> Self {
        self.line(time, &format!("UUID of player {} is {}", name, account))
    }

    pub fn join(self, time: &str, name: &str) -> Self {
        self.line(time, &format!("{} joined the game", name))
    }

    pub fn leave(self, time: &str, name: &str) -> Self {
        self.line(time, &format!("{} left the game", name))
    }

    pub fn chat(self, time: &str, name: &str, message: &str) -> Self {
        self.line(time, &format!("<{}> {}", name, message))
    }

    pub fn death(self, time: &str, name: &str, cause: &str) -> Self {
        self.line(time, &format!("{} {}", name, cause))
    }

    pub fn text(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }

    pub fn write_plain(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.text())?;
        Ok(())
    }

    pub fn write_gz(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut encoder = GzEncoder::new(File::create(path)?, Compression::default());
        encoder.write_all(self.text().as_bytes())?;
        encoder.finish()?;
        Ok(())
    }
}
