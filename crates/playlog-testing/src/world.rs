//! TestWorld pattern for declarative integration test setup.

use anyhow::Result;
use assert_cmd::Command;
use filetime::FileTime;
use playlog_runtime::{Config, WorkspacePaths};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

use crate::fixtures::ServerLog;

/// Isolated playlog data directory with a default config already written.
///
/// # Example
/// ```no_run
/// use playlog_testing::{ServerLog, TestWorld};
///
/// let world = TestWorld::new();
/// world
///     .write_log("2024-03-01-1.log", &ServerLog::new().join("10:00:00", "Steve"))
///     .unwrap();
///
/// let result = world.run(&["ingest", "--dry-run"]).unwrap();
/// assert!(result.success());
/// ```
pub struct TestWorld {
    temp_dir: TempDir,
    data_dir: PathBuf,
    config: Config,
    env_vars: HashMap<String, String>,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorld {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_dir = temp_dir.path().join(".playlog");
        let config = Config::default();

        config
            .save_to(&Config::path_in(&data_dir))
            .expect("Failed to write config");
        std::fs::create_dir_all(config.workspace(&data_dir).logs)
            .expect("Failed to create log dir");

        Self {
            temp_dir,
            data_dir,
            config,
            env_vars: HashMap::new(),
        }
    }

    /// Edit the config and write it back to `config.toml`.
    pub fn with_config(mut self, edit: impl FnOnce(&mut Config)) -> Self {
        edit(&mut self.config);
        self.config
            .save_to(&Config::path_in(&self.data_dir))
            .expect("Failed to write config");
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn paths(&self) -> WorkspacePaths {
        self.config.workspace(&self.data_dir)
    }

    /// Write a log into the raw log directory, gzip-compressed when the
    /// name ends in `.gz`.
    pub fn write_log(&self, name: &str, log: &ServerLog) -> Result<PathBuf> {
        let path = self.paths().logs.join(name);
        if name.ends_with(".gz") {
            log.write_gz(&path)?;
        } else {
            log.write_plain(&path)?;
        }
        Ok(path)
    }

    /// Push a file's modification time into the past.
    pub fn age_file(&self, path: &Path, by: Duration) -> Result<()> {
        let then = SystemTime::now() - by;
        filetime::set_file_mtime(path, FileTime::from_system_time(then))?;
        Ok(())
    }

    pub fn configure_command<'a>(&self, cmd: &'a mut Command) -> &'a mut Command {
        cmd.arg("--data-dir")
            .arg(self.data_dir())
            .arg("--log-level")
            .arg("warn");

        cmd.current_dir(self.temp_dir.path());
        cmd.env_remove("PLAYLOG_PATH");
        cmd.env_remove("RUST_LOG");
        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }

        cmd
    }

    #[allow(deprecated)]
    fn command(&self) -> Result<Command> {
        let mut cmd = Command::cargo_bin("playlog")
            .map_err(|e| anyhow::anyhow!("Failed to find playlog binary: {}", e))?;
        self.configure_command(&mut cmd);
        Ok(cmd)
    }

    /// Run the `playlog` binary with `args`.
    pub fn run(&self, args: &[&str]) -> Result<CliResult> {
        let mut cmd = self.command()?;
        cmd.args(args);
        Ok(CliResult::from(cmd.output()?))
    }

    /// Run the `playlog` binary feeding `input` on stdin.
    pub fn run_with_input(&self, args: &[&str], input: &str) -> Result<CliResult> {
        let mut cmd = self.command()?;
        cmd.args(args).write_stdin(input.to_string());
        Ok(CliResult::from(cmd.output()?))
    }
}

/// Result of a CLI command execution.
#[derive(Debug)]
pub struct CliResult {
    pub status: std::process::ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl From<std::process::Output> for CliResult {
    fn from(output: std::process::Output) -> Self {
        Self {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

impl CliResult {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }
}
