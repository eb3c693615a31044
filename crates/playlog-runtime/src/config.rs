use crate::throttle::ProcessingIntensity;
use crate::{Error, Result};
use playlog_parser::{ClassifierOptions, PatternKind, PatternSet};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Resolve the data directory based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. PLAYLOG_PATH environment variable (with tilde expansion)
/// 3. XDG data directory
/// 4. ~/.playlog
pub fn resolve_workspace_path(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("PLAYLOG_PATH") {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("playlog"));
    }

    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home).join(".playlog"));
    }

    Err(Error::Config(
        "Could not determine data directory: no HOME directory or XDG data directory found"
            .to_string(),
    ))
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub logs: PathBuf,
    pub processed: PathBuf,
    pub store: PathBuf,
    pub backups: PathBuf,
    pub reports: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            logs: PathBuf::from("logs"),
            processed: PathBuf::from("logs/processed"),
            store: PathBuf::from("players"),
            backups: PathBuf::from("backups"),
            reports: PathBuf::from("reports"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub intensity: ProcessingIntensity,
    pub max_backups: usize,
    pub ignored_names: Vec<String>,
    pub current_log: String,
    pub photoshoot_phrase: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            intensity: ProcessingIntensity::default(),
            max_backups: 10,
            ignored_names: Vec::new(),
            current_log: "latest.log".to_string(),
            photoshoot_phrase: "photoshoot is starting".to_string(),
        }
    }
}

/// Operator-supplied regular expressions, validated when the classifier
/// is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternsConfig {
    pub death: Vec<String>,
    pub chat: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestoreConfig {
    pub timeout_secs: u64,
}

impl Default for RestoreConfig {
    fn default() -> Self {
        Self { timeout_secs: 120 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub patterns: PatternsConfig,
    #[serde(default)]
    pub restore: RestoreConfig,
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn path_in(data_dir: &Path) -> PathBuf {
        data_dir.join("config.toml")
    }

    /// Absolute locations of every directory the tool touches.
    pub fn workspace(&self, data_dir: &Path) -> WorkspacePaths {
        let resolve = |path: &Path| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                data_dir.join(path)
            }
        };
        WorkspacePaths {
            data_dir: data_dir.to_path_buf(),
            logs: resolve(&self.paths.logs),
            processed: resolve(&self.paths.processed),
            store: resolve(&self.paths.store),
            backups: resolve(&self.paths.backups),
            reports: resolve(&self.paths.reports),
        }
    }

    /// Compile the operator patterns. Invalid ones are logged and skipped.
    pub fn classifier_options(&self) -> ClassifierOptions {
        ClassifierOptions {
            photoshoot_phrase: self.ingest.photoshoot_phrase.clone(),
            death_patterns: PatternSet::build(PatternKind::Death, &self.patterns.death),
            chat_patterns: PatternSet::build(PatternKind::Chat, &self.patterns.chat),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePaths {
    pub data_dir: PathBuf,
    pub logs: PathBuf,
    pub processed: PathBuf,
    pub store: PathBuf,
    pub backups: PathBuf,
    pub reports: PathBuf,
}

impl WorkspacePaths {
    pub fn config_file(&self) -> PathBuf {
        Config::path_in(&self.data_dir)
    }
}
