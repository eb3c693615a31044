use playlog_types::{
    Allocation, ParticipantDirectory, ParticipantId, ParticipantRecord, SessionDelta, allocate,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Top-level directory a record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Section {
    Active,
    Discharged,
}

impl Section {
    pub const ALL: [Section; 2] = [Section::Active, Section::Discharged];

    pub fn dir_name(&self) -> &'static str {
        match self {
            Section::Active => "active",
            Section::Discharged => "discharged",
        }
    }
}

#[derive(Debug, Clone)]
struct StoredRecord {
    record: ParticipantRecord,
    path: PathBuf,
    section: Section,
}

/// File-backed participant records, one pretty-printed JSON file each.
///
/// The whole store is loaded into memory on open. Every mutation is written
/// through to its file immediately unless the store was opened read-only,
/// in which case changes stay in memory and are lost on drop.
#[derive(Debug)]
pub struct ParticipantStore {
    root: PathBuf,
    records: BTreeMap<ParticipantId, StoredRecord>,
    read_only: bool,
}

impl ParticipantStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let records = load_records(&root)?;
        tracing::debug!(
            root = %root.display(),
            records = records.len(),
            "Loaded participant store"
        );
        Ok(Self {
            root,
            records,
            read_only: false,
        })
    }

    /// Keep every later change in memory only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn section_dir(&self, section: Section) -> PathBuf {
        self.root.join(section.dir_name())
    }

    /// Create the active and discharged directories if missing.
    pub fn ensure_layout(&self) -> Result<()> {
        for section in Section::ALL {
            fs::create_dir_all(self.section_dir(section))?;
        }
        Ok(())
    }

    /// Drop everything in memory and read the directories again.
    pub fn reload(&mut self) -> Result<()> {
        self.records = load_records(&self.root)?;
        tracing::info!(records = self.records.len(), "Reloaded participant store");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &ParticipantRecord> {
        self.records.values().map(|stored| &stored.record)
    }

    pub fn section_of(&self, id: &ParticipantId) -> Option<Section> {
        self.records.get(id).map(|stored| stored.section)
    }

    /// Sum `delta` into its record and persist. Returns false when the delta
    /// carries nothing to merge.
    pub fn merge(&mut self, delta: &SessionDelta) -> Result<bool> {
        if delta.is_empty() {
            return Ok(false);
        }

        let id = delta.participant_id.clone();
        if !self.records.contains_key(&id) {
            let mut record = ParticipantRecord::new(delta.base_name.clone());
            record.linked_name = delta.linked_name.clone();
            record.disambiguator = delta.disambiguator;
            self.insert_new(id.clone(), record);
        }

        if let Some(stored) = self.records.get_mut(&id) {
            stored.record.absorb(delta);
        }
        self.save(&id)?;
        Ok(true)
    }

    fn insert_new(&mut self, id: ParticipantId, record: ParticipantRecord) {
        let path = self.section_dir(Section::Active).join(id.file_name());
        self.records.insert(
            id,
            StoredRecord {
                record,
                path,
                section: Section::Active,
            },
        );
    }

    fn save(&self, id: &ParticipantId) -> Result<()> {
        if self.read_only {
            return Ok(());
        }
        let stored = self
            .records
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("participant {}", id)))?;
        write_record(&stored.path, &stored.record)
    }
}

impl ParticipantDirectory for ParticipantStore {
    fn get(&self, id: &ParticipantId) -> Option<&ParticipantRecord> {
        self.records.get(id).map(|stored| &stored.record)
    }

    fn find_by_account(&self, account: &str) -> Option<ParticipantId> {
        self.records
            .iter()
            .find(|(_, stored)| stored.record.owns_account(account))
            .map(|(id, _)| id.clone())
    }

    fn find_by_name(&self, name: &str) -> Option<ParticipantId> {
        // Active records win over discharged ones answering to the same name.
        let mut matches = self
            .records
            .iter()
            .filter(|(_, stored)| stored.record.answers_to(name))
            .collect::<Vec<_>>();
        matches.sort_by_key(|(_, stored)| stored.section);
        matches.first().map(|(id, _)| (*id).clone())
    }

    fn create(&mut self, base_name: &str) -> anyhow::Result<ParticipantId> {
        let records = &self.records;
        let record = match allocate(base_name, |id| records.get(id).map(|s| &s.record)) {
            Allocation::Existing(id) => return Ok(id),
            Allocation::New(record) => record,
        };
        let id = record.participant_id();
        self.insert_new(id.clone(), record);
        self.save(&id)?;
        Ok(id)
    }

    fn link_account(
        &mut self,
        id: &ParticipantId,
        account: &str,
        name: &str,
    ) -> anyhow::Result<()> {
        let stored = self
            .records
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("participant {}", id)))?;
        if stored
            .record
            .accounts
            .get(account)
            .is_some_and(|entry| entry.name == name)
        {
            return Ok(());
        }
        stored.record.link_account(account, name);
        self.save(id)?;
        Ok(())
    }
}

fn load_records(root: &Path) -> Result<BTreeMap<ParticipantId, StoredRecord>> {
    let mut records: BTreeMap<ParticipantId, StoredRecord> = BTreeMap::new();

    for section in Section::ALL {
        let dir = root.join(section.dir_name());
        if !dir.is_dir() {
            continue;
        }

        let mut paths = fs::read_dir(&dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        paths.sort();

        for path in paths {
            if path.extension().and_then(|e| e.to_str()) != Some("json") || !path.is_file() {
                continue;
            }
            let record = read_record(&path)?;
            let id = record.participant_id();
            if let Some(previous) = records.get(&id) {
                tracing::warn!(
                    participant = %id,
                    kept = %previous.path.display(),
                    skipped = %path.display(),
                    "Duplicate participant record"
                );
                continue;
            }
            records.insert(
                id,
                StoredRecord {
                    record,
                    path,
                    section,
                },
            );
        }
    }

    Ok(records)
}

fn read_record(path: &Path) -> Result<ParticipantRecord> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_record(path: &Path, record: &ParticipantRecord) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut json = serde_json::to_string_pretty(record).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;
    json.push('\n');
    fs::write(path, json)?;
    Ok(())
}
