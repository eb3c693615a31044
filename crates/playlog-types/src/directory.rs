use anyhow::Result;
use std::collections::BTreeMap;

use crate::participant::{ParticipantId, ParticipantRecord};

/// Lookup and creation of persisted participant identities.
///
/// Responsibilities:
/// - Find a record by any name it answers to, or by an owned account
/// - Create a record for a never-seen name
/// - Keep every account owned by exactly one record
pub trait ParticipantDirectory {
    fn get(&self, id: &ParticipantId) -> Option<&ParticipantRecord>;

    fn find_by_account(&self, account: &str) -> Option<ParticipantId>;

    fn find_by_name(&self, name: &str) -> Option<ParticipantId>;

    /// Create and persist a record keyed by `base_name`. Returns the
    /// existing id when a record with the same base name already exists;
    /// see [`allocate`] for names that only collide after sanitizing.
    fn create(&mut self, base_name: &str) -> Result<ParticipantId>;

    /// Union `account` into the record's account set and persist it.
    fn link_account(&mut self, id: &ParticipantId, account: &str, name: &str) -> Result<()>;
}

/// Where a newly sighted `base_name` lives.
#[derive(Debug, Clone, PartialEq)]
pub enum Allocation {
    /// A record with this base name (ignoring case) already holds the id.
    Existing(ParticipantId),
    /// A fresh record whose id is free, numbered when the plain derived id
    /// belongs to a different participant (`Steve` vs `*Steve`).
    New(ParticipantRecord),
}

/// Pick the id for `base_name` given a lookup over existing records.
pub fn allocate<'a, F>(base_name: &str, lookup: F) -> Allocation
where
    F: Fn(&ParticipantId) -> Option<&'a ParticipantRecord>,
{
    let mut record = ParticipantRecord::new(base_name);
    let mut next = 2;
    loop {
        let id = record.participant_id();
        match lookup(&id) {
            None => return Allocation::New(record),
            Some(existing) if existing.base_name.eq_ignore_ascii_case(base_name) => {
                return Allocation::Existing(id);
            }
            Some(_) => {
                record.disambiguator = Some(next);
                next += 1;
            }
        }
    }
}

/// Directory held entirely in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryDirectory {
    records: BTreeMap<ParticipantId, ParticipantRecord>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: ParticipantRecord) -> ParticipantId {
        let id = record.participant_id();
        self.records.insert(id.clone(), record);
        id
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &ParticipantRecord> {
        self.records.values()
    }
}

impl ParticipantDirectory for MemoryDirectory {
    fn get(&self, id: &ParticipantId) -> Option<&ParticipantRecord> {
        self.records.get(id)
    }

    fn find_by_account(&self, account: &str) -> Option<ParticipantId> {
        self.records
            .iter()
            .find(|(_, record)| record.owns_account(account))
            .map(|(id, _)| id.clone())
    }

    fn find_by_name(&self, name: &str) -> Option<ParticipantId> {
        self.records
            .iter()
            .find(|(_, record)| record.answers_to(name))
            .map(|(id, _)| id.clone())
    }

    fn create(&mut self, base_name: &str) -> Result<ParticipantId> {
        let records = &self.records;
        match allocate(base_name, |id| records.get(id)) {
            Allocation::Existing(id) => Ok(id),
            Allocation::New(record) => Ok(self.insert(record)),
        }
    }

    fn link_account(&mut self, id: &ParticipantId, account: &str, name: &str) -> Result<()> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| anyhow::anyhow!("Unknown participant: {}", id))?;
        record.link_account(account, name);
        Ok(())
    }
}
