use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

use crate::participant::{
    AccountEntry, ParticipantId, ParticipantRecord, PlaytimeEntry, push_playtime,
};
use crate::stats;

/// Not-yet-merged statistic changes for one participant in one session.
///
/// Opened from the persisted record the first time the participant is
/// touched: identity fields are copied, every account starts offline and
/// every counter starts at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDelta {
    pub participant_id: ParticipantId,
    pub base_name: String,
    pub linked_name: Option<String>,
    pub disambiguator: Option<u32>,
    pub accounts: BTreeMap<String, AccountEntry>,
    pub statistics: BTreeMap<String, i64>,
    pub join_history: Vec<NaiveDateTime>,
    pub photoshoot_history: Vec<NaiveDateTime>,
    pub playtime_history: Vec<PlaytimeEntry>,
    pub last_quit: Option<NaiveDateTime>,
}

impl SessionDelta {
    pub fn from_record(record: &ParticipantRecord) -> Self {
        let accounts = record
            .accounts
            .iter()
            .map(|(key, entry)| {
                (
                    key.clone(),
                    AccountEntry {
                        name: entry.name.clone(),
                        online: false,
                    },
                )
            })
            .collect();

        let statistics = stats::ALL
            .iter()
            .map(|key| key.to_string())
            .chain(record.statistics.keys().cloned())
            .map(|key| (key, 0))
            .collect();

        Self {
            participant_id: record.participant_id(),
            base_name: record.base_name.clone(),
            linked_name: record.linked_name.clone(),
            disambiguator: record.disambiguator,
            accounts,
            statistics,
            join_history: Vec::new(),
            photoshoot_history: Vec::new(),
            playtime_history: Vec::new(),
            last_quit: None,
        }
    }

    pub fn stat(&self, key: &str) -> i64 {
        self.statistics.get(key).copied().unwrap_or(0)
    }

    pub fn add(&mut self, key: &str, amount: i64) {
        *self.statistics.entry(key.to_string()).or_insert(0) += amount;
    }

    pub fn any_online(&self) -> bool {
        self.accounts.values().any(|entry| entry.online)
    }

    pub fn online_accounts(&self) -> impl Iterator<Item = &str> {
        self.accounts
            .iter()
            .filter(|(_, entry)| entry.online)
            .map(|(key, _)| key.as_str())
    }

    pub fn set_online(&mut self, account: &str, name: &str, online: bool) {
        let entry = self
            .accounts
            .entry(account.to_string())
            .or_insert_with(|| AccountEntry {
                name: name.to_string(),
                online,
            });
        entry.online = online;
    }

    pub fn record_playtime(&mut self, date: NaiveDate, seconds: i64) {
        push_playtime(&mut self.playtime_history, date, seconds);
    }

    /// True when merging this delta would change nothing.
    pub fn is_empty(&self) -> bool {
        self.statistics.values().all(|value| *value == 0)
            && self.join_history.is_empty()
            && self.photoshoot_history.is_empty()
            && self.playtime_history.is_empty()
            && self.last_quit.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_record_resets_counters_and_presence() {
        let mut record = ParticipantRecord::new("Steve");
        record.link_account("acc-1", "Steve");
        record.accounts.get_mut("acc-1").unwrap().online = true;
        record.statistics.insert(stats::DEATHS.to_string(), 9);
        record.statistics.insert("custom".to_string(), 4);

        let delta = SessionDelta::from_record(&record);

        assert!(!delta.any_online());
        assert_eq!(delta.stat(stats::DEATHS), 0);
        assert_eq!(delta.stat("custom"), 0);
        assert!(delta.statistics.contains_key(stats::LAUGH_COUNT));
        assert!(delta.is_empty());
        assert_eq!(delta.participant_id, record.participant_id());
    }

    #[test]
    fn test_online_tracking() {
        let record = ParticipantRecord::new("Steve");
        let mut delta = SessionDelta::from_record(&record);

        delta.set_online("acc-1", "Steve", true);
        delta.set_online("acc-2", "Steve_", true);
        delta.set_online("acc-1", "Steve", false);

        assert!(delta.any_online());
        assert_eq!(delta.online_accounts().collect::<Vec<_>>(), vec!["acc-2"]);
    }
}
