use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::delta::SessionDelta;

/// Characters that may not appear in a participant file name on any
/// supported filesystem.
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Stable, path-safe identifier of a participant.
///
/// Always re-derivable from the record's names, so a record keeps the same
/// id (and file name) across runs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn derive(base_name: &str, linked_name: Option<&str>) -> Self {
        let raw = match linked_name {
            Some(alias) if !alias.is_empty() => format!("{}_{}", alias, base_name),
            _ => base_name.to_string(),
        };
        Self(sanitize(&raw))
    }

    /// Id of the `n`th distinct participant whose names sanitize to the
    /// same id. Player names never contain `~`, so numbered ids cannot clash
    /// with derived ones.
    pub fn numbered(self, n: Option<u32>) -> Self {
        match n {
            Some(n) => Self(format!("{}~{}", self.0, n)),
            None => self,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip filesystem-illegal characters so the result is usable as a file stem.
pub fn sanitize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control() && !ILLEGAL_CHARS.contains(c))
        .collect();
    let trimmed = cleaned.trim().trim_end_matches('.').trim();
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountEntry {
    pub name: String,
    #[serde(default)]
    pub online: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaytimeEntry {
    pub date: NaiveDate,
    pub duration_seconds: i64,
}

/// Persistent identity of one human, possibly spanning several accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub base_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_name: Option<String>,
    /// Set when another participant already held the id these names derive to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disambiguator: Option<u32>,
    /// Keyed by hyphenated account UUID
    #[serde(default)]
    pub accounts: BTreeMap<String, AccountEntry>,
    #[serde(default)]
    pub statistics: BTreeMap<String, i64>,
    #[serde(default)]
    pub join_history: Vec<NaiveDateTime>,
    #[serde(default)]
    pub photoshoot_history: Vec<NaiveDateTime>,
    #[serde(default)]
    pub playtime_history: Vec<PlaytimeEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_quit: Option<NaiveDateTime>,
}

impl ParticipantRecord {
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            linked_name: None,
            disambiguator: None,
            accounts: BTreeMap::new(),
            statistics: BTreeMap::new(),
            join_history: Vec::new(),
            photoshoot_history: Vec::new(),
            playtime_history: Vec::new(),
            last_quit: None,
        }
    }

    pub fn participant_id(&self) -> ParticipantId {
        ParticipantId::derive(&self.base_name, self.linked_name.as_deref())
            .numbered(self.disambiguator)
    }

    pub fn stat(&self, key: &str) -> i64 {
        self.statistics.get(key).copied().unwrap_or(0)
    }

    pub fn owns_account(&self, account: &str) -> bool {
        self.accounts.contains_key(account)
    }

    /// True when `name` is the base name, the linked alias, or the last
    /// known name of any owned account. Comparison ignores ASCII case.
    pub fn answers_to(&self, name: &str) -> bool {
        self.base_name.eq_ignore_ascii_case(name)
            || self
                .linked_name
                .as_deref()
                .is_some_and(|alias| alias.eq_ignore_ascii_case(name))
            || self
                .accounts
                .values()
                .any(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    /// Union `account` into the account set. Re-linking an owned account
    /// only refreshes its last known name.
    pub fn link_account(&mut self, account: &str, name: &str) {
        self.accounts
            .entry(account.to_string())
            .and_modify(|entry| entry.name = name.to_string())
            .or_insert_with(|| AccountEntry {
                name: name.to_string(),
                online: false,
            });
    }

    /// Sum a session's deltas into this record.
    ///
    /// Counters are added, histories appended, and the last-quit stamp only
    /// moves forward. Identity fields are left alone: they were persisted by
    /// identity resolution when the delta was opened.
    pub fn absorb(&mut self, delta: &SessionDelta) {
        for (key, value) in &delta.statistics {
            if *value != 0 {
                *self.statistics.entry(key.clone()).or_insert(0) += value;
            }
        }
        self.join_history.extend(delta.join_history.iter().copied());
        self.photoshoot_history
            .extend(delta.photoshoot_history.iter().copied());
        for entry in &delta.playtime_history {
            push_playtime(&mut self.playtime_history, entry.date, entry.duration_seconds);
        }
        if let Some(quit) = delta.last_quit
            && self.last_quit.is_none_or(|current| current < quit)
        {
            self.last_quit = Some(quit);
        }
        for entry in self.accounts.values_mut() {
            entry.online = false;
        }
    }
}

/// Add playtime to a history, extending the last entry when it is for the
/// same calendar day.
pub fn push_playtime(history: &mut Vec<PlaytimeEntry>, date: NaiveDate, seconds: i64) {
    match history.last_mut() {
        Some(last) if last.date == date => last.duration_seconds += seconds,
        _ => history.push(PlaytimeEntry {
            date,
            duration_seconds: seconds,
        }),
    }
}
