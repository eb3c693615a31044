use anyhow::Result;
use chrono::NaiveDateTime;
use playlog_parser::count_laughs;
use playlog_types::{
    Event, ParticipantDirectory, ParticipantId, ParticipantRecord, SessionDelta, stats,
};
use std::collections::{BTreeMap, HashMap};

use crate::identity::IdentityResolver;

/// Everything one session produced, ready to merge or discard as a unit.
#[derive(Debug, Default)]
pub struct SessionOutcome {
    pub deltas: BTreeMap<ParticipantId, SessionDelta>,
    /// Count of applied events per kind.
    pub events: BTreeMap<&'static str, usize>,
    pub first_seen: Option<NaiveDateTime>,
    pub last_seen: Option<NaiveDateTime>,
    /// Accounts still online at the end, closed with a synthetic leave.
    pub forced_leaves: usize,
}

impl SessionOutcome {
    /// Deltas that would change their record when merged.
    pub fn changed(&self) -> impl Iterator<Item = &SessionDelta> {
        self.deltas.values().filter(|delta| !delta.is_empty())
    }
}

struct OpenLogin {
    participant: ParticipantId,
    name: String,
    since: NaiveDateTime,
}

/// Event state machine for one session.
///
/// Holds the per-session login clock and the lazily opened deltas. Identity
/// lookups go through the run's [`IdentityResolver`], which may create
/// records in the directory; statistics never touch the directory until the
/// caller merges the finished outcome.
pub struct SessionProcessor<'a, D: ParticipantDirectory + ?Sized> {
    directory: &'a mut D,
    resolver: &'a mut IdentityResolver,
    logins: HashMap<String, OpenLogin>,
    deltas: BTreeMap<ParticipantId, SessionDelta>,
    events: BTreeMap<&'static str, usize>,
    first_seen: Option<NaiveDateTime>,
    last_seen: Option<NaiveDateTime>,
}

impl<'a, D: ParticipantDirectory + ?Sized> SessionProcessor<'a, D> {
    pub fn new(directory: &'a mut D, resolver: &'a mut IdentityResolver) -> Self {
        Self {
            directory,
            resolver,
            logins: HashMap::new(),
            deltas: BTreeMap::new(),
            events: BTreeMap::new(),
            first_seen: None,
            last_seen: None,
        }
    }

    /// Apply one classified event. Events without a timestamp are skipped.
    pub fn apply(&mut self, at: Option<NaiveDateTime>, event: Event) -> Result<()> {
        let Some(now) = at else {
            return Ok(());
        };
        self.first_seen.get_or_insert(now);
        self.last_seen = Some(self.last_seen.map_or(now, |last| last.max(now)));

        if matches!(event, Event::Unknown) {
            return Ok(());
        }
        *self.events.entry(event.kind()).or_insert(0) += 1;

        match event {
            Event::IdentityMap { name, account } => {
                self.resolver
                    .resolve_with_account(&mut *self.directory, &name, &account)?;
            }
            Event::Join { name } => self.join(now, &name)?,
            Event::Leave { name } => self.leave(now, &name),
            Event::Death { name } => {
                if let Some(delta) = self.delta_for(&name)? {
                    delta.add(stats::DEATHS, 1);
                }
            }
            Event::Chat { name, message } => {
                if let Some(delta) = self.delta_for(&name)? {
                    delta.add(stats::CHAT_COUNT, 1);
                    delta.add(stats::LAUGH_COUNT, i64::from(count_laughs(&message)));
                }
            }
            Event::PhotoshootTrigger => {
                for delta in self.deltas.values_mut().filter(|d| d.any_online()) {
                    delta.add(stats::PHOTOSHOOT_COUNT, 1);
                    delta.photoshoot_history.push(now);
                }
            }
            Event::Unknown => {}
        }
        Ok(())
    }

    fn join(&mut self, now: NaiveDateTime, name: &str) -> Result<()> {
        let Some(id) = self.resolver.resolve(&mut *self.directory, name)? else {
            return Ok(());
        };
        let account = self.resolver.presence_key(name);
        if let Some(previous) = self.logins.remove(&account) {
            tracing::debug!(player = %name, "Join while already online; closing previous login");
            self.close(&account, previous, now);
        }
        let delta = self.open_delta(&id);

        if !delta.any_online() {
            delta.add(stats::JOINS, 1);
            delta.join_history.push(now);
        }
        delta.set_online(&account, name, true);

        self.logins.insert(
            account,
            OpenLogin {
                participant: id,
                name: name.to_string(),
                since: now,
            },
        );
        Ok(())
    }

    fn leave(&mut self, now: NaiveDateTime, name: &str) {
        let account = self.resolver.presence_key(name);
        let Some(login) = self.logins.remove(&account) else {
            tracing::debug!(player = %name, "Leave without a recorded join; ignoring");
            return;
        };
        self.close(&account, login, now);
    }

    fn close(&mut self, account: &str, login: OpenLogin, now: NaiveDateTime) {
        let elapsed = (now - login.since).num_seconds().max(0);
        let delta = self.open_delta(&login.participant);

        delta.add(stats::PLAYTIME_SECONDS, elapsed);
        delta.record_playtime(now.date(), elapsed);
        delta.set_online(account, &login.name, false);
        if !delta.any_online() {
            delta.last_quit = Some(now);
        }
    }

    fn delta_for(&mut self, name: &str) -> Result<Option<&mut SessionDelta>> {
        let Some(id) = self.resolver.resolve(&mut *self.directory, name)? else {
            return Ok(None);
        };
        Ok(Some(self.open_delta(&id)))
    }

    fn open_delta(&mut self, id: &ParticipantId) -> &mut SessionDelta {
        let directory = &*self.directory;
        self.deltas.entry(id.clone()).or_insert_with(|| match directory.get(id) {
            Some(record) => SessionDelta::from_record(record),
            None => SessionDelta::from_record(&ParticipantRecord::new(id.as_str())),
        })
    }

    /// Close every login still open at the last seen timestamp and hand
    /// back the session's deltas.
    pub fn finish(mut self) -> SessionOutcome {
        let mut forced_leaves = 0;
        if let Some(now) = self.last_seen {
            let mut open: Vec<(String, OpenLogin)> = self.logins.drain().collect();
            open.sort_by(|a, b| (&a.1.participant, &a.0).cmp(&(&b.1.participant, &b.0)));
            for (account, login) in open {
                tracing::debug!(player = %login.name, "Closing login still open at end of session");
                self.close(&account, login, now);
                forced_leaves += 1;
            }
        }

        SessionOutcome {
            deltas: self.deltas,
            events: self.events,
            first_seen: self.first_seen,
            last_seen: self.last_seen,
            forced_leaves,
        }
    }
}
