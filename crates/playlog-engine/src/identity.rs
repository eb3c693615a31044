use anyhow::Result;
use playlog_types::{ParticipantDirectory, ParticipantId};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Per-run name -> participant binding.
///
/// Bindings are created lazily on the first identity disclosure or the
/// first name-based event and then stay fixed for the rest of the run, so
/// resolving the same name twice always yields the same participant. A new
/// resolver is built for every run; nothing leaks between runs.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    names: HashMap<String, ParticipantId>,
    accounts: HashMap<String, String>,
    ignored: HashSet<String>,
}

impl IdentityResolver {
    pub fn new<I, S>(ignored: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: HashMap::new(),
            accounts: HashMap::new(),
            ignored: ignored
                .into_iter()
                .map(|name| name.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored.contains(&name.to_lowercase())
    }

    /// Account key disclosed for `name` earlier in this run.
    pub fn account_for(&self, name: &str) -> Option<&str> {
        self.accounts.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Account key used for presence tracking: the disclosed account, or a
    /// synthetic per-name key when the log never disclosed one.
    pub fn presence_key(&self, name: &str) -> String {
        match self.account_for(name) {
            Some(account) => account.to_string(),
            None => format!("offline:{}", name.to_lowercase()),
        }
    }

    /// Map `name` to a participant, creating and persisting a record on
    /// first sighting. Returns `None` for ignored names.
    pub fn resolve<D>(&mut self, directory: &mut D, name: &str) -> Result<Option<ParticipantId>>
    where
        D: ParticipantDirectory + ?Sized,
    {
        if self.is_ignored(name) {
            return Ok(None);
        }

        let key = name.to_lowercase();
        if let Some(id) = self.names.get(&key) {
            return Ok(Some(id.clone()));
        }

        let id = match directory.find_by_name(name) {
            Some(id) => id,
            None => {
                let id = directory.create(name)?;
                tracing::debug!(player = %name, participant = %id, "Created participant");
                id
            }
        };
        self.names.insert(key, id.clone());
        Ok(Some(id))
    }

    /// Bind `name` to `account` and union the account into the owning
    /// participant. Repeating a disclosure is a no-op.
    ///
    /// An account already owned by a record decides the participant unless
    /// the name was bound earlier in the run; in that case the earlier
    /// binding wins and ownership is left untouched.
    pub fn resolve_with_account<D>(
        &mut self,
        directory: &mut D,
        name: &str,
        account: &Uuid,
    ) -> Result<Option<ParticipantId>>
    where
        D: ParticipantDirectory + ?Sized,
    {
        if self.is_ignored(name) {
            return Ok(None);
        }

        let key = name.to_lowercase();
        let account_key = account.hyphenated().to_string();

        let owner = directory.find_by_account(&account_key);
        let id = match (self.names.get(&key).cloned(), owner.clone()) {
            (Some(bound), Some(owner)) if bound != owner => {
                tracing::warn!(
                    player = %name,
                    account = %account_key,
                    bound = %bound,
                    owner = %owner,
                    "Account already belongs to another participant; keeping run binding"
                );
                return Ok(Some(bound));
            }
            (Some(bound), _) => bound,
            (None, Some(owner)) => {
                self.names.insert(key.clone(), owner.clone());
                owner
            }
            (None, None) => match self.resolve(directory, name)? {
                Some(id) => id,
                None => return Ok(None),
            },
        };

        self.accounts.insert(key, account_key.clone());
        directory.link_account(&id, &account_key, name)?;
        Ok(Some(id))
    }
}
