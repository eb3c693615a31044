use playlog_types::Event;
use regex::Regex;
use std::sync::LazyLock;
use uuid::Uuid;

use crate::patterns::{PatternKind, PatternSet};

/// Player name as it appears in the log. Bedrock players joining through
/// the gateway carry a one-character prefix.
const NAME: &str = r"[.*]?[A-Za-z0-9_]{1,16}";

/// Vanilla death messages that follow the victim's name directly.
const DEATH_CAUSES: &[&str] = &[
    "was slain by",
    "was shot by",
    "was killed by",
    "was blown up by",
    "was fireballed by",
    "was pummeled by",
    "was impaled by",
    "was squashed by",
    "was squished too much",
    "was pricked to death",
    "was poked to death",
    "was stung to death",
    "was struck by lightning",
    "was frozen to death by",
    "was skewered by",
    "was obliterated by",
    "was roasted in dragon's breath",
    "was doomed to fall",
    "was burnt to a crisp",
    "was killed",
    "drowned",
    "died",
    "blew up",
    "burned to death",
    "went up in flames",
    "walked into fire",
    "walked into a cactus",
    "tried to swim in lava",
    "discovered the floor was lava",
    "hit the ground too hard",
    "fell from a high place",
    "fell off",
    "fell out of the world",
    "fell into",
    "fell while",
    "left the confines of this world",
    "starved to death",
    "suffocated in a wall",
    "experienced kinetic energy",
    "froze to death",
    "withered away",
    "didn't want to live",
];

/// Mobs and tamed animals whose deaths are also logged by the server.
const NON_PLAYER_NAMES: &[&str] = &[
    "Villager",
    "Allay",
    "Axolotl",
    "Cat",
    "Donkey",
    "Fox",
    "Horse",
    "Llama",
    "Mule",
    "Parrot",
    "Wolf",
    "Iron_Golem",
    "Snow_Golem",
    "Sniffer",
    "Camel",
];

/// `[Server thread/INFO]: ` and `[thread/INFO] [logger/]: ` prefixes
static LOGGER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\[[^\]]*\]\s*)+:\s?").expect("valid prefix regex"));

static IDENTITY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^UUID of player (?P<name>{NAME}) is (?P<account>\S+)$"))
        .expect("valid identity regex")
});

static GATEWAY_LOGIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?:\[floodgate\] )?Floodgate player logged in as (?P<name>{NAME}) joined \(UUID: (?P<account>[^)]+)\)$"
    ))
    .expect("valid gateway regex")
});

static JOIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?P<name>{NAME})(?: \(formerly known as \S+\))? joined the game$"
    ))
    .expect("valid join regex")
});

static LEAVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?P<name>{NAME}) left the game$")).expect("valid leave regex")
});

static CHAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?s)^(?:\[Not Secure\] )?<(?P<name>{NAME})> (?P<message>.*)$"
    ))
    .expect("valid chat regex")
});

static DEATH: LazyLock<Regex> = LazyLock::new(|| {
    let causes = DEATH_CAUSES
        .iter()
        .map(|cause| regex::escape(cause))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?s)^(?P<name>{NAME}) (?:{causes})(?:\s|$)"))
        .expect("valid death regex")
});

/// Tunables for the classifier that come from configuration.
#[derive(Debug)]
pub struct ClassifierOptions {
    pub photoshoot_phrase: String,
    pub death_patterns: PatternSet,
    pub chat_patterns: PatternSet,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            photoshoot_phrase: "photoshoot is starting".to_string(),
            death_patterns: PatternSet::empty(PatternKind::Death),
            chat_patterns: PatternSet::empty(PatternKind::Chat),
        }
    }
}

/// Ordered, first-match-wins mapping from line content to `Event`.
///
/// Identity disclosures are checked before joins so the account is known
/// by the time the join is counted. Operator patterns extend the chat and
/// death categories after the built-in ones and never shadow them.
#[derive(Debug, Default)]
pub struct EventClassifier {
    options: ClassifierOptions,
}

impl EventClassifier {
    pub fn new(options: ClassifierOptions) -> Self {
        Self { options }
    }

    pub fn classify(&self, content: &str) -> Event {
        let body = strip_logger_prefix(content);

        if let Some(event) = classify_identity(body) {
            return event;
        }

        if let Some(caps) = JOIN.captures(body) {
            return Event::Join {
                name: caps["name"].to_string(),
            };
        }

        if let Some(caps) = LEAVE.captures(body) {
            return Event::Leave {
                name: caps["name"].to_string(),
            };
        }

        if self.is_photoshoot_trigger(body) {
            return Event::PhotoshootTrigger;
        }

        if let Some(event) = self.classify_chat(body) {
            return event;
        }

        if let Some(event) = self.classify_death(body) {
            return event;
        }

        Event::Unknown
    }

    fn is_photoshoot_trigger(&self, body: &str) -> bool {
        let phrase = self.options.photoshoot_phrase.trim();
        if phrase.is_empty() {
            return false;
        }
        let announced = body
            .trim()
            .strip_prefix("[Server] ")
            .or_else(|| body.trim().strip_prefix("[Rcon] "))
            .unwrap_or(body.trim());
        announced.trim().eq_ignore_ascii_case(phrase)
    }

    fn classify_chat(&self, body: &str) -> Option<Event> {
        if let Some(caps) = CHAT.captures(body) {
            return Some(Event::Chat {
                name: caps["name"].to_string(),
                message: caps["message"].to_string(),
            });
        }

        self.options.chat_patterns.compiled().find_map(|regex| {
            let caps = regex.captures(body)?;
            Some(Event::Chat {
                name: caps.name("name")?.as_str().to_string(),
                message: caps
                    .name("message")
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
            })
        })
    }

    fn classify_death(&self, body: &str) -> Option<Event> {
        if let Some(caps) = DEATH.captures(body) {
            let name = &caps["name"];
            if is_player_death(name, body) {
                return Some(Event::Death {
                    name: name.to_string(),
                });
            }
        }

        self.options.death_patterns.compiled().find_map(|regex| {
            let caps = regex.captures(body)?;
            Some(Event::Death {
                name: caps.name("name")?.as_str().to_string(),
            })
        })
    }
}

fn strip_logger_prefix(content: &str) -> &str {
    match LOGGER_PREFIX.find(content) {
        Some(prefix) => &content[prefix.end()..],
        None => content,
    }
}

fn classify_identity(body: &str) -> Option<Event> {
    let caps = IDENTITY_LINE
        .captures(body)
        .or_else(|| GATEWAY_LOGIN.captures(body))?;
    let name = &caps["name"];
    let raw_account = &caps["account"];

    match Uuid::parse_str(raw_account) {
        Ok(account) => Some(Event::IdentityMap {
            name: name.to_string(),
            account,
        }),
        Err(err) => {
            tracing::warn!(
                player = %name,
                account = %raw_account,
                "Skipping identity binding with malformed account id: {}",
                err
            );
            Some(Event::Unknown)
        }
    }
}

/// Reject deaths of named mobs and entity dumps that share the vanilla
/// death wording.
fn is_player_death(name: &str, body: &str) -> bool {
    if NON_PLAYER_NAMES
        .iter()
        .any(|entity| entity.eq_ignore_ascii_case(name))
    {
        return false;
    }
    !(body.contains("['") || body.contains("Named entity"))
}
