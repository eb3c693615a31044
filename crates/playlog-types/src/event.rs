use uuid::Uuid;

/// Domain event classified from the content of one log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Join { name: String },
    Leave { name: String },
    Death { name: String },
    Chat { name: String, message: String },
    PhotoshootTrigger,
    IdentityMap { name: String, account: Uuid },
    Unknown,
}

impl Event {
    /// Player name the event refers to, if any
    pub fn name(&self) -> Option<&str> {
        match self {
            Event::Join { name }
            | Event::Leave { name }
            | Event::Death { name }
            | Event::Chat { name, .. }
            | Event::IdentityMap { name, .. } => Some(name),
            Event::PhotoshootTrigger | Event::Unknown => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Event::Join { .. } => "join",
            Event::Leave { .. } => "leave",
            Event::Death { .. } => "death",
            Event::Chat { .. } => "chat",
            Event::PhotoshootTrigger => "photoshoot",
            Event::IdentityMap { .. } => "identity",
            Event::Unknown => "unknown",
        }
    }
}
