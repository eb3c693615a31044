//! Statistic keys stored in a participant's `statistics` map.

pub const DEATHS: &str = "deaths";
pub const JOINS: &str = "joins";
pub const PLAYTIME_SECONDS: &str = "playtime_seconds";
pub const PHOTOSHOOT_COUNT: &str = "photoshoot_count";
pub const CHAT_COUNT: &str = "chat_count";
pub const LAUGH_COUNT: &str = "laugh_count";

pub const ALL: [&str; 6] = [
    DEATHS,
    JOINS,
    PLAYTIME_SECONDS,
    PHOTOSHOOT_COUNT,
    CHAT_COUNT,
    LAUGH_COUNT,
];
