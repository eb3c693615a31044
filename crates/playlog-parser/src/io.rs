use chrono::NaiveTime;
use flate2::read::MultiGzDecoder;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use crate::{Error, Result};

/// `[HH:MM:SS] content`
static STAMPED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(\d{2}):(\d{2}):(\d{2})\] ?(.*)$").expect("valid stamped-line regex")
});

/// Open a log file for line reading, decompressing `.gz` files on the fly.
pub fn open_log(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file = File::open(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;

    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Split a raw line into its time of day and content.
///
/// Lines without a well-formed `[HH:MM:SS]` prefix are continuations and
/// are returned whole with no time.
pub fn parse_raw_line(raw: &str) -> (Option<NaiveTime>, &str) {
    let Some(caps) = STAMPED_LINE.captures(raw) else {
        return (None, raw);
    };

    let time = (|| {
        let h = caps[1].parse().ok()?;
        let m = caps[2].parse().ok()?;
        let s = caps[3].parse().ok()?;
        NaiveTime::from_hms_opt(h, m, s)
    })();

    match time {
        Some(time) => (Some(time), caps.get(4).map_or("", |m| m.as_str())),
        None => (None, raw),
    }
}
