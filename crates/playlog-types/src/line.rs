use chrono::NaiveDateTime;

/// One logical log entry after timestamp parsing.
///
/// Continuation lines carry no timestamp of their own. Once a
/// `SessionLineStream` has attached them to their owner they no longer
/// appear as separate entries, except when a file starts with them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub timestamp: Option<NaiveDateTime>,
    pub content: String,
    pub is_continuation: bool,
}

impl LogLine {
    pub fn stamped(timestamp: NaiveDateTime, content: impl Into<String>) -> Self {
        Self {
            timestamp: Some(timestamp),
            content: content.into(),
            is_continuation: false,
        }
    }

    pub fn continuation(content: impl Into<String>) -> Self {
        Self {
            timestamp: None,
            content: content.into(),
            is_continuation: true,
        }
    }

    /// Append a continuation's content on a new line.
    pub fn absorb(&mut self, continuation: &LogLine) {
        self.content.push('\n');
        self.content.push_str(&continuation.content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_absorb_joins_with_newline() {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let mut line = LogLine::stamped(ts, "Exception in thread");
        line.absorb(&LogLine::continuation("\tat Foo.bar"));

        assert_eq!(line.content, "Exception in thread\n\tat Foo.bar");
        assert_eq!(line.timestamp, Some(ts));
        assert!(!line.is_continuation);
    }
}
