use chrono::{NaiveDate, NaiveTime};
use playlog_types::LogLine;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::discovery::LogFile;
use crate::io::{open_log, parse_raw_line};
use crate::{Error, Result};

/// One file's worth of lines, read lazily.
///
/// The reader is dropped (and the file closed) as soon as it reports end of
/// input; dropping the source closes it on every other path.
pub struct LineSource {
    path: PathBuf,
    day: NaiveDate,
    last_time: Option<NaiveTime>,
    reader: Option<Box<dyn BufRead + Send>>,
    buf: Vec<u8>,
}

impl LineSource {
    pub fn new(path: impl Into<PathBuf>, day: NaiveDate, reader: Box<dyn BufRead + Send>) -> Self {
        Self {
            path: path.into(),
            day,
            last_time: None,
            reader: Some(reader),
            buf: Vec::new(),
        }
    }

    pub fn open(file: &LogFile) -> Result<Self> {
        Ok(Self::new(&file.path, file.day, open_log(&file.path)?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    fn read_next(&mut self) -> Result<Option<LogLine>> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        self.buf.clear();
        let read = reader
            .read_until(b'\n', &mut self.buf)
            .map_err(|source| Error::Read {
                path: self.path.clone(),
                source,
            })?;
        if read == 0 {
            self.reader = None;
            return Ok(None);
        }

        let text = String::from_utf8_lossy(&self.buf);
        let raw = text.trim_end_matches(['\n', '\r']);
        let (time, content) = parse_raw_line(raw);

        let Some(time) = time else {
            return Ok(Some(LogLine::continuation(content)));
        };

        // Clock went backwards inside one file: the server ran past midnight.
        if let Some(last) = self.last_time
            && time < last
            && let Some(next_day) = self.day.succ_opt()
        {
            self.day = next_day;
        }
        self.last_time = Some(time);

        Ok(Some(LogLine::stamped(self.day.and_time(time), content)))
    }
}

/// K-way chronological merge of several line sources.
///
/// Each source buffers one head line. The earliest stamped head wins, ties
/// going to the source listed first. Continuation lines are folded into the
/// stamped line that precedes them in the same source, so they never
/// interleave with other sources. A source that starts with continuations
/// emits them as they are, ahead of any stamped line; holding them until no
/// stamped head remains would also hold back that source's stamped lines.
pub struct SessionLineStream {
    sources: Vec<LineSource>,
    heads: Vec<Option<LogLine>>,
    primed: bool,
}

impl SessionLineStream {
    pub fn new(sources: Vec<LineSource>) -> Self {
        let heads = vec![None; sources.len()];
        Self {
            sources,
            heads,
            primed: false,
        }
    }

    /// Open every file in order. Files opened before a failure are closed
    /// when the partially built list is dropped.
    pub fn open(files: &[LogFile]) -> Result<Self> {
        let sources = files
            .iter()
            .map(LineSource::open)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(sources))
    }

    /// Number of sources whose reader has not reached end of input yet.
    pub fn open_sources(&self) -> usize {
        self.sources.iter().filter(|s| s.is_open()).count()
    }

    fn prime(&mut self) -> Result<()> {
        for (head, source) in self.heads.iter_mut().zip(self.sources.iter_mut()) {
            *head = source.read_next()?;
        }
        self.primed = true;
        Ok(())
    }

    fn pick(&self) -> Option<usize> {
        let leading = self
            .heads
            .iter()
            .position(|head| head.as_ref().is_some_and(|line| line.timestamp.is_none()));
        if leading.is_some() {
            return leading;
        }

        self.heads
            .iter()
            .enumerate()
            .filter_map(|(i, head)| head.as_ref().and_then(|l| l.timestamp).map(|ts| (ts, i)))
            .min()
            .map(|(_, i)| i)
    }

    fn next_line(&mut self) -> Result<Option<LogLine>> {
        if !self.primed {
            self.prime()?;
        }

        let Some(i) = self.pick() else {
            return Ok(None);
        };
        let Some(mut line) = self.heads[i].take() else {
            return Ok(None);
        };

        if line.is_continuation {
            self.heads[i] = self.sources[i].read_next()?;
            return Ok(Some(line));
        }

        loop {
            match self.sources[i].read_next()? {
                Some(next) if next.is_continuation => line.absorb(&next),
                other => {
                    self.heads[i] = other;
                    break;
                }
            }
        }
        Ok(Some(line))
    }
}

impl Iterator for SessionLineStream {
    type Item = Result<LogLine>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}
