use chrono::NaiveDate;
use playlog_engine::{IdentityResolver, SessionProcessor};
use playlog_parser::{EventClassifier, LineSource, SessionLineStream};
use playlog_types::{MemoryDirectory, ParticipantId, ParticipantRecord, stats};
use std::io::Cursor;

fn source(name: &str, text: &str) -> LineSource {
    let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    LineSource::new(name, day, Box::new(Cursor::new(text.as_bytes().to_vec())))
}

const MORNING: &str = "\
[09:00:00] [User Authenticator #1/INFO]: UUID of player Steve is 069a79f4-44e9-4726-a5be-fca90e38aaf5
[09:00:01] [Server thread/INFO]: Steve joined the game
[09:10:00] [Server thread/INFO]: <Steve> wwww nice
[09:15:00] [Server thread/INFO]: Steve was slain by Zombie
[09:20:00] [Server thread/INFO]: Steve left the game
";

const EVENING: &str = "\
[09:05:00] [Server thread/INFO]: Alex joined the game
[09:12:00] [Server thread/INFO]: [Server] photoshoot is starting
[09:30:00] [Server thread/INFO]: Saving chunks
";

#[test]
fn test_two_sources_produce_session_deltas() -> anyhow::Result<()> {
    let mut dir = MemoryDirectory::new();
    let mut resolver = IdentityResolver::default();
    let classifier = EventClassifier::default();

    let stream = SessionLineStream::new(vec![source("a", MORNING), source("b", EVENING)]);
    let mut processor = SessionProcessor::new(&mut dir, &mut resolver);
    for line in stream {
        let line = line?;
        processor.apply(line.timestamp, classifier.classify(&line.content))?;
    }
    let outcome = processor.finish();

    let steve = &outcome.deltas[&ParticipantId::derive("Steve", None)];
    assert_eq!(steve.stat(stats::JOINS), 1);
    assert_eq!(steve.stat(stats::DEATHS), 1);
    assert_eq!(steve.stat(stats::CHAT_COUNT), 1);
    assert_eq!(steve.stat(stats::LAUGH_COUNT), 4);
    assert_eq!(steve.stat(stats::PHOTOSHOOT_COUNT), 1);
    assert_eq!(steve.stat(stats::PLAYTIME_SECONDS), 20 * 60 - 1);

    // Alex never left; closed at the last line of the merged stream.
    let alex = &outcome.deltas[&ParticipantId::derive("Alex", None)];
    assert_eq!(alex.stat(stats::PLAYTIME_SECONDS), 25 * 60);
    assert_eq!(alex.stat(stats::PHOTOSHOOT_COUNT), 1);
    assert_eq!(outcome.forced_leaves, 1);

    assert_eq!(dir.len(), 2);
    assert!(
        dir.records()
            .any(|r| r.owns_account("069a79f4-44e9-4726-a5be-fca90e38aaf5"))
    );
    Ok(())
}

#[test]
fn test_merged_deltas_add_to_persisted_counters() -> anyhow::Result<()> {
    let mut dir = MemoryDirectory::new();
    let mut existing = ParticipantRecord::new("Steve");
    existing.statistics.insert(stats::DEATHS.to_string(), 10);
    dir.insert(existing.clone());

    let mut resolver = IdentityResolver::default();
    let classifier = EventClassifier::default();
    let mut processor = SessionProcessor::new(&mut dir, &mut resolver);
    for line in SessionLineStream::new(vec![source("a", MORNING)]) {
        let line = line?;
        processor.apply(line.timestamp, classifier.classify(&line.content))?;
    }
    let outcome = processor.finish();

    let delta = &outcome.deltas[&existing.participant_id()];
    existing.absorb(delta);
    assert_eq!(existing.stat(stats::DEATHS), 11);
    assert_eq!(existing.stat(stats::JOINS), 1);
    assert_eq!(existing.playtime_history.len(), 1);
    Ok(())
}
