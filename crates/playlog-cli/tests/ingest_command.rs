use playlog_testing::assertions::{assert_file_count, assert_stat, read_record};
use playlog_testing::{ServerLog, TestWorld};
use playlog_types::stats;
use std::fs;

const STEVE_ACCOUNT: &str = "069a79f4-44e9-4726-a5be-fca90e38aaf5";

fn world_with_logs() -> TestWorld {
    let world = TestWorld::new();
    world
        .write_log(
            "2024-03-01-1.log.gz",
            &ServerLog::new()
                .account("20:59:59", "Steve", STEVE_ACCOUNT)
                .join("21:00:00", "Steve")
                .chat("21:05:00", "Steve", "www")
                .death("21:10:00", "Steve", "was slain by Zombie")
                .leave("22:00:00", "Steve"),
        )
        .expect("Failed to write log");
    world
        .write_log(
            "2024-03-02-1.log",
            &ServerLog::new()
                .join("09:00:00", "Alex")
                .line("09:15:00", "photoshoot is starting")
                .leave("09:30:00", "Alex"),
        )
        .expect("Failed to write log");
    world
}

#[test]
fn test_ingest_updates_records_and_moves_logs() {
    let world = world_with_logs();
    let paths = world.paths();

    let result = world.run(&["ingest", "--reason", "nightly"]).unwrap();
    assert!(result.success(), "ingest failed: {}", result.stderr());
    assert!(result.stdout().contains("Ingest complete."));

    assert_stat(&paths.store, "Steve", stats::JOINS, 1).unwrap();
    assert_stat(&paths.store, "Steve", stats::DEATHS, 1).unwrap();
    assert_stat(&paths.store, "Steve", stats::LAUGH_COUNT, 3).unwrap();
    assert_stat(&paths.store, "Steve", stats::PLAYTIME_SECONDS, 3600).unwrap();
    assert_stat(&paths.store, "Alex", stats::PHOTOSHOOT_COUNT, 1).unwrap();

    let steve = read_record(&paths.store, "active", "Steve").unwrap();
    assert!(steve.accounts.contains_key(STEVE_ACCOUNT));

    assert_file_count(&paths.logs, 0).unwrap();
    assert_file_count(&paths.processed, 2).unwrap();
    assert_file_count(&paths.backups, 1).unwrap();
    assert_file_count(&paths.reports, 1).unwrap();
}

#[test]
fn test_second_ingest_is_a_no_op() {
    let world = world_with_logs();
    let paths = world.paths();

    assert!(world.run(&["ingest"]).unwrap().success());
    let before = fs::read_to_string(paths.store.join("active/Steve.json")).unwrap();

    let result = world.run(&["ingest"]).unwrap();
    assert!(result.success());
    assert!(result.stdout().contains("No new log files to ingest."));
    assert_eq!(
        fs::read_to_string(paths.store.join("active/Steve.json")).unwrap(),
        before
    );
    assert_file_count(&paths.backups, 1).unwrap();
}

#[test]
fn test_dry_run_leaves_everything_in_place() {
    let world = world_with_logs();
    let paths = world.paths();

    let result = world.run(&["ingest", "--dry-run"]).unwrap();
    assert!(result.success(), "dry run failed: {}", result.stderr());
    assert!(result.stdout().contains("Dry run complete."));
    assert!(result.stdout().contains("2 participant(s) would change"));

    assert_file_count(&paths.store.join("active"), 0).unwrap();
    assert_file_count(&paths.logs, 2).unwrap();
    assert_file_count(&paths.backups, 0).unwrap();

    let report = fs::read_dir(&paths.reports)
        .unwrap()
        .next()
        .unwrap()
        .unwrap()
        .path();
    let report = fs::read_to_string(report).unwrap();
    assert!(report.contains("would change:"));
    assert!(report.contains("Steve: joins +1, deaths +1, playtime +1h00m00s"));
}

#[test]
fn test_date_range_selects_files() {
    let world = world_with_logs();
    let paths = world.paths();

    let result = world
        .run(&["ingest", "--from", "2024-03-02", "--to", "2024-03-02"])
        .unwrap();
    assert!(result.success());

    assert!(paths.logs.join("2024-03-01-1.log.gz").exists());
    assert!(!paths.store.join("active/Steve.json").exists());
    assert_stat(&paths.store, "Alex", stats::JOINS, 1).unwrap();
}

#[test]
fn test_malformed_date_fails_without_touching_files() {
    let world = world_with_logs();
    let paths = world.paths();

    let result = world.run(&["ingest", "--from", "March 1st"]).unwrap();
    assert!(!result.success());
    assert!(result.stderr().contains("Ingestion failed"));
    assert!(result.stderr().contains("Invalid date filter"));

    assert_file_count(&paths.logs, 2).unwrap();
    assert_file_count(&paths.backups, 0).unwrap();
}

#[test]
fn test_missing_log_directory_fails() {
    let world = TestWorld::new();
    fs::remove_dir_all(world.paths().logs).unwrap();

    let result = world.run(&["ingest"]).unwrap();
    assert!(!result.success());
    assert!(result.stderr().contains("Ingestion failed"));
    assert_file_count(&world.paths().backups, 0).unwrap();
}
