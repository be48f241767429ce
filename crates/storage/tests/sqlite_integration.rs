use chrono::Duration;
use tracker_core::Deduplicator;
use tracker_core::model::{
    ActivityPayload, ActivityRecord, ActivityType, CompletionMarker, LastPosition, SectionId,
    UnitId, UserId,
};
use tracker_core::time::fixed_now;
use storage::repository::{
    ActivityRepository, AppendOutcome, CompletionRepository, PositionRepository,
};
use storage::sqlite::SqliteRepository;

async fn memory_repo(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn record(user: u64, unit: u64, section: &str, kind: ActivityType) -> ActivityRecord {
    ActivityRecord::new(
        UserId::new(user),
        UnitId::new(unit),
        SectionId::new(section).unwrap(),
        kind,
        ActivityPayload::empty(),
        fixed_now(),
    )
}

#[tokio::test]
async fn sqlite_dedups_inside_window_and_accepts_after() {
    let repo = memory_repo("memdb_dedup").await;
    let dedup = Some(Deduplicator::default());

    let first = record(1, 10, "tools_demo", ActivityType::VideoWatch);
    let outcome = repo.append_activity(&first, dedup).await.unwrap();
    assert!(matches!(outcome, AppendOutcome::Accepted { .. }));

    let mut soon = first.clone();
    soon.created_at = fixed_now() + Duration::minutes(4);
    assert_eq!(
        repo.append_activity(&soon, dedup).await.unwrap(),
        AppendOutcome::Duplicate
    );

    let mut later = first.clone();
    later.created_at = fixed_now() + Duration::minutes(5);
    assert!(matches!(
        repo.append_activity(&later, dedup).await.unwrap(),
        AppendOutcome::Accepted { .. }
    ));

    let stored = repo
        .activities(UserId::new(1), UnitId::new(10), None)
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored[0].created_at < stored[1].created_at);
}

#[tokio::test]
async fn sqlite_dedup_is_per_tuple() {
    let repo = memory_repo("memdb_tuple").await;
    let dedup = Some(Deduplicator::default());

    let watch = record(1, 10, "overview", ActivityType::VideoWatch);
    let scroll = record(1, 10, "overview", ActivityType::Scroll);
    let other_user = record(2, 10, "overview", ActivityType::VideoWatch);
    let other_section = record(1, 10, "tools", ActivityType::VideoWatch);

    for r in [&watch, &scroll, &other_user, &other_section] {
        let outcome = repo.append_activity(r, dedup).await.unwrap();
        assert!(!outcome.is_duplicate(), "{r:?}");
    }
}

#[tokio::test]
async fn sqlite_round_trips_payload_and_unknown_types() {
    let repo = memory_repo("memdb_payload").await;

    let mut rec = record(3, 11, "faq", ActivityType::Other("quiz_answer".into()));
    rec.payload = ActivityPayload::parse(r#"{"score":4,"video_id":"abc"}"#).unwrap();
    repo.append_activity(&rec, None).await.unwrap();

    let faq = SectionId::new("faq").unwrap();
    let stored = repo
        .activities(UserId::new(3), UnitId::new(11), Some(&faq))
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].activity_type, ActivityType::Other("quiz_answer".into()));
    assert_eq!(stored[0].payload, rec.payload);
    assert_eq!(stored[0].created_at, fixed_now());
}

#[tokio::test]
async fn sqlite_corrupt_payload_reads_as_empty() {
    let repo = memory_repo("memdb_corrupt").await;
    sqlx::query(
        r"
            INSERT INTO activities (user_id, unit_id, section_id, activity_type, payload, created_at)
            VALUES (1, 1, 'overview', 'video_watch', '{broken', ?1)
        ",
    )
    .bind(fixed_now())
    .execute(repo.pool())
    .await
    .unwrap();

    let stored = repo
        .activities(UserId::new(1), UnitId::new(1), None)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].payload.is_empty());
}

#[tokio::test]
async fn sqlite_lists_units_and_sections() {
    let repo = memory_repo("memdb_listing").await;
    for (user, unit, section) in [(1, 20, "overview"), (1, 5, "tools"), (2, 20, "discussion")] {
        repo.append_activity(&record(user, unit, section, ActivityType::Scroll), None)
            .await
            .unwrap();
    }

    assert_eq!(
        repo.units_for_user(UserId::new(1)).await.unwrap(),
        vec![UnitId::new(5), UnitId::new(20)]
    );
    let sections = repo.sections_for_unit(UnitId::new(20)).await.unwrap();
    let names: Vec<&str> = sections.iter().map(SectionId::as_str).collect();
    assert_eq!(names, vec!["discussion", "overview"]);

    assert_eq!(
        repo.learners().await.unwrap(),
        vec![UserId::new(1), UserId::new(2)]
    );
    assert_eq!(
        repo.all_units().await.unwrap(),
        vec![UnitId::new(5), UnitId::new(20)]
    );
}

#[tokio::test]
async fn sqlite_completion_marker_is_idempotent() {
    let repo = memory_repo("memdb_completion").await;
    let marker = CompletionMarker::new(
        UserId::new(1),
        UnitId::new(10),
        SectionId::new("task").unwrap(),
        fixed_now(),
    );

    assert!(repo.record_completion(&marker).await.unwrap());
    assert!(!repo.record_completion(&marker).await.unwrap());

    let done = repo
        .completed_sections(UserId::new(1), UnitId::new(10))
        .await
        .unwrap();
    assert_eq!(done.len(), 1);
    assert!(done.contains(&SectionId::new("task").unwrap()));
}

#[tokio::test]
async fn sqlite_positions_upsert_and_resume() {
    let repo = memory_repo("memdb_positions").await;
    let user = UserId::new(4);

    let first = LastPosition::new(user, UnitId::new(1), SectionId::new("overview").unwrap(), fixed_now());
    repo.save_position(&first).await.unwrap();

    let moved = LastPosition::new(
        user,
        UnitId::new(1),
        SectionId::new("tools_demo").unwrap(),
        fixed_now() + Duration::minutes(1),
    );
    repo.save_position(&moved).await.unwrap();

    let other_unit = LastPosition::new(
        user,
        UnitId::new(2),
        SectionId::new("intro").unwrap(),
        fixed_now() + Duration::minutes(10),
    );
    repo.save_position(&other_unit).await.unwrap();

    let in_unit = repo.last_position(user, UnitId::new(1)).await.unwrap().unwrap();
    assert_eq!(in_unit.section_id.as_str(), "tools_demo");

    let latest = repo.latest_position(user).await.unwrap().unwrap();
    assert_eq!(latest, other_unit);

    assert!(repo.last_position(user, UnitId::new(3)).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_concurrent_duplicates_store_one_record() {
    let path = std::env::temp_dir().join(format!(
        "tracker-concurrent-{}.sqlite3",
        std::process::id()
    ));
    remove_db_files(&path);
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");

    let rec = record(9, 9, "overview", ActivityType::VideoWatch);
    let dedup = Some(Deduplicator::default());
    let (a, b, c) = tokio::join!(
        repo.append_activity(&rec, dedup),
        repo.append_activity(&rec, dedup),
        repo.append_activity(&rec, dedup),
    );
    let accepted = [a.unwrap(), b.unwrap(), c.unwrap()]
        .iter()
        .filter(|o| !o.is_duplicate())
        .count();
    assert_eq!(accepted, 1);

    let stored = repo
        .activities(UserId::new(9), UnitId::new(9), None)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);

    drop(repo);
    remove_db_files(&path);
}

fn remove_db_files(path: &std::path::Path) {
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}
