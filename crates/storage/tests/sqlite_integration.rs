use std::sync::Arc;

use dictation_core::model::{AttemptStats, LibraryName};
use storage::repository::{AccuracyLedger, Storage, StorageError};
use storage::sqlite::SqliteRepository;

fn lib(name: &str) -> LibraryName {
    LibraryName::new(name).unwrap()
}

#[tokio::test]
async fn sqlite_ledger_counts_attempts() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_ledger_counts?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    let animals = lib("animals");

    assert_eq!(
        repo.get_attempt_stats(&animals, "dog").await.unwrap(),
        AttemptStats::empty()
    );

    let outcomes = [true, false, false, true, true];
    for (i, hit) in outcomes.iter().enumerate() {
        let stats = repo.record_attempt(&animals, "dog", *hit).await.unwrap();
        assert!(stats.correct() <= stats.total());
        assert_eq!(stats.total() as usize, i + 1);
    }

    let stats = repo.get_attempt_stats(&animals, "dog").await.unwrap();
    assert_eq!((stats.correct(), stats.total()), (3, 5));
}

#[tokio::test]
async fn sqlite_full_counter_is_left_unchanged() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_full_counter?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    let animals = lib("animals");

    sqlx::query(
        "INSERT INTO attempt_stats (library_name, word, correct, total) VALUES (?1, ?2, 0, ?3)",
    )
    .bind(animals.as_str())
    .bind("cat")
    .bind(i64::from(u32::MAX))
    .execute(repo.pool())
    .await
    .expect("seed full row");

    let err = repo.record_attempt(&animals, "cat", false).await.unwrap_err();
    assert!(matches!(err, StorageError::CounterOverflow { .. }));

    let stats = repo.get_attempt_stats(&animals, "cat").await.unwrap();
    assert_eq!((stats.correct(), stats.total()), (0, u32::MAX));

    // Other keys keep counting.
    let stats = repo.record_attempt(&animals, "dog", true).await.unwrap();
    assert_eq!((stats.correct(), stats.total()), (1, 1));
}

#[tokio::test]
async fn sqlite_rejects_totals_beyond_u32() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_total_check?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let result = sqlx::query(
        "INSERT INTO attempt_stats (library_name, word, correct, total) VALUES ('animals', 'cat', 0, ?1)",
    )
    .bind(i64::from(u32::MAX) + 1)
    .execute(repo.pool())
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn sqlite_library_stats_are_stable_and_scoped() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_library_stats?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.record_attempt(&lib("a"), "cat", true).await.unwrap();
    repo.record_attempt(&lib("a"), "dog", false).await.unwrap();
    repo.record_attempt(&lib("b"), "cat", false).await.unwrap();

    let first = repo.get_library_stats(&lib("a")).await.unwrap();
    let second = repo.get_library_stats(&lib("a")).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.words().len(), 2);
    assert_eq!(first.total_correct(), 1);
    assert_eq!(first.total_attempts(), 2);

    let empty = repo.get_library_stats(&lib("c")).await.unwrap();
    assert!(empty.is_empty());
    assert_eq!(empty.accuracy(), 0.0);
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_migrate_twice?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.record_attempt(&lib("a"), "cat", true).await.unwrap();
    repo.migrate().await.expect("second migrate");

    let stats = repo.get_attempt_stats(&lib("a"), "cat").await.unwrap();
    assert_eq!((stats.correct(), stats.total()), (1, 1));
}

#[tokio::test]
async fn sqlite_concurrent_writes_on_one_key_are_not_lost() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("stats.db").display());
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    let ledger: Arc<dyn AccuracyLedger> = Arc::new(repo);

    let mut handles = Vec::new();
    for i in 0..20 {
        let ledger = Arc::clone(&ledger);
        handles.push(tokio::spawn(async move {
            ledger.record_attempt(&lib("race"), "word", i % 2 == 0).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stats = ledger.get_attempt_stats(&lib("race"), "word").await.unwrap();
    assert_eq!((stats.correct(), stats.total()), (10, 20));
}

#[tokio::test]
async fn sqlite_ledger_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("stats.db").display());
    let libraries = dir.path().join("Libraries");

    let storage = Storage::sqlite(&url, &libraries).await.expect("open");
    storage
        .ledger
        .record_attempt(&lib("animals"), "cat", true)
        .await
        .unwrap();
    storage.close().await;

    let reopened = Storage::sqlite(&url, &libraries).await.expect("reopen");
    let stats = reopened
        .ledger
        .get_attempt_stats(&lib("animals"), "cat")
        .await
        .unwrap();
    assert_eq!((stats.correct(), stats.total()), (1, 1));
    reopened.close().await;
}
