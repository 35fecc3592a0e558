mod common;

use std::collections::HashMap;
use std::time::Duration as StdDuration;

use bandscan_core::cache::{DirectoryCache, CACHE_FILE};
use bandscan_core::node::SourceId;
use chrono::Duration;
use common::{FixtureSource, ROOT};

fn windows(window: Duration) -> HashMap<SourceId, Duration> {
    let mut map = HashMap::new();
    map.insert(SourceId::TuneIn, window);
    map
}

#[tokio::test]
async fn fresh_entry_is_served_without_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DirectoryCache::open(dir.path(), windows(Duration::hours(1)));
    let source = FixtureSource::with_categories(&["Jazz", "Rock"]);

    let (first, stale) = cache.get(&source, ROOT, true).await.unwrap();
    assert_eq!(source.calls(), 1);
    assert!(!stale);

    // A fetch here would fail; the fresh entry must be served instead.
    source.set_fail(true);
    let (second, stale) = cache.get(&source, ROOT, true).await.unwrap();
    assert_eq!(source.calls(), 1);
    assert!(!stale);
    assert_eq!(first, second);
}

#[tokio::test]
async fn stale_entry_triggers_refetch_and_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DirectoryCache::open(dir.path(), windows(Duration::zero()));
    let source = FixtureSource::with_categories(&["Jazz"]);

    cache.get(&source, ROOT, true).await.unwrap();
    let (_, stale) = cache.get(&source, ROOT, true).await.unwrap();
    assert_eq!(source.calls(), 2);
    assert!(!stale, "successful refresh is not stale");
}

#[tokio::test]
async fn failed_refresh_falls_back_to_stale_when_allowed() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DirectoryCache::open(dir.path(), windows(Duration::zero()));
    let source = FixtureSource::with_categories(&["Jazz", "Rock"]);

    let (original, _) = cache.get(&source, ROOT, true).await.unwrap();
    source.set_fail(true);

    let (fallback, stale) = cache.get(&source, ROOT, true).await.unwrap();
    assert!(stale);
    assert_eq!(fallback, original);

    let err = cache.get(&source, ROOT, false).await.unwrap_err();
    assert!(err.is_fetch());
}

#[tokio::test]
async fn cold_fetch_failure_propagates_and_populates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DirectoryCache::open(dir.path(), windows(Duration::hours(1)));
    let source = FixtureSource::with_categories(&["Jazz"]);
    source.set_fail(true);

    let err = cache.get(&source, ROOT, true).await.unwrap_err();
    assert!(err.is_fetch());
    assert!(
        !dir.path().join(CACHE_FILE).exists(),
        "a failed cold fetch must not be persisted"
    );

    // Recovery: the next get fetches for real.
    source.set_fail(false);
    let (nodes, stale) = cache.get(&source, ROOT, true).await.unwrap();
    assert_eq!(source.calls(), 2);
    assert!(!stale);
    assert_eq!(nodes.len(), 1);
}

#[tokio::test]
async fn corrupt_cache_file_is_treated_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(CACHE_FILE), b"{\"entries\": [{\"trunca").unwrap();

    let cache = DirectoryCache::open(dir.path(), windows(Duration::hours(1)));
    let source = FixtureSource::with_categories(&["Jazz"]);

    let (nodes, stale) = cache.get(&source, ROOT, true).await.unwrap();
    assert_eq!(source.calls(), 1, "corrupt file must behave like a miss");
    assert!(!stale);
    assert_eq!(nodes[0].name(), "Jazz");
}

#[tokio::test]
async fn entries_round_trip_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let source = FixtureSource::with_categories(&["Jazz", "Rock", "Ambient"]);

    let written = {
        let cache = DirectoryCache::open(dir.path(), windows(Duration::hours(1)));
        let (nodes, _) = cache.get(&source, ROOT, true).await.unwrap();
        nodes
    };

    // No half-written temp file may survive a publish.
    assert!(dir.path().join(CACHE_FILE).exists());
    assert!(!dir.path().join("directory.json.tmp").exists());

    // Fresh cache instance, failing source: everything must come from disk.
    let cache = DirectoryCache::open(dir.path(), windows(Duration::hours(1)));
    source.set_fail(true);
    let (reloaded, stale) = cache.get(&source, ROOT, true).await.unwrap();
    assert_eq!(source.calls(), 1);
    assert!(!stale);
    assert_eq!(reloaded, written);
}

#[tokio::test]
async fn concurrent_gets_for_same_key_coalesce() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DirectoryCache::open(dir.path(), windows(Duration::hours(1)));
    let source = FixtureSource::with_categories(&["Jazz"])
        .with_delay(StdDuration::from_millis(100));

    let (a, b) = tokio::join!(
        cache.get(&source, ROOT, true),
        cache.get(&source, ROOT, true)
    );
    assert_eq!(source.calls(), 1, "same-key gets must not race to fetch twice");
    assert_eq!(a.unwrap().0, b.unwrap().0);
}

#[tokio::test]
async fn gets_for_different_keys_run_in_parallel() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DirectoryCache::open(dir.path(), windows(Duration::hours(1)));
    let source = FixtureSource::with_categories(&["Jazz"])
        .with_delay(StdDuration::from_millis(300));

    let started = std::time::Instant::now();
    let (a, b) = tokio::join!(
        cache.get(&source, "cat:Jazz", true),
        cache.get(&source, "cat:Rock", true)
    );
    a.unwrap();
    b.unwrap();
    assert_eq!(source.calls(), 2);
    assert!(
        started.elapsed() < StdDuration::from_millis(550),
        "different keys must not serialise behind one lock"
    );
}

#[tokio::test]
async fn parallel_persists_leave_one_valid_file() {
    let dir = tempfile::tempdir().unwrap();
    let source = FixtureSource::with_categories(&["Jazz"])
        .with_delay(StdDuration::from_millis(50));

    {
        let cache = DirectoryCache::open(dir.path(), windows(Duration::hours(1)));
        let (a, b) = tokio::join!(
            cache.get(&source, "cat:Jazz", true),
            cache.get(&source, "cat:Rock", true)
        );
        a.unwrap();
        b.unwrap();
    }
    assert!(!dir.path().join("directory.json.tmp").exists());

    // Both entries must have landed on disk intact: a reopened cache with a
    // failing source can only serve what the file holds.
    let cache = DirectoryCache::open(dir.path(), windows(Duration::hours(1)));
    source.set_fail(true);
    let (jazz, _) = cache.get(&source, "cat:Jazz", true).await.unwrap();
    let (rock, _) = cache.get(&source, "cat:Rock", true).await.unwrap();
    assert_eq!(source.calls(), 2, "both listings must come from disk");
    assert_eq!(jazz.len(), 1);
    assert_eq!(rock.len(), 1);
}

#[tokio::test]
async fn clear_removes_entries_and_file() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DirectoryCache::open(dir.path(), windows(Duration::hours(1)));
    let source = FixtureSource::with_categories(&["Jazz"]);

    cache.get(&source, ROOT, true).await.unwrap();
    assert!(dir.path().join(CACHE_FILE).exists());

    cache.clear().await.unwrap();
    assert!(!dir.path().join(CACHE_FILE).exists());

    cache.get(&source, ROOT, true).await.unwrap();
    assert_eq!(source.calls(), 2, "cleared entries must be refetched");
}
