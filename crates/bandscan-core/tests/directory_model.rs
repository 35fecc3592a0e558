mod common;

use std::collections::HashMap;
use std::sync::Arc;

use bandscan_core::cache::DirectoryCache;
use bandscan_core::model::DirectoryModel;
use bandscan_core::node::{Node, SourceId};
use bandscan_core::source::{DirectorySource, SourceSet};
use chrono::Duration;
use common::{FixtureSource, ROOT};

fn model_over(
    source: Arc<FixtureSource>,
    dir: &std::path::Path,
    window: Duration,
) -> DirectoryModel {
    let mut windows = HashMap::new();
    windows.insert(SourceId::TuneIn, window);
    let cache = DirectoryCache::open(dir, windows);
    DirectoryModel::new(
        SourceSet::new(vec![source as Arc<dyn DirectorySource>]),
        cache,
    )
}

#[tokio::test]
async fn empty_path_lists_one_root_per_source() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(FixtureSource::with_categories(&["Jazz"]));
    let model = model_over(source, dir.path(), Duration::hours(1));

    let listing = model.children(&[]).await.unwrap();
    assert_eq!(listing.nodes.len(), 1);
    assert_eq!(listing.nodes[0].name(), "Fixture");
    assert_eq!(listing.nodes[0].id(), ROOT);
    assert!(!listing.stale);
}

#[tokio::test]
async fn cold_cache_root_expansion_preserves_order() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(FixtureSource::with_categories(&["Jazz", "Rock"]));
    let model = model_over(source, dir.path(), Duration::hours(1));

    let root = model.roots().remove(0);
    let listing = model.children(&[root]).await.unwrap();

    let names: Vec<_> = listing.nodes.iter().map(|n| n.name()).collect();
    assert_eq!(names, vec!["Jazz", "Rock"]);
    assert!(listing.nodes.iter().all(|n| !n.is_station()));
}

#[tokio::test]
async fn stations_are_leaves() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(FixtureSource::with_categories(&[]));
    let model = model_over(source, dir.path(), Duration::hours(1));

    let root = model.roots().remove(0);
    let station = Node::Station {
        source: SourceId::TuneIn,
        id: "s1".into(),
        name: "Jazz FM".into(),
        playlist_url: "https://radio.example/s1.pls".into(),
        parent: ROOT.into(),
        bitrate: None,
        reliability: None,
        subtext: String::new(),
    };

    let listing = model.children(&[root, station]).await.unwrap();
    assert!(listing.nodes.is_empty());
}

#[tokio::test]
async fn cold_fetch_failure_surfaces_as_navigation_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(FixtureSource::with_categories(&["Jazz"]));
    source.set_fail(true);
    let model = model_over(source.clone(), dir.path(), Duration::hours(1));

    let root = model.roots().remove(0);
    let err = model.children(&[root.clone()]).await.unwrap_err();
    assert!(err.is_fetch());

    // The session survives: once the network is back the same path works.
    source.set_fail(false);
    let listing = model.children(&[root]).await.unwrap();
    assert_eq!(listing.nodes.len(), 1);
}

#[tokio::test]
async fn failed_refresh_marks_listing_stale() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(FixtureSource::with_categories(&["Jazz"]));
    let model = model_over(source.clone(), dir.path(), Duration::zero());

    let root = model.roots().remove(0);
    model.children(&[root.clone()]).await.unwrap();

    source.set_fail(true);
    let listing = model.children(&[root]).await.unwrap();
    assert!(listing.stale, "navigation must degrade, not block");
    assert_eq!(listing.nodes[0].name(), "Jazz");
}

#[tokio::test]
async fn disabled_source_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(FixtureSource::with_categories(&[]));
    let model = model_over(source, dir.path(), Duration::hours(1));

    let foreign = Node::Category {
        source: SourceId::SomaFm,
        id: "genres".into(),
        name: "SomaFM".into(),
        parent: String::new(),
    };
    let err = model.children(&[foreign]).await.unwrap_err();
    assert!(matches!(
        err,
        bandscan_core::DirectoryError::SourceUnavailable(SourceId::SomaFm)
    ));
}
