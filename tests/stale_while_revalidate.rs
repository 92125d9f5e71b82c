mod support;

use std::sync::Arc;
use std::time::Duration;

use librarise::application::catalog::CatalogLoader;
use librarise::cache::{CacheConfig, CacheKey, CacheService, FileStore};
use librarise::domain::catalog::{CatalogItem, CatalogListing};

use support::{GatedSource, PendingSource, StallingStore, StaticSource, record};

fn cached_listing(cache: &CacheService, ids: &[&str]) {
    let items = ids
        .iter()
        .map(|id| CatalogItem::from(record(id, "Romancë", false)))
        .collect();
    cache
        .catalog()
        .write(&CatalogListing::from_items(items, 4));
}

#[tokio::test]
async fn mount_serves_cached_catalog_without_touching_the_network() {
    let cache = Arc::new(CacheService::in_memory(CacheConfig::default()));
    cached_listing(&cache, &["1", "2", "3"]);

    let source = Arc::new(PendingSource::default());
    let loader = CatalogLoader::mount(source.clone(), cache);

    let state = loader.state();
    assert!(!state.is_loading);
    assert_eq!(state.items.len(), 3);
    assert_eq!(source.calls(), 0);

    let pending = tokio::time::timeout(Duration::from_millis(20), loader.revalidate()).await;
    assert!(pending.is_err(), "pending source never answers");
    assert_eq!(source.calls(), 1);
    assert_eq!(loader.state().items.len(), 3);
}

#[tokio::test]
async fn featured_rail_falls_back_to_first_four() {
    let cache = Arc::new(CacheService::in_memory(CacheConfig::default()));
    let records = (1..=10)
        .map(|n| record(&n.to_string(), "Fantazi", false))
        .collect();
    let loader = CatalogLoader::mount(Arc::new(StaticSource::new(records, Vec::new())), cache);

    let state = loader.revalidate().await;
    let featured: Vec<&str> = state.featured_items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(featured, ["1", "2", "3", "4"]);
    assert_eq!(state.items.len(), 10);
}

#[tokio::test]
async fn older_overlapping_response_is_discarded() {
    let cache = Arc::new(CacheService::in_memory(CacheConfig::default()));
    let (source, mut gates, mut started) = GatedSource::new(2);
    let loader = Arc::new(CatalogLoader::mount(Arc::new(source), cache.clone()));

    let first = tokio::spawn({
        let loader = loader.clone();
        async move { loader.refresh().await }
    });
    assert_eq!(started.recv().await, Some(0));

    let second = tokio::spawn({
        let loader = loader.clone();
        async move { loader.refresh().await }
    });
    assert_eq!(started.recv().await, Some(1));

    let newer = gates.pop().expect("second gate");
    let older = gates.pop().expect("first gate");

    newer
        .send(vec![record("new", "Mister", true)])
        .expect("second fetch waiting");
    let applied = second.await.expect("task joins").expect("latest applies");
    assert_eq!(applied.items[0].id, "new");

    older
        .send(vec![record("old", "Mister", true)])
        .expect("first fetch waiting");
    let discarded = first.await.expect("task joins").expect_err("stale response");
    assert!(discarded.is_superseded());

    assert_eq!(loader.state().items[0].id, "new");
    let cached = cache.catalog().read().expect("listing cached");
    assert_eq!(cached.items[0].id, "new");
}

#[tokio::test]
async fn failed_refresh_keeps_cached_state_and_cache() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(FileStore::open(dir.path()).expect("store opens"));
    let cache = Arc::new(CacheService::init(store, CacheConfig::default()));
    cached_listing(&cache, &["1", "2"]);

    let source = Arc::new(StaticSource::failing("connection refused"));
    let loader = CatalogLoader::mount(source.clone(), cache.clone())
        .with_fallback(vec![CatalogItem::from(record("local", "Histori", true))]);

    let err = loader.refresh().await.expect_err("refresh fails");
    assert!(!err.is_superseded());
    assert_eq!(source.calls(), 1);

    let state = loader.state();
    assert!(!state.is_loading);
    let ids: Vec<&str> = state.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, ["1", "2"]);
    assert_eq!(cache.catalog().read().map(|l| l.items.len()), Some(2));
}

#[tokio::test]
async fn successful_refresh_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    {
        let store = Arc::new(FileStore::open(dir.path()).expect("store opens"));
        let cache = Arc::new(CacheService::init(store, CacheConfig::default()));
        let source = StaticSource::new(vec![record("9", "Poezi", false)], Vec::new());
        CatalogLoader::mount(Arc::new(source), cache)
            .refresh()
            .await
            .expect("refresh succeeds");
    }

    let store = Arc::new(FileStore::open(dir.path()).expect("store reopens"));
    let cache = Arc::new(CacheService::init(store, CacheConfig::default()));
    let loader = CatalogLoader::mount(Arc::new(PendingSource::default()), cache);
    let state = loader.state();
    assert!(!state.is_loading);
    assert_eq!(state.items[0].id, "9");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn slow_cache_write_cannot_overwrite_a_newer_listing() {
    let (store, entered, release) = StallingStore::new(CacheKey::Catalog.as_str());
    let cache = Arc::new(CacheService::init(Arc::new(store), CacheConfig::default()));
    let (source, mut gates, mut started) = GatedSource::new(2);
    let loader = Arc::new(CatalogLoader::mount(Arc::new(source), cache.clone()));

    let first = tokio::spawn({
        let loader = loader.clone();
        async move { loader.refresh().await }
    });
    assert_eq!(started.recv().await, Some(0));
    let older = gates.remove(0);
    older
        .send(vec![record("old", "Mister", false)])
        .expect("first fetch waiting");
    entered.await.expect("first response reached the store");

    let second = tokio::spawn({
        let loader = loader.clone();
        async move { loader.refresh().await }
    });
    assert_eq!(started.recv().await, Some(1));
    gates
        .pop()
        .expect("second gate")
        .send(vec![record("new", "Mister", false)])
        .expect("second fetch waiting");

    tokio::time::sleep(Duration::from_millis(50)).await;
    release.send(()).expect("stalled write waiting");

    first.await.expect("task joins").expect("first applied before the second was issued");
    second.await.expect("task joins").expect("latest applies");

    assert_eq!(loader.state().items[0].id, "new");
    let cached = cache.catalog().read().expect("listing cached");
    assert_eq!(cached.items[0].id, "new");
}
