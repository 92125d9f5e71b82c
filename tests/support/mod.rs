#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::mpsc as std_mpsc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use librarise::application::repos::{CatalogSource, SourceError};
use librarise::cache::{DurableStore, MemoryStore, StoreError};
use librarise::domain::catalog::ItemRecord;
use librarise::domain::taxonomy::TaxonomyRecord;
use tokio::sync::{mpsc, oneshot};

pub fn record(id: &str, genre: &str, featured: bool) -> ItemRecord {
    ItemRecord {
        id: id.to_string(),
        title: format!("Libri {id}"),
        author: "Autori".to_string(),
        price: 1000.0,
        discount: None,
        genre: genre.to_string(),
        subcategory: None,
        description: None,
        rating: Some(4.0),
        cover: None,
        featured: Some(featured),
        created_at: None,
        publisher: None,
        pages: None,
        year: None,
    }
}

pub fn row(id: &str, name: &str, parent: Option<&str>, flag: bool) -> TaxonomyRecord {
    TaxonomyRecord {
        id: id.to_string(),
        name: name.to_string(),
        parent_id: parent.map(str::to_string),
        variant_flag: flag,
    }
}

pub fn scenario_a_rows() -> Vec<TaxonomyRecord> {
    vec![
        row("1", "Fiction", None, false),
        row("2", "Picture Books", None, true),
        row("3", "Early Readers", Some("2"), true),
    ]
}

/// Answers every call with the same rows and counts calls.
pub struct StaticSource {
    items: Result<Vec<ItemRecord>, String>,
    taxonomy: Result<Vec<TaxonomyRecord>, String>,
    calls: AtomicUsize,
}

impl StaticSource {
    pub fn new(items: Vec<ItemRecord>, taxonomy: Vec<TaxonomyRecord>) -> Self {
        Self {
            items: Ok(items),
            taxonomy: Ok(taxonomy),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            items: Err(reason.to_string()),
            taxonomy: Err(reason.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for StaticSource {
    async fn fetch_items(&self) -> Result<Vec<ItemRecord>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.items.clone().map_err(SourceError::Transport)
    }

    async fn fetch_taxonomy(&self) -> Result<Vec<TaxonomyRecord>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.taxonomy.clone().map_err(SourceError::Transport)
    }
}

/// Never answers; counts calls.
#[derive(Default)]
pub struct PendingSource {
    calls: AtomicUsize,
}

impl PendingSource {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for PendingSource {
    async fn fetch_items(&self) -> Result<Vec<ItemRecord>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }

    async fn fetch_taxonomy(&self) -> Result<Vec<TaxonomyRecord>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

/// Calls that block until the test releases the matching gate.
///
/// Each call takes the next gate in order and reports its index on `started`.
struct Gates<T> {
    pending: Mutex<VecDeque<(usize, oneshot::Receiver<T>)>>,
    started: mpsc::UnboundedSender<usize>,
}

impl<T> Gates<T> {
    fn new(count: usize) -> (Self, Vec<oneshot::Sender<T>>, mpsc::UnboundedReceiver<usize>) {
        let mut senders = Vec::with_capacity(count);
        let mut pending = VecDeque::with_capacity(count);
        for index in 0..count {
            let (tx, rx) = oneshot::channel();
            senders.push(tx);
            pending.push_back((index, rx));
        }
        let (started, started_rx) = mpsc::unbounded_channel();
        let gates = Self {
            pending: Mutex::new(pending),
            started,
        };
        (gates, senders, started_rx)
    }

    async fn wait(&self) -> Result<T, SourceError> {
        let next = self.pending.lock().expect("gate lock").pop_front();
        let Some((index, gate)) = next else {
            return Err(SourceError::Unavailable("no gate left".to_string()));
        };
        let _ = self.started.send(index);
        gate.await.map_err(SourceError::transport)
    }
}

/// Item fetches wait on gates; taxonomy fetches return nothing.
pub struct GatedSource {
    gates: Gates<Vec<ItemRecord>>,
}

impl GatedSource {
    pub fn new(
        count: usize,
    ) -> (
        Self,
        Vec<oneshot::Sender<Vec<ItemRecord>>>,
        mpsc::UnboundedReceiver<usize>,
    ) {
        let (gates, senders, started) = Gates::new(count);
        (Self { gates }, senders, started)
    }
}

#[async_trait]
impl CatalogSource for GatedSource {
    async fn fetch_items(&self) -> Result<Vec<ItemRecord>, SourceError> {
        self.gates.wait().await
    }

    async fn fetch_taxonomy(&self) -> Result<Vec<TaxonomyRecord>, SourceError> {
        Ok(Vec::new())
    }
}

/// Taxonomy fetches wait on gates and answer with whatever the gate delivers.
pub struct GatedTaxonomySource {
    gates: Gates<Result<Vec<TaxonomyRecord>, String>>,
}

impl GatedTaxonomySource {
    pub fn new(
        count: usize,
    ) -> (
        Self,
        Vec<oneshot::Sender<Result<Vec<TaxonomyRecord>, String>>>,
        mpsc::UnboundedReceiver<usize>,
    ) {
        let (gates, senders, started) = Gates::new(count);
        (Self { gates }, senders, started)
    }
}

#[async_trait]
impl CatalogSource for GatedTaxonomySource {
    async fn fetch_items(&self) -> Result<Vec<ItemRecord>, SourceError> {
        Ok(Vec::new())
    }

    async fn fetch_taxonomy(&self) -> Result<Vec<TaxonomyRecord>, SourceError> {
        self.gates.wait().await?.map_err(SourceError::Transport)
    }
}

/// Memory store whose first write to `stalled_key` blocks until released.
///
/// `entered` fires once that write has started; sending on the returned release handle
/// lets it finish.
pub struct StallingStore {
    inner: MemoryStore,
    stalled_key: &'static str,
    stall: Mutex<Option<(oneshot::Sender<()>, std_mpsc::Receiver<()>)>>,
}

impl StallingStore {
    pub fn new(
        stalled_key: &'static str,
    ) -> (Self, oneshot::Receiver<()>, std_mpsc::Sender<()>) {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = std_mpsc::channel();
        let store = Self {
            inner: MemoryStore::new(),
            stalled_key,
            stall: Mutex::new(Some((entered_tx, release_rx))),
        };
        (store, entered_rx, release_tx)
    }
}

impl DurableStore for StallingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if key == self.stalled_key {
            let stall = self.stall.lock().expect("stall lock").take();
            if let Some((entered, release)) = stall {
                let _ = entered.send(());
                let _ = release.recv();
            }
        }
        self.inner.put(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }
}
