//! Request-scoped batch cache.
//!
//! One [`BatchCache`] lives for exactly one resolution pass. Keyed lookups are
//! collected into a batch window with [`BatchCache::enqueue`] and served by a
//! single store call per kind on [`BatchCache::flush`]. Every (kind, id) pair
//! reaches the store at most once per request: found records, misses and
//! failures are all remembered and never retried.
//!
//! Scans are memoized per filter value as well, so a cyclic traversal that
//! revisits a user reuses the association rows fetched the first time.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::join_all;
use tokio::sync::{Mutex as AsyncMutex, OnceCell};
use tracing::{debug, warn};

use super::ports::{ForeignKey, RecordStore, StoreError, SubscriptionEnd};
use super::{EntityId, Record, RecordId, RecordKind, Subscription};

/// Cached outcome of a keyed lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Found(Arc<Record>),
    /// The store had no record with this key.
    Missing,
    /// The batch carrying this key failed.
    Failed(StoreError),
}

/// Store traffic issued through one cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Keyed store calls (`get_by_id` or `get_many_by_ids`).
    pub keyed_fetches: usize,
    /// Scan calls of any kind.
    pub scans: usize,
    /// Reads answered without touching the store.
    pub hits: usize,
}

type Memo<K, V> = Mutex<HashMap<K, Arc<OnceCell<Result<V, StoreError>>>>>;

#[derive(Default)]
struct KeyedState {
    slots: HashMap<(RecordKind, RecordId), Slot>,
    pending: BTreeMap<RecordKind, BTreeSet<RecordId>>,
}

/// Memoizing, batching front for a [`RecordStore`].
pub struct BatchCache {
    store: Arc<dyn RecordStore>,
    keyed: Mutex<KeyedState>,
    flush_lock: AsyncMutex<()>,
    full_scans: Memo<RecordKind, Vec<Arc<Record>>>,
    foreign_key_scans: Memo<(ForeignKey, RecordId), Vec<Arc<Record>>>,
    association_scans: Memo<(SubscriptionEnd, EntityId), Vec<Subscription>>,
    stats: Mutex<CacheStats>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl BatchCache {
    /// Create an empty cache in front of `store`.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            keyed: Mutex::default(),
            flush_lock: AsyncMutex::new(()),
            full_scans: Mutex::default(),
            foreign_key_scans: Mutex::default(),
            association_scans: Mutex::default(),
            stats: Mutex::default(),
        }
    }

    /// Snapshot of the store traffic so far.
    pub fn stats(&self) -> CacheStats {
        *lock(&self.stats)
    }

    fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        update(&mut lock(&self.stats));
    }

    /// Add `id` to the current batch window unless it is already cached.
    pub fn enqueue(&self, kind: RecordKind, id: RecordId) {
        let mut state = lock(&self.keyed);
        if !state.slots.contains_key(&(kind, id)) {
            state.pending.entry(kind).or_default().insert(id);
        }
    }

    /// Read a cached slot without touching the store.
    pub fn cached(&self, kind: RecordKind, id: &RecordId) -> Option<Slot> {
        lock(&self.keyed).slots.get(&(kind, *id)).cloned()
    }

    /// Resolve one key, flushing the current window if it is not cached.
    pub async fn resolve(&self, kind: RecordKind, id: RecordId) -> Slot {
        if let Some(slot) = self.cached(kind, &id) {
            self.record(|stats| stats.hits += 1);
            return slot;
        }
        self.enqueue(kind, id);
        self.flush().await;
        self.cached(kind, &id).unwrap_or(Slot::Missing)
    }

    /// Store records obtained elsewhere (e.g. from a scan) as found.
    ///
    /// Existing slots are kept.
    pub fn prime(&self, records: &[Arc<Record>]) {
        let mut state = lock(&self.keyed);
        for record in records {
            state
                .slots
                .entry((record.kind(), record.id()))
                .or_insert_with(|| Slot::Found(Arc::clone(record)));
        }
    }

    /// Close the current batch window: one store call per kind with pending
    /// ids. Concurrent flushes are serialized, so an id already in flight is
    /// served by the earlier call.
    pub async fn flush(&self) {
        let _serial = self.flush_lock.lock().await;

        let batches: Vec<(RecordKind, BTreeSet<RecordId>)> = {
            let mut state = lock(&self.keyed);
            let pending = std::mem::take(&mut state.pending);
            pending
                .into_iter()
                .map(|(kind, ids)| {
                    let unresolved: BTreeSet<RecordId> = ids
                        .into_iter()
                        .filter(|id| !state.slots.contains_key(&(kind, *id)))
                        .collect();
                    (kind, unresolved)
                })
                .filter(|(_, ids)| !ids.is_empty())
                .collect()
        };
        if batches.is_empty() {
            return;
        }

        let outcomes = join_all(batches.into_iter().map(|(kind, ids)| async move {
            let outcome = self.fetch(kind, &ids).await;
            (kind, ids, outcome)
        }))
        .await;

        let mut state = lock(&self.keyed);
        for (kind, ids, outcome) in outcomes {
            match outcome {
                Ok(mut found) => {
                    for id in ids {
                        let slot = found
                            .remove(&id)
                            .map_or(Slot::Missing, |record| Slot::Found(Arc::new(record)));
                        state.slots.insert((kind, id), slot);
                    }
                }
                Err(error) => {
                    warn!(kind = kind.as_str(), batch = ids.len(), %error, "batched lookup failed");
                    for id in ids {
                        state.slots.insert((kind, id), Slot::Failed(error.clone()));
                    }
                }
            }
        }
    }

    async fn fetch(
        &self,
        kind: RecordKind,
        ids: &BTreeSet<RecordId>,
    ) -> Result<HashMap<RecordId, Record>, StoreError> {
        self.record(|stats| stats.keyed_fetches += 1);
        debug!(kind = kind.as_str(), batch = ids.len(), "flushing batch window");

        if let (1, Some(id)) = (ids.len(), ids.first()) {
            let found = self.store.get_by_id(kind, id).await?;
            return Ok(found.into_iter().map(|record| (*id, record)).collect());
        }
        self.store.get_many_by_ids(kind, ids).await
    }

    async fn memoized<K, V, F, Fut>(&self, memo: &Memo<K, V>, key: K, fetch: F) -> Result<V, StoreError>
    where
        K: Eq + Hash,
        V: Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, StoreError>>,
    {
        let cell = {
            let mut cells = lock(memo);
            Arc::clone(cells.entry(key).or_default())
        };
        if cell.initialized() {
            self.record(|stats| stats.hits += 1);
        }
        cell.get_or_init(|| async move {
            self.record(|stats| stats.scans += 1);
            fetch().await
        })
        .await
        .clone()
    }

    /// Every record of `kind`. The records also prime the keyed cache.
    pub async fn scan_all(&self, kind: RecordKind) -> Result<Vec<Arc<Record>>, StoreError> {
        let records = self
            .memoized(&self.full_scans, kind, || async move {
                debug!(kind = kind.as_str(), "scanning all records");
                let rows = self.store.scan_all(kind).await?;
                Ok(rows.into_iter().map(Arc::new).collect::<Vec<_>>())
            })
            .await?;
        self.prime(&records);
        Ok(records)
    }

    /// Records whose `foreign_key` column equals `value`. The records also
    /// prime the keyed cache.
    pub async fn scan_by_foreign_key(
        &self,
        foreign_key: ForeignKey,
        value: RecordId,
    ) -> Result<Vec<Arc<Record>>, StoreError> {
        let records = self
            .memoized(
                &self.foreign_key_scans,
                (foreign_key, value),
                || async move {
                    debug!(column = foreign_key.column(), %value, "scanning by foreign key");
                    let rows = self.store.scan_by_foreign_key(foreign_key, &value).await?;
                    Ok(rows.into_iter().map(Arc::new).collect::<Vec<_>>())
                },
            )
            .await?;
        self.prime(&records);
        Ok(records)
    }

    /// Subscription rows whose `end` column equals `user`.
    pub async fn scan_association(
        &self,
        end: SubscriptionEnd,
        user: EntityId,
    ) -> Result<Vec<Subscription>, StoreError> {
        self.memoized(&self.association_scans, (end, user), || async move {
            debug!(column = end.column(), %user, "scanning subscriptions");
            self.store.scan_association(end, &user).await
        })
        .await
    }
}
