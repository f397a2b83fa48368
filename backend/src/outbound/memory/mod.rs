//! In-memory record store.
//!
//! Serves a fixed [`Dataset`] held in memory. Scans return rows in insertion
//! order, so results are deterministic for a given dataset. Foreign keys are
//! not checked: a dangling reference simply resolves to nothing.

mod dataset;

pub use dataset::{Dataset, DatasetError};

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{ForeignKey, RecordStore, StoreError, SubscriptionEnd};
use crate::domain::{EntityId, Record, RecordId, RecordKind, Subscription};

#[derive(Debug, Default, Clone)]
struct Table {
    rows: Vec<Record>,
    index: HashMap<RecordId, usize>,
}

impl Table {
    fn get(&self, id: &RecordId) -> Option<&Record> {
        self.index.get(id).and_then(|position| self.rows.get(*position))
    }
}

/// [`RecordStore`] backed by in-memory tables.
///
/// # Examples
/// ```
/// use feedgraph::domain::{EntityId, User};
/// use feedgraph::outbound::memory::{Dataset, InMemoryRecordStore};
///
/// let dataset = Dataset {
///     users: vec![User {
///         id: EntityId::random(),
///         name: "Ada".into(),
///         balance: 10.0,
///     }],
///     ..Dataset::default()
/// };
/// let store = InMemoryRecordStore::try_from(dataset).expect("unique ids");
/// assert_eq!(store.len(), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryRecordStore {
    tables: HashMap<RecordKind, Table>,
    subscriptions: Vec<Subscription>,
}

impl InMemoryRecordStore {
    /// Number of keyed records across all kinds.
    pub fn len(&self) -> usize {
        self.tables.values().map(|table| table.rows.len()).sum()
    }

    /// Whether the store holds no keyed records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn table(&self, kind: RecordKind) -> Option<&Table> {
        self.tables.get(&kind)
    }

    fn rows(&self, kind: RecordKind) -> impl Iterator<Item = &Record> {
        self.table(kind).into_iter().flat_map(|table| table.rows.iter())
    }
}

impl TryFrom<Dataset> for InMemoryRecordStore {
    type Error = DatasetError;

    fn try_from(dataset: Dataset) -> Result<Self, Self::Error> {
        let Dataset {
            member_types,
            users,
            profiles,
            posts,
            subscriptions,
        } = dataset;

        let mut store = Self {
            tables: HashMap::new(),
            subscriptions,
        };
        let records = member_types
            .into_iter()
            .map(Record::from)
            .chain(users.into_iter().map(Record::from))
            .chain(profiles.into_iter().map(Record::from))
            .chain(posts.into_iter().map(Record::from));
        for record in records {
            let table = store.tables.entry(record.kind()).or_default();
            let id = record.id();
            if table.index.insert(id, table.rows.len()).is_some() {
                return Err(DatasetError::DuplicateId {
                    kind: record.kind().as_str(),
                    id: id.to_string(),
                });
            }
            table.rows.push(record);
        }
        debug!(
            records = store.len(),
            subscriptions = store.subscriptions.len(),
            "in-memory store loaded"
        );
        Ok(store)
    }
}

fn references(record: &Record, foreign_key: ForeignKey, value: &RecordId) -> bool {
    match (foreign_key, record) {
        (ForeignKey::ProfileUser, Record::Profile(profile)) => {
            RecordId::from(profile.user_id) == *value
        }
        (ForeignKey::PostAuthor, Record::Post(post)) => RecordId::from(post.author_id) == *value,
        _ => false,
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get_by_id(
        &self,
        kind: RecordKind,
        id: &RecordId,
    ) -> Result<Option<Record>, StoreError> {
        Ok(self.table(kind).and_then(|table| table.get(id)).cloned())
    }

    async fn get_many_by_ids(
        &self,
        kind: RecordKind,
        ids: &BTreeSet<RecordId>,
    ) -> Result<HashMap<RecordId, Record>, StoreError> {
        let Some(table) = self.table(kind) else {
            return Ok(HashMap::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| table.get(id).map(|record| (*id, record.clone())))
            .collect())
    }

    async fn scan_all(&self, kind: RecordKind) -> Result<Vec<Record>, StoreError> {
        Ok(self.rows(kind).cloned().collect())
    }

    async fn scan_by_foreign_key(
        &self,
        foreign_key: ForeignKey,
        value: &RecordId,
    ) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .rows(foreign_key.kind())
            .filter(|record| references(record, foreign_key, value))
            .cloned()
            .collect())
    }

    async fn scan_association(
        &self,
        end: SubscriptionEnd,
        user: &EntityId,
    ) -> Result<Vec<Subscription>, StoreError> {
        Ok(self
            .subscriptions
            .iter()
            .filter(|subscription| match end {
                SubscriptionEnd::Subscriber => subscription.subscriber_id == *user,
                SubscriptionEnd::Author => subscription.author_id == *user,
            })
            .copied()
            .collect())
    }
}
