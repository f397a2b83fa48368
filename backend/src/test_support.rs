//! Test utilities for the backend crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`,
//! through the `test-support` feature).

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::domain::ports::{ForeignKey, RecordStore, StoreError, SubscriptionEnd};
use crate::domain::{EntityId, Record, RecordId, RecordKind, Subscription};

pub mod cap_fs {
    //! Capability-safe filesystem helpers for tests.

    use std::io;
    use std::path::Path;

    use cap_std::{ambient_authority, fs::Dir};

    /// Write bytes to a file through `cap_std`, creating the parent
    /// directory if needed.
    pub fn write_file(path: &Path, contents: &[u8]) -> io::Result<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = path.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "path must include a file name")
        })?;
        Dir::create_ambient_dir_all(parent, ambient_authority())?;
        let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
        directory.write(Path::new(file_name), contents)
    }
}

pub mod fixtures {
    //! Dataset builders with readable, deterministic identifiers.

    use crate::domain::{
        EntityId, MemberTier, MemberTierId, Post, Profile, Subscription, User,
    };
    use crate::outbound::memory::{Dataset, InMemoryRecordStore};

    /// Deterministic UUID for test entity number `n`.
    ///
    /// # Examples
    /// ```
    /// use feedgraph::test_support::fixtures::entity_id;
    ///
    /// assert_eq!(entity_id(7).to_string(), "00000000-0000-4000-8000-000000000007");
    /// ```
    pub fn entity_id(n: u64) -> EntityId {
        EntityId::new(format!("00000000-0000-4000-8000-{n:012}")).unwrap_or_else(|err| {
            panic!("fixture id {n} must be a valid UUID: {err}");
        })
    }

    /// Builder over [`Dataset`] used by tests.
    #[derive(Debug, Clone)]
    pub struct DatasetBuilder {
        dataset: Dataset,
        next_id: u64,
    }

    impl DatasetBuilder {
        /// Start from both member tiers and nothing else.
        pub fn new() -> Self {
            Self {
                dataset: Dataset {
                    member_types: vec![
                        MemberTier {
                            id: MemberTierId::Basic,
                            discount: 2.3,
                            posts_limit_per_month: 20,
                        },
                        MemberTier {
                            id: MemberTierId::Business,
                            discount: 7.7,
                            posts_limit_per_month: 100,
                        },
                    ],
                    ..Dataset::default()
                },
                next_id: 1000,
            }
        }

        fn fresh_id(&mut self) -> EntityId {
            self.next_id += 1;
            entity_id(self.next_id)
        }

        /// Add a user and return its id.
        pub fn user(&mut self, name: &str) -> EntityId {
            let id = self.fresh_id();
            self.dataset.users.push(User {
                id,
                name: name.to_owned(),
                balance: 100.0,
            });
            id
        }

        /// Add a profile for `user` on `tier` and return its id.
        pub fn profile(&mut self, user: EntityId, tier: MemberTierId) -> EntityId {
            let id = self.fresh_id();
            self.dataset.profiles.push(Profile {
                id,
                is_male: true,
                year_of_birth: 1990,
                user_id: user,
                member_type_id: tier,
            });
            id
        }

        /// Add a post by `author` and return its id.
        pub fn post(&mut self, author: EntityId, title: &str) -> EntityId {
            let id = self.fresh_id();
            self.dataset.posts.push(Post {
                id,
                title: title.to_owned(),
                content: format!("{title} body"),
                author_id: author,
            });
            id
        }

        /// Record that `subscriber` follows `author`.
        pub fn follow(&mut self, subscriber: EntityId, author: EntityId) -> &mut Self {
            self.dataset.subscriptions.push(Subscription {
                subscriber_id: subscriber,
                author_id: author,
            });
            self
        }

        /// Finish the dataset.
        pub fn build(&self) -> Dataset {
            self.dataset.clone()
        }

        /// Finish into an in-memory store.
        pub fn store(&self) -> InMemoryRecordStore {
            InMemoryRecordStore::try_from(self.build())
                .unwrap_or_else(|err| panic!("fixture dataset must be valid: {err}"))
        }
    }
}

/// One call observed by a [`RecordingStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    GetById {
        kind: RecordKind,
        id: RecordId,
    },
    GetManyByIds {
        kind: RecordKind,
        ids: BTreeSet<RecordId>,
    },
    ScanAll {
        kind: RecordKind,
    },
    ScanByForeignKey {
        foreign_key: ForeignKey,
        value: RecordId,
    },
    ScanAssociation {
        end: SubscriptionEnd,
        user: EntityId,
    },
}

impl StoreCall {
    /// Kind of the records the call returns, if it returns keyed records.
    pub fn kind(&self) -> Option<RecordKind> {
        match self {
            Self::GetById { kind, .. }
            | Self::GetManyByIds { kind, .. }
            | Self::ScanAll { kind } => Some(*kind),
            Self::ScanByForeignKey { foreign_key, .. } => Some(foreign_key.kind()),
            Self::ScanAssociation { .. } => None,
        }
    }

    /// Whether the call is a keyed lookup.
    pub fn is_keyed(&self) -> bool {
        matches!(self, Self::GetById { .. } | Self::GetManyByIds { .. })
    }

    /// Keys a keyed lookup asked for.
    pub fn keys(&self) -> Vec<RecordId> {
        match self {
            Self::GetById { id, .. } => vec![*id],
            Self::GetManyByIds { ids, .. } => ids.iter().copied().collect(),
            _ => Vec::new(),
        }
    }
}

type CallMatcher = Box<dyn Fn(&StoreCall) -> bool + Send + Sync>;

/// [`RecordStore`] decorator that records every call and can fail chosen
/// calls.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use feedgraph::domain::ports::StoreError;
/// use feedgraph::test_support::{RecordingStore, StoreCall};
/// use feedgraph::outbound::memory::InMemoryRecordStore;
///
/// let store = RecordingStore::new(Arc::new(InMemoryRecordStore::default()))
///     .fail_when(|call| matches!(call, StoreCall::ScanAll { .. }), StoreError::connection("down"));
/// assert!(store.calls().is_empty());
/// ```
pub struct RecordingStore {
    inner: Arc<dyn RecordStore>,
    calls: Mutex<Vec<StoreCall>>,
    failures: Vec<(CallMatcher, StoreError)>,
}

impl RecordingStore {
    /// Wrap `inner`.
    pub fn new(inner: Arc<dyn RecordStore>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            failures: Vec::new(),
        }
    }

    /// Fail every call matching `matcher` with `error`. The call is still
    /// recorded.
    #[must_use]
    pub fn fail_when(
        mut self,
        matcher: impl Fn(&StoreCall) -> bool + Send + Sync + 'static,
        error: StoreError,
    ) -> Self {
        self.failures.push((Box::new(matcher), error));
        self
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&StoreCall) -> bool) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|call| predicate(call))
            .count()
    }

    /// Number of keyed lookups for `kind`.
    pub fn keyed_fetches(&self, kind: RecordKind) -> usize {
        self.count(|call| call.is_keyed() && call.kind() == Some(kind))
    }

    /// How often `id` of `kind` was requested by keyed lookups.
    pub fn fetches_of(&self, kind: RecordKind, id: RecordId) -> usize {
        self.count(|call| {
            call.is_keyed() && call.kind() == Some(kind) && call.keys().contains(&id)
        })
    }

    fn observe(&self, call: StoreCall) -> Result<(), StoreError> {
        let failure = self
            .failures
            .iter()
            .find(|(matcher, _)| matcher(&call))
            .map(|(_, error)| error.clone());
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
        failure.map_or(Ok(()), Err)
    }
}

#[async_trait]
impl RecordStore for RecordingStore {
    async fn get_by_id(
        &self,
        kind: RecordKind,
        id: &RecordId,
    ) -> Result<Option<Record>, StoreError> {
        self.observe(StoreCall::GetById { kind, id: *id })?;
        self.inner.get_by_id(kind, id).await
    }

    async fn get_many_by_ids(
        &self,
        kind: RecordKind,
        ids: &BTreeSet<RecordId>,
    ) -> Result<HashMap<RecordId, Record>, StoreError> {
        self.observe(StoreCall::GetManyByIds {
            kind,
            ids: ids.clone(),
        })?;
        self.inner.get_many_by_ids(kind, ids).await
    }

    async fn scan_all(&self, kind: RecordKind) -> Result<Vec<Record>, StoreError> {
        self.observe(StoreCall::ScanAll { kind })?;
        self.inner.scan_all(kind).await
    }

    async fn scan_by_foreign_key(
        &self,
        foreign_key: ForeignKey,
        value: &RecordId,
    ) -> Result<Vec<Record>, StoreError> {
        self.observe(StoreCall::ScanByForeignKey {
            foreign_key,
            value: *value,
        })?;
        self.inner.scan_by_foreign_key(foreign_key, value).await
    }

    async fn scan_association(
        &self,
        end: SubscriptionEnd,
        user: &EntityId,
    ) -> Result<Vec<Subscription>, StoreError> {
        self.observe(StoreCall::ScanAssociation { end, user: *user })?;
        self.inner.scan_association(end, user).await
    }
}
