//! Port for reading records from the backing store.
//!
//! This is the only seam between the resolution engine and storage. Adapters
//! translate between their row representation and domain records; they hold
//! no business logic and never mutate data.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;

use crate::domain::{EntityId, Record, RecordId, RecordKind, Subscription};

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by record store adapters.
    pub enum StoreError {
        /// The store could not be reached.
        Connection { message: String } => "record store connection failed: {message}",
        /// A lookup or scan failed during execution.
        Query { message: String } => "record store query failed: {message}",
    }
}

/// Foreign-key columns that support filtered scans.
///
/// Each column belongs to exactly one record kind, so a scan by foreign key
/// never needs a separate kind argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForeignKey {
    /// `Profile.userId`.
    ProfileUser,
    /// `Post.authorId`.
    PostAuthor,
}

impl ForeignKey {
    /// Kind of the records carrying this column.
    pub const fn kind(self) -> RecordKind {
        match self {
            Self::ProfileUser => RecordKind::Profile,
            Self::PostAuthor => RecordKind::Post,
        }
    }

    /// Column name used in log fields.
    pub const fn column(self) -> &'static str {
        match self {
            Self::ProfileUser => "userId",
            Self::PostAuthor => "authorId",
        }
    }
}

/// End of the subscription association a scan filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionEnd {
    /// Rows where the user is the follower.
    Subscriber,
    /// Rows where the user is the followed author.
    Author,
}

impl SubscriptionEnd {
    /// Column name used in log fields.
    pub const fn column(self) -> &'static str {
        match self {
            Self::Subscriber => "subscriberId",
            Self::Author => "authorId",
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch one record by key.
    async fn get_by_id(&self, kind: RecordKind, id: &RecordId)
        -> Result<Option<Record>, StoreError>;

    /// Fetch many records of one kind. Missing ids are omitted from the map.
    async fn get_many_by_ids(
        &self,
        kind: RecordKind,
        ids: &BTreeSet<RecordId>,
    ) -> Result<HashMap<RecordId, Record>, StoreError>;

    /// Return every record of a kind in a deterministic order.
    async fn scan_all(&self, kind: RecordKind) -> Result<Vec<Record>, StoreError>;

    /// Return the records whose foreign key equals `value`, in a deterministic
    /// order.
    async fn scan_by_foreign_key(
        &self,
        foreign_key: ForeignKey,
        value: &RecordId,
    ) -> Result<Vec<Record>, StoreError>;

    /// Return subscription rows whose `end` column equals `user`.
    async fn scan_association(
        &self,
        end: SubscriptionEnd,
        user: &EntityId,
    ) -> Result<Vec<Subscription>, StoreError>;
}
