//! PostgreSQL-backed `RecordStore` implementation using Diesel.
//!
//! Keyed lookups use `= ANY` filters so one batch window costs one round
//! trip. Scans are ordered by primary key, and association scans by the
//! surrogate row id, which follows insertion order.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{ForeignKey, RecordStore, StoreError, SubscriptionEnd};
use crate::domain::{EntityId, MemberTierId, Record, RecordId, RecordKind, Subscription};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{
    MemberTypeRow, PostRow, ProfileRow, SubscriptionRow, UserRow, into_records,
};
use super::pool::DbPool;
use super::schema::{member_types, posts, profiles, subscribers_on_users, users};

/// Diesel-backed implementation of the record store port.
#[derive(Clone)]
pub struct DieselRecordStore {
    pool: DbPool,
}

impl DieselRecordStore {
    /// Create a store reading through `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn entity_uuids(ids: &BTreeSet<RecordId>) -> Vec<Uuid> {
    ids.iter()
        .filter_map(RecordId::as_entity)
        .map(|id| *id.as_uuid())
        .collect()
}

fn tier_names(ids: &BTreeSet<RecordId>) -> Vec<&'static str> {
    ids.iter()
        .filter_map(RecordId::as_member_tier)
        .map(MemberTierId::as_str)
        .collect()
}

fn expect_entity(foreign_key: ForeignKey, value: &RecordId) -> Result<Uuid, StoreError> {
    value.as_entity().map(|id| *id.as_uuid()).ok_or_else(|| {
        StoreError::query(format!(
            "{} expects a UUID, got {value}",
            foreign_key.column()
        ))
    })
}

#[async_trait]
impl RecordStore for DieselRecordStore {
    async fn get_by_id(
        &self,
        kind: RecordKind,
        id: &RecordId,
    ) -> Result<Option<Record>, StoreError> {
        let ids = BTreeSet::from([*id]);
        let mut found = self.get_many_by_ids(kind, &ids).await?;
        Ok(found.remove(id))
    }

    async fn get_many_by_ids(
        &self,
        kind: RecordKind,
        ids: &BTreeSet<RecordId>,
    ) -> Result<HashMap<RecordId, Record>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        debug!(kind = kind.as_str(), batch = ids.len(), "loading records by id");

        let records = match kind {
            RecordKind::MemberTier => into_records(
                member_types::table
                    .filter(member_types::id.eq_any(tier_names(ids)))
                    .select(MemberTypeRow::as_select())
                    .load(&mut conn)
                    .await
                    .map_err(map_diesel_error)?,
            )?,
            RecordKind::User => into_records(
                users::table
                    .filter(users::id.eq_any(entity_uuids(ids)))
                    .select(UserRow::as_select())
                    .load(&mut conn)
                    .await
                    .map_err(map_diesel_error)?,
            )?,
            RecordKind::Profile => into_records(
                profiles::table
                    .filter(profiles::id.eq_any(entity_uuids(ids)))
                    .select(ProfileRow::as_select())
                    .load(&mut conn)
                    .await
                    .map_err(map_diesel_error)?,
            )?,
            RecordKind::Post => into_records(
                posts::table
                    .filter(posts::id.eq_any(entity_uuids(ids)))
                    .select(PostRow::as_select())
                    .load(&mut conn)
                    .await
                    .map_err(map_diesel_error)?,
            )?,
        };

        Ok(records
            .into_iter()
            .map(|record| (record.id(), record))
            .collect())
    }

    async fn scan_all(&self, kind: RecordKind) -> Result<Vec<Record>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        match kind {
            RecordKind::MemberTier => into_records(
                member_types::table
                    .order(member_types::id)
                    .select(MemberTypeRow::as_select())
                    .load(&mut conn)
                    .await
                    .map_err(map_diesel_error)?,
            ),
            RecordKind::User => into_records(
                users::table
                    .order(users::id)
                    .select(UserRow::as_select())
                    .load(&mut conn)
                    .await
                    .map_err(map_diesel_error)?,
            ),
            RecordKind::Profile => into_records(
                profiles::table
                    .order(profiles::id)
                    .select(ProfileRow::as_select())
                    .load(&mut conn)
                    .await
                    .map_err(map_diesel_error)?,
            ),
            RecordKind::Post => into_records(
                posts::table
                    .order(posts::id)
                    .select(PostRow::as_select())
                    .load(&mut conn)
                    .await
                    .map_err(map_diesel_error)?,
            ),
        }
    }

    async fn scan_by_foreign_key(
        &self,
        foreign_key: ForeignKey,
        value: &RecordId,
    ) -> Result<Vec<Record>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        match foreign_key {
            ForeignKey::ProfileUser => into_records(
                profiles::table
                    .filter(profiles::user_id.eq(expect_entity(foreign_key, value)?))
                    .order(profiles::id)
                    .select(ProfileRow::as_select())
                    .load(&mut conn)
                    .await
                    .map_err(map_diesel_error)?,
            ),
            ForeignKey::PostAuthor => into_records(
                posts::table
                    .filter(posts::author_id.eq(expect_entity(foreign_key, value)?))
                    .order(posts::id)
                    .select(PostRow::as_select())
                    .load(&mut conn)
                    .await
                    .map_err(map_diesel_error)?,
            ),
        }
    }

    async fn scan_association(
        &self,
        end: SubscriptionEnd,
        user: &EntityId,
    ) -> Result<Vec<Subscription>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let user = *user.as_uuid();

        let rows: Vec<SubscriptionRow> = match end {
            SubscriptionEnd::Subscriber => {
                subscribers_on_users::table
                    .filter(subscribers_on_users::subscriber_id.eq(user))
                    .order(subscribers_on_users::id)
                    .select(SubscriptionRow::as_select())
                    .load(&mut conn)
                    .await
            }
            SubscriptionEnd::Author => {
                subscribers_on_users::table
                    .filter(subscribers_on_users::author_id.eq(user))
                    .order(subscribers_on_users::id)
                    .select(SubscriptionRow::as_select())
                    .load(&mut conn)
                    .await
            }
        }
        .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(Subscription::from).collect())
    }
}
