//! Internal Diesel row structs.
//!
//! Rows never leave the persistence layer; [`IntoRecord`] turns them into
//! domain records, rejecting values the domain cannot represent.

use diesel::prelude::*;
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::StoreError;
use crate::domain::{EntityId, MemberTier, MemberTierId, Post, Profile, Record, Subscription, User};

use super::schema::{member_types, posts, profiles, subscribers_on_users, users};

/// Conversion from a row into a domain record.
pub(crate) trait IntoRecord {
    fn into_record(self) -> Result<Record, StoreError>;
}

fn tier_id(raw: &str) -> Result<MemberTierId, StoreError> {
    raw.parse().map_err(|err| {
        warn!(value = raw, "unexpected member type id in database");
        StoreError::query(format!("invalid member type row: {err}"))
    })
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = member_types)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MemberTypeRow {
    pub id: String,
    pub discount: f64,
    pub posts_limit_per_month: i32,
}

impl IntoRecord for MemberTypeRow {
    fn into_record(self) -> Result<Record, StoreError> {
        let posts_limit_per_month = u32::try_from(self.posts_limit_per_month).map_err(|_| {
            StoreError::query(format!(
                "member type {} has a negative posts limit",
                self.id
            ))
        })?;
        Ok(Record::from(MemberTier {
            id: tier_id(&self.id)?,
            discount: self.discount,
            posts_limit_per_month,
        }))
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub balance: f64,
}

impl IntoRecord for UserRow {
    fn into_record(self) -> Result<Record, StoreError> {
        Ok(Record::from(User {
            id: EntityId::from_uuid(self.id),
            name: self.name,
            balance: self.balance,
        }))
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProfileRow {
    pub id: Uuid,
    pub is_male: bool,
    pub year_of_birth: i32,
    pub user_id: Uuid,
    pub member_type_id: String,
}

impl IntoRecord for ProfileRow {
    fn into_record(self) -> Result<Record, StoreError> {
        Ok(Record::from(Profile {
            id: EntityId::from_uuid(self.id),
            is_male: self.is_male,
            year_of_birth: self.year_of_birth,
            user_id: EntityId::from_uuid(self.user_id),
            member_type_id: tier_id(&self.member_type_id)?,
        }))
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PostRow {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
}

impl IntoRecord for PostRow {
    fn into_record(self) -> Result<Record, StoreError> {
        Ok(Record::from(Post {
            id: EntityId::from_uuid(self.id),
            title: self.title,
            content: self.content,
            author_id: EntityId::from_uuid(self.author_id),
        }))
    }
}

#[derive(Debug, Clone, Copy, Queryable, Selectable)]
#[diesel(table_name = subscribers_on_users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SubscriptionRow {
    pub subscriber_id: Uuid,
    pub author_id: Uuid,
}

impl From<SubscriptionRow> for Subscription {
    fn from(row: SubscriptionRow) -> Self {
        Self {
            subscriber_id: EntityId::from_uuid(row.subscriber_id),
            author_id: EntityId::from_uuid(row.author_id),
        }
    }
}

/// Convert a batch of rows, failing on the first unrepresentable one.
pub(crate) fn into_records<R: IntoRecord>(rows: Vec<R>) -> Result<Vec<Record>, StoreError> {
    rows.into_iter().map(IntoRecord::into_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn member_type_rows_convert_to_tiers() {
        let record = MemberTypeRow {
            id: "business".into(),
            discount: 7.7,
            posts_limit_per_month: 100,
        }
        .into_record()
        .expect("valid row");
        assert_eq!(record.scalar("postsLimitPerMonth"), Some(100.into()));
    }

    #[rstest]
    #[case("gold", 10)]
    #[case("basic", -1)]
    fn invalid_member_type_rows_are_query_errors(#[case] id: &str, #[case] limit: i32) {
        let err = MemberTypeRow {
            id: id.into(),
            discount: 1.0,
            posts_limit_per_month: limit,
        }
        .into_record()
        .expect_err("row is rejected");
        assert!(matches!(err, StoreError::Query { .. }));
    }

    #[rstest]
    fn profile_rows_keep_their_foreign_keys() {
        let user_id = Uuid::new_v4();
        let record = ProfileRow {
            id: Uuid::new_v4(),
            is_male: true,
            year_of_birth: 1912,
            user_id,
            member_type_id: "basic".into(),
        }
        .into_record()
        .expect("valid row");
        assert_eq!(record.scalar("userId"), Some(user_id.to_string().into()));
        assert_eq!(record.scalar("memberTypeId"), Some("basic".into()));
    }
}
