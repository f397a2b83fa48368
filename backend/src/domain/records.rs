//! Record shapes read by the resolution engine.
//!
//! Records are immutable from the engine's point of view. Field names follow
//! the camelCase wire names used by seed files and response trees.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::{EntityId, MemberTierId, RecordId};

/// Kinds of keyed records held by a store.
///
/// Subscriptions are association rows and are only reachable through
/// association scans, so they have no kind of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKind {
    MemberTier,
    User,
    Profile,
    Post,
}

impl RecordKind {
    /// Human readable name used in log fields and error messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MemberTier => "member_tier",
            Self::User => "user",
            Self::Profile => "profile",
            Self::Post => "post",
        }
    }
}

/// Membership tier reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberTier {
    pub id: MemberTierId,
    /// Percentage discount, 0 to 100.
    pub discount: f64,
    pub posts_limit_per_month: u32,
}

/// Registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: EntityId,
    pub name: String,
    pub balance: f64,
}

/// Optional one-to-one profile of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: EntityId,
    pub is_male: bool,
    pub year_of_birth: i32,
    pub user_id: EntityId,
    pub member_type_id: MemberTierId,
}

/// Post written by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: EntityId,
    pub title: String,
    pub content: String,
    pub author_id: EntityId,
}

/// Directed association row: `subscriber_id` follows `author_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub subscriber_id: EntityId,
    pub author_id: EntityId,
}

/// Any keyed record.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    MemberTier(MemberTier),
    User(User),
    Profile(Profile),
    Post(Post),
}

impl Record {
    /// Kind of the wrapped record.
    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::MemberTier(_) => RecordKind::MemberTier,
            Self::User(_) => RecordKind::User,
            Self::Profile(_) => RecordKind::Profile,
            Self::Post(_) => RecordKind::Post,
        }
    }

    /// Primary key of the wrapped record.
    pub const fn id(&self) -> RecordId {
        match self {
            Self::MemberTier(tier) => RecordId::MemberTier(tier.id),
            Self::User(user) => RecordId::Entity(user.id),
            Self::Profile(profile) => RecordId::Entity(profile.id),
            Self::Post(post) => RecordId::Entity(post.id),
        }
    }

    /// Read a scalar column by its wire name.
    ///
    /// Returns `None` when the record has no such column.
    pub fn scalar(&self, field: &str) -> Option<Value> {
        match self {
            Self::MemberTier(tier) => match field {
                "id" => Some(Value::from(tier.id.as_str())),
                "discount" => Some(Value::from(tier.discount)),
                "postsLimitPerMonth" => Some(Value::from(tier.posts_limit_per_month)),
                _ => None,
            },
            Self::User(user) => match field {
                "id" => Some(Value::from(user.id.to_string())),
                "name" => Some(Value::from(user.name.as_str())),
                "balance" => Some(Value::from(user.balance)),
                _ => None,
            },
            Self::Profile(profile) => match field {
                "id" => Some(Value::from(profile.id.to_string())),
                "isMale" => Some(Value::from(profile.is_male)),
                "yearOfBirth" => Some(Value::from(profile.year_of_birth)),
                "userId" => Some(Value::from(profile.user_id.to_string())),
                "memberTypeId" => Some(Value::from(profile.member_type_id.as_str())),
                _ => None,
            },
            Self::Post(post) => match field {
                "id" => Some(Value::from(post.id.to_string())),
                "title" => Some(Value::from(post.title.as_str())),
                "content" => Some(Value::from(post.content.as_str())),
                "authorId" => Some(Value::from(post.author_id.to_string())),
                _ => None,
            },
        }
    }
}

impl From<MemberTier> for Record {
    fn from(value: MemberTier) -> Self {
        Self::MemberTier(value)
    }
}

impl From<User> for Record {
    fn from(value: User) -> Self {
        Self::User(value)
    }
}

impl From<Profile> for Record {
    fn from(value: Profile) -> Self {
        Self::Profile(value)
    }
}

impl From<Post> for Record {
    fn from(value: Post) -> Self {
        Self::Post(value)
    }
}
