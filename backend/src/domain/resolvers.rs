//! Field resolvers.
//!
//! Every resolver maps a parent record (or nothing, at the query root) plus
//! the field's arguments to a [`Resolution`]. Keyed lookups are only enqueued
//! on the batch cache here; the driver flushes the window once for all
//! resolvers of a selection set and then settles each resolution.

use std::sync::Arc;

use serde_json::Value;

use super::batch_cache::{BatchCache, Slot};
use super::ports::{ForeignKey, SubscriptionEnd};
use super::response::ResolveError;
use super::schema::{FieldDef, FieldResolver, ObjectType, Relation};
use super::selection::{Field, InputValue};
use super::{EntityId, Post, Profile, Record, RecordId, RecordKind, User};

/// Outcome of a resolver before the batch window is flushed.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A leaf value.
    Value(Value),
    /// A single record already in hand, or none.
    Record(Option<Arc<Record>>),
    /// Records already in hand.
    Records(Vec<Arc<Record>>),
    /// A record waiting on the batch window.
    Deferred(RecordKind, RecordId),
    /// Records waiting on the batch window, in this order.
    DeferredList(RecordKind, Vec<RecordId>),
}

/// A resolution after the batch window was flushed.
#[derive(Debug, Clone, PartialEq)]
pub enum Settled {
    Leaf(Value),
    Object(Option<Arc<Record>>),
    List(Vec<Arc<Record>>),
}

impl Resolution {
    /// Read deferred keys back from the cache.
    ///
    /// A missing single record settles as null. Missing list members are
    /// omitted. A failed batch fails the field.
    pub async fn settle(self, cache: &BatchCache) -> Result<Settled, ResolveError> {
        match self {
            Self::Value(value) => Ok(Settled::Leaf(value)),
            Self::Record(record) => Ok(Settled::Object(record)),
            Self::Records(records) => Ok(Settled::List(records)),
            Self::Deferred(kind, id) => match cache.resolve(kind, id).await {
                Slot::Found(record) => Ok(Settled::Object(Some(record))),
                Slot::Missing => Ok(Settled::Object(None)),
                Slot::Failed(error) => Err(error.into()),
            },
            Self::DeferredList(kind, ids) => {
                let mut records = Vec::with_capacity(ids.len());
                for id in ids {
                    match cache.resolve(kind, id).await {
                        Slot::Found(record) => records.push(record),
                        Slot::Missing => {}
                        Slot::Failed(error) => return Err(error.into()),
                    }
                }
                Ok(Settled::List(records))
            }
        }
    }
}

/// Reject arguments the field does not declare.
///
/// Root lookups take a single `id`; no other field takes arguments.
pub fn check_arguments(object: ObjectType, def: &FieldDef, field: &Field) -> Result<(), ResolveError> {
    let accepted: &[&str] = match def.resolver {
        FieldResolver::RootLookup(_) => &["id"],
        _ => &[],
    };
    match field
        .arguments
        .keys()
        .find(|name| !accepted.contains(&name.as_str()))
    {
        Some(name) => Err(ResolveError::validation(format!(
            "Unknown argument \"{name}\" on field \"{}.{}\".",
            object.name(),
            field.name
        ))),
        None => Ok(()),
    }
}

/// Run the resolver declared for `field` on `parent`.
pub async fn resolve(
    cache: &BatchCache,
    object: ObjectType,
    def: FieldDef,
    field: &Field,
    parent: Option<&Record>,
) -> Result<Resolution, ResolveError> {
    match def.resolver {
        FieldResolver::Typename => Ok(Resolution::Value(Value::from(object.name()))),
        FieldResolver::Scalar => parent
            .and_then(|record| record.scalar(&field.name))
            .map(Resolution::Value)
            .ok_or_else(|| unknown_field(object, field)),
        FieldResolver::RootList(kind) => root_list(cache, kind).await,
        FieldResolver::RootLookup(kind) => root_lookup(cache, kind, field),
        FieldResolver::Relation(relation) => match (relation, parent) {
            (Relation::ProfileMemberType, Some(Record::Profile(profile))) => {
                Ok(profile_member_type(cache, profile))
            }
            (Relation::UserProfile, Some(Record::User(user))) => user_profile(cache, user).await,
            (Relation::UserPosts, Some(Record::User(user))) => user_posts(cache, user).await,
            (Relation::UserSubscribedTo, Some(Record::User(user))) => {
                user_subscribed_to(cache, user).await
            }
            (Relation::UserSubscribedFrom, Some(Record::User(user))) => {
                user_subscribed_from(cache, user).await
            }
            (Relation::PostAuthor, Some(Record::Post(post))) => Ok(post_author(cache, post)),
            _ => Err(unknown_field(object, field)),
        },
    }
}

fn unknown_field(object: ObjectType, field: &Field) -> ResolveError {
    ResolveError::validation(format!(
        "Cannot query field \"{}\" on type \"{}\".",
        field.name,
        object.name()
    ))
}

/// `Profile.memberType`.
pub fn profile_member_type(cache: &BatchCache, profile: &Profile) -> Resolution {
    defer(cache, RecordKind::MemberTier, profile.member_type_id.into())
}

/// `User.profile`: the first profile referencing the user, if any.
pub async fn user_profile(cache: &BatchCache, user: &User) -> Result<Resolution, ResolveError> {
    let profiles = cache
        .scan_by_foreign_key(ForeignKey::ProfileUser, user.id.into())
        .await?;
    Ok(Resolution::Record(profiles.into_iter().next()))
}

/// `User.posts`, in store order.
pub async fn user_posts(cache: &BatchCache, user: &User) -> Result<Resolution, ResolveError> {
    let posts = cache
        .scan_by_foreign_key(ForeignKey::PostAuthor, user.id.into())
        .await?;
    Ok(Resolution::Records(posts))
}

/// `User.subscribedTo`: the authors this user follows.
pub async fn user_subscribed_to(
    cache: &BatchCache,
    user: &User,
) -> Result<Resolution, ResolveError> {
    let rows = cache
        .scan_association(SubscriptionEnd::Subscriber, user.id)
        .await?;
    Ok(defer_users(
        cache,
        rows.iter().map(|subscription| subscription.author_id),
    ))
}

/// `User.subscribedFrom`: the subscribers following this user.
pub async fn user_subscribed_from(
    cache: &BatchCache,
    user: &User,
) -> Result<Resolution, ResolveError> {
    let rows = cache.scan_association(SubscriptionEnd::Author, user.id).await?;
    Ok(defer_users(
        cache,
        rows.iter().map(|subscription| subscription.subscriber_id),
    ))
}

/// `Post.author`.
pub fn post_author(cache: &BatchCache, post: &Post) -> Resolution {
    defer(cache, RecordKind::User, post.author_id.into())
}

/// Root list fields: every record of `kind`.
pub async fn root_list(cache: &BatchCache, kind: RecordKind) -> Result<Resolution, ResolveError> {
    Ok(Resolution::Records(cache.scan_all(kind).await?))
}

/// Root lookup fields. The `id` argument is validated before anything is
/// enqueued.
pub fn root_lookup(
    cache: &BatchCache,
    kind: RecordKind,
    field: &Field,
) -> Result<Resolution, ResolveError> {
    let id = lookup_id(kind, field)?;
    Ok(defer(cache, kind, id))
}

fn defer(cache: &BatchCache, kind: RecordKind, id: RecordId) -> Resolution {
    cache.enqueue(kind, id);
    Resolution::Deferred(kind, id)
}

fn defer_users(cache: &BatchCache, ids: impl Iterator<Item = EntityId>) -> Resolution {
    let ids: Vec<RecordId> = ids
        .map(|id| {
            let id = RecordId::from(id);
            cache.enqueue(RecordKind::User, id);
            id
        })
        .collect();
    Resolution::DeferredList(RecordKind::User, ids)
}

const fn id_type(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::MemberTier => "MemberTypeId",
        RecordKind::User | RecordKind::Profile | RecordKind::Post => "UUID",
    }
}

fn lookup_id(kind: RecordKind, field: &Field) -> Result<RecordId, ResolveError> {
    let value = field.argument("id").ok_or_else(|| {
        ResolveError::validation(format!(
            "Field \"{}\" argument \"id\" of type \"{}!\" is required but not provided.",
            field.name,
            id_type(kind)
        ))
    })?;
    let raw = match (kind, value) {
        (RecordKind::MemberTier, InputValue::Enum(raw)) | (_, InputValue::String(raw)) => raw,
        (_, other) => {
            return Err(ResolveError::validation(format!(
                "Argument \"id\" of field \"{}\" expects {} but received {}.",
                field.name,
                id_type(kind),
                other.describe()
            )));
        }
    };
    Ok(RecordId::parse(kind, raw)?)
}
