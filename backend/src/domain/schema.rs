//! Static description of the exposed object types.
//!
//! The driver consults this table to learn, for every selected field, which
//! resolver answers it, what shape the value has and whether null is allowed.

use super::records::RecordKind;

/// Object types reachable from the query root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Query,
    MemberType,
    User,
    Profile,
    Post,
}

/// Relations between records, one resolver each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// `Profile.memberType`.
    ProfileMemberType,
    /// `User.profile`.
    UserProfile,
    /// `User.posts`.
    UserPosts,
    /// `User.subscribedTo`: users this user follows.
    UserSubscribedTo,
    /// `User.subscribedFrom`: users following this user.
    UserSubscribedFrom,
    /// `Post.author`.
    PostAuthor,
}

/// Which resolver answers a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldResolver {
    /// `__typename`.
    Typename,
    /// A column of the parent record.
    Scalar,
    /// A relation starting at the parent record.
    Relation(Relation),
    /// A full scan of a kind at the query root.
    RootList(RecordKind),
    /// A single lookup by `id` at the query root.
    RootLookup(RecordKind),
}

/// Shape of a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Leaf,
    Object(ObjectType),
    /// List of non-null objects.
    List(ObjectType),
}

/// Resolver, shape and nullability of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub resolver: FieldResolver,
    pub shape: Shape,
    pub nullable: bool,
}

impl FieldDef {
    const fn scalar() -> Self {
        Self {
            resolver: FieldResolver::Scalar,
            shape: Shape::Leaf,
            nullable: false,
        }
    }

    const fn relation(relation: Relation, shape: Shape, nullable: bool) -> Self {
        Self {
            resolver: FieldResolver::Relation(relation),
            shape,
            nullable,
        }
    }

    const fn root(resolver: FieldResolver, shape: Shape) -> Self {
        Self {
            resolver,
            shape,
            nullable: true,
        }
    }
}

impl ObjectType {
    /// Type name reported by `__typename` and used by type conditions.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Query => "Query",
            Self::MemberType => "MemberType",
            Self::User => "User",
            Self::Profile => "Profile",
            Self::Post => "Post",
        }
    }

    /// Object type exposing records of `kind`.
    pub const fn for_kind(kind: RecordKind) -> Self {
        match kind {
            RecordKind::MemberTier => Self::MemberType,
            RecordKind::User => Self::User,
            RecordKind::Profile => Self::Profile,
            RecordKind::Post => Self::Post,
        }
    }

    /// Look up a field definition by name.
    pub fn field(self, name: &str) -> Option<FieldDef> {
        if name == "__typename" {
            return Some(FieldDef {
                resolver: FieldResolver::Typename,
                shape: Shape::Leaf,
                nullable: false,
            });
        }

        match (self, name) {
            (Self::Query, "memberTypes") => Some(root_list(RecordKind::MemberTier)),
            (Self::Query, "users") => Some(root_list(RecordKind::User)),
            (Self::Query, "profiles") => Some(root_list(RecordKind::Profile)),
            (Self::Query, "posts") => Some(root_list(RecordKind::Post)),
            (Self::Query, "memberType") => Some(root_lookup(RecordKind::MemberTier)),
            (Self::Query, "user") => Some(root_lookup(RecordKind::User)),
            (Self::Query, "profile") => Some(root_lookup(RecordKind::Profile)),
            (Self::Query, "post") => Some(root_lookup(RecordKind::Post)),

            (Self::MemberType, "id" | "discount" | "postsLimitPerMonth") => {
                Some(FieldDef::scalar())
            }

            (Self::User, "id" | "name" | "balance") => Some(FieldDef::scalar()),
            (Self::User, "profile") => Some(FieldDef::relation(
                Relation::UserProfile,
                Shape::Object(Self::Profile),
                true,
            )),
            (Self::User, "posts") => Some(FieldDef::relation(
                Relation::UserPosts,
                Shape::List(Self::Post),
                true,
            )),
            (Self::User, "subscribedTo") => Some(FieldDef::relation(
                Relation::UserSubscribedTo,
                Shape::List(Self::User),
                true,
            )),
            (Self::User, "subscribedFrom") => Some(FieldDef::relation(
                Relation::UserSubscribedFrom,
                Shape::List(Self::User),
                true,
            )),

            (Self::Profile, "id" | "isMale" | "yearOfBirth" | "userId" | "memberTypeId") => {
                Some(FieldDef::scalar())
            }
            (Self::Profile, "memberType") => Some(FieldDef::relation(
                Relation::ProfileMemberType,
                Shape::Object(Self::MemberType),
                true,
            )),

            (Self::Post, "id" | "title" | "content" | "authorId") => Some(FieldDef::scalar()),
            (Self::Post, "author") => Some(FieldDef::relation(
                Relation::PostAuthor,
                Shape::Object(Self::User),
                false,
            )),

            _ => None,
        }
    }
}

const fn root_list(kind: RecordKind) -> FieldDef {
    FieldDef::root(
        FieldResolver::RootList(kind),
        Shape::List(ObjectType::for_kind(kind)),
    )
}

const fn root_lookup(kind: RecordKind) -> FieldDef {
    FieldDef::root(
        FieldResolver::RootLookup(kind),
        Shape::Object(ObjectType::for_kind(kind)),
    )
}
