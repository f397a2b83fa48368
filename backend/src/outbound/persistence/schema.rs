//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. `diesel
//! print-schema` regenerates them from a live database.

diesel::table! {
    /// Membership tier reference data keyed by tier name.
    member_types (id) {
        /// `basic` or `business`.
        id -> Varchar,
        discount -> Float8,
        posts_limit_per_month -> Int4,
    }
}

diesel::table! {
    users (id) {
        id -> Uuid,
        name -> Varchar,
        balance -> Float8,
    }
}

diesel::table! {
    /// At most one profile per user.
    profiles (id) {
        id -> Uuid,
        is_male -> Bool,
        year_of_birth -> Int4,
        user_id -> Uuid,
        member_type_id -> Varchar,
    }
}

diesel::table! {
    posts (id) {
        id -> Uuid,
        title -> Varchar,
        content -> Text,
        author_id -> Uuid,
    }
}

diesel::table! {
    /// Directed follow relation. The surrogate key preserves insertion
    /// order and allows repeated pairs.
    subscribers_on_users (id) {
        id -> Int8,
        subscriber_id -> Uuid,
        author_id -> Uuid,
    }
}

diesel::joinable!(profiles -> member_types (member_type_id));
diesel::joinable!(profiles -> users (user_id));
diesel::joinable!(posts -> users (author_id));

diesel::allow_tables_to_appear_in_same_query!(
    member_types,
    users,
    profiles,
    posts,
    subscribers_on_users,
);
