//! Tests for selection-tree resolution: batching, memoization, null
//! propagation and error attribution.

use super::*;
use crate::domain::ports::{ForeignKey, StoreError};
use crate::domain::{EntityId, InputValue, MemberTierId, RecordId, RecordKind};
use crate::test_support::fixtures::{DatasetBuilder, entity_id};
use crate::test_support::{RecordingStore, StoreCall};
use insta::assert_json_snapshot;
use rstest::rstest;
use serde_json::json;

fn field(name: &str) -> Field {
    Field::new(name)
}

fn object(name: &str, selection: Vec<Field>) -> Field {
    Field::new(name).with_selection(selection)
}

fn user_lookup(id: EntityId, selection: Vec<Field>) -> Field {
    object("user", selection).with_argument("id", InputValue::String(id.to_string()))
}

fn recording(builder: &DatasetBuilder) -> Arc<RecordingStore> {
    Arc::new(RecordingStore::new(Arc::new(builder.store())))
}

async fn execute(store: &Arc<RecordingStore>, selection: Vec<Field>) -> GraphqlResponse {
    let store: Arc<dyn RecordStore> = store.clone();
    ResolutionDriver::new(store).execute(&selection).await
}

#[rstest]
#[tokio::test]
async fn sibling_profiles_share_one_member_type_fetch() {
    let mut builder = DatasetBuilder::new();
    for n in 0..5 {
        let user = builder.user(&format!("user-{n}"));
        let tier = if n % 2 == 0 {
            MemberTierId::Basic
        } else {
            MemberTierId::Business
        };
        builder.profile(user, tier);
    }
    let store = recording(&builder);

    let response = execute(
        &store,
        vec![object(
            "users",
            vec![object(
                "profile",
                vec![object("memberType", vec![field("id"), field("discount")])],
            )],
        )],
    )
    .await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(store.keyed_fetches(RecordKind::MemberTier), 1);
    assert!(store.calls().contains(&StoreCall::GetManyByIds {
        kind: RecordKind::MemberTier,
        ids: [MemberTierId::Basic, MemberTierId::Business]
            .map(RecordId::from)
            .into(),
    }));
    assert_eq!(
        response.pointer("/users/1/profile/memberType/id"),
        Some(&json!("business"))
    );
}

#[rstest]
#[tokio::test]
async fn aliased_lookups_of_one_user_fetch_it_once() {
    let mut builder = DatasetBuilder::new();
    let ada = builder.user("Ada");
    let store = recording(&builder);

    let response = execute(
        &store,
        vec![
            user_lookup(ada, vec![field("name")]).with_alias("first"),
            user_lookup(ada, vec![field("id")]).with_alias("second"),
        ],
    )
    .await;

    assert_eq!(store.fetches_of(RecordKind::User, ada.into()), 1);
    assert_eq!(response.pointer("/first/name"), Some(&json!("Ada")));
    assert_eq!(response.pointer("/second/id"), Some(&json!(ada.to_string())));
}

#[rstest]
#[tokio::test]
async fn missing_profiles_short_circuit_their_children() {
    let mut builder = DatasetBuilder::new();
    let loner = builder.user("Loner");
    let store = recording(&builder);

    let response = execute(
        &store,
        vec![user_lookup(
            loner,
            vec![object("profile", vec![object("memberType", vec![field("id")])])],
        )],
    )
    .await;

    assert!(response.errors.is_empty());
    assert_eq!(response.data, Some(json!({"user": {"profile": null}})));
    assert_eq!(store.keyed_fetches(RecordKind::MemberTier), 0);
}

#[rstest]
#[tokio::test]
async fn cyclic_subscriptions_terminate_with_each_user_fetched_once() {
    let mut builder = DatasetBuilder::new();
    let a = builder.user("A");
    let b = builder.user("B");
    builder.follow(a, b).follow(b, a);
    let store = recording(&builder);

    let response = execute(
        &store,
        vec![user_lookup(
            a,
            vec![object(
                "subscribedTo",
                vec![field("name"), object("subscribedTo", vec![field("id")])],
            )],
        )],
    )
    .await;

    assert!(response.errors.is_empty());
    assert_eq!(
        response.data,
        Some(json!({
            "user": {
                "subscribedTo": [{
                    "name": "B",
                    "subscribedTo": [{"id": a.to_string()}],
                }],
            },
        }))
    );
    assert_eq!(store.fetches_of(RecordKind::User, a.into()), 1);
    assert_eq!(store.fetches_of(RecordKind::User, b.into()), 1);
}

#[rstest]
#[tokio::test]
async fn subscribed_from_reads_the_relation_from_the_author_end() {
    let mut builder = DatasetBuilder::new();
    let author = builder.user("Author");
    let first = builder.user("First");
    let second = builder.user("Second");
    builder.follow(first, author).follow(second, author).follow(author, first);
    let store = recording(&builder);

    let response = execute(
        &store,
        vec![user_lookup(
            author,
            vec![
                object("subscribedFrom", vec![field("name")]),
                object("subscribedTo", vec![field("name")]),
            ],
        )],
    )
    .await;

    assert_eq!(
        response.data,
        Some(json!({
            "user": {
                "subscribedFrom": [{"name": "First"}, {"name": "Second"}],
                "subscribedTo": [{"name": "First"}],
            },
        }))
    );
}

#[rstest]
#[tokio::test]
async fn self_and_duplicate_subscriptions_pass_through() {
    let mut builder = DatasetBuilder::new();
    let narcissus = builder.user("Narcissus");
    builder.follow(narcissus, narcissus).follow(narcissus, narcissus);
    let store = recording(&builder);

    let response = execute(
        &store,
        vec![user_lookup(
            narcissus,
            vec![object("subscribedTo", vec![field("name")])],
        )],
    )
    .await;

    assert_eq!(
        response.pointer("/user/subscribedTo"),
        Some(&json!([{"name": "Narcissus"}, {"name": "Narcissus"}]))
    );
    assert_eq!(store.fetches_of(RecordKind::User, narcissus.into()), 1);
}

#[rstest]
#[case(InputValue::String("not-a-uuid".into()))]
#[case(InputValue::String(" 00000000-0000-4000-8000-000000001001".into()))]
#[case(InputValue::Boolean(true))]
#[tokio::test]
async fn malformed_ids_fail_without_touching_the_store(#[case] id: InputValue) {
    let store = recording(&DatasetBuilder::new());

    let response = execute(
        &store,
        vec![object("user", vec![field("name")]).with_argument("id", id)],
    )
    .await;

    assert!(store.calls().is_empty());
    assert_eq!(response.data, Some(json!({"user": null})));
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].extensions.code, "VALIDATION_ERROR");
    assert_eq!(
        response.errors[0].path,
        Some(vec![PathSegment::Key("user".into())])
    );
}

#[rstest]
#[tokio::test]
async fn unknown_member_tiers_fail_validation() {
    let store = recording(&DatasetBuilder::new());

    let response = execute(
        &store,
        vec![
            object("memberType", vec![field("id")])
                .with_argument("id", InputValue::Enum("platinum".into())),
        ],
    )
    .await;

    assert!(store.calls().is_empty());
    assert_eq!(
        response.errors[0].message,
        "member type \"platinum\" is not one of: basic, business"
    );
}

#[rstest]
#[tokio::test]
async fn failed_post_scan_only_nulls_that_users_posts() {
    let mut builder = DatasetBuilder::new();
    let healthy = builder.user("Healthy");
    let broken = builder.user("Broken");
    builder.post(healthy, "still here");
    builder.post(broken, "unreachable");
    let broken_key = RecordId::from(broken);
    let store = Arc::new(
        RecordingStore::new(Arc::new(builder.store())).fail_when(
            move |call| {
                matches!(
                    call,
                    StoreCall::ScanByForeignKey {
                        foreign_key: ForeignKey::PostAuthor,
                        value,
                    } if *value == broken_key
                )
            },
            StoreError::connection("replica offline"),
        ),
    );

    let response = execute(
        &store,
        vec![object(
            "users",
            vec![field("name"), object("posts", vec![field("title")])],
        )],
    )
    .await;

    assert_eq!(
        response.data,
        Some(json!({
            "users": [
                {"name": "Healthy", "posts": [{"title": "still here"}]},
                {"name": "Broken", "posts": null},
            ],
        }))
    );
    assert_eq!(response.errors.len(), 1);
    let error = &response.errors[0];
    assert_eq!(error.extensions.code, "STORE_ERROR");
    assert_eq!(
        error.path,
        Some(vec![
            PathSegment::Key("users".into()),
            PathSegment::Index(1),
            PathSegment::Key("posts".into()),
        ])
    );
}

#[rstest]
#[tokio::test]
async fn dangling_authors_null_the_enclosing_list() {
    let mut builder = DatasetBuilder::new();
    let ghost = entity_id(9);
    builder.post(ghost, "orphan");
    let store = recording(&builder);

    let response = execute(
        &store,
        vec![object(
            "posts",
            vec![field("title"), object("author", vec![field("name")])],
        )],
    )
    .await;

    assert_eq!(response.data, Some(json!({"posts": null})));
    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.errors[0].message,
        "Cannot return null for non-nullable field Post.author."
    );
    assert_eq!(
        response.errors[0].path,
        Some(vec![
            PathSegment::Key("posts".into()),
            PathSegment::Index(0),
            PathSegment::Key("author".into()),
        ])
    );
}

#[rstest]
#[tokio::test]
async fn failed_author_batches_report_one_error_per_post() {
    let mut builder = DatasetBuilder::new();
    let ada = builder.user("Ada");
    let grace = builder.user("Grace");
    builder.post(ada, "one");
    builder.post(grace, "two");
    let store = Arc::new(
        RecordingStore::new(Arc::new(builder.store())).fail_when(
            |call| call.is_keyed() && call.kind() == Some(RecordKind::User),
            StoreError::query("statement timeout"),
        ),
    );

    let response = execute(
        &store,
        vec![
            object("posts", vec![object("author", vec![field("name")])]),
            object("memberTypes", vec![field("id")]),
        ],
    )
    .await;

    assert_eq!(store.keyed_fetches(RecordKind::User), 1);
    assert_eq!(response.pointer("/posts"), Some(&json!(null)));
    assert_eq!(
        response.pointer("/memberTypes"),
        Some(&json!([{"id": "basic"}, {"id": "business"}]))
    );
    let codes: Vec<_> = response
        .errors
        .iter()
        .map(|error| error.extensions.code)
        .collect();
    assert_eq!(codes, vec!["STORE_ERROR", "STORE_ERROR"]);
}

#[rstest]
#[tokio::test]
async fn type_conditions_and_typename_follow_the_object_type() {
    let mut builder = DatasetBuilder::new();
    builder.user("Ada");
    let store = recording(&builder);

    let response = execute(
        &store,
        vec![object(
            "users",
            vec![
                field("__typename"),
                field("name").on_type("User"),
                field("title").on_type("Post"),
                field("name").with_alias("handle"),
            ],
        )],
    )
    .await;

    assert!(response.errors.is_empty());
    assert_eq!(
        response.pointer("/users/0"),
        Some(&json!({"__typename": "User", "name": "Ada", "handle": "Ada"}))
    );
}

#[rstest]
#[tokio::test]
async fn repeated_response_keys_merge_their_selections() {
    let mut builder = DatasetBuilder::new();
    let ada = builder.user("Ada");
    builder.profile(ada, MemberTierId::Basic);
    let store = recording(&builder);

    let response = execute(
        &store,
        vec![
            user_lookup(ada, vec![field("name")]),
            user_lookup(ada, vec![object("profile", vec![field("yearOfBirth")])]),
        ],
    )
    .await;

    assert_eq!(
        response.data,
        Some(json!({"user": {"name": "Ada", "profile": {"yearOfBirth": 1990}}}))
    );
}

#[rstest]
#[tokio::test]
async fn invalid_selections_are_reported_once_per_selection_set() {
    let mut builder = DatasetBuilder::new();
    builder.user("Ada");
    builder.user("Grace");
    let store = recording(&builder);

    let response = execute(
        &store,
        vec![
            object("users", vec![field("name"), field("password")]),
            field("posts"),
            object("memberTypes", vec![object("id", vec![field("x")])]),
        ],
    )
    .await;

    assert_eq!(
        response.data,
        Some(json!({
            "users": [
                {"name": "Ada", "password": null},
                {"name": "Grace", "password": null},
            ],
            "posts": null,
            "memberTypes": [{"id": null}, {"id": null}],
        }))
    );
    let mut reported: Vec<_> = response
        .errors
        .iter()
        .map(|error| (error.message.as_str(), json!(error.path)))
        .collect();
    reported.sort_unstable_by(|left, right| left.0.cmp(right.0));
    assert_eq!(
        reported,
        vec![
            (
                "Cannot query field \"password\" on type \"User\".",
                json!(["users", 0, "password"]),
            ),
            (
                "Field \"id\" must not have a selection since it has no subfields.",
                json!(["memberTypes", 0, "id"]),
            ),
            (
                "Field \"posts\" of type \"Post\" must have a selection of subfields.",
                json!(["posts"]),
            ),
        ]
    );
    assert!(
        store
            .calls()
            .iter()
            .all(|call| !matches!(call, StoreCall::ScanAll { kind: RecordKind::Post }))
    );
}

#[rstest]
#[tokio::test]
async fn sibling_subtrees_at_one_depth_share_a_batch_window() {
    let mut builder = DatasetBuilder::new();
    let ada = builder.user("Ada");
    let grace = builder.user("Grace");
    builder.profile(ada, MemberTierId::Basic);
    builder.profile(grace, MemberTierId::Business);
    let store = recording(&builder);
    let tier_of = |id| {
        user_lookup(
            id,
            vec![object("profile", vec![object("memberType", vec![field("id")])])],
        )
    };

    let response = execute(
        &store,
        vec![tier_of(ada).with_alias("first"), tier_of(grace).with_alias("second")],
    )
    .await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.pointer("/first/profile/memberType/id"),
        Some(&json!("basic"))
    );
    assert_eq!(
        response.pointer("/second/profile/memberType/id"),
        Some(&json!("business"))
    );
    assert_eq!(store.keyed_fetches(RecordKind::MemberTier), 1);
    assert_eq!(store.keyed_fetches(RecordKind::User), 1);
}

#[rstest]
#[tokio::test]
async fn nested_user_tree_matches_snapshot() {
    let mut builder = DatasetBuilder::new();
    let ada = builder.user("Ada");
    builder.profile(ada, MemberTierId::Business);
    builder.post(ada, "Engines");
    let store = recording(&builder);

    let response = execute(
        &store,
        vec![user_lookup(
            ada,
            vec![
                field("id"),
                field("name"),
                object("posts", vec![field("title")]),
                object("profile", vec![object("memberType", vec![field("id")])]),
            ],
        )],
    )
    .await;

    assert_json_snapshot!(response, @r#"
    {
      "data": {
        "user": {
          "id": "00000000-0000-4000-8000-000000001001",
          "name": "Ada",
          "posts": [
            {
              "title": "Engines"
            }
          ],
          "profile": {
            "memberType": {
              "id": "business"
            }
          }
        }
      }
    }
    "#);
}
