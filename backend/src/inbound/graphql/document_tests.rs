//! Tests for query document conversion.

use super::*;
use rstest::rstest;
use serde_json::json;

const ADA: &str = "00000000-0000-4000-8000-000000001001";

fn vars(value: serde_json::Value) -> Map<String, serde_json::Value> {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("variables must be an object, got {other}"),
    }
}

fn build(query: &str) -> Result<Vec<Field>, DocumentError> {
    build_selection(query, None, &Map::new())
}

#[rstest]
fn shorthand_queries_keep_aliases_and_nesting() {
    let fields = build(r#"{ first: user(id: "x") { name posts { title } } }"#).expect("valid");

    assert_eq!(
        fields,
        vec![
            Field::new("user")
                .with_alias("first")
                .with_argument("id", InputValue::String("x".into()))
                .with_selection(vec![
                    Field::new("name"),
                    Field::new("posts").with_selection(vec![Field::new("title")]),
                ])
        ]
    );
}

#[rstest]
fn enum_literals_stay_enums() {
    let fields = build("{ memberType(id: business) { id } }").expect("valid");
    assert_eq!(
        fields[0].argument("id"),
        Some(&InputValue::Enum("business".into()))
    );
}

#[rstest]
#[case("{ users { name }", "GRAPHQL_PARSE_FAILED")]
#[case("fragment F on User { name }", "OPERATION_RESOLUTION_FAILURE")]
#[case("query A { users { name } } query B { posts { title } }", "OPERATION_RESOLUTION_FAILURE")]
#[case("mutation { createUser { id } }", "OPERATION_RESOLUTION_FAILURE")]
#[case("subscription { users { id } }", "OPERATION_RESOLUTION_FAILURE")]
#[case("{ users { ...Missing } }", "GRAPHQL_VALIDATION_FAILED")]
#[case("{ user(id: $id) { name } }", "GRAPHQL_VALIDATION_FAILED")]
fn request_failures_carry_stable_codes(#[case] query: &str, #[case] code: &str) {
    let err = build(query).expect_err("request must be rejected");
    assert_eq!(err.code(), code);
}

#[rstest]
fn mutations_are_named_in_the_rejection() {
    let err = build("mutation { createUser { id } }").expect_err("mutation");
    assert_eq!(
        err.to_string(),
        "Only query operations are supported; received a mutation."
    );
}

#[rstest]
#[case(Some("Posts"), "posts")]
#[case(Some("Users"), "users")]
fn operation_names_pick_the_operation(#[case] name: Option<&str>, #[case] root: &str) {
    let query = "query Users { users { id } } query Posts { posts { id } }";
    let fields = build_selection(query, name, &Map::new()).expect("named operation");
    assert_eq!(fields[0].name, root);
}

#[rstest]
fn unknown_operation_names_are_reported() {
    let err = build_selection("query Users { users { id } }", Some("Posts"), &Map::new())
        .expect_err("unknown");
    assert_eq!(err.to_string(), "Unknown operation named \"Posts\".");
}

#[rstest]
fn variables_are_substituted_and_defaulted() {
    let query = r#"
        query Q($id: UUID!, $tier: MemberTypeId = basic) {
            user(id: $id) { name }
            memberType(id: $tier) { id }
        }
    "#;
    let fields = build_selection(query, None, &vars(json!({ "id": ADA }))).expect("valid");

    assert_eq!(
        fields[0].argument("id"),
        Some(&InputValue::String(ADA.into()))
    );
    assert_eq!(
        fields[1].argument("id"),
        Some(&InputValue::Enum("basic".into()))
    );
}

#[rstest]
#[case(json!({}))]
#[case(json!({ "id": null }))]
fn required_variables_must_be_provided(#[case] provided: serde_json::Value) {
    let err = build_selection(
        "query Q($id: UUID!) { user(id: $id) { name } }",
        None,
        &vars(provided),
    )
    .expect_err("missing variable");
    assert_eq!(
        err.to_string(),
        "Variable \"$id\" of required type \"UUID!\" was not provided."
    );
}

#[rstest]
fn absent_nullable_variables_drop_the_argument() {
    let fields = build_selection(
        "query Q($id: UUID) { user(id: $id) { name } }",
        None,
        &Map::new(),
    )
    .expect("valid");
    assert!(fields[0].arguments.is_empty());
}

#[rstest]
fn fragments_flatten_with_their_type_condition() {
    let query = r#"
        query {
            users {
                id
                ...UserFields
                ... on Post { title }
                ... { balance }
            }
        }
        fragment UserFields on User { name }
    "#;
    let fields = build(query).expect("valid");

    assert_eq!(
        fields[0].selection,
        vec![
            Field::new("id"),
            Field::new("name").on_type("User"),
            Field::new("title").on_type("Post"),
            Field::new("balance"),
        ]
    );
}

#[rstest]
fn conflicting_nested_conditions_drop_the_fields() {
    let query = r#"
        { users { ... on User { ... on Post { title } name } } }
    "#;
    let fields = build(query).expect("valid");
    assert_eq!(fields[0].selection, vec![Field::new("name").on_type("User")]);
}

#[rstest]
fn self_referencing_fragments_are_rejected() {
    let query = r#"
        { users { ...Loop } }
        fragment Loop on User { subscribedTo { ...Loop } }
    "#;
    let err = build(query).expect_err("cycle");
    assert_eq!(
        err,
        DocumentError::FragmentCycle {
            name: "Loop".into()
        }
    );
}

#[rstest]
#[case(json!({ "hide": true }), vec!["id"])]
#[case(json!({ "hide": false }), vec!["id", "name"])]
fn skip_and_include_follow_their_condition(
    #[case] provided: serde_json::Value,
    #[case] expected: Vec<&str>,
) {
    let query = r#"
        query Q($hide: Boolean!) {
            users {
                id
                name @skip(if: $hide)
                balance @include(if: false)
            }
        }
    "#;
    let fields = build_selection(query, None, &vars(provided)).expect("valid");
    let names: Vec<&str> = fields[0]
        .selection
        .iter()
        .map(|field| field.name.as_str())
        .collect();
    assert_eq!(names, expected);
}

#[rstest]
fn directive_conditions_must_be_boolean() {
    let err = build("{ users { name @skip(if: \"yes\") } }").expect_err("not a boolean");
    assert_eq!(
        err.to_string(),
        "Directive \"@skip\" argument \"if\" must be a boolean."
    );
}
