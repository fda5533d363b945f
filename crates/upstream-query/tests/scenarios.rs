use std::sync::Arc;

use serde_json::json;
use upstream_query::{
    ArgumentValue, BuildOptions, CacheConfig, ComplexityOptions, FieldSelection, Limits, QueryConfig,
    SecurityValidator, SyntaxCache, build_query, calculate_complexity,
};

fn user_fields() -> Vec<FieldSelection> {
    vec![FieldSelection::new("id"), FieldSelection::new("email")]
}

#[test]
fn plain_build() {
    let built = build_query("user", &user_fields(), &BuildOptions::default());

    assert!(built.query.contains("user"));
    assert!(built.query.contains("id"));
    assert!(built.query.contains("email"));
    assert_eq!(built.metadata.field_count, 2);
    assert_eq!(built.metadata.depth, 1);

    insta::assert_json_snapshot!(built, @r#"
    {
      "query": "query UserQuery { user { id email } }",
      "operationName": "UserQuery",
      "variables": {},
      "metadata": {
        "fieldCount": 2,
        "depth": 1,
        "hasVariables": false
      }
    }
    "#);
}

#[test]
fn build_with_variables() {
    let options = BuildOptions::default()
        .with_operation_name("GetUser")
        .with_variable("id", json!("123"))
        .with_root_argument("id", ArgumentValue::variable("id"));

    let built = build_query("user", &user_fields(), &options);

    assert!(built.query.contains("query GetUser("));
    assert!(built.query.contains("$id: ID!"));
    assert!(built.query.contains("user(id: $id)"));
}

#[test]
fn blocked_field_is_rejected() {
    let result = SecurityValidator::default().validate(
        &[FieldSelection::new("password")],
        &Limits::default().with_blocked_fields(["password"]),
    );

    assert!(!result.valid);
    assert!(result.errors.iter().any(|error| error.contains("password")));
}

#[test]
fn smallest_syntax_cache_keeps_the_second_query() {
    let cache = SyntaxCache::new(CacheConfig {
        max_size: 1,
        ..Default::default()
    })
    .unwrap();

    assert!(cache.validate("query First { a }").valid);
    assert!(cache.validate("query Second { b }").valid);

    assert_eq!(cache.len(), 1);
    assert!(cache.get("query Second { b }").is_some());
    assert!(cache.get("query First { a }").is_none());
}

#[test]
fn complexity_of_leaf_and_parent() {
    let options = ComplexityOptions {
        field_cost: 1,
        list_multiplier: 10,
        max_complexity: 1000,
    };

    let leaf = FieldSelection::new("name");
    assert_eq!(calculate_complexity(std::slice::from_ref(&leaf), &options), 1);

    let parent = FieldSelection::new("friends").with_selections([leaf]);
    assert!(calculate_complexity(&[parent], &options) >= 10);
}

#[test]
fn configured_validator_and_builder_agree() {
    let config = Arc::new(
        QueryConfig::from_toml_str(indoc::indoc! {r#"
            max_depth = 2
            blocked_fields = ["internalNotes"]
            required_fields = ["id"]

            [field_mappings]
            email = "emailAddress"
        "#})
        .unwrap(),
    );

    let fields = vec![
        FieldSelection::new("email"),
        FieldSelection::new("internalNotes"),
        FieldSelection::new("posts").with_selections([FieldSelection::new("title")]),
    ];

    let validator = SecurityValidator::new(Arc::clone(&config));
    assert!(!validator.validate(&fields, &Limits::default()).valid);

    let sanitized = validator.sanitize(&fields);
    assert!(validator.validate(&sanitized, &Limits::default()).valid);

    let built = upstream_query::QueryBuilder::new(config).build("user", &sanitized, &BuildOptions::default());
    insta::assert_snapshot!(built.query, @"query UserQuery { user { emailAddress posts { title } id } }");
    assert_eq!(built.metadata.field_count, 3);
}
