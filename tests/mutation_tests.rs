use jsequel::{Compiler, QueryNode, Row, Schema, Status};

fn schema() -> Schema {
    serde_json::from_str(
        r#"{
            "shop": {
                "users": { "email": {}, "meta": {}, "flag": {}, "count": {}, "tags": {} }
            }
        }"#,
    )
    .unwrap()
}

fn compiler() -> Compiler {
    Compiler::new(schema())
}

fn row(json: &str) -> Row {
    serde_json::from_str::<serde_json::Value>(json)
        .unwrap()
        .as_object()
        .unwrap()
        .clone()
}

fn node(json: &str) -> QueryNode {
    serde_json::from_str(json).unwrap()
}

#[test]
fn create_renders_columns_and_values_in_row_order() {
    let out = compiler().create(
        &QueryNode::named("shop.users"),
        &row(r#"{ "email": "ann@example.com", "flag": false, "count": 0 }"#),
    );
    assert_eq!(out.status, Status::Success);
    assert_eq!(
        out.query,
        "INSERT INTO shop.users (email,flag,count) VALUES ('ann@example.com',false,0)"
    );
}

#[test]
fn create_encodes_containers_as_json_constructors() {
    let out = compiler().create(
        &QueryNode::named("shop.users"),
        &row(r#"{ "tags": [1, "a"], "meta": { "colour": "blue" } }"#),
    );
    assert_eq!(out.status, Status::Success);
    assert_eq!(
        out.query,
        "INSERT INTO shop.users (tags,meta) VALUES (JSON_ARRAY(1,'a'),JSON_OBJECT('colour', 'blue'))"
    );
}

#[test]
fn literal_null_string_becomes_sql_null_and_json_null_is_dropped() {
    let out = compiler().create(
        &QueryNode::named("shop.users"),
        &row(r#"{ "email": "NULL", "meta": null, "count": 1 }"#),
    );
    assert_eq!(out.status, Status::Success);
    assert_eq!(out.query, "INSERT INTO shop.users (email,count) VALUES (NULL,1)");
}

#[test]
fn unknown_data_key_is_dropped_with_a_complaint() {
    let out = compiler().create(
        &QueryNode::named("shop.users"),
        &row(r#"{ "email": "ann@example.com", "nope": 1 }"#),
    );
    assert_eq!(out.status, Status::Success);
    assert_eq!(out.errors.len(), 1);
    assert_eq!(
        out.query,
        "INSERT INTO shop.users (email) VALUES ('ann@example.com')"
    );
}

#[test]
fn empty_row_is_fatal() {
    let out = compiler().create(&QueryNode::named("shop.users"), &row("{}"));
    assert_eq!(out.status, Status::Error);
    assert_eq!(out.query, "");
    assert!(out.errors[0].contains("at least one column and value"));
}

#[test]
fn injection_in_a_value_is_fatal() {
    let out = compiler().create(
        &QueryNode::named("shop.users"),
        &row(r#"{ "email": "x'; DROP TABLE users" }"#),
    );
    assert_eq!(out.status, Status::Error);
    assert_eq!(out.query, "");
    assert!(out.errors[0].contains("not allowed"));
}

#[test]
fn create_on_unknown_table_is_fatal() {
    let out = compiler().create(
        &QueryNode::named("shop.nothing"),
        &row(r#"{ "email": "ann@example.com" }"#),
    );
    assert_eq!(out.status, Status::Error);
    assert_eq!(out.query, "");
}

#[test]
fn update_sets_each_pair_and_keeps_the_where() {
    let out = compiler().update(
        &node(r#"{ "name": "shop.users", "where": ["id = 1"] }"#),
        &row(r#"{ "email": "ann@example.com", "count": 2 }"#),
    );
    assert_eq!(out.status, Status::Success);
    assert_eq!(
        out.query,
        "UPDATE shop.users SET email = 'ann@example.com',count = 2 WHERE id = 1"
    );
}

#[test]
fn update_without_where_is_refused() {
    let out = compiler().update(
        &QueryNode::named("shop.users"),
        &row(r#"{ "email": "ann@example.com" }"#),
    );
    assert_eq!(out.status, Status::Error);
    assert_eq!(out.query, "");
    assert!(out.errors.iter().any(|e| e.contains("no where condition")));
}

#[test]
fn dollar_key_updates_through_json_set_with_fallback() {
    let out = compiler().update(
        &node(r#"{ "name": "shop.users", "where": ["id = 1"] }"#),
        &row(r#"{ "$meta.colour": "blue" }"#),
    );
    assert_eq!(out.status, Status::Success);
    let set_expr =
        "JSON_SET(shop.users.meta, CONCAT(CONCAT(\"$\"), \".colour\"), 'blue')";
    assert_eq!(
        out.query,
        format!(
            "UPDATE shop.users SET meta = IF({set_expr} IS NOT NULL, {set_expr}, meta) \
             WHERE id = 1"
        )
    );
}

#[test]
fn dollar_key_on_unknown_column_is_dropped() {
    let out = compiler().update(
        &node(r#"{ "name": "shop.users", "where": ["id = 1"] }"#),
        &row(r#"{ "$nope.x": "blue", "count": 1 }"#),
    );
    assert_eq!(out.status, Status::Success);
    assert_eq!(out.errors.len(), 1);
    assert_eq!(out.query, "UPDATE shop.users SET count = 1 WHERE id = 1");
}

#[test]
fn delete_requires_a_where() {
    let out = compiler().delete(&QueryNode::named("shop.users"));
    assert_eq!(out.status, Status::Error);
    assert_eq!(out.query, "");
    assert!(out.errors[0].contains("no where condition"));
}

#[test]
fn missing_where_is_reported_before_the_schema_is_consulted() {
    let out = compiler().delete(&QueryNode::named("shop.nothing"));
    assert_eq!(out.status, Status::Error);
    assert_eq!(out.errors.len(), 1);
    assert!(out.errors[0].contains("no where condition"));
}

#[test]
fn delete_with_where_compiles() {
    let out = compiler().delete(&node(r#"{ "name": "shop.users", "where": ["id = 1"] }"#));
    assert_eq!(out.status, Status::Success);
    assert_eq!(out.query, "DELETE FROM shop.users WHERE id = 1");
}

#[test]
fn or_group_in_where_joins_alternatives() {
    let out = compiler().delete(&node(
        r#"{ "name": "shop.users", "where": [["id = 1", "id = 2"]] }"#,
    ));
    assert_eq!(out.status, Status::Success);
    assert_eq!(out.query, "DELETE FROM shop.users WHERE id = 1 OR id = 2");
}

#[test]
fn function_tag_root_routes_mutations_through_the_catalog() {
    let mut compiler = compiler();
    compiler.register_function("audit", |_args, row| {
        let email = row
            .and_then(|r| r.get("email"))
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        format!("CALL audit('{email}')")
    });

    let out = compiler.create(
        &QueryNode::named("audit=>()"),
        &row(r#"{ "email": "ann@example.com" }"#),
    );
    assert_eq!(out.status, Status::Success);
    assert_eq!(out.query, "CALL audit('ann@example.com')");
}
