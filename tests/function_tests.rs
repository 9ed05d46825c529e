use jsequel::{Compiler, QueryNode, Schema, Status};

fn schema() -> Schema {
    serde_json::from_str(r#"{"shop":{"users":{"id":{},"name":{},"meta":{}}}}"#).unwrap()
}

fn select_one(compiler: &Compiler, name: &str) -> jsequel::Outcome {
    let query = QueryNode::named("shop.users")
        .with_where("id = 1")
        .with_columns(vec![QueryNode::named(name).with_alias("out")]);
    compiler.select(&query)
}

#[test]
fn unregistered_names_become_uppercase_sql_calls() {
    let out = select_one(&Compiler::new(schema()), "upper=>(name)");
    assert_eq!(out.status, Status::Success);
    assert!(out.query.contains("UPPER(name)"));
}

#[test]
fn nested_calls_reduce_innermost_first() {
    let out = select_one(&Compiler::new(schema()), "concat=>(\"a\", upper=>(name))");
    assert_eq!(out.status, Status::Success);
    assert!(out.query.contains("CONCAT(\"a\",UPPER(name))"));
}

#[test]
fn registered_callbacks_replace_the_whole_call() {
    let mut compiler = Compiler::new(schema());
    compiler.register_function("now", |_args, _row| "NOW()".to_string());
    let out = select_one(&compiler, "now=>()");
    assert_eq!(out.status, Status::Success);
    assert!(out.query.contains("NOW()"));
    assert!(!out.query.contains("now=>"));
}

#[test]
fn callbacks_receive_flattened_arguments() {
    let mut compiler = Compiler::new(schema());
    compiler.register_function("pick", |args, _row| args.join("|"));
    let out = select_one(&compiler, "pick=>(name, upper=>(name))");
    assert_eq!(out.status, Status::Success);
    assert!(out.query.contains("name|UPPER(name)"));
}

#[test]
fn quoted_json_path_arguments_compile_to_extracts() {
    let out = select_one(&Compiler::new(schema()), "jsonExtract=>(\"$meta.colour\")");
    assert_eq!(out.status, Status::Success);
    assert!(out.query.contains(
        "JSONEXTRACT(JSON_UNQUOTE(JSON_EXTRACT(meta, CONCAT(CONCAT(\"$\"), \".colour\"))))"
    ));
}

#[test]
fn object_path_arguments_substitute_from_the_installed_graph() {
    let mut compiler = Compiler::new(schema());
    compiler.set_objects(serde_json::json!({ "session": { "user_id": 42 } }));
    let out = select_one(&compiler, "coalesce=>(\"@.session.user_id\", id)");
    assert_eq!(out.status, Status::Success);
    assert!(out.query.contains("COALESCE(42,id)"));
}

#[test]
fn banned_keyword_inside_a_call_is_fatal() {
    let out = select_one(&Compiler::new(schema()), "foo=>(x; DROP TABLE users)");
    assert_eq!(out.status, Status::Error);
    assert_eq!(out.query, "");
}

#[test]
fn unparseable_expression_skips_the_column() {
    let out = select_one(&Compiler::new(schema()), "foo=>");
    assert_eq!(out.status, Status::Success);
    assert_eq!(out.errors.len(), 1);
    assert!(out.errors[0].contains("could not parse function expression"));
}
