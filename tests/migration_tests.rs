use jsequel::{Compiler, Schema, SchemaRow, Status};

fn compiler(schema: &str) -> Compiler {
    Compiler::new(serde_json::from_str::<Schema>(schema).unwrap())
}

fn live(table: &str, column: &str, data_type: &str, max_length: Option<i64>) -> SchemaRow {
    SchemaRow {
        table_name: table.to_string(),
        col_name: column.to_string(),
        data_type: data_type.to_string(),
        max_length,
    }
}

#[test]
fn plan_orders_creates_before_column_work_and_drops_last() {
    let compiler = compiler(
        r#"{
            "shop": {
                "users": {
                    "name": { "type": "string", "maxLength": 50 },
                    "age": { "type": "number" },
                    "created": { "type": "date" }
                },
                "extra": {
                    "note": { "type": "string" }
                }
            }
        }"#,
    );

    let migration = compiler.schema_migration(|query| {
        assert!(query.contains("INFORMATION_SCHEMA.COLUMNS"));
        assert!(query.contains("table_schema = 'shop'"));
        Ok(vec![
            live("users", "id", "int", None),
            live("users", "name", "varchar", Some(50)),
            live("users", "age", "int", None),
            live("users", "old_col", "varchar", Some(20)),
            live("stale", "foo", "varchar", Some(10)),
        ])
    });

    assert_eq!(migration.status, Status::Success);
    assert_eq!(
        migration.statements,
        vec![
            "CREATE TABLE `extra` (`id` int(11) unsigned NOT NULL AUTO_INCREMENT, \
             PRIMARY KEY (`id`)) ENGINE=InnoDB DEFAULT CHARSET=utf8"
                .to_string(),
            "DELETE `old_col` FROM `users`".to_string(),
            "DELETE `foo` FROM `stale`".to_string(),
            "ALTER TABLE `extra` ADD COLUMN `note` varchar(200)".to_string(),
            "ALTER TABLE `users` ADD COLUMN `created` timestamp".to_string(),
            "DROP TABLE `stale`".to_string(),
        ]
    );
}

#[test]
fn matching_schemas_produce_an_empty_plan() {
    let compiler = compiler(
        r#"{ "shop": { "users": { "name": { "type": "string", "maxLength": 50 } } } }"#,
    );

    let migration = compiler
        .schema_migration(|_query| Ok(vec![live("users", "name", "varchar", Some(50))]));

    assert_eq!(migration.status, Status::Success);
    assert_eq!(migration.statements, Vec::<String>::new());
}

#[test]
fn int_columns_match_regardless_of_reported_length() {
    let compiler =
        compiler(r#"{ "shop": { "users": { "age": { "type": "number" } } } }"#);

    let migration =
        compiler.schema_migration(|_query| Ok(vec![live("users", "age", "int", None)]));

    assert_eq!(migration.status, Status::Success);
    assert_eq!(migration.statements, Vec::<String>::new());
}

#[test]
fn changed_length_recreates_the_column() {
    let compiler = compiler(
        r#"{ "shop": { "users": { "name": { "type": "string", "maxLength": 80 } } } }"#,
    );

    let migration = compiler
        .schema_migration(|_query| Ok(vec![live("users", "name", "varchar", Some(50))]));

    assert_eq!(
        migration.statements,
        vec![
            "DELETE `name` FROM `users`".to_string(),
            "ALTER TABLE `users` ADD COLUMN `name` varchar(80)".to_string(),
        ]
    );
}

#[test]
fn declared_id_columns_are_filtered_with_a_complaint() {
    let compiler = compiler(
        r#"{ "shop": { "users": { "id": { "type": "number" }, "name": { "type": "string", "maxLength": 50 } } } }"#,
    );

    let migration = compiler
        .schema_migration(|_query| Ok(vec![live("users", "name", "varchar", Some(50))]));

    assert_eq!(migration.status, Status::Success);
    assert_eq!(migration.statements, Vec::<String>::new());
    assert!(migration.errors.iter().any(|e| e.contains("reserved")));
}

#[test]
fn uppercase_table_names_are_fatal() {
    let compiler =
        compiler(r#"{ "shop": { "Users": { "name": { "type": "string" } } } }"#);

    let migration = compiler.schema_migration(|_query| Ok(Vec::new()));

    assert_eq!(migration.status, Status::Error);
    assert_eq!(migration.statements, Vec::<String>::new());
    assert!(migration.errors.iter().any(|e| e.contains("lower-case")));
}

#[test]
fn fetch_failure_is_fatal() {
    let compiler =
        compiler(r#"{ "shop": { "users": { "name": { "type": "string" } } } }"#);

    let migration = compiler.schema_migration(|_query| Err("connection refused".to_string()));

    assert_eq!(migration.status, Status::Error);
    assert!(migration.errors[0].contains("connection refused"));
    assert_eq!(migration.statements, Vec::<String>::new());
}
