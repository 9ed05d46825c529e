//! The name router: the control-flow hub deciding what one column
//! specification compiles to.

use crate::ast::shape::{NameShape, split_db_table};
use crate::ast::QueryNode;
use crate::compiler::{limit_clause, sort_clause, where_clause};
use crate::errors::{CompileError, ErrorSet};
use crate::funcs::{self, FunctionCatalog};
use crate::jsonpath;
use crate::schema::Schema;

/// Route one column node to its SQL fragment.
///
/// Dispatch order is load-bearing: a dotted name is textually ambiguous
/// between a correlated scalar subquery and a nested aggregation, and the
/// function/path shapes would also pass the bare-identifier test once
/// their sigils were gone. First match wins.
///
/// Returns `None` when the column must be skipped; whether that skip also
/// poisons the compilation depends on the rule (see the error calls).
pub fn route(
    schema: &Schema,
    catalog: &dyn FunctionCatalog,
    node: &QueryNode,
    enclosing: &str,
    errors: &mut ErrorSet,
) -> Option<String> {
    match NameShape::classify(&node.name) {
        NameShape::FuncTag => {
            if node.alias.is_none() {
                errors.push(CompileError::FunctionNeedsAlias(node.name.clone()));
                return None;
            }
            funcs::evaluate(&node.name, None, catalog, errors)
        }
        NameShape::JsonPath => {
            if node.alias.is_none() {
                errors.push(CompileError::PathNeedsAlias(node.name.clone()));
                return None;
            }
            let Some((db, table)) = split_db_table(enclosing) else {
                errors.fail(CompileError::MalformedDbTable(enclosing.to_string()));
                return None;
            };
            jsonpath::extract(schema, db, table, &node.name, errors)
        }
        NameShape::DbTable if node.alias.is_none() => {
            // Without correlation this would scan unbounded rows.
            if node.wheres.is_empty() {
                errors.fail(CompileError::CorrelationNeedsWhere(node.name.clone()));
                return None;
            }
            Some(node.name.clone())
        }
        NameShape::DbTable => nested_json(schema, catalog, node, errors),
        NameShape::Column => {
            let Some((db, table)) = split_db_table(enclosing) else {
                errors.fail(CompileError::MalformedDbTable(enclosing.to_string()));
                return None;
            };
            if !schema.has_column(db, table, &node.name) {
                // The schema is the source of truth for plain columns;
                // letting an unknown name through would mask a typo as an
                // empty result.
                errors.fail(CompileError::UnknownColumn {
                    db: db.to_string(),
                    table: table.to_string(),
                    column: node.name.clone(),
                });
                return None;
            }
            Some(node.name.clone())
        }
        NameShape::Other => {
            errors.fail(CompileError::UnroutableColumn(node.name.clone()));
            None
        }
    }
}

/// Build a nested JSON aggregation for a dotted-name-with-alias node:
/// an array of objects, one key/value pair per child column.
fn nested_json(
    schema: &Schema,
    catalog: &dyn FunctionCatalog,
    node: &QueryNode,
    errors: &mut ErrorSet,
) -> Option<String> {
    let Some((db, table)) = split_db_table(&node.name) else {
        errors.fail(CompileError::MalformedDbTable(node.name.clone()));
        return None;
    };
    if !schema.has_table(db, table) {
        errors.fail(CompileError::UnknownTable(db.to_string(), table.to_string()));
        return None;
    }

    let columns = node.columns.as_deref().unwrap_or_default();
    if columns.is_empty() {
        errors.push(CompileError::NoNestedColumns(db.to_string(), table.to_string()));
        return None;
    }

    let enclosing = format!("{db}.{table}");
    let mut key_vals = Vec::new();
    for col in columns {
        let Some(fragment) = route(schema, catalog, col, &enclosing, errors) else {
            continue;
        };
        let key = col.alias.as_deref().unwrap_or(&col.name);
        key_vals.push(format!("'{key}',{fragment}"));
    }

    let where_sql = where_clause(&node.wheres, errors);
    let sort = sort_clause(node.sort.as_deref(), errors);
    let limit = limit_clause(node.limit.as_deref());

    Some(format!(
        "(SELECT JSON_ARRAYAGG(JSON_OBJECT({})) FROM {db}.{table}{where_sql}{sort}{limit})",
        key_vals.join(",")
    ))
}
