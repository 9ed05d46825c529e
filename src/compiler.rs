//! Statement builders and the public [`Compiler`] entrypoints.
//!
//! Each entrypoint owns a fresh [`ErrorSet`] for the whole compilation and
//! only inspects the fatal flag once, after the full tree has been walked,
//! so independent problems in sibling branches all surface in one pass.

use serde_json::Value;

use crate::ast::shape::{NameShape, split_db_table};
use crate::ast::{QueryNode, WhereExpr};
use crate::errors::{CompileError, ErrorSet, Outcome};
use crate::funcs::{self, FunctionCatalog, Registry, Row};
use crate::guard;
use crate::jsonpath;
use crate::router;
use crate::schema::Schema;
use crate::treemap::{TreePath, map_trees};

/// The query-to-SQL compiler.
///
/// Holds the declared schema and the custom function/object catalog, both
/// immutable across compilations; a compiler may be shared freely since
/// every compile call threads its own error context.
pub struct Compiler<C = Registry> {
    schema: Schema,
    catalog: C,
}

impl Compiler<Registry> {
    pub fn new(schema: Schema) -> Self {
        Compiler {
            schema,
            catalog: Registry::new(),
        }
    }

    /// Register a custom function callback, reachable from `name=>(...)`
    /// selections and values.
    pub fn register_function<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[String], Option<&Row>) -> String + Send + Sync + 'static,
    {
        self.catalog.register(name, f);
    }

    /// Install the object graph reachable from `"@.path"` arguments.
    pub fn set_objects(&mut self, objects: Value) {
        self.catalog.set_objects(objects);
    }
}

impl<C: FunctionCatalog> Compiler<C> {
    /// Build a compiler around an alternative catalog implementation.
    pub fn with_catalog(schema: Schema, catalog: C) -> Self {
        Compiler { schema, catalog }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Compile a SELECT statement.
    pub fn select(&self, query: &QueryNode) -> Outcome {
        let mut errors = ErrorSet::new();
        let sql = self.build_select(query, &mut errors).unwrap_or_default();
        errors.outcome(sql)
    }

    /// Compile an INSERT statement from a query node and a data row.
    pub fn create(&self, query: &QueryNode, row: &Row) -> Outcome {
        let mut errors = ErrorSet::new();
        let sql = self.build_create(query, row, &mut errors).unwrap_or_default();
        errors.outcome(sql)
    }

    /// Compile an UPDATE statement. A non-empty `where` is mandatory;
    /// there is no blind full-table mutation.
    pub fn update(&self, query: &QueryNode, row: &Row) -> Outcome {
        let mut errors = ErrorSet::new();
        let sql = self.build_update(query, row, &mut errors).unwrap_or_default();
        errors.outcome(sql)
    }

    /// Compile a DELETE statement. A non-empty `where` is mandatory.
    pub fn delete(&self, query: &QueryNode) -> Outcome {
        let mut errors = ErrorSet::new();
        let sql = self.build_delete(query, &mut errors).unwrap_or_default();
        errors.outcome(sql)
    }

    fn build_select(&self, query: &QueryNode, errors: &mut ErrorSet) -> Option<String> {
        // A function tag at the root short-circuits the whole statement to
        // a single evaluator result: a "virtual query" for stored routines.
        if NameShape::classify(&query.name) == NameShape::FuncTag {
            return funcs::evaluate(&query.name, None, &self.catalog, errors);
        }

        let (db, table) = self.checked_db_table(&query.name, errors)?;

        let columns = query.columns.as_deref().unwrap_or_default();
        let trees = map_trees(columns);
        if trees.is_empty() {
            errors.push(CompileError::NoColumns);
        }

        // The root node is the first correlation level: its where rides
        // every per-column wrap instead of the outer statement, so each
        // selected column is a self-contained correlated subquery.
        let root_where = where_clause(&query.wheres, errors);
        let mut selections = Vec::new();
        for tree in &trees {
            let Some((fragment, as_name)) =
                self.column_from_tree(columns, tree, 0, &query.name, errors)
            else {
                continue;
            };
            selections.push(format!(
                "(SELECT {fragment} FROM {db}.{table}{root_where}) AS {as_name}"
            ));
        }

        let group = group_clause(query.group.as_deref(), errors);
        let having = having_clause(query.having.as_deref(), errors);
        let sort = sort_clause(query.sort.as_deref(), errors);
        let limit = limit_clause(query.limit.as_deref());

        Some(format!(
            "SELECT {} FROM {db}.{table}{group}{having}{sort}{limit}",
            selections.join(",")
        ))
    }

    /// Walk one TreePath down to its leaf, wrapping every intermediate
    /// level in a correlated subquery. The leaf's alias (or bare name) is
    /// carried back up so the outermost SELECT list gets exactly one `AS`
    /// per path, no matter how deep the routing went.
    fn column_from_tree(
        &self,
        columns: &[QueryNode],
        tree: &TreePath,
        index: usize,
        enclosing: &str,
        errors: &mut ErrorSet,
    ) -> Option<(String, String)> {
        let col = columns.get(tree[index])?;

        if tree.get(index + 1).is_none() || col.alias.is_some() {
            let as_name = col.alias.clone().unwrap_or_else(|| col.name.clone());
            let fragment = router::route(&self.schema, &self.catalog, col, enclosing, errors)?;
            return Some((fragment, as_name));
        }

        let children = col.columns.as_deref()?;
        let (inner, as_name) =
            self.column_from_tree(children, tree, index + 1, &col.name, errors)?;

        let where_sql = where_clause(&col.wheres, errors);
        let group = group_clause(col.group.as_deref(), errors);
        let limit = limit_clause(col.limit.as_deref());
        let sort = sort_clause(col.sort.as_deref(), errors);

        Some((
            format!(
                "(SELECT {inner} FROM {}{where_sql}{group}{limit}{sort})",
                col.name
            ),
            as_name,
        ))
    }

    fn build_create(&self, query: &QueryNode, row: &Row, errors: &mut ErrorSet) -> Option<String> {
        if NameShape::classify(&query.name) == NameShape::FuncTag {
            return funcs::evaluate(&query.name, Some(row), &self.catalog, errors);
        }

        let (db, table) = self.checked_db_table(&query.name, errors)?;
        let (columns, values) = self.parse_data(db, table, row, errors);
        if columns.is_empty() || values.is_empty() {
            errors.fail(CompileError::EmptyRow);
        }

        Some(format!(
            "INSERT INTO {db}.{table} ({}) VALUES ({})",
            columns.join(","),
            values.join(",")
        ))
    }

    fn build_update(&self, query: &QueryNode, row: &Row, errors: &mut ErrorSet) -> Option<String> {
        if NameShape::classify(&query.name) == NameShape::FuncTag {
            return funcs::evaluate(&query.name, Some(row), &self.catalog, errors);
        }

        let (db, table) = self.checked_db_table(&query.name, errors)?;
        let (columns, values) = self.parse_data(db, table, row, errors);
        if columns.is_empty() || values.is_empty() {
            errors.fail(CompileError::EmptyRow);
        }

        if query.wheres.is_empty() {
            errors.fail(CompileError::UpdateWithoutWhere);
        }

        let set = columns
            .iter()
            .zip(&values)
            .map(|(c, v)| format!("{c} = {v}"))
            .collect::<Vec<_>>()
            .join(",");
        let where_sql = where_clause(&query.wheres, errors);

        Some(format!("UPDATE {db}.{table} SET {set}{where_sql}"))
    }

    fn build_delete(&self, query: &QueryNode, errors: &mut ErrorSet) -> Option<String> {
        if NameShape::classify(&query.name) == NameShape::FuncTag {
            return funcs::evaluate(&query.name, None, &self.catalog, errors);
        }

        // Checked before the schema lookup: the guarantee against blind
        // full-table deletion does not depend on a valid schema.
        if query.wheres.is_empty() {
            errors.fail(CompileError::DeleteWithoutWhere);
            return None;
        }

        let (db, table) = self.checked_db_table(&query.name, errors)?;
        let where_sql = where_clause(&query.wheres, errors);

        Some(format!("DELETE FROM {db}.{table}{where_sql}"))
    }

    /// Parse one data row into paired column and value fragments.
    ///
    /// `$`-prefixed keys are JSON-path writes: the value is spliced into
    /// the column through `JSON_SET`, wrapped so a failed set (wrong type,
    /// bad path) falls back to the existing column value instead of
    /// nulling it. Keys that miss the schema are dropped with a recorded
    /// complaint.
    fn parse_data(
        &self,
        db: &str,
        table: &str,
        row: &Row,
        errors: &mut ErrorSet,
    ) -> (Vec<String>, Vec<String>) {
        let mut columns = Vec::new();
        let mut values = Vec::new();

        for (key, value) in row {
            let (column, rendered) = if key.starts_with('$') {
                let Some(encoded) = encode_value(value, errors) else {
                    continue;
                };
                let Some(column) = jsonpath::root_column(key) else {
                    errors.push(CompileError::MalformedJsonPath(key.clone()));
                    continue;
                };
                let Some(set_expr) = jsonpath::set(db, table, key, &encoded, errors) else {
                    continue;
                };
                (
                    column.to_string(),
                    format!("IF({set_expr} IS NOT NULL, {set_expr}, {column})"),
                )
            } else {
                let Some(encoded) = encode_value(value, errors) else {
                    continue;
                };
                (key.clone(), encoded)
            };

            if !self.schema.has_column(db, table, &column) {
                errors.push(CompileError::UnknownDataKey {
                    db: db.to_string(),
                    table: table.to_string(),
                    column,
                });
                continue;
            }

            columns.push(column);
            values.push(rendered);
        }

        (columns, values)
    }

    fn checked_db_table<'a>(
        &self,
        name: &'a str,
        errors: &mut ErrorSet,
    ) -> Option<(&'a str, &'a str)> {
        let Some((db, table)) = split_db_table(name) else {
            errors.fail(CompileError::MalformedDbTable(name.to_string()));
            return None;
        };
        if !self.schema.has_table(db, table) {
            errors.fail(CompileError::UnknownTable(db.to_string(), table.to_string()));
            return None;
        }
        Some((db, table))
    }
}

/// Encode one row value as SQL text: strings single-quoted, numbers and
/// booleans bare, sequences and mappings as JSON constructor calls, the
/// literal string `"NULL"` as SQL NULL. JSON nulls are dropped.
pub fn encode_value(value: &Value, errors: &mut ErrorSet) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if s == "NULL" => Some("NULL".to_string()),
        Value::String(s) => {
            if !guard::check(s, errors) {
                return None;
            }
            Some(format!("'{s}'"))
        }
        Value::Array(items) => {
            let encoded: Vec<String> = items
                .iter()
                .filter_map(|item| encode_value(item, errors))
                .collect();
            Some(format!("JSON_ARRAY({})", encoded.join(",")))
        }
        Value::Object(map) => {
            let mut pairs = Vec::new();
            for (key, val) in map {
                let Some(encoded) = encode_value(val, errors) else {
                    continue;
                };
                pairs.push(format!("'{key}', {encoded}"));
            }
            Some(format!("JSON_OBJECT({})", pairs.join(",")))
        }
    }
}

/// Assemble the WHERE clause: each entry is guarded, OR-groups are joined
/// with `OR`, and surviving entries are ANDed. Empty input or all-dropped
/// entries produce an empty clause.
pub(crate) fn where_clause(wheres: &[WhereExpr], errors: &mut ErrorSet) -> String {
    let mut parts = Vec::new();
    for expr in wheres {
        match expr {
            WhereExpr::Single(condition) => {
                if guard::check(condition, errors) {
                    parts.push(condition.clone());
                }
            }
            WhereExpr::Any(alternatives) => {
                let kept: Vec<&str> = alternatives
                    .iter()
                    .filter(|alt| guard::check(alt, errors))
                    .map(String::as_str)
                    .collect();
                if !kept.is_empty() {
                    parts.push(kept.join(" OR "));
                }
            }
        }
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

pub(crate) fn sort_clause(sort: Option<&str>, errors: &mut ErrorSet) -> String {
    match sort {
        Some(sort) if guard::check(sort, errors) => format!(" ORDER BY {sort}"),
        _ => String::new(),
    }
}

pub(crate) fn limit_clause(limit: Option<&[u64]>) -> String {
    match limit {
        Some(limit) if !limit.is_empty() => {
            let parts: Vec<String> = limit.iter().map(u64::to_string).collect();
            format!(" LIMIT {}", parts.join(","))
        }
        _ => String::new(),
    }
}

pub(crate) fn group_clause(group: Option<&[String]>, errors: &mut ErrorSet) -> String {
    match group {
        Some(group) if !group.is_empty() => {
            let kept: Vec<&str> = group
                .iter()
                .filter(|g| guard::check(g, errors))
                .map(String::as_str)
                .collect();
            if kept.is_empty() {
                String::new()
            } else {
                format!(" GROUP BY {}", kept.join(","))
            }
        }
        _ => String::new(),
    }
}

pub(crate) fn having_clause(having: Option<&[String]>, errors: &mut ErrorSet) -> String {
    match having {
        Some(having) if !having.is_empty() => {
            let kept: Vec<&str> = having
                .iter()
                .filter(|h| guard::check(h, errors))
                .map(String::as_str)
                .collect();
            if kept.is_empty() {
                String::new()
            } else {
                format!(" HAVING {}", kept.join(" AND "))
            }
        }
        _ => String::new(),
    }
}
