//! Schema-drift planner: diffs the declared schema against the live
//! database layout and produces the DDL statements that reconcile them.
//!
//! This is the simple collaborator next to the query compiler: a three-way
//! set diff over two flat table/column lists. The caller supplies the
//! function that actually runs the generated INFORMATION_SCHEMA query and
//! hands back rows; this crate performs no I/O.

use serde::Deserialize;

use crate::compiler::Compiler;
use crate::errors::{CompileError, ErrorSet, Status};
use crate::funcs::FunctionCatalog;
use crate::schema::ColumnKind;

/// One flat column row, in the shape the INFORMATION_SCHEMA query aliases
/// its output to.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SchemaRow {
    #[serde(rename = "tableName")]
    pub table_name: String,
    #[serde(rename = "colName")]
    pub col_name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(rename = "maxLength", default)]
    pub max_length: Option<i64>,
}

/// Result envelope for a migration plan; `statements` is empty when a
/// fatal complaint was recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct Migration {
    pub status: Status,
    pub errors: Vec<String>,
    pub statements: Vec<String>,
}

impl<C: FunctionCatalog> Compiler<C> {
    /// Plan the DDL that brings the live database in line with the
    /// declared schema.
    ///
    /// `fetch` receives the INFORMATION_SCHEMA query text and returns the
    /// live rows; async callers block on their own executor at this
    /// boundary. Statement order matters: new tables are created first so
    /// new columns have somewhere to go, stale tables are dropped last.
    pub fn schema_migration<F>(&self, fetch: F) -> Migration
    where
        F: FnOnce(&str) -> Result<Vec<SchemaRow>, String>,
    {
        let mut errors = ErrorSet::new();

        let Some(db) = self.schema().first_db() else {
            errors.fail(CompileError::SchemaFetch(
                "no database declared in schema".to_string(),
            ));
            return finish(errors, Vec::new());
        };

        let info_query = format!(
            "SELECT TABLE_NAME AS tableName, COLUMN_NAME AS colName, \
             DATA_TYPE AS type, CHARACTER_MAXIMUM_LENGTH AS maxLength \
             FROM INFORMATION_SCHEMA.COLUMNS WHERE table_schema = '{db}'"
        );

        let mut old_rows = match fetch(&info_query) {
            Ok(rows) => rows,
            Err(e) => {
                errors.fail(CompileError::SchemaFetch(e));
                return finish(errors, Vec::new());
            }
        };

        // The id column is managed by the database itself; it never takes
        // part in the diff.
        old_rows.retain(|row| row.col_name != "id");

        let mut new_rows = self.flatten_declared(db);
        new_rows.retain(|row| {
            if row.col_name == "id" {
                errors.push(CompileError::ReservedIdColumn);
                false
            } else {
                true
            }
        });

        let new_tables = unique_tables(&new_rows);
        for table in &new_tables {
            if table.chars().any(|c| c.is_ascii_uppercase()) {
                errors.fail(CompileError::UppercaseTableName);
            }
        }
        let old_tables = unique_tables(&old_rows);

        let mut statements = Vec::new();

        // Created first so any new columns have a table to go to.
        for table in &new_tables {
            if !old_tables.contains(table) {
                statements.push(create_table(table));
            }
        }

        for row in &old_rows {
            if !new_rows.iter().any(|n| rows_match(n, row, &n.data_type)) {
                statements.push(delete_column(row));
            }
        }

        for row in &new_rows {
            if !old_rows.iter().any(|o| rows_match(o, row, &o.data_type)) {
                statements.push(create_column(row));
            }
        }

        for table in &old_tables {
            if !new_tables.contains(table) {
                statements.push(drop_table(table));
            }
        }

        finish(errors, statements)
    }

    /// Flatten the declared schema into the same row shape the live query
    /// returns, with the declared types mapped to their SQL spellings.
    /// Tables and columns are sorted so plans are deterministic.
    fn flatten_declared(&self, db: &str) -> Vec<SchemaRow> {
        let mut tables: Vec<_> = self.schema().tables(db).collect();
        tables.sort_by(|a, b| a.0.cmp(b.0));

        let mut rows = Vec::new();
        for (table, columns) in tables {
            let mut columns: Vec<_> = columns.iter().collect();
            columns.sort_by(|a, b| a.0.cmp(b.0));
            for (column, spec) in columns {
                let (data_type, max_length) = match spec.kind {
                    ColumnKind::String => ("varchar", Some(spec.max_length.unwrap_or(200) as i64)),
                    ColumnKind::Number => ("int", Some(spec.max_length.unwrap_or(11) as i64)),
                    ColumnKind::Date => ("timestamp", None),
                };
                rows.push(SchemaRow {
                    table_name: table.clone(),
                    col_name: column.clone(),
                    data_type: data_type.to_string(),
                    max_length,
                });
            }
        }
        rows
    }
}

fn finish(errors: ErrorSet, statements: Vec<String>) -> Migration {
    let fatal = errors.is_fatal();
    let messages = errors.errors().iter().map(ToString::to_string).collect();
    Migration {
        status: if fatal { Status::Error } else { Status::Success },
        errors: messages,
        statements: if fatal { Vec::new() } else { statements },
    }
}

fn unique_tables(rows: &[SchemaRow]) -> Vec<String> {
    let mut tables: Vec<String> = Vec::new();
    for row in rows {
        if !tables.contains(&row.table_name) {
            tables.push(row.table_name.clone());
        }
    }
    tables
}

/// Two rows describe the same column when table, name and type agree.
/// The live schema reports no max length for ints, so lengths are only
/// compared for other types (the probe side decides).
fn rows_match(a: &SchemaRow, b: &SchemaRow, probe_type: &str) -> bool {
    a.table_name == b.table_name
        && a.col_name == b.col_name
        && a.data_type == b.data_type
        && (probe_type == "int" || a.max_length == b.max_length)
}

fn create_table(table: &str) -> String {
    format!(
        "CREATE TABLE `{table}` (`id` int(11) unsigned NOT NULL AUTO_INCREMENT, \
         PRIMARY KEY (`id`)) ENGINE=InnoDB DEFAULT CHARSET=utf8"
    )
}

fn delete_column(row: &SchemaRow) -> String {
    format!("DELETE `{}` FROM `{}`", row.col_name, row.table_name)
}

fn create_column(row: &SchemaRow) -> String {
    if row.data_type == "timestamp" {
        format!(
            "ALTER TABLE `{}` ADD COLUMN `{}` {}",
            row.table_name, row.col_name, row.data_type
        )
    } else {
        format!(
            "ALTER TABLE `{}` ADD COLUMN `{}` {}({})",
            row.table_name,
            row.col_name,
            row.data_type,
            row.max_length.unwrap_or_default()
        )
    }
}

fn drop_table(table: &str) -> String {
    format!("DROP TABLE `{table}`")
}
