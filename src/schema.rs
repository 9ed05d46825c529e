use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The declared schema: database → table → column → descriptor.
///
/// Loaded once per compiler and read-only afterwards; every existence check
/// the compiler performs goes through here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(pub HashMap<String, HashMap<String, HashMap<String, ColumnSpec>>>);

/// Declared type of a column in the schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    #[default]
    String,
    Number,
    Date,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    #[serde(rename = "type", default)]
    pub kind: ColumnKind,
    #[serde(rename = "maxLength", default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

impl Schema {
    pub fn new() -> Self {
        Schema::default()
    }

    /// Insert a column descriptor, creating the db/table levels as needed.
    /// Mostly a convenience for tests and hand-built schemas; production
    /// callers usually deserialize the whole three-level map from JSON.
    pub fn declare(
        &mut self,
        db: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
        spec: ColumnSpec,
    ) -> &mut Self {
        self.0
            .entry(db.into())
            .or_default()
            .entry(table.into())
            .or_default()
            .insert(column.into(), spec);
        self
    }

    pub fn has_table(&self, db: &str, table: &str) -> bool {
        self.0.get(db).is_some_and(|t| t.contains_key(table))
    }

    pub fn has_column(&self, db: &str, table: &str, column: &str) -> bool {
        self.column(db, table, column).is_some()
    }

    pub fn column(&self, db: &str, table: &str, column: &str) -> Option<&ColumnSpec> {
        self.0.get(db)?.get(table)?.get(column)
    }

    /// Name of the first declared database. The migration planner works on
    /// one database at a time, keyed off this.
    pub fn first_db(&self) -> Option<&str> {
        self.0.keys().next().map(String::as_str)
    }

    pub fn tables(&self, db: &str) -> impl Iterator<Item = (&String, &HashMap<String, ColumnSpec>)> {
        self.0.get(db).into_iter().flatten()
    }
}
