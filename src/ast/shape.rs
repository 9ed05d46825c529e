use std::sync::LazyLock;

use regex::Regex;

static FUNC_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+=>").unwrap());
static JSON_PATH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\$\w+").unwrap());
static DB_TABLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+\.\w+$").unwrap());
static COLUMN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+$").unwrap());

/// The shape of a `QueryNode` name, classified once before routing.
///
/// The variants mirror the router's dispatch priority. A dotted name can
/// compile to two different things depending on whether the node carries an
/// alias, so `DbTable` covers both and the router inspects the alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameShape {
    /// `name=>(args)` - inline function call
    FuncTag,
    /// `$column.path[0]` - JSON-path pointer
    JsonPath,
    /// `db.table` - correlated selection or nested aggregation
    DbTable,
    /// `column` - plain schema-checked column
    Column,
    /// Anything else; always a routing error
    Other,
}

impl NameShape {
    pub fn classify(name: &str) -> Self {
        if FUNC_TAG.is_match(name) {
            NameShape::FuncTag
        } else if JSON_PATH.is_match(name) {
            NameShape::JsonPath
        } else if DB_TABLE.is_match(name) {
            NameShape::DbTable
        } else if COLUMN.is_match(name) {
            NameShape::Column
        } else {
            NameShape::Other
        }
    }
}

/// Split a `db.table` name into its two parts, without validating either
/// against the schema.
pub fn split_db_table(name: &str) -> Option<(&str, &str)> {
    if !DB_TABLE.is_match(name) {
        return None;
    }
    name.split_once('.')
}

#[test]
fn classification_priority() {
    assert_eq!(NameShape::classify("concat=>(a, b)"), NameShape::FuncTag);
    assert_eq!(NameShape::classify("$meta.tags[0]"), NameShape::JsonPath);
    assert_eq!(NameShape::classify("shop.orders"), NameShape::DbTable);
    assert_eq!(NameShape::classify("total"), NameShape::Column);
    assert_eq!(NameShape::classify("shop.orders.id"), NameShape::Other);
    assert_eq!(NameShape::classify(""), NameShape::Other);
}
