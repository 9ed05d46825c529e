use serde::{Deserialize, Serialize};

/// One node of the query description tree.
///
/// A node may represent a table root, a nested correlated selection, or a
/// leaf column. The JSON field names match the wire shape callers send:
///
/// ```json
/// {
///   "name": "shop.orders",
///   "columns": [{ "name": "id" }, { "name": "total" }],
///   "where": ["id = 1"]
/// }
/// ```
///
/// `columns` is deliberately `Option<Vec<_>>`: a node with `"columns": []`
/// still counts as branching for the tree mapper, while a node with no
/// `columns` key at all is a leaf.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryNode {
    #[serde(default)]
    pub name: String,

    /// Alias for the selection. On a dotted name this switches the meaning
    /// from correlated scalar subquery to nested JSON aggregation.
    #[serde(rename = "as", default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<QueryNode>>,

    /// Conditions ANDed together; each entry may itself be an OR-group.
    #[serde(rename = "where", default, skip_serializing_if = "Vec::is_empty")]
    pub wheres: Vec<WhereExpr>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,

    /// Offset/count pair, or count alone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<Vec<u64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub having: Option<Vec<String>>,
}

impl QueryNode {
    /// A bare node with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        QueryNode {
            name: name.into(),
            ..QueryNode::default()
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_columns(mut self, columns: Vec<QueryNode>) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn with_where(mut self, condition: impl Into<String>) -> Self {
        self.wheres.push(WhereExpr::Single(condition.into()));
        self
    }
}

/// One WHERE entry: a single condition, or a group of alternatives that
/// will be joined with `OR`. Entries of the outer sequence are ANDed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WhereExpr {
    Single(String),
    Any(Vec<String>),
}
