use serde::Serialize;
use thiserror::Error;

/// Everything a compilation can complain about.
///
/// Two severities exist but are not encoded here; the call site decides
/// whether a complaint is recoverable ([`ErrorSet::push`]) or fatal
/// ([`ErrorSet::fail`]). The messages are the user-facing strings carried
/// out in the [`Outcome`] envelope.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("the string '{0}' is not allowed")]
    Banned(String),

    #[error("{0}.{1} not found in schema")]
    UnknownTable(String, String),

    #[error("{db}.{table}.{column} not found in schema")]
    UnknownColumn {
        db: String,
        table: String,
        column: String,
    },

    #[error("{db} {table} {column} column not in schema")]
    UnknownDataKey {
        db: String,
        table: String,
        column: String,
    },

    #[error("there must be an \"as\" value for every function selection: {0}")]
    FunctionNeedsAlias(String),

    #[error("there must be an \"as\" value for every json path selection: {0}")]
    PathNeedsAlias(String),

    #[error("there must be a \"where\" value for every db.table selection: {0}")]
    CorrelationNeedsWhere(String),

    #[error("'{0}' is not a valid db.table name")]
    MalformedDbTable(String),

    #[error("no columns included at {0}.{1}")]
    NoNestedColumns(String, String),

    #[error("no columns provided for selection")]
    NoColumns,

    #[error("column didn't meet the requirements for a selection: {0}")]
    UnroutableColumn(String),

    #[error("could not parse function expression: {0}")]
    MalformedFunction(String),

    #[error("'{0}' is not a valid json path")]
    MalformedJsonPath(String),

    #[error("no where condition provided. You cannot update all records in the table at once.")]
    UpdateWithoutWhere,

    #[error("no where condition provided. JSequel cannot delete all records in a single query.")]
    DeleteWithoutWhere,

    #[error("there must be at least one column and value when writing a record")]
    EmptyRow,

    #[error("the column name \"id\" is reserved and has been removed from the schema query")]
    ReservedIdColumn,

    #[error("table names must contain lower-case letters only")]
    UppercaseTableName,

    #[error("schema fetch failed: {0}")]
    SchemaFetch(String),
}

/// Per-compilation error accumulator.
///
/// One of these is created at each entrypoint and threaded `&mut` through
/// every call, so concurrent compilations over a shared [`crate::Compiler`]
/// never touch common state. Once the fatal flag is set it stays set and
/// the final envelope suppresses the query text.
#[derive(Debug, Default)]
pub struct ErrorSet {
    errors: Vec<CompileError>,
    fatal: bool,
}

impl ErrorSet {
    pub fn new() -> Self {
        ErrorSet::default()
    }

    /// Record a recoverable complaint; the offending fragment is dropped
    /// and compilation continues.
    pub fn push(&mut self, error: CompileError) {
        self.errors.push(error);
    }

    /// Record a complaint that must block emission.
    pub fn fail(&mut self, error: CompileError) {
        self.errors.push(error);
        self.fatal = true;
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    pub fn errors(&self) -> &[CompileError] {
        &self.errors
    }

    /// Close out the compilation. The query text is only released when no
    /// fatal complaint was recorded.
    pub fn outcome(self, query: String) -> Outcome {
        if self.fatal {
            Outcome {
                status: Status::Error,
                errors: self.errors.iter().map(ToString::to_string).collect(),
                query: String::new(),
            }
        } else {
            Outcome {
                status: Status::Success,
                errors: self.errors.iter().map(ToString::to_string).collect(),
                query,
            }
        }
    }
}

/// Result envelope returned by every compiler entrypoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub status: Status,
    pub errors: Vec<String>,
    pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_suppresses_query() {
        let mut errors = ErrorSet::new();
        errors.push(CompileError::NoColumns);
        assert!(!errors.is_fatal());

        errors.fail(CompileError::UpdateWithoutWhere);
        assert!(errors.is_fatal());

        let out = errors.outcome("UPDATE x".into());
        assert_eq!(out.status, Status::Error);
        assert_eq!(out.query, "");
        assert_eq!(out.errors.len(), 2);
    }

    #[test]
    fn success_keeps_recoverable_messages() {
        let mut errors = ErrorSet::new();
        errors.push(CompileError::NoColumns);
        let out = errors.outcome("SELECT 1".into());
        assert_eq!(out.status, Status::Success);
        assert_eq!(out.query, "SELECT 1");
        assert_eq!(out.errors, vec!["no columns provided for selection"]);
    }
}
