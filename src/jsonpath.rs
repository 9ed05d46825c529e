//! The JSON-path mini-interpreter.
//!
//! Compiles a proprietary path expression like `$meta.tags[0][?blue]` into
//! a SQL expression that *builds the JSON pointer at query time* and feeds
//! it to `JSON_EXTRACT`/`JSON_SET`. Plain segments fold into nested
//! `CONCAT` calls; a `[?...]` search predicate has no native equivalent in
//! the target engine, so it compiles to a `JSON_SEARCH` that resolves the
//! value to a numeric index and splices it into the pointer under
//! construction.

use std::sync::LazyLock;

use regex::Regex;

use crate::ast::PathSegment;
use crate::errors::{CompileError, ErrorSet};
use crate::guard;
use crate::schema::Schema;

static SEGMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\$\w+)|(\[\d\])|(\.\w+)|(\[\?[\w\s@#:;{},.!"£$%^&*()/?|`¬\-=+~]*\])"#).unwrap()
});

static FIRST_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.\[]").unwrap());

/// Tokenize a path expression into classified segments. Text the grammar
/// does not recognize is skipped rather than rejected.
pub fn tokenize(path: &str) -> Vec<PathSegment> {
    SEGMENTS
        .find_iter(path)
        .map(|m| {
            let text = m.as_str();
            if let Some(rest) = text.strip_prefix('$') {
                PathSegment::Root(rest.to_string())
            } else if let Some(inner) = text.strip_prefix("[?") {
                PathSegment::Search(inner[..inner.len() - 1].to_string())
            } else if text.starts_with('[') {
                PathSegment::Index(text.to_string())
            } else {
                PathSegment::Target(text.to_string())
            }
        })
        .collect()
}

/// The bare column a path points into: everything between the `$` and the
/// first `.` or `[`. Used by mutation sites that need the original column
/// for the no-op fallback.
pub fn root_column(path: &str) -> Option<&str> {
    let rest = path.strip_prefix('$')?;
    match FIRST_BREAK.find(rest) {
        Some(m) => Some(&rest[..m.start()]),
        None => Some(rest),
    }
}

/// Compile `path` to `JSON_UNQUOTE(JSON_EXTRACT(db.table.col, <pointer>))`,
/// validating the root column against the schema. The schema is the source
/// of truth for the JSON-typed column the path grounds into; a miss is
/// fatal.
pub fn extract(
    schema: &Schema,
    db: &str,
    table: &str,
    path: &str,
    errors: &mut ErrorSet,
) -> Option<String> {
    if !guard::check(path, errors) {
        return None;
    }
    let segments = tokenize(path);
    let column = root_of(&segments, path, errors)?;

    if !schema.has_column(db, table, &column) {
        errors.fail(CompileError::UnknownColumn {
            db: db.to_string(),
            table: table.to_string(),
            column,
        });
        return None;
    }

    let name = format!("{db}.{table}.{column}");
    let pointer = fold(&name, &segments);
    Some(format!("JSON_UNQUOTE(JSON_EXTRACT({name}, {pointer}))"))
}

/// Table-less variant used inside function arguments, where no enclosing
/// table is implicit and the root name is taken as-is.
pub fn extract_unscoped(path: &str, errors: &mut ErrorSet) -> Option<String> {
    if !guard::check(path, errors) {
        return None;
    }
    let segments = tokenize(path);
    let name = root_of(&segments, path, errors)?;
    let pointer = fold(&name, &segments);
    Some(format!("JSON_UNQUOTE(JSON_EXTRACT({name}, {pointer}))"))
}

/// Compile `path` to `JSON_SET(db.table.col, <pointer>, <value>)`. The
/// value must already be SQL-encoded. Column validity is checked by the
/// data-row parser before this is reached.
pub fn set(db: &str, table: &str, path: &str, value: &str, errors: &mut ErrorSet) -> Option<String> {
    if !guard::check(path, errors) {
        return None;
    }
    let segments = tokenize(path);
    let column = root_of(&segments, path, errors)?;
    let name = format!("{db}.{table}.{column}");
    let pointer = fold(&name, &segments);
    Some(format!("JSON_SET({name}, {pointer}, {value})"))
}

fn root_of(segments: &[PathSegment], path: &str, errors: &mut ErrorSet) -> Option<String> {
    match segments.first() {
        Some(PathSegment::Root(name)) => Some(name.clone()),
        _ => {
            errors.push(CompileError::MalformedJsonPath(path.to_string()));
            None
        }
    }
}

/// Fold segments left-to-right into one pointer-building expression. Each
/// step wraps the previous result in another `CONCAT`.
fn fold(name: &str, segments: &[PathSegment]) -> String {
    let mut prev = String::new();
    for segment in segments {
        prev = match segment {
            PathSegment::Root(_) => r#"CONCAT("$")"#.to_string(),
            PathSegment::Index(text) | PathSegment::Target(text) => {
                format!(r#"CONCAT({prev}, "{text}")"#)
            }
            PathSegment::Search(literal) => format!(
                "CONCAT({prev}, CONCAT('[',SUBSTR(JSON_SEARCH(JSON_EXTRACT({name}, \"$\"),'one','{literal}'), 4,LOCATE(']',JSON_SEARCH(JSON_EXTRACT({name}, \"$\"), 'one', '{literal}'))-4),']'))"
            ),
        };
    }
    prev
}
