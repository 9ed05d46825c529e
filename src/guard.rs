use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{CompileError, ErrorSet};

/// Keywords and separators that must never reach emitted SQL through a
/// caller-supplied string. The spaces are part of the patterns: a column
/// literally named `updated_at` stays legal while `update x` does not.
static BANNED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(drop )|;|(update )|( truncate)").unwrap());

/// Check one fragment of caller text destined for SQL. A hit is fatal:
/// the compilation keeps walking to surface other problems but no query
/// text will be released.
pub fn check(text: &str, errors: &mut ErrorSet) -> bool {
    if BANNED.is_match(text) {
        errors.fail(CompileError::Banned(text.to_string()));
        false
    } else {
        true
    }
}
