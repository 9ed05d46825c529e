/// One segment of a JSON-path expression, classified during tokenization.
///
/// Segments are folded left-to-right; each one produces a SQL snippet that
/// concatenates onto the pointer built so far.
///
/// # Examples
/// - `$meta` → `Root("meta")`
/// - `[0]` → `Index("[0]")`
/// - `.tags` → `Target(".tags")`
/// - `[?blue]` → `Search("blue")` (value-based lookup resolved at query time)
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// Leading `$name`; carries the bare column name
    Root(String),
    /// `[digit]` array index, literal text preserved
    Index(String),
    /// `.name` field target, literal text preserved
    Target(String),
    /// `[?...]` search predicate; carries the inner literal to locate
    Search(String),
}
