/// A classified lexeme inside a function-call expression.
///
/// The function evaluator never sees commas: the tokenizer grammar has no
/// separator alternative, so `(a, b)` lexes straight to two tokens and
/// argument lists are rebuilt with commas at emission time.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `(`
    Open,
    /// `)`
    Close,
    /// `name=>` introducing a nested call; carries the bare name
    FuncTag(String),
    /// A quoted literal, kept with its quote characters so custom-object
    /// (`"@.a.b"`) and JSON-path (`"$col.x"`) arguments stay recognizable
    Quoted(String),
    /// Identifiers, dotted names, operators and other plain text
    Text(String),
}

impl Token {
    /// The literal text this token contributes when re-joined into SQL.
    pub fn text(&self) -> String {
        match self {
            Token::Open => "(".to_string(),
            Token::Close => ")".to_string(),
            Token::FuncTag(name) => format!("{name}=>"),
            Token::Quoted(s) | Token::Text(s) => s.clone(),
        }
    }
}

/// A `[start, end)` slice over a token sequence holding one balanced
/// argument list: `start` is the index after the opening paren, `end` the
/// index of its matching close. Spans always point at the innermost
/// unresolved pair at each reduction step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpan {
    pub start: usize,
    pub end: usize,
}

impl ArgSpan {
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
