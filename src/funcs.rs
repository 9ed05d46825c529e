//! The inline function-call evaluator.
//!
//! A function tag like `concat=>(name, ' x', jsonExtract=>("$meta.tags"))`
//! is tokenized with a composite lexical grammar and then reduced without a
//! parser stack: every pass pairs brackets by depth count, takes the
//! leftmost-innermost argument span and flattens it back into the token
//! stream, until only the outermost call's own argument list remains.
//!
//! Names with a registered custom callback produce the callback's output;
//! every other name is uppercased into a SQL function call. That open
//! acceptance is deliberate - the lexical guard's keyword denylist is the
//! sole injection defense on this path.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::ast::{ArgSpan, Token};
use crate::errors::{CompileError, ErrorSet};
use crate::guard;
use crate::jsonpath;

/// A flat row of data being written, as supplied to Create/Update.
pub type Row = serde_json::Map<String, Value>;

/// A caller-registered function body. Receives the flattened argument list
/// and, during Create/Update compilation, the row being written.
pub type CustomFn = Box<dyn Fn(&[String], Option<&Row>) -> String + Send + Sync>;

/// Capability interface the evaluator resolves custom names through,
/// decoupling the core from any specific registry implementation.
pub trait FunctionCatalog {
    /// Resolve a registered function call, or `None` to fall back to the
    /// uppercase SQL-function rendering.
    fn call(&self, name: &str, args: &[String], row: Option<&Row>) -> Option<String>;

    /// Resolve a dotted custom-object path (`@.a.b`, leading `@` included).
    fn object(&self, path: &str) -> Option<Value>;
}

/// The stock [`FunctionCatalog`]: a name → callback map plus one nested
/// object graph reachable from `"@.path"` arguments.
#[derive(Default)]
pub struct Registry {
    functions: HashMap<String, CustomFn>,
    objects: Value,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[String], Option<&Row>) -> String + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Box::new(f));
    }

    pub fn set_objects(&mut self, objects: Value) {
        self.objects = objects;
    }
}

impl FunctionCatalog for Registry {
    fn call(&self, name: &str, args: &[String], row: Option<&Row>) -> Option<String> {
        self.functions.get(name).map(|f| f(args, row))
    }

    fn object(&self, path: &str) -> Option<Value> {
        let mut current = &self.objects;
        // First segment is the bare "@" naming the graph itself.
        for segment in path.split('.').skip(1) {
            current = current.get(segment)?;
        }
        Some(current.clone())
    }
}

static TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"['"`][\[{].*[}\]]['"`]|\w+=>|\(|\)|['"`].*?['"`]|\$*(?:\w+\.)+\w+|\$*\w+|\\|/|\+|>=|<=|=>|>|<|-|\*|="#,
    )
    .unwrap()
});

static JSON_PATH_ARG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"^"\$\w+"#).unwrap());

/// Lex the text after the function's `=>` into classified tokens. Commas
/// and whitespace fall through the grammar and simply vanish.
fn tokenize(input: &str) -> Vec<Token> {
    TOKENS
        .find_iter(input)
        .map(|m| {
            let text = m.as_str();
            match text {
                "(" => Token::Open,
                ")" => Token::Close,
                _ => {
                    if let Some(name) = text.strip_suffix("=>")
                        && !name.is_empty()
                    {
                        Token::FuncTag(name.to_string())
                    } else if text.starts_with(['\'', '"', '`']) {
                        Token::Quoted(text.to_string())
                    } else {
                        Token::Text(text.to_string())
                    }
                }
            }
        })
        .collect()
}

/// Record one `ArgSpan` per close paren by matching it to the most recent
/// open paren seen at the same running depth. The depth counter only moves
/// on open-after-non-close and close-after-close, which keeps the counts
/// monotonic per nesting level and makes the pairing correct without a
/// stack.
fn arg_positions(tokens: &[Token]) -> Vec<ArgSpan> {
    #[derive(PartialEq, Clone, Copy)]
    enum Kind {
        Open,
        Close,
    }

    let mut count: i64 = 0;
    let mut kinds: Vec<Kind> = Vec::new();
    let mut counts: Vec<i64> = Vec::new();
    let mut indexes: Vec<usize> = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        match token {
            Token::Open => {
                if kinds.last() != Some(&Kind::Close) {
                    count += 1;
                }
                kinds.push(Kind::Open);
                counts.push(count);
                indexes.push(index);
            }
            Token::Close => {
                if kinds.last() == Some(&Kind::Close) {
                    count -= 1;
                }
                kinds.push(Kind::Close);
                counts.push(count);
                indexes.push(index);
            }
            _ => {}
        }
    }

    let mut spans = Vec::new();
    for i in 0..kinds.len() {
        if kinds[i] == Kind::Close {
            let depth = counts[i];
            if let Some(j) = (0..i).rev().find(|&j| counts[j] == depth) {
                spans.push(ArgSpan {
                    start: indexes[j] + 1,
                    end: indexes[i],
                });
            }
        }
    }
    spans
}

enum Step {
    /// The outermost argument list has been reached.
    Done(Vec<String>),
    /// One nested call was folded back into the stream.
    Reduced(Vec<Token>),
}

/// Evaluate one function expression to a SQL fragment.
///
/// `row` is the record being written when compiling Create/Update, passed
/// through to custom callbacks.
pub fn evaluate(
    expr: &str,
    row: Option<&Row>,
    catalog: &dyn FunctionCatalog,
    errors: &mut ErrorSet,
) -> Option<String> {
    if !guard::check(expr, errors) {
        return None;
    }

    let Some(split) = expr.find("=>") else {
        errors.push(CompileError::MalformedFunction(expr.to_string()));
        return None;
    };
    let func = &expr[..split];
    let mut tokens = tokenize(&expr[split + 2..]);

    let args = loop {
        let spans = arg_positions(&tokens);
        if spans.is_empty() {
            errors.push(CompileError::MalformedFunction(expr.to_string()));
            return None;
        }
        match flatten_once(tokens, &spans, catalog, row) {
            Step::Done(args) => break args,
            Step::Reduced(next) => tokens = next,
        }
    };

    if let Some(out) = catalog.call(func, &args, row) {
        return Some(out);
    }

    // Arguments that are themselves quoted JSON paths go through the
    // table-less extractor before joining the call.
    let rendered: Vec<String> = args
        .iter()
        .map(|arg| {
            if JSON_PATH_ARG.is_match(arg) {
                jsonpath::extract_unscoped(&arg[1..arg.len() - 1], errors).unwrap_or_default()
            } else {
                arg.clone()
            }
        })
        .collect();

    Some(format!("{}({})", func.to_uppercase(), rendered.join(",")))
}

/// Resolve one nested call: registered callback output, or the uppercased
/// SQL rendering.
fn resolve_call(
    name: &str,
    args: &[String],
    row: Option<&Row>,
    catalog: &dyn FunctionCatalog,
) -> String {
    catalog
        .call(name, args, row)
        .unwrap_or_else(|| format!("{}({})", name.to_uppercase(), args.join(",")))
}

/// Substitute a quoted `"@.path"` argument from the custom object graph.
/// Unresolvable paths keep their literal text.
fn resolve_object(token_text: &str, catalog: &dyn FunctionCatalog) -> String {
    let path = &token_text[1..token_text.len() - 1];
    match catalog.object(path) {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => token_text.to_string(),
        Some(other) => other.to_string(),
    }
}

fn is_object_arg(token: &Token) -> bool {
    matches!(token, Token::Quoted(s) if s.starts_with("\"@"))
}

/// Flatten the leftmost-innermost argument span.
///
/// Terminal case: the span starts right after the outermost call's own
/// opening paren (start == 1), so its tokens *are* the final argument
/// list. Otherwise the span, its brackets, and the preceding token naming
/// the nested call collapse into one resolved token.
fn flatten_once(
    tokens: Vec<Token>,
    spans: &[ArgSpan],
    catalog: &dyn FunctionCatalog,
    row: Option<&Row>,
) -> Step {
    let ArgSpan { start, end } = spans[0];

    if start == 1 && spans[0].is_empty() {
        // `name=>()` - no arguments at all.
        return Step::Done(Vec::new());
    }

    if start == 1 {
        let args = tokens[start..end]
            .iter()
            .map(|token| match token {
                Token::FuncTag(name) => resolve_call(name, &[], row, catalog),
                t if is_object_arg(t) => resolve_object(&t.text(), catalog),
                t => t.text(),
            })
            .collect();
        return Step::Done(args);
    }

    let inner: Vec<String> = tokens[start..end].iter().map(Token::text).collect();
    let callee = start.checked_sub(2);

    let mut next = Vec::with_capacity(tokens.len());
    for (i, token) in tokens.iter().enumerate() {
        if Some(i) == callee {
            match token {
                Token::FuncTag(name) => {
                    next.push(Token::Text(resolve_call(name, &inner, row, catalog)));
                    continue;
                }
                t if is_object_arg(t) => {
                    next.push(Token::Text(resolve_object(&t.text(), catalog)));
                    continue;
                }
                _ => {}
            }
        }
        // Drop the opening paren and the span contents up to and
        // including the close.
        if i + 1 == start || (i >= start && i <= end) {
            continue;
        }
        next.push(token.clone());
    }

    Step::Reduced(next)
}
