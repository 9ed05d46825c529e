//! # JSequel - query description types
//!
//! This module defines the data types that describe a query before it is
//! compiled to SQL text.
//!
//! ## Architecture Overview
//!
//! The module is organized into focused submodules:
//!
//! - **[query]** - The recursive `QueryNode` input tree and `WhereExpr`
//! - **[shape]** - The five selection shapes the name router dispatches on
//! - **[tokens]** - Lexemes and argument spans inside the function evaluator
//! - **[segment]** - JSON-path segments folded into pointer expressions
//!
//! ## Core Concepts
//!
//! A query is a tree of [`QueryNode`]s. The `name` of each node decides what
//! it compiles to:
//!
//! ```text
//! "total"                    plain column, checked against the schema
//! "shop.orders"              correlated db.table selection
//! "shop.orders" + "as"       nested JSON aggregation (array of objects)
//! "concat=>(name, ' x')"     inline SQL function call
//! "$meta.tags[0]"            JSON-path pointer into a JSON column
//! ```
//!
//! Shapes are classified exactly once into [`shape::NameShape`] and matched
//! in a fixed priority order; a dotted name is textually ambiguous so the
//! order is load-bearing.
pub mod query;
pub mod segment;
pub mod shape;
pub mod tokens;

pub use query::{QueryNode, WhereExpr};
pub use segment::PathSegment;
pub use shape::NameShape;
pub use tokens::{ArgSpan, Token};
