pub mod ast;
pub mod compiler;
pub mod errors;
pub mod funcs;
pub mod guard;
pub mod jsonpath;
pub mod migrate;
pub mod router;
pub mod schema;
pub mod treemap;

pub use ast::{NameShape, QueryNode, WhereExpr};
pub use compiler::Compiler;
pub use errors::{CompileError, ErrorSet, Outcome, Status};
pub use funcs::{FunctionCatalog, Registry, Row};
pub use migrate::{Migration, SchemaRow};
pub use schema::{ColumnKind, ColumnSpec, Schema};
pub use treemap::{TreePath, map_trees};
