pub mod compiler;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod predicate_where;
pub mod types;

pub use compiler::PredicateCompiler;
pub use error::PredicateError;
pub use predicate_where::{quote_column, quote_identifier, PredicateWhere};
pub use types::{CompareOp, Predicate, SqlResult, TextOp};
