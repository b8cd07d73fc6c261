//! Parser for a small boolean query language.
//!
//! A query such as `age > 18 and not (city.Contains("burg") or vip)` is split
//! into tokens, parsed into a tree of `and`/`or`/`not` connectives, and reduced
//! to a list of predicates plus a compact logic string (`A and not (B or C)`).
//! Malformed input never fails the parse; problems are reported in
//! [`ParseResult::errors`].
//!
//! ```
//! use predicate_logic::{OperatorList, QueryParser};
//!
//! let parser = QueryParser::with_operators(OperatorList::default()).unwrap();
//! let result = parser.parse("a or b or c");
//! assert_eq!(result.tree.to_string(), "(a or (b or c))");
//! assert_eq!(result.logic, "A or B or C");
//! ```

pub mod ast;
pub mod config;
pub mod lexer;
pub mod parser;
pub mod query_parser;
pub mod repl;
pub mod token;

pub use ast::{Node, Predicate};
pub use config::{ConfigError, OperatorList, QueryConfig};
pub use parser::{ParseError, ParseErrorKind, ParseResult};
pub use query_parser::QueryParser;
