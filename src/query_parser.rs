//! Entry point that ties the tokenizer and the parser to one operator configuration.

use tracing::debug;

use crate::config::{ConfigError, OperatorList, QueryConfig};
use crate::lexer::Tokenizer;
use crate::parser::{ParseResult, Parser, DEFAULT_MAX_DEPTH};

/// Parses queries against an operator list captured at construction time.
///
/// Every call to [`QueryParser::parse`] owns its own cursor and result lists,
/// so a single instance can be shared by reference between threads.
#[derive(Debug, Clone)]
pub struct QueryParser {
    operators: OperatorList,
    tokenizer: Tokenizer,
    max_depth: usize,
}

impl QueryParser {
    pub fn new(config: &QueryConfig) -> Result<Self, ConfigError> {
        let mut parser = Self::with_operators(config.operator_list()?)?;
        parser.max_depth = config.max_depth;
        Ok(parser)
    }

    pub fn with_operators(operators: OperatorList) -> Result<Self, ConfigError> {
        let tokenizer = Tokenizer::new(&operators)?;
        Ok(Self {
            operators,
            tokenizer,
            max_depth: DEFAULT_MAX_DEPTH,
        })
    }

    /// Replaces the operator list for every subsequent parse.
    pub fn set_operators(&mut self, operators: OperatorList) -> Result<(), ConfigError> {
        self.tokenizer = Tokenizer::new(&operators)?;
        self.operators = operators;
        Ok(())
    }

    pub fn operators(&self) -> &OperatorList {
        &self.operators
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Token preview without parsing.
    pub fn tokenize(&self, query: &str) -> Vec<String> {
        self.tokenizer
            .tokenize(query)
            .into_iter()
            .map(|token| token.text.to_string())
            .collect()
    }

    /// Parses a query. Malformed input shows up in [`ParseResult::errors`], never as a panic.
    pub fn parse(&self, query: &str) -> ParseResult {
        let tokens = self.tokenizer.tokenize(query);
        let result = Parser::new(query, &tokens, &self.operators)
            .with_max_depth(self.max_depth)
            .parse();

        debug!(
            logic = %result.logic,
            predicates = result.predicates.len(),
            errors = result.errors.len(),
            "parsed query"
        );
        result
    }
}
