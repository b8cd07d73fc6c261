//! Interactive session: command dispatch and console formatting.
//!
//! Everything here consumes [`ParseResult`] values; no parsing logic lives in this module.

use std::fmt::Write;

use crate::config::{ConfigError, OperatorList, QueryConfig};
use crate::parser::ParseResult;
use crate::query_parser::QueryParser;

pub const HELP: &str = "\
Enter a query to parse it, e.g. age > 18 and name.StartsWith(\"J\")

Commands:
  :tokens <query>   show the token sequence
  :json <query>     print the parse result as JSON
  :ops <op> ...     replace the operator list (sorted longest first)
  :help             show this message
  :quit             leave";

/// A single line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Parse(&'a str),
    Tokens(&'a str),
    Json(&'a str),
    Operators(Vec<&'a str>),
    Help,
    Quit,
    Empty,
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        let Some(rest) = line.strip_prefix(':') else {
            return Command::Parse(line);
        };

        let (name, argument) = rest
            .split_once(char::is_whitespace)
            .map(|(name, argument)| (name, argument.trim()))
            .unwrap_or((rest, ""));

        match name {
            "tokens" | "t" => Command::Tokens(argument),
            "json" => Command::Json(argument),
            "ops" => Command::Operators(argument.split_whitespace().collect()),
            "help" | "h" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            _ => Command::Unknown(name),
        }
    }
}

/// What the caller should do after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Output(String),
    Quit,
}

/// One parser configuration kept for the lifetime of the session
pub struct Session {
    parser: QueryParser,
}

impl Session {
    pub fn new(config: &QueryConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            parser: QueryParser::new(config)?,
        })
    }

    pub fn parser(&self) -> &QueryParser {
        &self.parser
    }

    pub fn execute(&mut self, line: &str) -> anyhow::Result<Outcome> {
        let output = match Command::parse(line) {
            Command::Empty => String::new(),
            Command::Quit => return Ok(Outcome::Quit),
            Command::Help => HELP.to_string(),
            Command::Unknown(name) => format!("unknown command ':{name}', try :help"),
            Command::Parse(query) => render_report(&self.parser.parse(query)),
            Command::Tokens(query) => render_tokens(&self.parser.tokenize(query)),
            Command::Json(query) => serde_json::to_string_pretty(&self.parser.parse(query))?,
            Command::Operators(operators) => {
                match OperatorList::sorted_by_length(operators)
                    .and_then(|list| self.parser.set_operators(list))
                {
                    Ok(()) => format!("operators: {}", render_operators(self.parser.operators())),
                    Err(e) => format!("error: {e}"),
                }
            }
        };
        Ok(Outcome::Output(output))
    }
}

/// Tree, logic string, predicates and errors of one parse
pub fn render_report(result: &ParseResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "tree:   {}", result.tree);
    let _ = writeln!(out, "logic:  {}", result.logic);

    if result.predicates.is_empty() {
        let _ = writeln!(out, "predicates: none");
    } else {
        let _ = writeln!(out, "predicates:");
        for predicate in &result.predicates {
            let _ = writeln!(out, "  {predicate}");
        }
    }

    if result.errors.is_empty() {
        out.push_str("errors: none");
    } else {
        out.push_str("errors:");
        for error in &result.errors {
            let _ = write!(out, "\n  {error}");
        }
    }
    out
}

pub fn render_tokens(tokens: &[String]) -> String {
    tokens
        .iter()
        .map(|token| format!("[{token}]"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render_operators(operators: &OperatorList) -> String {
    operators.iter().collect::<Vec<_>>().join(" ")
}
