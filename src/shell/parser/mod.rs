pub mod ast;
pub mod error;
pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;

pub use ast::{Command, Direction, Program};
pub use parser::Parser;

use error::ParseError;

/// Parses one input line into a `Command`.
pub fn parse(line: &str) -> Result<Command, ParseError> {
    Parser::new(line).parse_command()
}
