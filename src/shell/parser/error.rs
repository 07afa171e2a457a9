use thiserror::Error;

use super::ast::Direction;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("missing command")]
    EmptyCommand,
    #[error("illegal backgrounding")]
    IllegalBackgrounding,
    #[error("duplicate redirection of {0}")]
    DuplicateRedirection(Direction),
    #[error("missing filename after redirection of {0}")]
    MissingFilename(Direction),
    #[error("Illegal filename: \"{0}\"")]
    IllegalFilename(String),
    #[error("unexpected token: {0}")]
    UnexpectedToken(String),
}
