pub mod primitive;
pub mod usda;

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, not_line_ending},
    combinator::recognize,
    error::{ErrorKind, ParseError},
    multi::many0,
    sequence::pair,
    IResult,
};
use std::{fmt, io};

pub(crate) type Result<'a, T> = IResult<&'a str, T, UsdaParseError>;

/// Errors that can happen while reading a `.usda` document. Most errors are simply
/// `NomError` but a few of them are specific either for better error reporting or due to
/// custom logic.
#[derive(Debug)]
pub enum UsdaParseError {
    NomError {
        kind: ErrorKind,
        other: Option<Box<UsdaParseError>>,
    },
    IoError(io::Error),
    /// Returned when the document ends in the middle of a construct.
    NotEnoughData,
    /// Returned when the file doesn't start with `#usda 1.0`. Binary `.usdc` content
    /// lands here too, since it is not distinguished from any other non-text input.
    MissingHeader,
    /// A property declared a type outside the subset in `ValueType`.
    UnknownValueType(String),
    /// Prim names are quoted in the grammar but still have to be valid identifiers.
    InvalidIdentifier(String),
    /// Relationship targets must be absolute prim paths like `</root_0>`.
    InvalidPathTarget(String),
    /// Returned when content remains after the last prim definition.
    TrailingContent,
}

impl<'a> ParseError<&'a str> for UsdaParseError {
    fn from_error_kind(_input: &'a str, kind: ErrorKind) -> Self {
        UsdaParseError::NomError { kind, other: None }
    }

    fn append(_input: &'a str, kind: ErrorKind, other: Self) -> Self {
        UsdaParseError::NomError {
            kind,
            other: Some(Box::new(other)),
        }
    }
}

impl fmt::Display for UsdaParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsdaParseError::NomError { kind, .. } => {
                write!(f, "malformed document ({:?})", kind)
            }
            UsdaParseError::IoError(e) => write!(f, "io error: {}", e),
            UsdaParseError::NotEnoughData => write!(f, "document ends unexpectedly"),
            UsdaParseError::MissingHeader => {
                write!(f, "document doesn't start with '#usda 1.0'")
            }
            UsdaParseError::UnknownValueType(token) => {
                write!(f, "unknown value type '{}'", token)
            }
            UsdaParseError::InvalidIdentifier(name) => {
                write!(f, "'{}' is not a valid identifier", name)
            }
            UsdaParseError::InvalidPathTarget(text) => {
                write!(f, "'{}' is not an absolute prim path", text)
            }
            UsdaParseError::TrailingContent => {
                write!(f, "unexpected content after the last prim definition")
            }
        }
    }
}

impl std::error::Error for UsdaParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UsdaParseError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

/// Eats whitespace and `#` line comments. The `#usda 1.0` header never reaches this
/// because the document parser consumes it first.
pub(crate) fn ws(input: &str) -> Result<&str> {
    recognize(many0(alt((
        take_while1(|c: char| c.is_ascii_whitespace()),
        comment,
    ))))(input)
}

fn comment(input: &str) -> Result<&str> {
    recognize(pair(char('#'), not_line_ending))(input)
}
