use std::fmt;

use thiserror::Error;

use crate::diagnostics::Location;

/// Every fatal condition the interpreter can raise.
///
/// The messages are the bare descriptions; [`NebulaError`] adds the
/// `Error L<line> in <file>:` prefix once a location is known.
#[derive(Debug, Error)]
pub enum ErrorKind {
    // Lexing and parsing
    #[error("did you forget to close a string literal")]
    UnterminatedLiteral,
    #[error("unexpected keyword - {0}")]
    UnexpectedKeyword(String),
    #[error("syntax error - {0}")]
    Syntax(String),

    // Block structure
    #[error("dangling statement - {0}")]
    DanglingStatement(String),
    #[error("nested function - function {0} lies inside another function")]
    NestedFunction(String),
    #[error("missing closure for code block")]
    OpenCodeBlock,

    // Declarations
    #[error("function redeclaration - {0}")]
    FunctionRedeclaration(String),
    #[error("existing reference to an endpoint through {0}")]
    RequestRedeclaration(String),
    #[error("undeclared function - {0}")]
    UndeclaredFunction(String),
    #[error("undeclared symbol - {0}")]
    UndeclaredSymbol(String),
    #[error("no registered endpoint with reference to {0}")]
    UnregisteredRequest(String),
    #[error("{0} is an api object; unsupported action")]
    NotAPlainValue(String),
    #[error("symbol {0} exists and marked constant")]
    ConstantModification(String),

    // Evaluation
    #[error("argument count mismatch for - {0}")]
    ArgCountMismatch(String),
    #[error("cannot compare between 2 different types")]
    KindMismatch,
    #[error("numeric type is required for {0}")]
    NotNumeric(String),
    #[error("invalid number - {0}")]
    InvalidNumber(String),
    #[error("trying to access return value of void function - {0}")]
    AccessVoidResult(String),
    #[error("function {0} must return a value of kind {1}")]
    ReturnKindMismatch(String, String),
    #[error("could not read api response for {0}")]
    ApiRead(String),
    #[error("symbol {0} carries no status code")]
    NoStatusCode(String),
    #[error("index {index} is out of range for {name}")]
    IndexOutOfRange { name: String, index: usize },
    #[error("move use keyword to the top")]
    InvalidUsePosition,
    #[error("invalid argument for keyword - {0}")]
    InvalidArgument(String),
    #[error("could not invoke - {0}")]
    Invoke(String),
    #[error("{0}")]
    Builtin(String),
    #[error("maximum call depth of {0} exceeded")]
    CallDepthExceeded(usize),

    // Driver
    #[error("required source file as arg")]
    NoSourceFiles,
    #[error("internal error - {0}")]
    Internal(String),
    #[error("io error - {0}")]
    Io(#[from] std::io::Error),
}

/// A fatal error, optionally tagged with the statement it was raised for.
#[derive(Debug)]
pub struct NebulaError {
    pub kind: ErrorKind,
    pub location: Option<Location>,
}

impl NebulaError {
    /// Attach a location unless a more precise one was attached further down.
    pub fn at(mut self, location: &Location) -> Self {
        if self.location.is_none() {
            self.location = Some(location.clone());
        }
        self
    }
}

impl fmt::Display for NebulaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "Error L{} in {}: {}.", loc.line, loc.file, self.kind),
            None => write!(f, "Error: {}.", self.kind),
        }
    }
}

impl std::error::Error for NebulaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<ErrorKind> for NebulaError {
    fn from(kind: ErrorKind) -> Self {
        NebulaError { kind, location: None }
    }
}

impl From<std::io::Error> for NebulaError {
    fn from(e: std::io::Error) -> Self {
        ErrorKind::Io(e).into()
    }
}

pub type Result<T> = std::result::Result<T, NebulaError>;
