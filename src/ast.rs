use std::fmt;

use crate::diagnostics::Location;

/// Kind of a literal operand as written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    Numeric,
    Str,
    /// A symbol name, substituted by its value at evaluation time.
    Name,
}

/// A literal or name appearing as a statement argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    pub text: String,
    pub kind: OperandKind,
}

impl Operand {
    pub fn new(text: impl Into<String>, kind: OperandKind) -> Self {
        Self { text: text.into(), kind }
    }
}

/// Kind of a resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Numeric,
    Str,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric => write!(f, "num"),
            Self::Str => write!(f, "str"),
        }
    }
}

/// A plain value: raw text plus kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    pub text: String,
    pub kind: ValueKind,
}

impl Value {
    pub fn numeric(text: impl Into<String>) -> Self {
        Self { text: text.into(), kind: ValueKind::Numeric }
    }

    pub fn string(text: impl Into<String>) -> Self {
        Self { text: text.into(), kind: ValueKind::Str }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

/// Condition of an `if` or `for`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `if success`: the last `res` call returned 200.
    LastSuccess { negated: bool },
    /// `if name`: the symbol is declared in the current frame.
    Exists { name: String, negated: bool },
    /// `if lhs <op> rhs`
    Compare { lhs: Operand, op: CompareOp, rhs: Operand, negated: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Def {
    pub name: String,
    pub params: Vec<String>,
    pub returns: Option<ValueKind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Var {
    pub target: String,
    pub value: Operand,
    pub constant: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    pub target: String,
    /// A literal endpoint, or the name of a symbol holding one when it
    /// contains no `.`.
    pub endpoint: String,
    pub method: String,
    pub timeout_ms: u64,
    /// Parsed but not consulted yet.
    pub halt: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Operand>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseMode {
    Debug,
    Scope,
    Warns,
}

/// Per-keyword payload of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StmtKind {
    Def(Def),
    Var(Var),
    If(Condition),
    For(Condition),
    /// `else`, or `else <if ...>` carrying the raw tokens after `else`.
    Else { chained: Vec<String> },
    End,
    Del { target: String },
    Err { target: String, reference: String },
    Res { target: String, reference: String },
    Url(Url),
    Use(UseMode),
    Print(Operand),
    Read { target: String },
    Return(Option<Operand>),
    FunctionCall(Call),
    FunctionCallWithResult { target: String, call: Call },
    Indexer { target: String, source: String, index: usize },
    UnaryIncrement { target: String },
    UnaryDecrement { target: String },
}

impl StmtKind {
    /// Statements that open a block closed by `end`.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Def(_) | Self::If(_) | Self::For(_))
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Def(_) => "def",
            Self::Var(_) => "var",
            Self::If(_) => "if",
            Self::For(_) => "for",
            Self::Else { .. } => "else",
            Self::End => "end",
            Self::Del { .. } => "del",
            Self::Err { .. } => "err",
            Self::Res { .. } => "res",
            Self::Url(_) => "url",
            Self::Use(_) => "use",
            Self::Print(_) => "print",
            Self::Read { .. } => "read",
            Self::Return(_) => "return",
            Self::FunctionCall(_) => "function call",
            Self::FunctionCallWithResult { .. } => "function call",
            Self::Indexer { .. } => "indexer",
            Self::UnaryIncrement { .. } => "++",
            Self::UnaryDecrement { .. } => "--",
        }
    }
}

/// A node of the program tree.
///
/// `body` holds the children of a container; `alt` holds the else-branch of
/// an `if`. Both are empty for every other kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub kind: StmtKind,
    pub location: Location,
    pub body: Vec<Statement>,
    pub alt: Vec<Statement>,
}

impl Statement {
    pub fn new(kind: StmtKind, location: Location) -> Self {
        Self { kind, location, body: Vec::new(), alt: Vec::new() }
    }
}

/// The assembled program: its top-level statements, all of them `def`s.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    /// Find the `def` statement declaring `name`.
    pub fn function(&self, name: &str) -> Option<&Statement> {
        self.statements
            .iter()
            .find(|stmt| matches!(&stmt.kind, StmtKind::Def(def) if def.name == name))
    }
}
