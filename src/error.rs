/// Parsing errors.
///
/// Defines all error types that can occur while turning a token stream into
/// an expression tree: unexpected tokens, missing delimiters, malformed
/// literals and invalid assignment targets.
pub mod parse_error;
/// Runtime errors.
///
/// Contains all error types that can be raised during evaluation, such as
/// unknown names, type mismatches, incompatible dimensions, arity mismatches
/// and numeric domain failures.
pub mod runtime_error;

pub use parse_error::ParseError;
pub use runtime_error::RuntimeError;

/// Broad classification of every failure the core can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unexpected or missing token.
    Syntax,
    /// Wrong value kind given to an operator or function.
    Type,
    /// Incompatible units or currencies.
    Dimension,
    /// Wrong number of arguments.
    Arity,
    /// Division by zero, invalid timezone, unsupported numeric domain.
    Domain,
    /// Unknown variable or function.
    Lookup,
}

/// Any failure produced by [`crate::evaluate`].
#[derive(Debug)]
pub enum Error {
    /// The source text could not be parsed.
    Parse(ParseError),
    /// The expression parsed but could not be evaluated.
    Runtime(RuntimeError),
}

impl Error {
    /// Returns the taxonomy bucket of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse(_) => ErrorKind::Syntax,
            Self::Runtime(e) => e.kind(),
        }
    }

    /// Returns the byte offset into the source the error refers to.
    #[must_use]
    pub const fn offset(&self) -> usize {
        match self {
            Self::Parse(e) => e.offset(),
            Self::Runtime(e) => e.offset(),
        }
    }
}

impl From<ParseError> for Error {
    fn from(value: ParseError) -> Self {
        Self::Parse(value)
    }
}

impl From<RuntimeError> for Error {
    fn from(value: RuntimeError) -> Self {
        Self::Runtime(value)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "{e}"),
            Self::Runtime(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Runtime(e) => Some(e),
        }
    }
}
