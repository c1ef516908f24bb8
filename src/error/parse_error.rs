#[derive(Debug, Clone, PartialEq, Eq)]
/// Represents all errors that can occur while parsing.
pub enum ParseError {
    /// Found an unexpected token while parsing.
    UnexpectedToken {
        /// The token encountered.
        token:  String,
        /// Byte offset of the token in the source.
        offset: usize,
    },
    /// Reached the end of input unexpectedly.
    UnexpectedEndOfInput {
        /// Byte offset where input ended.
        offset: usize,
    },
    /// A specific token was required but something else was found.
    ExpectedToken {
        /// Description of the expected token.
        expected: &'static str,
        /// The token actually found.
        found:    String,
        /// Byte offset of the found token.
        offset:   usize,
    },
    /// Found extra tokens after a complete expression.
    UnexpectedTrailingTokens {
        /// The first extra token.
        token:  String,
        /// Byte offset of the extra token.
        offset: usize,
    },
    /// The left-hand side of `=`, `+=` or `-=` is not a plain name.
    InvalidAssignmentTarget {
        /// Byte offset of the assignment operator.
        offset: usize,
    },
    /// A numeric or date literal could not be represented.
    InvalidLiteral {
        /// The literal text.
        literal: String,
        /// Byte offset of the literal.
        offset:  usize,
    },
}

impl ParseError {
    /// Byte offset of the token this error refers to.
    #[must_use]
    pub const fn offset(&self) -> usize {
        match self {
            Self::UnexpectedToken { offset, .. }
            | Self::UnexpectedEndOfInput { offset }
            | Self::ExpectedToken { offset, .. }
            | Self::UnexpectedTrailingTokens { offset, .. }
            | Self::InvalidAssignmentTarget { offset }
            | Self::InvalidLiteral { offset, .. } => *offset,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedToken { token, offset } => {
                write!(f, "Syntax error at {offset}: Unexpected token '{token}'.")
            },
            Self::UnexpectedEndOfInput { offset } => {
                write!(f, "Syntax error at {offset}: Unexpected end of input.")
            },
            Self::ExpectedToken { expected,
                                  found,
                                  offset, } => {
                write!(f, "Syntax error at {offset}: Expected {expected}, found '{found}'.")
            },
            Self::UnexpectedTrailingTokens { token, offset } => write!(f,
                                                                       "Syntax error at {offset}: Extra tokens after expression starting at '{token}'."),
            Self::InvalidAssignmentTarget { offset } => {
                write!(f, "Syntax error at {offset}: Only names can be assigned to.")
            },
            Self::InvalidLiteral { literal, offset } => {
                write!(f, "Syntax error at {offset}: Invalid literal '{literal}'.")
            },
        }
    }
}

impl std::error::Error for ParseError {}
