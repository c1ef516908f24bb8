use crate::error::ErrorKind;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Represents all errors that can occur during evaluation.
pub enum RuntimeError {
    /// Tried to use an undefined variable.
    UnknownVariable {
        /// The name of the variable.
        name:   String,
        /// Byte offset of the reference.
        offset: usize,
    },
    /// Called an unknown function.
    UnknownFunction {
        /// The name of the function.
        name:   String,
        /// Byte offset of the call.
        offset: usize,
    },
    /// A value had an unexpected or incompatible type.
    TypeError {
        /// Details about the type mismatch.
        details: String,
        /// Byte offset of the failing node.
        offset:  usize,
    },
    /// Two quantities with different dimensions were combined or converted.
    IncompatibleUnits {
        /// Units of the left operand.
        left:   String,
        /// Units of the right operand or conversion target.
        right:  String,
        /// Byte offset of the failing node.
        offset: usize,
    },
    /// A currency conversion needed a rate the rate table does not hold.
    MissingExchangeRate {
        /// The currency code without a rate.
        code:   String,
        /// Byte offset of the failing node.
        offset: usize,
    },
    /// The wrong number of arguments was supplied to a function.
    ArgumentCountMismatch {
        /// Function name, or `<lambda>` for anonymous functions.
        name:     String,
        /// Human readable description of the accepted counts.
        expected: String,
        /// Number of arguments actually supplied.
        found:    usize,
        /// Byte offset of the call.
        offset:   usize,
    },
    /// Attempted division by zero.
    DivisionByZero {
        /// Byte offset of the failing node.
        offset: usize,
    },
    /// A timezone name could not be resolved.
    InvalidTimezone {
        /// The unresolved name.
        name:   String,
        /// Byte offset of the failing node.
        offset: usize,
    },
    /// A numeric operation left the representable or defined domain.
    UnsupportedDomain {
        /// Details about the failure.
        details: String,
        /// Byte offset of the failing node.
        offset:  usize,
    },
    /// An argument had the right type but an unusable value.
    InvalidArgument {
        /// Details about why the argument is invalid.
        details: String,
        /// Byte offset of the call.
        offset:  usize,
    },
    /// Tried to access an array element outside its bounds.
    IndexOutOfBounds {
        /// The requested index.
        index:  i64,
        /// Length of the array.
        len:    usize,
        /// Byte offset of the access.
        offset: usize,
    },
    /// An aggregate found nothing numeric in the history.
    NoValues {
        /// `total` or `average`.
        aggregate: &'static str,
        /// Byte offset of the aggregate keyword.
        offset:    usize,
    },
    /// User function calls nested deeper than the call depth limit.
    RecursionLimit {
        /// The depth limit that was hit.
        depth:  usize,
        /// Byte offset of the call.
        offset: usize,
    },
}

impl RuntimeError {
    /// Returns the taxonomy bucket of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownVariable { .. } | Self::UnknownFunction { .. } => ErrorKind::Lookup,
            Self::TypeError { .. } | Self::InvalidArgument { .. } => ErrorKind::Type,
            Self::IncompatibleUnits { .. } | Self::MissingExchangeRate { .. } => {
                ErrorKind::Dimension
            },
            Self::ArgumentCountMismatch { .. } => ErrorKind::Arity,
            Self::DivisionByZero { .. }
            | Self::InvalidTimezone { .. }
            | Self::UnsupportedDomain { .. }
            | Self::IndexOutOfBounds { .. }
            | Self::NoValues { .. }
            | Self::RecursionLimit { .. } => ErrorKind::Domain,
        }
    }

    /// Byte offset of the node this error refers to.
    #[must_use]
    pub const fn offset(&self) -> usize {
        match self {
            Self::UnknownVariable { offset, .. }
            | Self::UnknownFunction { offset, .. }
            | Self::TypeError { offset, .. }
            | Self::IncompatibleUnits { offset, .. }
            | Self::MissingExchangeRate { offset, .. }
            | Self::ArgumentCountMismatch { offset, .. }
            | Self::DivisionByZero { offset }
            | Self::InvalidTimezone { offset, .. }
            | Self::UnsupportedDomain { offset, .. }
            | Self::InvalidArgument { offset, .. }
            | Self::IndexOutOfBounds { offset, .. }
            | Self::NoValues { offset, .. }
            | Self::RecursionLimit { offset, .. } => *offset,
        }
    }

    /// Shorthand for a [`RuntimeError::TypeError`].
    pub fn type_error(details: impl Into<String>, offset: usize) -> Self {
        Self::TypeError { details: details.into(),
                          offset }
    }

    /// Shorthand for a [`RuntimeError::UnsupportedDomain`].
    pub fn domain(details: impl Into<String>, offset: usize) -> Self {
        Self::UnsupportedDomain { details: details.into(),
                                  offset }
    }

    /// A result that does not fit in a decimal.
    #[must_use]
    pub fn overflow(offset: usize) -> Self {
        Self::domain("Numeric overflow", offset)
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownVariable { name, offset } => {
                write!(f, "Error at {offset}: Unknown variable '{name}'.")
            },
            Self::UnknownFunction { name, offset } => {
                write!(f, "Error at {offset}: Unknown function '{name}'.")
            },
            Self::TypeError { details, offset } => {
                write!(f, "Error at {offset}: Type error: {details}.")
            },
            Self::IncompatibleUnits { left, right, offset } => {
                write!(f, "Error at {offset}: Cannot combine '{left}' with '{right}'.")
            },
            Self::MissingExchangeRate { code, offset } => {
                write!(f, "Error at {offset}: No exchange rate for '{code}'.")
            },
            Self::ArgumentCountMismatch { name,
                                          expected,
                                          found,
                                          offset, } => write!(f,
                                                              "Error at {offset}: '{name}' expects {expected} argument(s), got {found}."),
            Self::DivisionByZero { offset } => write!(f, "Error at {offset}: Division by zero."),
            Self::InvalidTimezone { name, offset } => {
                write!(f, "Error at {offset}: Unknown timezone '{name}'.")
            },
            Self::UnsupportedDomain { details, offset } => {
                write!(f, "Error at {offset}: {details}.")
            },
            Self::InvalidArgument { details, offset } => {
                write!(f, "Error at {offset}: Invalid argument: {details}.")
            },
            Self::IndexOutOfBounds { index, len, offset } => write!(f,
                                                                    "Error at {offset}: Index {index} is out of bounds for length {len}."),
            Self::NoValues { aggregate, offset } => {
                write!(f, "Error at {offset}: no values to {aggregate}.")
            },
            Self::RecursionLimit { depth, offset } => write!(f,
                                                             "Error at {offset}: Maximum call depth of {depth} exceeded."),
        }
    }
}

impl std::error::Error for RuntimeError {}
