use std::rc::Rc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

/// One unit in a compound unit, such as `s^-2` in `m/s^2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitTerm {
    /// The unit exactly as spelled in the source (`meters`, `km`, `USD`).
    pub unit:     String,
    /// Signed exponent of the unit.
    pub exponent: i32,
}

impl UnitTerm {
    /// Creates a unit term.
    pub fn new(unit: impl Into<String>, exponent: i32) -> Self {
        Self { unit: unit.into(),
               exponent }
    }
}

/// A piece of a string literal: plain text or an interpolated expression.
#[derive(Debug, Clone, PartialEq)]
pub enum StringPart {
    /// Literal text, escapes already resolved.
    Text(String),
    /// An embedded `${...}` expression.
    Interpolation(Expr),
}

/// Mathematical and literal constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constant {
    /// `pi` / `π`
    Pi,
    /// Euler's number `e`.
    E,
    /// `tau` (2π)
    Tau,
    /// The golden ratio `phi`.
    Phi,
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
}

impl Constant {
    /// Source spelling of the constant.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pi => "pi",
            Self::E => "e",
            Self::Tau => "tau",
            Self::Phi => "phi",
            Self::True => "true",
            Self::False => "false",
            Self::Null => "null",
        }
    }

    /// Looks up a mathematical constant by its spelling.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pi" | "π" | "PI" => Some(Self::Pi),
            "e" => Some(Self::E),
            "tau" | "τ" => Some(Self::Tau),
            "phi" | "φ" => Some(Self::Phi),
            _ => None,
        }
    }
}

/// Type names accepted by `is` checks and `as` casts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeName {
    /// `number`
    Number,
    /// `quantity` / `unit`
    Quantity,
    /// `string`
    String,
    /// `boolean` / `bool`
    Boolean,
    /// `null`
    Null,
    /// `date`
    Date,
    /// `array` / `list`
    Array,
    /// `object`
    Object,
    /// `function`
    Function,
}

impl TypeName {
    /// Resolves a type name from its spelling.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "number" => Some(Self::Number),
            "quantity" | "unit" => Some(Self::Quantity),
            "string" | "text" => Some(Self::String),
            "boolean" | "bool" => Some(Self::Boolean),
            "null" => Some(Self::Null),
            "date" => Some(Self::Date),
            "array" | "list" => Some(Self::Array),
            "object" => Some(Self::Object),
            "function" => Some(Self::Function),
            _ => None,
        }
    }
}

impl std::fmt::Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Number => "number",
            Self::Quantity => "quantity",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Date => "date",
            Self::Array => "array",
            Self::Object => "object",
            Self::Function => "function",
        };
        write!(f, "{name}")
    }
}

/// Units that shift a date by calendar rules or fixed durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarUnit {
    /// Fixed 1 s.
    Second,
    /// Fixed 60 s.
    Minute,
    /// Fixed 3600 s.
    Hour,
    /// Calendar day (wall clock preserved across DST).
    Day,
    /// Seven calendar days.
    Week,
    /// Calendar month, clamped to the target month's length.
    Month,
    /// Twelve calendar months.
    Year,
}

/// The date a `Date` node denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSpec {
    /// A `DD.MM.YYYY` literal.
    Calendar(NaiveDate),
    /// `today`
    Today,
    /// `tomorrow`
    Tomorrow,
    /// `yesterday`
    Yesterday,
}

/// The instant a `DateTime` node denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeSpec {
    /// A `DD.MM.YYYYTHH:MM` literal.
    Literal(NaiveDateTime),
    /// `now`
    Now,
}

/// Which history aggregate an `Aggregate` node computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    /// `total` / `sum`
    Total,
    /// `average` / `avg`
    Average,
}

impl AggregateKind {
    /// Verb used in error messages.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Total => "total",
            Self::Average => "average",
        }
    }
}

/// Target of an `as`/`to`/`in` conversion that is not a type cast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionTarget {
    /// Convert a quantity into these units.
    Units(Vec<UnitTerm>),
    /// Relabel an instant with this timezone.
    Timezone(String),
}

/// What a call expression invokes.
#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    /// A name resolved at call time: a binding first, then a builtin.
    Named(String),
    /// Any expression evaluating to a callable value.
    Expr(Box<Expr>),
}

/// An abstract syntax tree (AST) node.
///
/// Every ambiguity of the surface syntax (unit or variable, cast or
/// conversion, percent or modulo) is settled by the parser; the evaluator
/// never re-interprets a node. Every variant records the byte offset of the
/// token it starts at for error reporting.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A number literal, optionally carrying units (`5`, `5 km/h`).
    Number {
        /// The decimal value.
        value:  Decimal,
        /// Attached units; empty for a plain number.
        units:  Vec<UnitTerm>,
        /// Byte offset in the source.
        offset: usize,
    },
    /// A string literal with optional interpolations.
    Str {
        /// Text and interpolation parts in source order.
        parts:  Vec<StringPart>,
        /// Byte offset in the source.
        offset: usize,
    },
    /// A named constant (`pi`, `true`, `null`).
    Constant {
        /// Which constant.
        constant: Constant,
        /// Byte offset in the source.
        offset:   usize,
    },
    /// Reference to a variable by name.
    Variable {
        /// Name of the variable.
        name:   String,
        /// Byte offset in the source.
        offset: usize,
    },
    /// A prefix or percent operation.
    Unary {
        /// The operator.
        op:     UnaryOperator,
        /// The operand.
        expr:   Box<Self>,
        /// Byte offset in the source.
        offset: usize,
    },
    /// An arithmetic or bitwise operation.
    Binary {
        /// Left operand.
        left:   Box<Self>,
        /// The operator.
        op:     BinaryOperator,
        /// Right operand.
        right:  Box<Self>,
        /// Byte offset in the source.
        offset: usize,
    },
    /// A short-circuiting `and` / `or`.
    Logical {
        /// Left operand.
        left:   Box<Self>,
        /// The operator.
        op:     LogicalOperator,
        /// Right operand.
        right:  Box<Self>,
        /// Byte offset in the source.
        offset: usize,
    },
    /// An equality or ordering comparison.
    Comparison {
        /// Left operand.
        left:   Box<Self>,
        /// The operator.
        op:     ComparisonOperator,
        /// Right operand.
        right:  Box<Self>,
        /// Byte offset in the source.
        offset: usize,
    },
    /// `condition ? then : else`
    Ternary {
        /// The condition.
        condition:   Box<Self>,
        /// Evaluated when the condition is truthy.
        then_branch: Box<Self>,
        /// Evaluated otherwise.
        else_branch: Box<Self>,
        /// Byte offset in the source.
        offset:      usize,
    },
    /// `expr is type`
    TypeCheck {
        /// The checked expression.
        expr:      Box<Self>,
        /// The expected type.
        type_name: TypeName,
        /// Byte offset in the source.
        offset:    usize,
    },
    /// `expr as type`
    TypeCast {
        /// The converted expression.
        expr:   Box<Self>,
        /// The target type.
        target: TypeName,
        /// Byte offset in the source.
        offset: usize,
    },
    /// `expr to units` or `expr in timezone`
    Conversion {
        /// The converted expression.
        expr:   Box<Self>,
        /// Units or timezone to convert into.
        target: ConversionTarget,
        /// Byte offset in the source.
        offset: usize,
    },
    /// A function call.
    Call {
        /// What is being called.
        callee: Callee,
        /// Argument expressions.
        args:   Vec<Self>,
        /// Byte offset in the source.
        offset: usize,
    },
    /// Property (`.name`) or index (`[expr]`) access.
    Access {
        /// The accessed array or object.
        object: Box<Self>,
        /// The key or index expression.
        key:    Box<Self>,
        /// Byte offset in the source.
        offset: usize,
    },
    /// `name = value`, `name += value`, `name -= value`.
    ///
    /// For compound forms `value` holds only the right-hand side; the
    /// evaluator combines it with the current binding using `compound`.
    Assignment {
        /// The bound name.
        name:     String,
        /// The value expression.
        value:    Box<Self>,
        /// The operator of a compound assignment.
        compound: Option<BinaryOperator>,
        /// Byte offset in the source.
        offset:   usize,
    },
    /// `total` / `average` over the prior results.
    Aggregate {
        /// Which aggregate.
        kind:   AggregateKind,
        /// Optional explicit target units.
        target: Option<Vec<UnitTerm>>,
        /// Byte offset in the source.
        offset: usize,
    },
    /// A date at local midnight.
    Date {
        /// Which date.
        date:   DateSpec,
        /// Optional timezone tag.
        zone:   Option<String>,
        /// Byte offset in the source.
        offset: usize,
    },
    /// A time of day today.
    Time {
        /// Wall-clock time.
        time:   NaiveTime,
        /// Optional timezone tag.
        zone:   Option<String>,
        /// Byte offset in the source.
        offset: usize,
    },
    /// A full date and time.
    DateTime {
        /// Which instant.
        datetime: DateTimeSpec,
        /// Optional timezone tag.
        zone:     Option<String>,
        /// Byte offset in the source.
        offset:   usize,
    },
    /// A date shifted by a calendar amount (`today + 5 days`).
    DateOperation {
        /// The date being shifted.
        date:   Box<Self>,
        /// `Add` or `Sub`.
        op:     BinaryOperator,
        /// Magnitude of the shift, without units.
        amount: Box<Self>,
        /// Unit of the shift.
        unit:   CalendarUnit,
        /// Byte offset in the source.
        offset: usize,
    },
    /// Array literal.
    Array {
        /// Element expressions.
        elements: Vec<Self>,
        /// Byte offset in the source.
        offset:   usize,
    },
    /// Object literal; keys kept in insertion order, later duplicates win.
    Object {
        /// Key and value expressions.
        entries: Vec<(String, Self)>,
        /// Byte offset in the source.
        offset:  usize,
    },
    /// `x => body`, `(a, b) => body`, or a named `f(x) = body` definition.
    Lambda {
        /// Name of a named function definition.
        name:   Option<String>,
        /// Parameter names.
        params: Vec<String>,
        /// The body, shared with every function value created from it.
        body:   Rc<Self>,
        /// Byte offset in the source.
        offset: usize,
    },
}

impl Expr {
    /// Gets the source offset from `self`.
    /// ## Example
    /// ```
    /// use tally::ast::Expr;
    ///
    /// let expr = Expr::Variable { name:   "x".to_string(),
    ///                             offset: 5, };
    ///
    /// assert_eq!(expr.offset(), 5);
    /// ```
    #[must_use]
    pub const fn offset(&self) -> usize {
        match self {
            Self::Number { offset, .. }
            | Self::Str { offset, .. }
            | Self::Constant { offset, .. }
            | Self::Variable { offset, .. }
            | Self::Unary { offset, .. }
            | Self::Binary { offset, .. }
            | Self::Logical { offset, .. }
            | Self::Comparison { offset, .. }
            | Self::Ternary { offset, .. }
            | Self::TypeCheck { offset, .. }
            | Self::TypeCast { offset, .. }
            | Self::Conversion { offset, .. }
            | Self::Call { offset, .. }
            | Self::Access { offset, .. }
            | Self::Assignment { offset, .. }
            | Self::Aggregate { offset, .. }
            | Self::Date { offset, .. }
            | Self::Time { offset, .. }
            | Self::DateTime { offset, .. }
            | Self::DateOperation { offset, .. }
            | Self::Array { offset, .. }
            | Self::Object { offset, .. }
            | Self::Lambda { offset, .. } => *offset,
        }
    }

    /// Returns `true` for a literal percentage (`20%`).
    #[must_use]
    pub const fn is_percent(&self) -> bool {
        matches!(self,
                 Self::Unary { op: UnaryOperator::Percent,
                               .. })
    }

    /// Returns `true` for date, time and datetime literals (including
    /// `now`/`today`) and calendar shifts of them.
    #[must_use]
    pub const fn is_date_literal(&self) -> bool {
        matches!(self,
                 Self::Date { .. } | Self::Time { .. } | Self::DateTime { .. } | Self::DateOperation { .. })
    }

    /// Returns `true` if the node may evaluate to an instant.
    ///
    /// Variables are treated as possible instants. Subtracting two operands
    /// yields a duration, so subtraction is excluded.
    #[must_use]
    pub const fn may_be_instant(&self) -> bool {
        match self {
            Self::Date { .. }
            | Self::Time { .. }
            | Self::DateTime { .. }
            | Self::DateOperation { .. }
            | Self::Variable { .. } => true,
            Self::Binary { op, .. } => !matches!(op, BinaryOperator::Sub),
            _ => false,
        }
    }
}

/// Represents an arithmetic or bitwise binary operator.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinaryOperator {
    /// Addition (`+`)
    Add,
    /// Subtraction (`-`)
    Sub,
    /// Multiplication (`*`)
    Mul,
    /// Division (`/`)
    Div,
    /// Modulo (`%`, `mod`)
    Mod,
    /// Exponentiation (`^`, `**`)
    Pow,
    /// Bitwise and (`&`)
    BitAnd,
    /// Bitwise or (`|`)
    BitOr,
    /// Left shift (`<<`)
    Shl,
    /// Right shift (`>>`)
    Shr,
}

/// Represents a unary operator.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnaryOperator {
    /// Arithmetic negation (`-x`).
    Negate,
    /// Unary plus (`+x`), a no-op on numbers.
    Plus,
    /// Logical not (`not x`, `!x`).
    Not,
    /// Trailing percent (`x%`), evaluates to `x / 100`.
    Percent,
}

/// Short-circuiting logical operators.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LogicalOperator {
    /// `and`, `&&`
    And,
    /// `or`, `||`
    Or,
}

/// Comparison operators.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ComparisonOperator {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use BinaryOperator::{Add, BitAnd, BitOr, Div, Mod, Mul, Pow, Shl, Shr, Sub};
        let operator = match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Pow => "^",
            BitAnd => "&",
            BitOr => "|",
            Shl => "<<",
            Shr => ">>",
        };
        write!(f, "{operator}")
    }
}

impl std::fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let operator = match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
        };
        write!(f, "{operator}")
    }
}

impl std::fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let operator = match self {
            Self::Negate => "-",
            Self::Plus => "+",
            Self::Not => "not",
            Self::Percent => "%",
        };
        write!(f, "{operator}")
    }
}
