/// Per-call host input.
///
/// Holds the result history, the external argument, currency rates, the
/// clock, the default timezone and the host environment lookup.
pub mod context;
/// Variable scopes.
///
/// A chain of scopes shared by reference, so closures see bindings made
/// after they were created, plus the host-facing [`environment::Environment`].
pub mod environment;
/// The evaluator module executes AST nodes and computes results.
///
/// The evaluator traverses the AST, performs arithmetic with units, dates
/// and collections, calls built-in and user functions, and produces a
/// single value or a runtime error.
///
/// # Responsibilities
/// - Evaluates every expression node.
/// - Converts between units and timezones.
/// - Reports runtime errors such as division by zero or incompatible units.
pub mod evaluator;
/// The lexer module tokenizes source text for the parser.
///
/// A `logos` scanner produces raw tokens, and a refinement pass turns them
/// into language tokens: it validates date and time literals, classifies
/// identifiers as units, currencies, timezones, keywords or names, and merges
/// multi-word timezone names.
///
/// # Responsibilities
/// - Converts the input into tokens with byte offsets.
/// - Extracts string interpolation spans.
/// - Silently skips characters it does not recognize.
pub mod lexer;
/// The parser module builds the abstract syntax tree (AST) from tokens.
///
/// A recursive descent parser over the token stream. Speculative forms such
/// as lambda heads and compound units are decided with lookahead before the
/// stream is consumed.
///
/// # Responsibilities
/// - Converts tokens into a single expression tree.
/// - Applies operator precedence, percent rules and unit suffixes.
/// - Reports syntax errors with the offending token and offset.
pub mod parser;
/// Timezone names.
///
/// Resolves `UTC±H`, abbreviations, city names and IANA names to zones.
pub mod timezone;
/// Units of measurement.
///
/// The unit table, dimension categories, currency rates and conversion
/// factors.
pub mod units;
/// The value module defines the runtime data types for evaluation.
///
/// Numbers, quantities, strings, booleans, null, dates, arrays, objects,
/// functions and partials, with conversions and display forms.
///
/// # Responsibilities
/// - Defines the `Value` enum and all supported value variants.
/// - Implements dimension arithmetic for quantities.
/// - Implements calendar arithmetic for dates.
pub mod value;
