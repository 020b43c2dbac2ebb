/// The lexer module tokenizes source code for further parsing.
///
/// The lexer reads the raw source text and produces a vector of tokens, each
/// carrying its kind, its text and a [`Span`](crate::util::span::Span).
/// Comments are kept as tokens so the parser can decide where they matter.
///
/// # Responsibilities
/// - Converts the input into tokens with kind and source location.
/// - Recognises keywords, identifiers, numbers, strings and punctuation.
/// - Reports characters that cannot start a token, and unterminated strings
///   or comments.
pub mod lexer;
/// The parser module builds the syntax tree from tokens.
///
/// A recursive-descent parser with one function per precedence level, plus a
/// separate ladder for type annotations. Every node records the union of its
/// children's spans. The first mismatch aborts the parse.
///
/// # Responsibilities
/// - Converts tokens into [`crate::ast::Program`] nodes.
/// - Desugars function declarations and compound assignments.
/// - Distinguishes a missing `;` from other grammar errors.
pub mod parser;
/// The static type lattice.
///
/// Defines [`types::Type`] and the tag arithmetic behind subtyping and
/// closest common parents.
pub mod types;
/// The value module defines the runtime data types for evaluation.
///
/// The exact numeric tower (naturals stored as prime factorizations,
/// integers, fractions and residues) plus booleans, strings, tuples,
/// function values and `void`.
///
/// # Responsibilities
/// - Defines the `Value` enum and all supported value variants.
/// - Implements exact arithmetic for each number type.
/// - Renders values both plainly and in factored form.
pub mod value;
/// Name resolution.
///
/// Builds the scope tree, declares every identifier, and links each use to
/// the symbol it refers to. Also records which symbols make up each
/// function's frame.
pub mod binder;
/// The type checker.
///
/// Assigns a type to every expression and makes every implicit conversion
/// explicit by inserting cast nodes.
pub mod checker;
/// The evaluator executes a checked program.
///
/// Walks the typed tree, performs the arithmetic, manages variable state and
/// calls, and collects everything the program prints.
///
/// # Responsibilities
/// - Evaluates expressions and executes statements.
/// - Bounds recursion depth and records a stack trace for diagnostics.
/// - Reports runtime errors such as division by zero or out-of-range values.
pub mod evaluator;
