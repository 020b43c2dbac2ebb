/// Core evaluation logic and context management.
///
/// Contains the runtime [`core::Context`], the expression dispatcher, variable
/// storage keyed by symbol, and the gate every runtime diagnostic passes
/// through.
pub mod core;

/// Statement execution.
///
/// Runs declarations, assignments, prints and control flow, and carries
/// `return` outward as a [`core::Signal`].
pub mod statement;

/// Binary operator evaluation logic.
///
/// Arithmetic over every numeric type, string concatenation, componentwise
/// tuple arithmetic, comparisons, and short-circuiting logic.
pub mod binary;

/// Unary operator evaluation logic.
///
/// Negation, logical NOT, and factorial.
pub mod unary;

/// Function calls.
///
/// Checks the call depth and arity, saves and restores the callee's frame,
/// and records the call in the stack trace.
pub mod function;

/// Run-time conversions.
///
/// Carries out the casts the checker inserted, including the value checks
/// that can only fail at run time.
pub mod cast;

/// Program output.
///
/// The [`io::IoBuffer`] collecting stdout, stderr and the active call stack.
pub mod io;
