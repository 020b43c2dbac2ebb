/// Number-theory helpers.
///
/// Greatest common divisors, modular arithmetic, primality testing, and prime
/// factorization of machine integers. The exact numeric tower in
/// [`crate::interpreter::value`] is built on these routines.
pub mod num;
/// Source positions.
///
/// Defines [`span::Span`], the `(start_line, start_col, end_line, end_col)`
/// range attached to every token, tree node, and diagnostic, plus the
/// [`span::LineIndex`] used to turn byte offsets into positions.
pub mod span;
