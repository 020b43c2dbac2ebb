/// Natural numbers.
///
/// Defines [`natural::Shorthand`], the sparse prime factorization every
/// magnitude is stored as, and [`natural::Natural`], the strictly positive
/// integers built on it. Factorizations of machine integers are memoized
/// process-wide.
pub mod natural;
/// Signed integers.
///
/// A sign plus an optional natural magnitude. Products stay factored; sums
/// and quotients go through machine integers.
pub mod integer;
/// Exact fractions.
///
/// Literals keep the scale they were written with; arithmetic reduces its
/// results. Equality, ordering, and display always look at the reduced form.
pub mod rational;
/// Residue classes.
///
/// Elements of `Z/nZ` with wrapping arithmetic and division by modular
/// inverse.
pub mod modulus;

pub mod core;
