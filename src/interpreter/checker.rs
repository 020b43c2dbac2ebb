/// The checking pass itself.
///
/// Walks the bound tree, assigns a type to every expression and returns a
/// typed copy. Also enforces the rules for calls, indexing and function
/// bodies.
pub mod core;

/// Coercions.
///
/// Decides which conversions are allowed statically and inserts the cast
/// nodes that perform them at run time. Literal coercions to `Z/nZ` are
/// folded into residue literals here.
pub mod coerce;

/// Operator typing.
///
/// Result and operand types for every binary and unary operator, including
/// the mixed `N`/`Z`/`Q`/`Z/nZ` arithmetic and componentwise tuple
/// arithmetic.
pub mod operators;
