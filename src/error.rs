/// Diagnostics.
///
/// Defines the single error channel shared by every phase: the [`ErrorKind`]
/// taxonomy, the span-carrying [`Diagnostic`], and the call [`Frame`]s
/// captured when a diagnostic is raised during execution.
pub mod diagnostic;
/// Numeric errors.
///
/// Failures of the exact numeric tower (division by zero, leaving the
/// naturals, out-of-range values). They carry no position; the evaluator
/// lifts them into a [`Diagnostic`] at the node that triggered them.
pub mod numeric_error;

pub use diagnostic::{Diagnostic, EcruResult, ErrorKind, Frame};
pub use numeric_error::NumericError;
