use std::fmt;

use thiserror::Error;

use crate::util::span::Span;

/// Result type used by every phase of the pipeline.
pub type EcruResult<T> = Result<T, Diagnostic>;

/// The diagnostic taxonomy. Every diagnostic carries exactly one kind; its
/// `Display` form is the variant name, which is what appears at the start of
/// rendered error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The token stream does not match the grammar.
    ParserError,
    /// A statement is missing its terminating `;`.
    MissingSemicolonError,
    /// The tokenizer met a character it cannot start a token with.
    UnknownCharacterError,
    /// An identifier is used without a visible declaration.
    UndefinedIdentifierError,
    /// An identifier is declared twice in the same scope.
    RedefinedIdentifierError,
    /// A value cannot be converted to the type its context demands.
    IllegalTypeConversionError,
    /// Something that is not a function was called.
    IllegalCallError,
    /// Something that is not indexable was indexed.
    IllegalIndexError,
    /// A call supplied the wrong number of arguments.
    ArgumentLengthError,
    /// Tuple operands of an operator have different lengths.
    DimensionError,
    /// A function with a non-void return type has no `return` statement.
    NonexistentReturnError,
    /// An operator is applied to types it is not defined on.
    UnsupportedBinop,
    /// Division by zero, or by a non-invertible modulus class.
    DivisionByZeroError,
    /// An index lies outside its tuple or string.
    OutOfBoundsError,
    /// User recursion exceeded the configured call depth.
    StackOverflowError,
    /// An internal invariant was violated. Always a bug in the interpreter.
    CompilerError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One active call at the moment a diagnostic was raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Name of the called function, or `<lambda>` for anonymous callees.
    pub name: String,
    /// Span of the call expression.
    pub span: Span,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.span)
    }
}

/// A fatal diagnostic.
///
/// Renders as `<ErrorKind>:Span(<sl>:<sc>-<el>:<ec>) -- <message>`.
///
/// # Example
/// ```
/// use ecru::{
///     error::{Diagnostic, ErrorKind},
///     util::span::Span,
/// };
///
/// let diagnostic = Diagnostic::new(ErrorKind::UndefinedIdentifierError,
///                                  Span::new(1, 1, 1, 2),
///                                  "'x' is not defined");
///
/// assert_eq!(diagnostic.to_string(),
///            "UndefinedIdentifierError:Span(1:1-1:2) -- 'x' is not defined");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}:{span} -- {message}")]
pub struct Diagnostic {
    pub kind:    ErrorKind,
    pub span:    Span,
    pub message: String,
    /// Active calls when the diagnostic was raised, most recent first.
    pub stack:   Vec<Frame>,
}

impl Diagnostic {
    #[must_use]
    pub fn new(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self { kind,
               span,
               message: message.into(),
               stack: Vec::new() }
    }

    /// Attaches a call-stack snapshot.
    #[must_use]
    pub fn with_stack(mut self, stack: Vec<Frame>) -> Self {
        self.stack = stack;
        self
    }

    /// Renders the stack trace, keeping at most `limit` frames and
    /// summarising the rest as `+N more`. The program itself is always the
    /// outermost frame.
    ///
    /// # Example
    /// ```
    /// use ecru::{
    ///     error::{Diagnostic, ErrorKind, Frame},
    ///     util::span::Span,
    /// };
    ///
    /// let frame = Frame { name: "f".to_string(),
    ///                     span: Span::new(1, 10, 1, 14), };
    /// let diagnostic =
    ///     Diagnostic::new(ErrorKind::StackOverflowError, Span::default(), "too deep")
    ///         .with_stack(vec![frame.clone(), frame.clone(), frame]);
    ///
    /// assert_eq!(diagnostic.render_stack(1),
    ///            "    at f (Span(1:10-1:14))\n    +2 more\n    at <program>");
    /// ```
    #[must_use]
    pub fn render_stack(&self, limit: usize) -> String {
        let mut lines = self.stack
                            .iter()
                            .take(limit)
                            .map(|frame| format!("    at {frame}"))
                            .collect::<Vec<_>>();
        if self.stack.len() > limit {
            lines.push(format!("    +{} more", self.stack.len() - limit));
        }
        lines.push("    at <program>".to_string());
        lines.join("\n")
    }
}
