use std::{collections::HashMap, rc::Rc};

use tracing::{debug, instrument};

use crate::{
    ast::{Expr, ExprKind, LiteralValue, NodeId, Program},
    error::{Diagnostic, EcruResult, ErrorKind, NumericError},
    interpreter::{
        binder::{Resolution, SymbolId},
        evaluator::io::IoBuffer,
        value::core::{MapValue, Value},
    },
    util::span::Span,
};

/// Result type used by the evaluator.
///
/// All evaluation functions return either a value of type `T` or a
/// [`Diagnostic`] raised through [`Context::fail`].
pub type EvalResult<T> = EcruResult<T>;

/// Default bound on nested user calls.
pub const MAX_CALL_DEPTH: usize = 350;

/// How a statement finished.
///
/// A `return` does not unwind the host stack; it travels outward as
/// [`Signal::Return`] through every enclosing block and loop until the call
/// that owns it picks it up.
#[derive(Debug)]
pub enum Signal {
    /// Carry on with the next statement.
    Continue,
    /// Leave the enclosing function with this value.
    Return(Value),
}

/// Stores the runtime evaluation state.
///
/// Variables live in one table keyed by the binder's symbols, so there is no
/// runtime scope chain. A call saves the values of its function's frame,
/// binds the parameters, and restores the saved values when it returns.
///
/// ## Usage
///
/// A `Context` is created for one run of one checked program, and its
/// [`IoBuffer`] collects what the program prints.
pub struct Context<'a> {
    resolution:         &'a Resolution,
    values:             HashMap<SymbolId, Value>,
    pub buffer:         IoBuffer,
    pub max_call_depth: usize,
}

impl<'a> Context<'a> {
    /// Creates a context with no variable set and an empty buffer.
    #[must_use]
    pub fn new(resolution: &'a Resolution) -> Self {
        Self { resolution,
               values: HashMap::new(),
               buffer: IoBuffer::new(),
               max_call_depth: MAX_CALL_DEPTH }
    }

    /// Runs a checked program to completion.
    ///
    /// A top-level `return` ends the program early; it is not an error.
    ///
    /// # Errors
    /// The first runtime diagnostic. Output printed before it stays in the
    /// buffer.
    ///
    /// # Example
    /// ```
    /// use ecru::interpreter::{
    ///     binder::bind_program, checker::core::check_program, evaluator::core::Context,
    ///     lexer::tokenize, parser::core::parse_program,
    /// };
    ///
    /// let program = parse_program(tokenize("x: N = 6; print x!;").unwrap()).unwrap();
    /// let resolution = bind_program(&program).unwrap();
    /// let typed = check_program(&program, &resolution).unwrap();
    ///
    /// let mut context = Context::new(&resolution);
    /// context.run(&typed).unwrap();
    ///
    /// assert_eq!(context.buffer.stdout, "720");
    /// ```
    #[instrument(skip_all)]
    pub fn run(&mut self, program: &Program) -> EvalResult<()> {
        if let Signal::Return(value) = self.exec_block(&program.statements)? {
            debug!(%value, "program returned early");
        }
        debug!(variables = self.values.len(), "program finished");
        Ok(())
    }

    /// Raises a runtime diagnostic.
    ///
    /// Every runtime error goes through here so that it carries a snapshot
    /// of the active calls, most recent first.
    #[must_use]
    pub fn fail(&self, kind: ErrorKind, span: Span, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(kind, span, message).with_stack(self.buffer.stack())
    }

    /// Lifts a numeric failure to a diagnostic at `span`.
    #[must_use]
    pub fn numeric(&self, error: &NumericError, span: Span) -> Diagnostic {
        self.fail(error.kind(), span, error.to_string())
    }

    pub(super) fn symbol(&self, node: NodeId, span: Span) -> EvalResult<SymbolId> {
        self.resolution
            .resolve(node, span)
            .map(|(id, _)| id)
            .map_err(|e| e.with_stack(self.buffer.stack()))
    }

    pub(super) const fn resolution(&self) -> &'a Resolution {
        self.resolution
    }

    pub(super) fn value(&self, id: SymbolId) -> Option<&Value> {
        self.values.get(&id)
    }

    /// Sets a variable, or unsets it with `None`.
    pub(super) fn set(&mut self, id: SymbolId, value: Option<Value>) {
        match value {
            Some(value) => {
                self.values.insert(id, value);
            },
            None => {
                self.values.remove(&id);
            },
        }
    }

    /// Evaluates an expression and returns the resulting value.
    ///
    /// This is the main entry point for expression evaluation. Operands
    /// arrive with the types the checker gave them, so arithmetic never has
    /// to promote at run time.
    ///
    /// # Errors
    /// Runtime diagnostics such as `DivisionByZeroError`,
    /// `IllegalTypeConversionError`, `OutOfBoundsError` or
    /// `StackOverflowError`.
    pub fn eval(&mut self, expr: &Expr) -> EvalResult<Value> {
        match &expr.kind {
            ExprKind::Id(name) => self.eval_variable(expr, name),
            ExprKind::Literal(literal) => Ok(literal_value(literal)),
            ExprKind::Tuple(items) => {
                items.iter().map(|item| self.eval(item)).collect::<EvalResult<Vec<_>>>().map(Value::from)
            },
            ExprKind::FuncDecl(func) => Ok(Value::Map(MapValue::new(Rc::clone(func), expr.id))),
            ExprKind::Call { callee, args } => self.eval_call(callee, args, expr.span),
            ExprKind::Index { base, index } => self.eval_index(base, index, expr.span),
            ExprKind::Binary { op, left, right } => self.eval_binary(*op, left, right, expr.span),
            ExprKind::Unary { op, expr: operand } => self.eval_unary(*op, operand, expr.span),
            ExprKind::Cast { target, expr: inner } => {
                let value = self.eval(inner)?;
                self.convert(value, target, expr.span)
            },
        }
    }

    /// Evaluates a condition the checker has already coerced to `Bool`.
    pub(super) fn eval_bool(&mut self, expr: &Expr) -> EvalResult<bool> {
        match self.eval(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(self.fail(ErrorKind::CompilerError,
                                   expr.span,
                                   format!("expected a Bool, found a value of type {}", other.ty()))),
        }
    }

    fn eval_variable(&self, expr: &Expr, name: &str) -> EvalResult<Value> {
        let id = self.symbol(expr.id, expr.span)?;
        self.value(id).cloned().ok_or_else(|| {
                                   self.fail(ErrorKind::UndefinedIdentifierError,
                                             expr.span,
                                             format!("'{name}' is used before it is assigned"))
                               })
    }

    /// Zero-based indexing into strings and tuples.
    fn eval_index(&mut self, base: &Expr, index: &Expr, span: Span) -> EvalResult<Value> {
        let base = self.eval(base)?;
        let position = match self.eval(index)? {
            Value::Integer(i) => i.to_i128().map_err(|e| self.numeric(&e, index.span))?,
            other => {
                return Err(self.fail(ErrorKind::CompilerError,
                                     index.span,
                                     format!("expected an integer index, found a value of type {}", other.ty())));
            },
        };
        let slot = usize::try_from(position).ok();
        let (found, length) = match &base {
            Value::Str(s) => (slot.and_then(|i| s.chars().nth(i)).map(|c| Value::from(c.to_string())),
                              s.chars().count()),
            Value::Tuple(items) => (slot.and_then(|i| items.get(i)).cloned(), items.len()),
            other => {
                return Err(self.fail(ErrorKind::IllegalIndexError,
                                     span,
                                     format!("a value of type {} cannot be indexed", other.ty())));
            },
        };
        found.ok_or_else(|| {
                 self.fail(ErrorKind::OutOfBoundsError,
                           index.span,
                           format!("index {position} is out of bounds for length {length}"))
             })
    }
}

/// The runtime value of a literal.
fn literal_value(literal: &LiteralValue) -> Value {
    match literal {
        LiteralValue::Str(s) => Value::Str(Rc::clone(s)),
        LiteralValue::Integer(i) => Value::Integer(i.clone()),
        LiteralValue::Natural(n) => Value::Natural(n.clone()),
        LiteralValue::Rational { value, .. } => Value::Rational(value.clone()),
        LiteralValue::Modulus(m) => Value::Modulus(*m),
        LiteralValue::Bool(b) => Value::Bool(*b),
        LiteralValue::Void => Value::Void,
    }
}
