use tracing::trace;

use crate::{
    ast::Expr,
    error::{ErrorKind, Frame},
    interpreter::{
        evaluator::core::{Context, EvalResult, Signal},
        value::core::{MapValue, Value},
    },
    util::span::Span,
};

impl Context<'_> {
    /// Evaluates `callee(args...)`: the callee first, then the arguments
    /// from left to right.
    pub(super) fn eval_call(&mut self, callee: &Expr, args: &[Expr], span: Span) -> EvalResult<Value> {
        let map = match self.eval(callee)? {
            Value::Map(map) => map,
            other => {
                return Err(self.fail(ErrorKind::IllegalCallError,
                                     callee.span,
                                     format!("a value of type {} cannot be called", other.ty())));
            },
        };
        let args = args.iter().map(|arg| self.eval(arg)).collect::<EvalResult<Vec<_>>>()?;
        self.call(&map, args, span)
    }

    /// Calls a function value.
    ///
    /// Every symbol of the function's frame is saved before the parameters
    /// are bound and restored afterwards, so each activation, including a
    /// recursive one, sees its own parameters and locals.
    ///
    /// # Parameters
    /// - `map`: The function value.
    /// - `args`: Argument values, already converted to the parameter types.
    /// - `span`: The call site, recorded in the stack trace.
    ///
    /// # Errors
    /// `StackOverflowError` when the call would exceed
    /// [`Context::max_call_depth`]; otherwise whatever the body raises.
    pub fn call(&mut self, map: &MapValue, args: Vec<Value>, span: Span) -> EvalResult<Value> {
        if self.buffer.depth() >= self.max_call_depth {
            return Err(self.fail(ErrorKind::StackOverflowError,
                                 span,
                                 format!("maximum call depth of {} exceeded in '{}'",
                                         self.max_call_depth,
                                         map.name())));
        }
        if args.len() != map.func.params.len() {
            return Err(self.fail(ErrorKind::ArgumentLengthError,
                                 span,
                                 format!("'{}' expects {} argument(s), found {}",
                                         map.name(),
                                         map.func.params.len(),
                                         args.len())));
        }

        let frame = self.resolution().frame(map.node);
        let saved = frame.iter().map(|&id| (id, self.value(id).cloned())).collect::<Vec<_>>();
        for (param, arg) in map.func.params.iter().zip(args) {
            let id = self.symbol(param.id, param.span)?;
            self.set(id, Some(arg));
        }

        self.buffer.push_frame(Frame { name: map.name().to_string(),
                                       span });
        trace!(name = map.name(), depth = self.buffer.depth(), "call");
        let outcome = self.exec_block(&map.func.body);
        self.buffer.pop_frame();
        for (id, value) in saved {
            self.set(id, value);
        }

        let result = match outcome? {
            Signal::Return(value) => value,
            Signal::Continue => Value::Void,
        };
        match &map.returns {
            Some(ret) => self.convert(result, ret, span),
            None => Ok(result),
        }
    }
}
