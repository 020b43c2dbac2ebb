use crate::{
    ast::{Expr, UnaryOperator},
    error::ErrorKind,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::{core::Value, natural::Natural},
    },
    util::span::Span,
};

impl Context<'_> {
    /// Evaluates `-e`, `~e` and `e!`.
    pub(super) fn eval_unary(&mut self, op: UnaryOperator, operand: &Expr, span: Span) -> EvalResult<Value> {
        if op == UnaryOperator::Not {
            return Ok(Value::Bool(!self.eval_bool(operand)?));
        }
        let value = self.eval(operand)?;
        match (op, value) {
            (UnaryOperator::Neg, Value::Integer(i)) => Ok(Value::from(i.neg())),
            (UnaryOperator::Neg, Value::Rational(q)) => Ok(Value::from(q.neg())),
            (UnaryOperator::Neg, Value::Modulus(m)) => Ok(Value::from(m.neg())),
            (UnaryOperator::Fact, Value::Integer(i)) => {
                if i.is_negative() {
                    return Err(self.fail(ErrorKind::IllegalTypeConversionError,
                                         span,
                                         format!("factorial of negative number {i}")));
                }
                let n = i.magnitude().map_or(Ok(0), Natural::to_u64).map_err(|e| self.numeric(&e, span))?;
                Natural::factorial(n).map(Value::from).map_err(|e| self.numeric(&e, span))
            },
            (op, value) => Err(self.fail(ErrorKind::UnsupportedBinop,
                                         span,
                                         format!("`{op}` is not defined for {}", value.ty()))),
        }
    }
}
