use std::cmp::Ordering;

use crate::{
    ast::{BinaryOperator, Expr},
    error::{ErrorKind, NumericError},
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::core::Value,
    },
    util::span::Span,
};

impl Context<'_> {
    /// Evaluates a binary operation.
    ///
    /// `&&` and `||` short-circuit; every other operator evaluates both
    /// operands, left first.
    pub(super) fn eval_binary(&mut self, op: BinaryOperator, left: &Expr, right: &Expr, span: Span)
                              -> EvalResult<Value> {
        match op {
            BinaryOperator::And => Ok(Value::Bool(self.eval_bool(left)? && self.eval_bool(right)?)),
            BinaryOperator::Or => Ok(Value::Bool(self.eval_bool(left)? || self.eval_bool(right)?)),
            _ => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                self.apply_binary(op, &left, &right, span)
            },
        }
    }

    /// Applies a strict binary operator to two values.
    ///
    /// # Parameters
    /// - `op`: Any operator except `&&` and `||`.
    /// - `left`, `right`: Operands, already converted to the types the
    ///   checker chose for this operator.
    /// - `span`: Location reported with any error.
    pub fn apply_binary(&self, op: BinaryOperator, left: &Value, right: &Value, span: Span) -> EvalResult<Value> {
        match op {
            BinaryOperator::Eq => Ok(Value::Bool(left == right)),
            BinaryOperator::Neq => Ok(Value::Bool(left != right)),
            BinaryOperator::Lt | BinaryOperator::Le | BinaryOperator::Gt | BinaryOperator::Ge => {
                let ordering = compare(left, right).ok_or_else(|| self.unsupported(op, left, right, span))?;
                Ok(Value::Bool(match op {
                    BinaryOperator::Lt => ordering.is_lt(),
                    BinaryOperator::Le => ordering.is_le(),
                    BinaryOperator::Gt => ordering.is_gt(),
                    _ => ordering.is_ge(),
                }))
            },
            BinaryOperator::Pow => self.power(left, right, span),
            _ => self.arithmetic(op, left, right, span),
        }
    }

    fn unsupported(&self, op: BinaryOperator, left: &Value, right: &Value, span: Span) -> crate::error::Diagnostic {
        self.fail(ErrorKind::UnsupportedBinop,
                  span,
                  format!("`{op}` is not defined for {} and {}", left.ty(), right.ty()))
    }

    /// `+ - * / %` on values of one type, and componentwise on tuples.
    fn arithmetic(&self, op: BinaryOperator, left: &Value, right: &Value, span: Span) -> EvalResult<Value> {
        let numeric = |e: NumericError| self.numeric(&e, span);
        match (left, right) {
            (Value::Str(a), Value::Str(b)) if op == BinaryOperator::Add => Ok(Value::from(format!("{a}{b}"))),
            (Value::Tuple(a), Value::Tuple(b)) => {
                if a.len() != b.len() {
                    return Err(self.fail(ErrorKind::DimensionError,
                                         span,
                                         format!("`{op}` needs tuples of equal length, found {} and {}",
                                                 a.len(),
                                                 b.len())));
                }
                a.iter()
                 .zip(b.iter())
                 .map(|(x, y)| self.arithmetic(op, x, y, span))
                 .collect::<EvalResult<Vec<_>>>()
                 .map(Value::from)
            },
            (Value::Natural(a), Value::Natural(b)) => match op {
                BinaryOperator::Add => a.add(b).map(Value::from).map_err(numeric),
                BinaryOperator::Mul => Ok(Value::from(a.mul(b))),
                _ => Err(self.unsupported(op, left, right, span)),
            },
            (Value::Integer(a), Value::Integer(b)) => {
                let result = match op {
                    BinaryOperator::Add => a.add(b),
                    BinaryOperator::Sub => a.sub(b),
                    BinaryOperator::Mul => Ok(a.mul(b)),
                    BinaryOperator::Div => a.div_floor(b),
                    BinaryOperator::Mod => a.rem_floor(b),
                    _ => return Err(self.unsupported(op, left, right, span)),
                };
                result.map(Value::from).map_err(numeric)
            },
            (Value::Rational(a), Value::Rational(b)) => {
                let result = match op {
                    BinaryOperator::Add => a.add(b),
                    BinaryOperator::Sub => a.sub(b),
                    BinaryOperator::Mul => Ok(a.mul(b)),
                    BinaryOperator::Div => a.div(b),
                    _ => return Err(self.unsupported(op, left, right, span)),
                };
                result.map(Value::from).map_err(numeric)
            },
            (Value::Modulus(a), Value::Modulus(b)) if a.modulus() == b.modulus() => {
                let result = match op {
                    BinaryOperator::Add => Ok(a.add(b)),
                    BinaryOperator::Sub => Ok(a.sub(b)),
                    BinaryOperator::Mul => Ok(a.mul(b)),
                    BinaryOperator::Div => a.div(b),
                    _ => return Err(self.unsupported(op, left, right, span)),
                };
                result.map(Value::from).map_err(numeric)
            },
            _ => Err(self.unsupported(op, left, right, span)),
        }
    }

    /// `base ^ exponent` for a natural or integer exponent.
    ///
    /// Negative exponents are only reached with rational or residue bases,
    /// which invert.
    fn power(&self, base: &Value, exponent: &Value, span: Span) -> EvalResult<Value> {
        let numeric = |e: NumericError| self.numeric(&e, span);
        let k = match exponent {
            Value::Natural(n) => n.to_u64().map(i128::from).map_err(numeric)?,
            Value::Integer(i) => i.to_i128().map_err(numeric)?,
            _ => return Err(self.unsupported(BinaryOperator::Pow, base, exponent, span)),
        };
        let unsigned = || u64::try_from(k).map_err(|_| numeric(NumericError::NotPositive { value: k.to_string() }));
        match base {
            Value::Natural(n) => n.pow(unsigned()?).map(Value::from).map_err(numeric),
            Value::Integer(i) => i.pow(unsigned()?).map(Value::from).map_err(numeric),
            Value::Rational(q) => q.pow(k).map(Value::from).map_err(numeric),
            Value::Modulus(m) => m.pow(k).map(Value::from).map_err(numeric),
            _ => Err(self.unsupported(BinaryOperator::Pow, base, exponent, span)),
        }
    }
}

/// Orders two values of the same rational-tower type.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Natural(a), Value::Natural(b)) => Some(a.cmp(b)),
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::Rational(a), Value::Rational(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::{
        binder::Resolution,
        value::{integer::Integer, modulus::Modulus, natural::Natural, rational::Rational},
    };

    fn nat(n: u64) -> Value {
        Value::from(Natural::new(n).unwrap())
    }

    fn int(n: i128) -> Value {
        Value::from(Integer::from_i128(n).unwrap())
    }

    fn apply(op: BinaryOperator, left: &Value, right: &Value) -> EvalResult<Value> {
        let resolution = Resolution::default();
        let context = Context::new(&resolution);
        context.apply_binary(op, left, right, Span::default())
    }

    #[test]
    fn integer_division_floors() {
        assert_eq!(apply(BinaryOperator::Div, &int(-7), &int(2)).unwrap(), int(-4));
        assert_eq!(apply(BinaryOperator::Mod, &int(-7), &int(2)).unwrap(), int(1));
        assert_eq!(apply(BinaryOperator::Div, &int(1), &int(0)).unwrap_err().kind,
                   ErrorKind::DivisionByZeroError);
    }

    #[test]
    fn natural_addition_past_the_machine_range_fails() {
        let big = nat(u64::MAX);
        assert_eq!(apply(BinaryOperator::Add, &big, &nat(1)).unwrap_err().kind,
                   ErrorKind::IllegalTypeConversionError);
        assert_eq!(apply(BinaryOperator::Mul, &big, &big).unwrap().to_string(),
                   "340282366920938463426481119284349108225");
    }

    #[test]
    fn residues_divide_by_inverses() {
        let a = Value::from(Modulus::from_residue(3, 7));
        let b = Value::from(Modulus::from_residue(5, 7));
        assert_eq!(apply(BinaryOperator::Div, &a, &b).unwrap(), Value::from(Modulus::from_residue(2, 7)));
        let zero = Value::from(Modulus::from_residue(0, 7));
        assert_eq!(apply(BinaryOperator::Div, &a, &zero).unwrap_err().kind,
                   ErrorKind::DivisionByZeroError);
    }

    #[test]
    fn rational_powers_invert() {
        let half = Value::from(Rational::from_decimal("0", "5").unwrap());
        assert_eq!(apply(BinaryOperator::Pow, &half, &int(-2)).unwrap().to_string(), "4");
    }

    #[test]
    fn tuples_combine_componentwise() {
        let left = Value::from(vec![int(1), int(2)]);
        let right = Value::from(vec![int(10), int(20)]);
        assert_eq!(apply(BinaryOperator::Add, &left, &right).unwrap().to_string(), "(11, 22)");
        let short = Value::from(vec![int(1)]);
        assert_eq!(apply(BinaryOperator::Add, &left, &short).unwrap_err().kind, ErrorKind::DimensionError);
    }

    #[test]
    fn comparisons() {
        assert_eq!(apply(BinaryOperator::Lt, &int(-3), &int(2)).unwrap(), Value::Bool(true));
        assert_eq!(apply(BinaryOperator::Ge, &nat(3), &nat(3)).unwrap(), Value::Bool(true));
        assert_eq!(apply(BinaryOperator::Neq, &Value::from("a"), &Value::from("b")).unwrap(), Value::Bool(true));
    }
}
