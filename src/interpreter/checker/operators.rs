use crate::{
    ast::{BinaryOperator, Expr, ExprKind, UnaryOperator},
    error::{Diagnostic, EcruResult, ErrorKind},
    interpreter::{
        checker::{coerce::is_numeric, core::Checker},
        types::Type,
    },
    util::span::Span,
};

fn unsupported(op: impl std::fmt::Display, left: &Type, right: Option<&Type>, span: Span) -> Diagnostic {
    let operands = match right {
        Some(right) => format!("{left} and {right}"),
        None => left.to_string(),
    };
    Diagnostic::new(ErrorKind::UnsupportedBinop,
                    span,
                    format!("`{op}` is not defined for {operands}"))
}

/// The type both operands of an arithmetic operator are brought to.
///
/// `N`, `Z` and `Q` join in the lattice. A residue class absorbs `N` and
/// `Z` operands; two classes must share their modulus.
///
/// # Example
/// ```
/// use ecru::interpreter::{checker::operators::math_join, types::Type};
///
/// assert_eq!(math_join(&Type::Natural, &Type::Rational), Some(Type::Rational));
/// assert_eq!(math_join(&Type::Integer, &Type::Modulus(4)), Some(Type::Modulus(4)));
/// assert_eq!(math_join(&Type::Modulus(3), &Type::Modulus(4)), None);
/// ```
#[must_use]
pub fn math_join(left: &Type, right: &Type) -> Option<Type> {
    match (left, right) {
        (Type::Modulus(n), Type::Modulus(m)) => (n == m).then_some(Type::Modulus(*n)),
        (Type::Modulus(n), Type::Natural | Type::Integer) | (Type::Natural | Type::Integer, Type::Modulus(n)) => {
            Some(Type::Modulus(*n))
        },
        _ if left.is_rational_tower() && right.is_rational_tower() => Some(left.closest_parent(right)),
        _ => None,
    }
}

/// Operand and result type of `+ - * / %`.
///
/// Subtraction, division and remainder leave the naturals, so they work on
/// `Z` when both operands are `N`. Remainder is only defined on `Z`. Tuples
/// of equal length combine componentwise.
///
/// # Errors
/// `UnsupportedBinop` for operand types the operator is not defined on and
/// `DimensionError` for tuples of different lengths.
pub fn arithmetic_type(op: BinaryOperator, left: &Type, right: &Type, span: Span) -> EcruResult<Type> {
    if let (Type::Product(ours), Type::Product(theirs)) = (left, right) {
        if op == BinaryOperator::Mod {
            return Err(unsupported(op, left, Some(right), span));
        }
        if ours.len() != theirs.len() {
            return Err(Diagnostic::new(ErrorKind::DimensionError,
                                       span,
                                       format!("`{op}` needs tuples of equal length, found {} and {}",
                                               ours.len(),
                                               theirs.len())));
        }
        return ours.iter()
                   .zip(theirs)
                   .map(|(a, b)| arithmetic_type(op, a, b, span))
                   .collect::<EcruResult<Vec<_>>>()
                   .map(Type::Product);
    }
    let joined = math_join(left, right).ok_or_else(|| unsupported(op, left, Some(right), span))?;
    let joined = match op {
        BinaryOperator::Sub | BinaryOperator::Div | BinaryOperator::Mod if joined == Type::Natural => Type::Integer,
        _ => joined,
    };
    if op == BinaryOperator::Mod && joined != Type::Integer {
        return Err(unsupported(op, left, Some(right), span));
    }
    Ok(joined)
}

/// Base and result type of `base ^ exponent`.
///
/// A natural exponent keeps the base type. An integer exponent may be
/// negative, so rational-tower bases become `Q`; residue classes stay put.
fn power_type(base: &Type, exponent: &Type) -> Option<Type> {
    match exponent {
        Type::Natural if is_numeric(base) => Some(base.clone()),
        Type::Integer if base.is_rational_tower() => Some(Type::Rational),
        Type::Integer if matches!(base, Type::Modulus(_)) => Some(base.clone()),
        _ => None,
    }
}

impl Checker<'_> {
    pub(super) fn check_binary(&mut self, expr: &Expr, op: BinaryOperator, left: &Expr, right: &Expr)
                               -> EcruResult<Expr> {
        let left = self.check_expr(left)?;
        let right = self.check_expr(right)?;
        let (left, right, ty) = self.type_binary(op, left, right, expr.span)?;
        Ok(Expr { id: expr.id,
                  kind: ExprKind::Binary { op,
                                           left: Box::new(left),
                                           right: Box::new(right) },
                  span: expr.span,
                  ty })
    }

    fn type_binary(&mut self, op: BinaryOperator, left: Expr, right: Expr, span: Span)
                   -> EcruResult<(Expr, Expr, Type)> {
        let both = |checker: &mut Self, left: Expr, right: Expr, operand: &Type| -> EcruResult<(Expr, Expr)> {
            Ok((checker.coerce(left, operand)?, checker.coerce(right, operand)?))
        };
        match op {
            BinaryOperator::And | BinaryOperator::Or => {
                let (left, right) = both(self, left, right, &Type::Bool)?;
                Ok((left, right, Type::Bool))
            },
            BinaryOperator::Eq | BinaryOperator::Neq => {
                if left.ty == right.ty {
                    return Ok((left, right, Type::Bool));
                }
                let joined = if is_numeric(&left.ty) && is_numeric(&right.ty) {
                    math_join(&left.ty, &right.ty)
                } else {
                    None
                };
                let joined = joined.ok_or_else(|| unsupported(op, &left.ty, Some(&right.ty), span))?;
                let (left, right) = both(self, left, right, &joined)?;
                Ok((left, right, Type::Bool))
            },
            BinaryOperator::Lt | BinaryOperator::Le | BinaryOperator::Gt | BinaryOperator::Ge => {
                if !left.ty.is_rational_tower() || !right.ty.is_rational_tower() {
                    return Err(unsupported(op, &left.ty, Some(&right.ty), span));
                }
                let joined = left.ty.closest_parent(&right.ty);
                let (left, right) = both(self, left, right, &joined)?;
                Ok((left, right, Type::Bool))
            },
            BinaryOperator::Add if left.ty == Type::Str || right.ty == Type::Str => {
                let (left, right) = both(self, left, right, &Type::Str)?;
                Ok((left, right, Type::Str))
            },
            BinaryOperator::Pow => {
                let ty = power_type(&left.ty, &right.ty)
                         .ok_or_else(|| unsupported(op, &left.ty, Some(&right.ty), span))?;
                let left = self.coerce(left, &ty)?;
                Ok((left, right, ty))
            },
            BinaryOperator::Add | BinaryOperator::Sub | BinaryOperator::Mul | BinaryOperator::Div | BinaryOperator::Mod => {
                let ty = arithmetic_type(op, &left.ty, &right.ty, span)?;
                let (left, right) = both(self, left, right, &ty)?;
                Ok((left, right, ty))
            },
        }
    }

    /// Types `-e`, `~e` and `e!`.
    ///
    /// Negation leaves the naturals, so `N` operands become `Z`. Logical
    /// negation works on `Bool`. Factorial takes a `Z` operand, rejected at
    /// run time if negative, and yields `N`.
    pub(super) fn check_unary(&mut self, expr: &Expr, op: UnaryOperator, operand: &Expr) -> EcruResult<Expr> {
        let operand = self.check_expr(operand)?;
        let (operand, ty) = match op {
            UnaryOperator::Neg => {
                let ty = match &operand.ty {
                    Type::Natural => Type::Integer,
                    ty @ (Type::Integer | Type::Rational | Type::Modulus(_)) => ty.clone(),
                    other => return Err(unsupported(op, other, None, expr.span)),
                };
                (self.coerce(operand, &ty)?, ty)
            },
            UnaryOperator::Not => (self.coerce(operand, &Type::Bool)?, Type::Bool),
            UnaryOperator::Fact => (self.coerce(operand, &Type::Integer)?, Type::Natural),
        };
        Ok(Expr { id: expr.id,
                  kind: ExprKind::Unary { op,
                                          expr: Box::new(operand) },
                  span: expr.span,
                  ty })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::{Program, StmtKind},
        interpreter::{
            binder::bind_program, checker::core::check_program, lexer::tokenize,
            parser::core::parse_program,
        },
    };

    fn check(source: &str) -> EcruResult<Program> {
        let program = parse_program(tokenize(source).unwrap()).unwrap();
        let resolution = bind_program(&program).unwrap();
        check_program(&program, &resolution)
    }

    /// Type of the expression in the last print statement.
    fn printed_type(source: &str) -> Type {
        let program = check(source).unwrap();
        match &program.statements.last().unwrap().kind {
            StmtKind::Print { expr, .. } => expr.ty.clone(),
            other => panic!("expected a print statement, found {other:?}"),
        }
    }

    fn error_kind(source: &str) -> ErrorKind {
        check(source).unwrap_err().kind
    }

    #[test]
    fn naturals_close_under_addition_and_multiplication_only() {
        assert_eq!(printed_type("print 1 + 2 * 3;"), Type::Natural);
        assert_eq!(printed_type("print 1 - 2;"), Type::Integer);
        assert_eq!(printed_type("print 7 / 2;"), Type::Integer);
        assert_eq!(printed_type("print -3;"), Type::Integer);
        assert_eq!(printed_type("print 1.5 + 1;"), Type::Rational);
    }

    #[test]
    fn residue_arithmetic() {
        assert_eq!(printed_type("m: Z/7Z; print m + 3;"), Type::Modulus(7));
        assert_eq!(printed_type("m: Z/7Z; print m ^ -1;"), Type::Modulus(7));
        assert_eq!(error_kind("a: Z/7Z; b: Z/5Z; print a + b;"), ErrorKind::UnsupportedBinop);
        assert_eq!(error_kind("a: Z/7Z; print a % 2;"), ErrorKind::UnsupportedBinop);
    }

    #[test]
    fn powers() {
        assert_eq!(printed_type("print 2 ^ 10;"), Type::Natural);
        assert_eq!(printed_type("print 2 ^ -1;"), Type::Rational);
        assert_eq!(error_kind("print 2 ^ 0.5;"), ErrorKind::UnsupportedBinop);
    }

    #[test]
    fn strings_concatenate() {
        assert_eq!(printed_type("print \"n = \" + 3;"), Type::Str);
        assert_eq!(error_kind("print \"a\" - 1;"), ErrorKind::UnsupportedBinop);
    }

    #[test]
    fn tuples_combine_componentwise() {
        assert_eq!(printed_type("print (1, 2.5) + (3, 4);"), Type::Product(vec![Type::Natural, Type::Rational]));
        assert_eq!(error_kind("print (1, 2) + (1, 2, 3);"), ErrorKind::DimensionError);
    }

    #[test]
    fn comparisons_and_logic() {
        assert_eq!(printed_type("print 1 < 2.5;"), Type::Bool);
        assert_eq!(printed_type("print \"a\" == \"a\" && ~false;"), Type::Bool);
        assert_eq!(error_kind("print \"a\" == 1;"), ErrorKind::UnsupportedBinop);
        assert_eq!(error_kind("print \"a\" < \"b\";"), ErrorKind::UnsupportedBinop);
        assert_eq!(error_kind("print 1 && true;"), ErrorKind::IllegalTypeConversionError);
    }

    #[test]
    fn factorial_yields_naturals() {
        assert_eq!(printed_type("print 5!;"), Type::Natural);
        assert_eq!(printed_type("print 0!;"), Type::Natural);
    }
}
