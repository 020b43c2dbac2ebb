use crate::{
    ast::{Expr, ExprKind, LiteralValue},
    error::{Diagnostic, EcruResult, ErrorKind},
    interpreter::{checker::core::Checker, types::Type, value::modulus::Modulus},
};

/// Whether a value of type `from` may be converted to `to`.
///
/// Allowed conversions:
/// - between any two of `N`, `Z`, `Q` and `Z/nZ` (range and integrality are
///   checked when the conversion runs),
/// - `Bool` to and from `Z/2Z`,
/// - anything to `Str` or `void`, and `Str` to `N`, `Z` or `Q`,
/// - products of equal length, componentwise,
/// - functions with the same parameters whose results convert.
///
/// # Example
/// ```
/// use ecru::interpreter::{checker::coerce::can_coerce, types::Type};
///
/// assert!(can_coerce(&Type::Rational, &Type::Natural));
/// assert!(can_coerce(&Type::Bool, &Type::Modulus(2)));
/// assert!(!can_coerce(&Type::Bool, &Type::Integer));
/// ```
#[must_use]
pub fn can_coerce(from: &Type, to: &Type) -> bool {
    match (from, to) {
        _ if from == to => true,
        (_, Type::Any | Type::Void | Type::Str) | (Type::Any, _) => true,
        (Type::Bool, Type::Modulus(2)) | (Type::Modulus(2), Type::Bool) => true,
        (Type::Str, Type::Natural | Type::Integer | Type::Rational) => true,
        (Type::Product(ours), Type::Product(theirs)) => {
            ours.len() == theirs.len() && ours.iter().zip(theirs).all(|(a, b)| can_coerce(a, b))
        },
        (Type::Function { params: ours, ret: from_ret },
         Type::Function { params: theirs,
                          ret: to_ret, }) => ours == theirs && can_coerce(from_ret, to_ret),
        _ => is_numeric(from) && is_numeric(to),
    }
}

/// `N`, `Z`, `Q` or `Z/nZ`.
pub(super) const fn is_numeric(ty: &Type) -> bool {
    ty.is_rational_tower() || matches!(ty, Type::Modulus(_))
}

impl Checker<'_> {
    /// Converts a typed expression to `target`.
    ///
    /// Returns the expression unchanged when it already has the target type,
    /// and otherwise wraps it in a cast node. Tuple literals are converted
    /// component by component, and whole-number literals headed for `Z/nZ`
    /// become residue literals.
    ///
    /// # Errors
    /// `IllegalTypeConversionError` if [`can_coerce`] rejects the conversion.
    pub fn coerce(&mut self, expr: Expr, target: &Type) -> EcruResult<Expr> {
        if expr.ty == *target || *target == Type::Any {
            return Ok(expr);
        }
        if !can_coerce(&expr.ty, target) {
            return Err(Diagnostic::new(ErrorKind::IllegalTypeConversionError,
                                       expr.span,
                                       format!("cannot convert {} to {target}", expr.ty)));
        }
        if let Type::Modulus(n) = target
           && let ExprKind::Literal(literal) = &expr.kind
        {
            let residue = match literal {
                LiteralValue::Natural(value) => Some(value.rem_u64(*n)),
                LiteralValue::Integer(value) => Some(value.rem_u64(*n)),
                _ => None,
            };
            if let Some(residue) = residue {
                let literal = LiteralValue::Modulus(Modulus::from_residue(residue, *n));
                return Ok(Expr { kind: ExprKind::Literal(literal),
                                 ty: target.clone(),
                                 ..expr });
            }
        }
        if let Type::Product(components) = target
           && let ExprKind::Tuple(items) = expr.kind
        {
            let items = items.into_iter()
                             .zip(components)
                             .map(|(item, component)| self.coerce(item, component))
                             .collect::<EcruResult<Vec<_>>>()?;
            return Ok(Expr { id:   expr.id,
                             kind: ExprKind::Tuple(items),
                             span: expr.span,
                             ty:   target.clone(), });
        }
        Ok(Expr { id:   self.fresh_id(),
                  span: expr.span,
                  kind: ExprKind::Cast { target: target.clone(),
                                         expr:   Box::new(expr), },
                  ty:   target.clone(), })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_types_convert_among_themselves() {
        let numeric = [Type::Natural, Type::Integer, Type::Rational, Type::Modulus(9)];
        for from in &numeric {
            for to in &numeric {
                assert!(can_coerce(from, to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn everything_converts_to_str_and_void() {
        let pair = Type::Product(vec![Type::Bool, Type::Str]);
        let map = Type::function(vec![Type::Integer], Type::Integer);
        for from in [Type::Bool, Type::Void, pair, map] {
            assert!(can_coerce(&from, &Type::Str));
            assert!(can_coerce(&from, &Type::Void));
        }
    }

    #[test]
    fn structural_conversions() {
        let narrow = Type::Product(vec![Type::Natural, Type::Natural]);
        let wide = Type::Product(vec![Type::Rational, Type::Integer]);
        assert!(can_coerce(&narrow, &wide));
        assert!(!can_coerce(&narrow, &Type::Product(vec![Type::Rational; 3])));

        let f = Type::function(vec![Type::Integer], Type::Natural);
        assert!(can_coerce(&f, &Type::function(vec![Type::Integer], Type::Rational)));
        assert!(!can_coerce(&f, &Type::function(vec![Type::Natural], Type::Natural)));
    }

    #[test]
    fn rejected_conversions() {
        assert!(!can_coerce(&Type::Str, &Type::Modulus(3)));
        assert!(!can_coerce(&Type::Bool, &Type::Natural));
        assert!(!can_coerce(&Type::Void, &Type::Integer));
        assert!(!can_coerce(&Type::Modulus(3), &Type::Bool));
    }
}
