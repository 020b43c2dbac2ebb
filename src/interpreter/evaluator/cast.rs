use crate::{
    error::{ErrorKind, NumericError},
    interpreter::{
        evaluator::core::{Context, EvalResult},
        types::Type,
        value::{
            core::{MapValue, Value},
            integer::Integer,
            modulus::Modulus,
            natural::Natural,
            rational::Rational,
        },
    },
    util::span::Span,
};

impl Context<'_> {
    /// Converts a value to `target`.
    ///
    /// This is the run-time half of a cast node. The checker has already
    /// ruled out conversions that can never succeed; what remains can still
    /// fail on the value, e.g. `-1` to `N`, `1/2` to `Z` or `"x"` to `Q`.
    ///
    /// # Errors
    /// `IllegalTypeConversionError` when the value has no counterpart in
    /// `target`, `DivisionByZeroError` when a fraction's denominator has no
    /// inverse modulo `n`.
    pub fn convert(&self, value: Value, target: &Type, span: Span) -> EvalResult<Value> {
        let numeric = |e: NumericError| self.numeric(&e, span);
        match (target, value) {
            (Type::Any, value) => Ok(value),
            (Type::Void, _) => Ok(Value::Void),
            (Type::Str, Value::Str(s)) => Ok(Value::Str(s)),
            (Type::Str, value) => Ok(Value::from(value.to_string())),
            (Type::Natural, value) if is_number_source(&value) => {
                to_natural(&value).map(Value::from).map_err(numeric)
            },
            (Type::Integer, value) if is_number_source(&value) => {
                to_integer(&value).map(Value::from).map_err(numeric)
            },
            (Type::Rational, value) if is_number_source(&value) => {
                to_rational(&value).map(Value::from).map_err(numeric)
            },
            (Type::Modulus(n), value) if is_number_source(&value) || matches!(value, Value::Bool(_)) => {
                to_modulus(&value, *n).map(Value::from).map_err(numeric)
            },
            (Type::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
            (Type::Bool, Value::Modulus(m)) if m.modulus() == 2 => Ok(Value::Bool(m.value() == 1)),
            (Type::Product(components), Value::Tuple(items)) if components.len() == items.len() => {
                items.iter()
                     .cloned()
                     .zip(components)
                     .map(|(item, component)| self.convert(item, component, span))
                     .collect::<EvalResult<Vec<_>>>()
                     .map(Value::from)
            },
            (Type::Function { ret, .. }, Value::Map(map)) => {
                Ok(Value::Map(MapValue { returns: Some((**ret).clone()),
                                         ..map }))
            },
            (target, value) => Err(self.fail(ErrorKind::IllegalTypeConversionError,
                                             span,
                                             format!("cannot convert {} value {value} to {target}", value.ty()))),
        }
    }
}

/// Values that numeric conversions accept.
const fn is_number_source(value: &Value) -> bool {
    matches!(value,
             Value::Natural(_) | Value::Integer(_) | Value::Rational(_) | Value::Modulus(_) | Value::Str(_))
}

/// Reads a number from text: `12`, `-3`, `1.25`, `-7/2`.
///
/// # Example
/// ```
/// use ecru::interpreter::evaluator::cast::parse_rational;
///
/// assert_eq!(parse_rational(" -7/2 ").unwrap().to_string(), "-7/2");
/// assert_eq!(parse_rational("1.25").unwrap().to_string(), "5/4");
/// assert!(parse_rational("seven").is_err());
/// ```
pub fn parse_rational(text: &str) -> Result<Rational, NumericError> {
    let not_a_number = || NumericError::NotANumber { text: text.to_string() };
    let trimmed = text.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    if unsigned.is_empty() || unsigned.starts_with(['-', '+']) {
        return Err(not_a_number());
    }
    let magnitude = if let Some((numerator, denominator)) = unsigned.split_once('/') {
        let numerator = numerator.trim().parse::<u64>().map_err(|_| not_a_number())?;
        let denominator = denominator.trim().parse::<u64>().map_err(|_| not_a_number())?;
        if denominator == 0 {
            return Err(NumericError::DivisionByZero);
        }
        Rational::new(Integer::from_i128(i128::from(numerator))?, Natural::new(denominator)?)
    } else if let Some((whole, fraction)) = unsigned.split_once('.') {
        Rational::from_decimal(whole, fraction).map_err(|_| not_a_number())?
    } else {
        let whole = unsigned.parse::<u64>().map_err(|_| not_a_number())?;
        Rational::from_integer(Integer::from_i128(i128::from(whole))?)
    };
    Ok(if negative { magnitude.neg() } else { magnitude })
}

fn to_rational(value: &Value) -> Result<Rational, NumericError> {
    match value {
        Value::Natural(n) => Ok(Rational::from_integer(Integer::from_natural(n.clone()))),
        Value::Integer(i) => Ok(Rational::from_integer(i.clone())),
        Value::Rational(q) => Ok(q.clone()),
        Value::Modulus(m) => Ok(Rational::from_integer(Integer::from_i128(i128::from(m.value()))?)),
        Value::Str(s) => parse_rational(s),
        other => Err(NumericError::NotANumber { text: other.to_string() }),
    }
}

fn to_integer(value: &Value) -> Result<Integer, NumericError> {
    match value {
        Value::Natural(n) => Ok(Integer::from_natural(n.clone())),
        Value::Integer(i) => Ok(i.clone()),
        other => to_rational(other)?.to_integer(),
    }
}

fn to_natural(value: &Value) -> Result<Natural, NumericError> {
    match value {
        Value::Natural(n) => Ok(n.clone()),
        other => to_integer(other)?.to_natural(),
    }
}

/// A fraction `p/q` maps to `p * q^-1` modulo `n`.
fn to_modulus(value: &Value, n: u64) -> Result<Modulus, NumericError> {
    match value {
        Value::Bool(b) => Ok(Modulus::from_residue(u64::from(*b), n)),
        Value::Modulus(m) => Ok(Modulus::from_residue(m.value(), n)),
        Value::Natural(k) => Ok(Modulus::from_residue(k.rem_u64(n), n)),
        Value::Integer(k) => Ok(Modulus::from_residue(k.rem_u64(n), n)),
        other => {
            let q = to_rational(other)?.reduced();
            let numerator = Modulus::from_residue(q.numerator().rem_u64(n), n);
            let denominator = Modulus::from_residue(q.denominator().rem_u64(n), n);
            numerator.div(&denominator)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::binder::Resolution;

    fn convert(value: Value, target: &Type) -> EvalResult<Value> {
        let resolution = Resolution::default();
        Context::new(&resolution).convert(value, target, Span::default())
    }

    fn int(n: i128) -> Value {
        Value::from(Integer::from_i128(n).unwrap())
    }

    #[test]
    fn naturals_reject_non_positive_values() {
        assert_eq!(convert(int(5), &Type::Natural).unwrap().to_string(), "5");
        for value in [int(0), int(-2)] {
            assert_eq!(convert(value, &Type::Natural).unwrap_err().kind,
                       ErrorKind::IllegalTypeConversionError);
        }
    }

    #[test]
    fn integers_reject_fractions() {
        let half = Value::from(parse_rational("1/2").unwrap());
        assert_eq!(convert(half, &Type::Integer).unwrap_err().kind, ErrorKind::IllegalTypeConversionError);
        let two = Value::from(parse_rational("4/2").unwrap());
        assert_eq!(convert(two, &Type::Integer).unwrap(), int(2));
    }

    #[test]
    fn residues() {
        assert_eq!(convert(int(-1), &Type::Modulus(5)).unwrap().to_string(), "4");
        let half = Value::from(parse_rational("1/2").unwrap());
        assert_eq!(convert(half.clone(), &Type::Modulus(5)).unwrap().to_string(), "3");
        assert_eq!(convert(half, &Type::Modulus(4)).unwrap_err().kind, ErrorKind::DivisionByZeroError);
        assert_eq!(convert(Value::Bool(true), &Type::Modulus(2)).unwrap().to_string(), "1");
        let one = Value::from(Modulus::from_residue(1, 2));
        assert_eq!(convert(one, &Type::Bool).unwrap(), Value::Bool(true));
    }

    #[test]
    fn strings_parse_and_render() {
        assert_eq!(convert(Value::from(" 42 "), &Type::Natural).unwrap().to_string(), "42");
        assert_eq!(convert(Value::from("-1.5"), &Type::Rational).unwrap().to_string(), "-3/2");
        assert_eq!(convert(Value::from("x"), &Type::Integer).unwrap_err().kind,
                   ErrorKind::IllegalTypeConversionError);
        assert_eq!(convert(Value::from(vec![int(1), Value::from("a")]), &Type::Str).unwrap().to_string(),
                   "(1, a)");
    }

    #[test]
    fn tuples_convert_componentwise() {
        let pair = Value::from(vec![int(1), int(2)]);
        let target = Type::Product(vec![Type::Natural, Type::Rational]);
        assert_eq!(convert(pair, &target).unwrap().ty(), target);
    }
}
