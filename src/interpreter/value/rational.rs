use std::{cmp::Ordering, fmt};

use crate::{
    error::NumericError,
    interpreter::value::{integer::Integer, natural::Natural},
};

/// An exact fraction `numerator / denominator` with a positive denominator.
///
/// Values built with [`Rational::new`] keep the form they were written in, so
/// a literal such as `1.50` remembers its scale. Arithmetic always returns
/// reduced results, and equality, ordering and display look through the
/// representation.
#[derive(Debug, Clone)]
pub struct Rational {
    numerator:   Integer,
    denominator: Natural,
}

impl Rational {
    /// Builds a fraction without reducing it. A zero numerator forces the
    /// denominator to one.
    #[must_use]
    pub fn new(numerator: Integer, denominator: Natural) -> Self {
        let denominator = if numerator.is_zero() { Natural::one() } else { denominator };
        Self { numerator,
               denominator }
    }

    #[must_use]
    pub fn zero() -> Self {
        Self::from_integer(Integer::zero())
    }

    #[must_use]
    pub fn from_integer(numerator: Integer) -> Self {
        Self::new(numerator, Natural::one())
    }

    /// Parses the digits of a decimal literal, split at the point.
    ///
    /// # Example
    /// ```
    /// use ecru::interpreter::value::rational::Rational;
    ///
    /// let value = Rational::from_decimal("1", "50").unwrap();
    ///
    /// assert_eq!(value.denominator().to_string(), "100");
    /// assert_eq!(value.to_string(), "3/2");
    /// ```
    pub fn from_decimal(whole: &str, fraction: &str) -> Result<Self, NumericError> {
        let digits = format!("{whole}{fraction}");
        let not_a_number = || NumericError::NotANumber { text: format!("{whole}.{fraction}") };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(not_a_number());
        }
        let numerator = digits.parse::<u64>().map_err(|_| NumericError::Overflow)?;
        let scale = u32::try_from(fraction.len()).map_err(|_| NumericError::Overflow)?;
        let denominator = 10u64.checked_pow(scale).ok_or(NumericError::Overflow)?;
        Ok(Self::new(Integer::from_i128(i128::from(numerator))?, Natural::new(denominator)?))
    }

    #[must_use]
    pub const fn numerator(&self) -> &Integer {
        &self.numerator
    }

    #[must_use]
    pub const fn denominator(&self) -> &Natural {
        &self.denominator
    }

    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.numerator.is_zero()
    }

    /// The same value in lowest terms.
    #[must_use]
    pub fn reduced(&self) -> Self {
        match self.numerator.magnitude() {
            None => Self::zero(),
            Some(magnitude) => {
                let (numerator, denominator) = magnitude.cancel(&self.denominator);
                Self::new(Integer::new(self.numerator.is_negative(), Some(numerator)),
                          denominator)
            },
        }
    }

    /// Whether the reduced denominator is one.
    #[must_use]
    pub fn is_integral(&self) -> bool {
        self.reduced().denominator.is_one()
    }

    /// The value as an integer, failing on a fractional part.
    pub fn to_integer(&self) -> Result<Integer, NumericError> {
        let reduced = self.reduced();
        if reduced.denominator.is_one() {
            Ok(reduced.numerator)
        } else {
            Err(NumericError::NotIntegral { value: self.to_string() })
        }
    }

    #[must_use]
    pub fn neg(&self) -> Self {
        Self::new(self.numerator.neg(), self.denominator.clone()).reduced()
    }

    pub fn add(&self, other: &Self) -> Result<Self, NumericError> {
        let (left, right) = self.denominator.cancel(&other.denominator);
        let numerator = self.numerator
                            .mul(&Integer::from(right.clone()))
                            .add(&other.numerator.mul(&Integer::from(left)))?;
        Ok(Self::new(numerator, self.denominator.mul(&right)).reduced())
    }

    pub fn sub(&self, other: &Self) -> Result<Self, NumericError> {
        self.add(&other.neg())
    }

    #[must_use]
    pub fn mul(&self, other: &Self) -> Self {
        Self::new(self.numerator.mul(&other.numerator),
                  self.denominator.mul(&other.denominator)).reduced()
    }

    /// # Example
    /// ```
    /// use ecru::interpreter::value::{integer::Integer, rational::Rational};
    ///
    /// let one = Rational::from_integer(Integer::from_i128(1).unwrap());
    /// let three = Rational::from_integer(Integer::from_i128(-3).unwrap());
    ///
    /// assert_eq!(one.div(&three).unwrap().to_string(), "-1/3");
    /// assert!(one.div(&Rational::zero()).is_err());
    /// ```
    pub fn div(&self, other: &Self) -> Result<Self, NumericError> {
        Ok(self.mul(&other.recip()?))
    }

    /// `1 / self`.
    pub fn recip(&self) -> Result<Self, NumericError> {
        let magnitude = self.numerator.magnitude().ok_or(NumericError::DivisionByZero)?;
        Ok(Self::new(Integer::new(self.numerator.is_negative(), Some(self.denominator.clone())),
                     magnitude.clone()))
    }

    /// `self^k` for a signed exponent. Negative exponents invert first.
    pub fn pow(&self, k: i128) -> Result<Self, NumericError> {
        let base = if k < 0 { self.recip()? } else { self.reduced() };
        let k = u64::try_from(k.unsigned_abs()).map_err(|_| NumericError::Overflow)?;
        Ok(Self::new(base.numerator.pow(k)?, base.denominator.pow(k)?))
    }

    /// Reduced factorizations, e.g. `(-2^2)/(3^3)`; integral values render
    /// like an integer.
    #[must_use]
    pub fn pretty(&self) -> String {
        let reduced = self.reduced();
        if reduced.denominator.is_one() {
            reduced.numerator.pretty()
        } else {
            format!("({})/({})", reduced.numerator.pretty(), reduced.denominator.pretty())
        }
    }
}

impl From<Integer> for Rational {
    fn from(i: Integer) -> Self {
        Self::from_integer(i)
    }
}

impl PartialEq for Rational {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Rational {}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        let left = self.numerator.mul(&Integer::from(other.denominator.clone()));
        let right = other.numerator.mul(&Integer::from(self.denominator.clone()));
        left.cmp(&right)
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reduced = self.reduced();
        if reduced.denominator.is_one() {
            write!(f, "{}", reduced.numerator)
        } else {
            write!(f, "{}/{}", reduced.numerator, reduced.denominator)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(n: i128, d: u64) -> Rational {
        Rational::new(Integer::from_i128(n).unwrap(), Natural::new(d).unwrap())
    }

    #[test]
    fn equality_ignores_representation() {
        assert_eq!(q(2, 4), q(1, 2));
        assert_eq!(q(0, 7), Rational::zero());
        assert_ne!(q(1, 3), q(1, 2));
        assert_eq!(q(6, 4).to_string(), "3/2");
        assert_eq!(q(8, 4).to_string(), "2");
    }

    #[test]
    fn field_operations_are_exact() {
        assert_eq!(q(1, 2).add(&q(1, 3)).unwrap(), q(5, 6));
        assert_eq!(q(1, 2).sub(&q(3, 4)).unwrap(), q(-1, 4));
        assert_eq!(q(2, 3).mul(&q(9, 4)), q(3, 2));
        assert_eq!(q(1, 2).div(&q(-1, 4)).unwrap(), q(-2, 1));
        assert_eq!(q(1, 2).div(&q(0, 1)), Err(NumericError::DivisionByZero));
    }

    #[test]
    fn results_are_reduced() {
        let sum = q(1, 6).add(&q(1, 3)).unwrap();
        assert_eq!(sum.denominator().get_val(), Some(2));
        assert!(q(10, 5).is_integral());
        assert!(!q(10, 4).is_integral());
    }

    #[test]
    fn negative_powers_invert() {
        assert_eq!(q(2, 3).pow(-2).unwrap(), q(9, 4));
        assert_eq!(q(-2, 1).pow(-3).unwrap(), q(-1, 8));
        assert_eq!(q(0, 1).pow(-1), Err(NumericError::DivisionByZero));
    }

    #[test]
    fn ordering_cross_multiplies() {
        assert!(q(1, 3) < q(1, 2));
        assert!(q(-1, 2) < q(-1, 3));
        assert!(q(7, 2) > q(3, 1));
    }

    #[test]
    fn decimal_literals_keep_their_scale() {
        let value = Rational::from_decimal("0", "25").unwrap();
        assert_eq!(value.numerator().to_string(), "25");
        assert_eq!(value.denominator().to_string(), "100");
        assert_eq!(value, q(1, 4));
        assert!(Rational::from_decimal("1", "2.3").is_err());
    }

    #[test]
    fn pretty_shows_reduced_factorizations() {
        assert_eq!(q(-4, 27).pretty(), "(-2^2)/(3^3)");
        assert_eq!(q(12, 1).pretty(), "2^2*3");
    }
}
