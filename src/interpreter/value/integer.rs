use std::{cmp::Ordering, fmt};

use crate::{error::NumericError, interpreter::value::natural::Natural};

/// A signed integer: a sign and an optional natural magnitude, where a
/// missing magnitude is zero.
///
/// Multiplication and exponentiation work on the factored magnitude and are
/// exact at any size. Addition, subtraction, floor division and remainder go
/// through `i128` and fail with [`NumericError::Overflow`] once an operand
/// leaves `u64` magnitude.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Integer {
    negative:  bool,
    magnitude: Option<Natural>,
}

impl Integer {
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Builds an integer from its parts. Zero is never negative.
    #[must_use]
    pub fn new(negative: bool, magnitude: Option<Natural>) -> Self {
        Self { negative: negative && magnitude.is_some(),
               magnitude }
    }

    #[must_use]
    pub fn from_natural(n: Natural) -> Self {
        Self::new(false, Some(n))
    }

    /// # Example
    /// ```
    /// use ecru::interpreter::value::integer::Integer;
    ///
    /// assert_eq!(Integer::from_i128(-12).unwrap().to_string(), "-12");
    /// assert!(Integer::from_i128(0).unwrap().is_zero());
    /// ```
    pub fn from_i128(v: i128) -> Result<Self, NumericError> {
        let magnitude = u64::try_from(v.unsigned_abs()).map_err(|_| NumericError::Overflow)?;
        if magnitude == 0 {
            return Ok(Self::zero());
        }
        Ok(Self::new(v < 0, Some(Natural::new(magnitude)?)))
    }

    /// The value as an `i128`, or [`NumericError::Overflow`] when the
    /// magnitude exceeds `u64`.
    pub fn to_i128(&self) -> Result<i128, NumericError> {
        let magnitude = match &self.magnitude {
            None => return Ok(0),
            Some(n) => i128::from(n.to_u64()?),
        };
        Ok(if self.negative { -magnitude } else { magnitude })
    }

    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.magnitude.is_none()
    }

    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.negative
    }

    #[must_use]
    pub const fn magnitude(&self) -> Option<&Natural> {
        self.magnitude.as_ref()
    }

    /// The value as a natural number, failing unless it is positive.
    pub fn to_natural(&self) -> Result<Natural, NumericError> {
        match &self.magnitude {
            Some(n) if !self.negative => Ok(n.clone()),
            _ => Err(NumericError::NotPositive { value: self.to_string() }),
        }
    }

    #[must_use]
    pub fn neg(&self) -> Self {
        Self::new(!self.negative, self.magnitude.clone())
    }

    #[must_use]
    pub fn abs(&self) -> Self {
        Self::new(false, self.magnitude.clone())
    }

    pub fn add(&self, other: &Self) -> Result<Self, NumericError> {
        Self::from_i128(self.to_i128()? + other.to_i128()?)
    }

    pub fn sub(&self, other: &Self) -> Result<Self, NumericError> {
        Self::from_i128(self.to_i128()? - other.to_i128()?)
    }

    /// Product of the factored magnitudes.
    #[must_use]
    pub fn mul(&self, other: &Self) -> Self {
        match (&self.magnitude, &other.magnitude) {
            (Some(a), Some(b)) => Self::new(self.negative != other.negative, Some(a.mul(b))),
            _ => Self::zero(),
        }
    }

    /// Division rounding toward negative infinity.
    ///
    /// # Example
    /// ```
    /// use ecru::interpreter::value::integer::Integer;
    ///
    /// let seven = Integer::from_i128(-7).unwrap();
    /// let two = Integer::from_i128(2).unwrap();
    ///
    /// assert_eq!(seven.div_floor(&two).unwrap().to_string(), "-4");
    /// assert_eq!(seven.rem_floor(&two).unwrap().to_string(), "1");
    /// ```
    pub fn div_floor(&self, other: &Self) -> Result<Self, NumericError> {
        let (a, b) = (self.to_i128()?, other.to_i128()?);
        if b == 0 {
            return Err(NumericError::DivisionByZero);
        }
        Self::from_i128(floor_div(a, b))
    }

    /// Remainder of [`Self::div_floor`]; takes the sign of the divisor.
    pub fn rem_floor(&self, other: &Self) -> Result<Self, NumericError> {
        let (a, b) = (self.to_i128()?, other.to_i128()?);
        if b == 0 {
            return Err(NumericError::DivisionByZero);
        }
        Self::from_i128(a - b * floor_div(a, b))
    }

    /// `self^k`, with `0^0 = 1`.
    pub fn pow(&self, k: u64) -> Result<Self, NumericError> {
        if k == 0 {
            return Ok(Self::from_natural(Natural::one()));
        }
        match &self.magnitude {
            None => Ok(Self::zero()),
            Some(n) => Ok(Self::new(self.negative && k % 2 == 1, Some(n.pow(k)?))),
        }
    }

    /// The residue of `self` modulo `m`, in `0..m`.
    #[must_use]
    pub fn rem_u64(&self, m: u64) -> u64 {
        match &self.magnitude {
            None => 0,
            Some(n) => {
                let r = n.rem_u64(m);
                if self.negative && r != 0 { m - r } else { r }
            },
        }
    }

    /// Signed factorization, e.g. `-2^2*3`.
    #[must_use]
    pub fn pretty(&self) -> String {
        match &self.magnitude {
            None => "0".to_string(),
            Some(n) if self.negative => format!("-{}", n.pretty()),
            Some(n) => n.pretty(),
        }
    }
}

const fn floor_div(a: i128, b: i128) -> i128 {
    let q = a / b;
    if a % b != 0 && (a < 0) != (b < 0) { q - 1 } else { q }
}

impl From<Natural> for Integer {
    fn from(n: Natural) -> Self {
        Self::from_natural(n)
    }
}

impl Ord for Integer {
    fn cmp(&self, other: &Self) -> Ordering {
        const fn rank(i: &Integer) -> i8 {
            match (i.negative, &i.magnitude) {
                (_, None) => 0,
                (true, _) => -1,
                (false, _) => 1,
            }
        }
        match rank(self).cmp(&rank(other)) {
            Ordering::Equal => match (&self.magnitude, &other.magnitude) {
                (Some(a), Some(b)) if self.negative => b.cmp(a),
                (Some(a), Some(b)) => a.cmp(b),
                _ => Ordering::Equal,
            },
            unequal => unequal,
        }
    }
}

impl PartialOrd for Integer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.magnitude {
            None => write!(f, "0"),
            Some(n) if self.negative => write!(f, "-{n}"),
            Some(n) => write!(f, "{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(v: i128) -> Integer {
        Integer::from_i128(v).unwrap()
    }

    #[test]
    fn arithmetic_matches_machine_integers() {
        for a in -20..=20 {
            for b in -20..=20 {
                assert_eq!(int(a).add(&int(b)).unwrap(), int(a + b));
                assert_eq!(int(a).sub(&int(b)).unwrap(), int(a - b));
                assert_eq!(int(a).mul(&int(b)), int(a * b));
                assert_eq!(int(a).cmp(&int(b)), a.cmp(&b), "{a} vs {b}");
                if b != 0 {
                    let q = int(a).div_floor(&int(b)).unwrap().to_i128().unwrap();
                    let r = int(a).rem_floor(&int(b)).unwrap().to_i128().unwrap();
                    assert_eq!(q * b + r, a, "{a} / {b}");
                    assert!(r.abs() < b.abs());
                    assert!(r == 0 || (r < 0) == (b < 0), "{a} % {b} = {r}");
                }
            }
        }
    }

    #[test]
    fn zero_has_no_sign() {
        assert_eq!(int(5).sub(&int(5)).unwrap(), Integer::zero());
        assert_eq!(Integer::zero().neg(), Integer::zero());
        assert_eq!(int(-3).mul(&Integer::zero()).to_string(), "0");
    }

    #[test]
    fn division_by_zero_is_reported() {
        assert_eq!(int(1).div_floor(&Integer::zero()), Err(NumericError::DivisionByZero));
        assert_eq!(int(1).rem_floor(&Integer::zero()), Err(NumericError::DivisionByZero));
    }

    #[test]
    fn powers_keep_sign_parity() {
        assert_eq!(int(-2).pow(3).unwrap(), int(-8));
        assert_eq!(int(-2).pow(4).unwrap(), int(16));
        assert_eq!(Integer::zero().pow(0).unwrap(), int(1));
        assert_eq!(int(-12).pretty(), "-2^2*3");
    }

    #[test]
    fn residues_are_non_negative() {
        assert_eq!(int(-1).rem_u64(5), 4);
        assert_eq!(int(-10).rem_u64(5), 0);
        assert_eq!(int(13).rem_u64(5), 3);
    }
}
