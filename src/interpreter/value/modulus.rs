use std::fmt;

use crate::{
    error::NumericError,
    util::num::{add_mod, inverse_mod, mul_mod, pow_mod},
};

/// A residue class of `Z/nZ`, stored as its least non-negative
/// representative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Modulus {
    value:   u64,
    modulus: u64,
}

impl Modulus {
    /// The class of `value` modulo `modulus`. A zero modulus is treated as
    /// one.
    ///
    /// # Example
    /// ```
    /// use ecru::interpreter::value::modulus::Modulus;
    ///
    /// assert_eq!(Modulus::from_residue(12, 5).value(), 2);
    /// ```
    #[must_use]
    pub const fn from_residue(value: u64, modulus: u64) -> Self {
        let modulus = if modulus == 0 { 1 } else { modulus };
        Self { value: value % modulus,
               modulus }
    }

    /// The class of a signed value.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub const fn from_signed(value: i128, modulus: u64) -> Self {
        let modulus = if modulus == 0 { 1 } else { modulus };
        Self { value: value.rem_euclid(modulus as i128) as u64,
               modulus }
    }

    #[must_use]
    pub const fn value(&self) -> u64 {
        self.value
    }

    #[must_use]
    pub const fn modulus(&self) -> u64 {
        self.modulus
    }

    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.value == 0
    }

    #[must_use]
    pub const fn add(&self, other: &Self) -> Self {
        Self::from_residue(add_mod(self.value, other.value, self.modulus), self.modulus)
    }

    #[must_use]
    pub const fn neg(&self) -> Self {
        Self::from_residue(self.modulus - self.value, self.modulus)
    }

    #[must_use]
    pub const fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    #[must_use]
    pub const fn mul(&self, other: &Self) -> Self {
        Self::from_residue(mul_mod(self.value, other.value, self.modulus), self.modulus)
    }

    /// The multiplicative inverse. The zero class reports division by
    /// zero; other classes sharing a factor with the modulus report
    /// [`NumericError::NotInvertible`].
    pub fn recip(&self) -> Result<Self, NumericError> {
        if self.is_zero() {
            return Err(NumericError::DivisionByZero);
        }
        inverse_mod(self.value, self.modulus).map(|inverse| Self::from_residue(inverse, self.modulus))
                                             .ok_or(NumericError::NotInvertible { value:   self.value,
                                                                                  modulus: self.modulus, })
    }

    /// # Example
    /// ```
    /// use ecru::interpreter::value::modulus::Modulus;
    ///
    /// let three = Modulus::from_residue(3, 7);
    /// let quotient = Modulus::from_residue(1, 7).div(&three).unwrap();
    ///
    /// assert_eq!(quotient.value(), 5);
    /// assert!(Modulus::from_residue(1, 6).div(&Modulus::from_residue(2, 6)).is_err());
    /// ```
    pub fn div(&self, other: &Self) -> Result<Self, NumericError> {
        Ok(self.mul(&other.recip()?))
    }

    /// `self^k`; a negative exponent raises the inverse.
    pub fn pow(&self, k: i128) -> Result<Self, NumericError> {
        let base = if k < 0 { self.recip()? } else { *self };
        let k = u64::try_from(k.unsigned_abs()).map_err(|_| NumericError::Overflow)?;
        Ok(Self::from_residue(pow_mod(base.value, k, self.modulus), self.modulus))
    }

    /// The class with its modulus, e.g. `3 (mod 5)`.
    #[must_use]
    pub fn pretty(&self) -> String {
        format!("{} (mod {})", self.value, self.modulus)
    }
}

impl fmt::Display for Modulus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(v: u64, n: u64) -> Modulus {
        Modulus::from_residue(v, n)
    }

    #[test]
    fn ring_operations_wrap() {
        assert_eq!(m(3, 5).add(&m(4, 5)), m(2, 5));
        assert_eq!(m(1, 5).sub(&m(3, 5)), m(3, 5));
        assert_eq!(m(3, 5).mul(&m(4, 5)), m(2, 5));
        assert_eq!(m(0, 5).neg(), m(0, 5));
        assert_eq!(Modulus::from_signed(-1, 5), m(4, 5));
    }

    #[test]
    fn division_uses_the_inverse() {
        for a in 1..11 {
            let inverse = m(a, 11).recip().unwrap();
            assert_eq!(m(a, 11).mul(&inverse), m(1, 11));
        }
        assert_eq!(m(1, 5).div(&m(0, 5)), Err(NumericError::DivisionByZero));
        assert_eq!(m(1, 6).div(&m(3, 6)),
                   Err(NumericError::NotInvertible { value: 3, modulus: 6 }));
    }

    #[test]
    fn powers_accept_negative_exponents() {
        assert_eq!(m(2, 7).pow(3).unwrap(), m(1, 7));
        assert_eq!(m(2, 7).pow(-1).unwrap(), m(4, 7));
        assert_eq!(m(2, 7).pow(0).unwrap(), m(1, 7));
    }

    #[test]
    fn modulus_one_has_a_single_class() {
        assert_eq!(m(5, 1).value(), 0);
        assert_eq!(m(0, 1).pow(0).unwrap().value(), 0);
        assert_eq!(m(3, 5).pretty(), "3 (mod 5)");
    }
}
