use thiserror::Error;

use crate::error::ErrorKind;

/// Represents all failures of the exact numeric tower.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumericError {
    /// Division by zero, or by the zero class of a modulus.
    #[error("division by zero")]
    DivisionByZero,
    /// The divisor has no inverse in `Z/nZ`.
    #[error("{value} has no inverse modulo {modulus}")]
    NotInvertible {
        value:   u64,
        modulus: u64,
    },
    /// A natural number was requested from a value that is not positive.
    #[error("{value} is not a positive natural number")]
    NotPositive {
        /// Display form of the offending value.
        value: String,
    },
    /// An integer was requested from a value with a fractional part.
    #[error("{value} is not an integer")]
    NotIntegral {
        /// Display form of the offending value.
        value: String,
    },
    /// Text does not spell a number.
    #[error("\"{text}\" is not a number")]
    NotANumber {
        text: String,
    },
    /// The result leaves the range that additive arithmetic supports.
    #[error("value out of range")]
    Overflow,
}

impl NumericError {
    /// The diagnostic kind this failure is reported as.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DivisionByZero | Self::NotInvertible { .. } => ErrorKind::DivisionByZeroError,
            Self::NotPositive { .. }
            | Self::NotIntegral { .. }
            | Self::NotANumber { .. }
            | Self::Overflow => ErrorKind::IllegalTypeConversionError,
        }
    }
}
